//! CLI errors and their exit codes.
//!
//! Exit code scheme:
//! - 0:  success
//! - 2:  clap arg parse error (automatic, before our code runs)
//! - 10: field error (bad dimensions, host failure)
//! - 11: I/O error (snapshot or spec file)
//! - 12: input error (bad config JSON, bad color, out-of-range value)
//! - 13: serialization error

use driftfield_core::FieldError;
use std::fmt;

/// Errors produced by CLI operations, each mapped to a distinct exit code.
#[derive(Debug)]
pub enum CliError {
    /// The field could not be built or run.
    Field(FieldError),
    /// Reading or writing a file failed.
    Io(String),
    /// A user-supplied value was rejected.
    Input(String),
    /// JSON output could not be produced.
    Serialization(String),
}

impl CliError {
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Field(_) => 10,
            CliError::Io(_) => 11,
            CliError::Input(_) => 12,
            CliError::Serialization(_) => 13,
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Field(e) => write!(f, "{e}"),
            CliError::Io(msg) | CliError::Input(msg) | CliError::Serialization(msg) => {
                write!(f, "{msg}")
            }
        }
    }
}

impl From<FieldError> for CliError {
    fn from(e: FieldError) -> Self {
        match e {
            FieldError::Io(msg) => CliError::Io(msg),
            e @ (FieldError::InvalidConfig { .. } | FieldError::InvalidColor(_)) => {
                CliError::Input(e.to_string())
            }
            other => CliError::Field(other),
        }
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        CliError::Serialization(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_are_distinct() {
        let codes = [
            CliError::Field(FieldError::InvalidDimensions).exit_code(),
            CliError::Io("disk".into()).exit_code(),
            CliError::Input("bad".into()).exit_code(),
            CliError::Serialization("json".into()).exit_code(),
        ];
        assert_eq!(codes, [10, 11, 12, 13]);
    }

    #[test]
    fn field_io_routes_to_cli_io() {
        let cli_err = CliError::from(FieldError::Io("disk full".into()));
        assert_eq!(cli_err.exit_code(), 11);
        assert!(cli_err.to_string().contains("disk full"));
    }

    #[test]
    fn config_and_color_errors_are_input_errors() {
        let e = CliError::from(FieldError::config("fade_alpha", "too big"));
        assert_eq!(e.exit_code(), 12);
        assert!(e.to_string().contains("fade_alpha"));
        assert_eq!(CliError::from(FieldError::InvalidColor("#zz".into())).exit_code(), 12);
    }

    #[test]
    fn other_field_errors_keep_field_code() {
        assert_eq!(CliError::from(FieldError::Host("gone".into())).exit_code(), 10);
    }

    #[test]
    fn serde_json_error_routes_to_serialization() {
        let bad = serde_json::from_str::<serde_json::Value>("{invalid").unwrap_err();
        assert_eq!(CliError::from(bad).exit_code(), 13);
    }
}
