//! Error types for the driftfield core.

use thiserror::Error;

/// Errors produced by field construction, configuration, and hosts.
///
/// The running loop itself never surfaces these for transient conditions
/// (missing drawing context, zero-size container); those are absorbed as
/// skipped frames. Errors are reserved for construction-time validation
/// and for host failures a caller can act on.
#[derive(Debug, Error)]
pub enum FieldError {
    /// Width or height was zero, negative, or non-finite where a real surface is required.
    #[error("invalid dimensions: width and height must be positive and finite")]
    InvalidDimensions,

    /// A color string could not be parsed.
    #[error("invalid color: {0}")]
    InvalidColor(String),

    /// A configuration value was out of its accepted range.
    #[error("invalid config value for '{name}': {reason}")]
    InvalidConfig { name: String, reason: String },

    /// The host platform refused an operation (frame request, listener attach).
    #[error("host error: {0}")]
    Host(String),

    /// Writing an artifact (snapshot, run spec) failed.
    #[error("I/O error: {0}")]
    Io(String),
}

impl FieldError {
    /// Shorthand for [`FieldError::InvalidConfig`].
    pub fn config(name: &str, reason: impl Into<String>) -> Self {
        FieldError::InvalidConfig {
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_dimensions_displays_readable_message() {
        let msg = FieldError::InvalidDimensions.to_string();
        assert!(
            msg.contains("width") && msg.contains("height"),
            "expected message mentioning width and height, got: {msg}"
        );
    }

    #[test]
    fn invalid_config_includes_name_and_reason() {
        let err = FieldError::config("fade_alpha", "must be within [0, 1]");
        let msg = err.to_string();
        assert!(msg.contains("fade_alpha"), "missing name in: {msg}");
        assert!(msg.contains("[0, 1]"), "missing reason in: {msg}");
    }

    #[test]
    fn host_and_io_include_message() {
        assert!(FieldError::Host("no window".into())
            .to_string()
            .contains("no window"));
        assert!(FieldError::Io("disk full".into())
            .to_string()
            .contains("disk full"));
    }

    #[test]
    fn field_error_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<FieldError>();
    }
}
