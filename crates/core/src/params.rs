//! Helpers for reading typed configuration values from a `serde_json::Value` object.
//!
//! Numeric helpers never fail: a missing key or a value of the wrong JSON type
//! yields the default. Colors are the exception, since a malformed hex string
//! is almost certainly a typo worth reporting.

use crate::color::Srgb;
use crate::error::FieldError;
use serde_json::Value;

/// Extracts an `f64` from `params[name]`, returning `default` if missing or wrong type.
pub fn param_f64(params: &Value, name: &str, default: f64) -> f64 {
    params.get(name).and_then(Value::as_f64).unwrap_or(default)
}

/// Extracts an optional `f64`: `null` or a missing key yields `None`.
pub fn param_opt_f64(params: &Value, name: &str, default: Option<f64>) -> Option<f64> {
    match params.get(name) {
        Some(Value::Null) => None,
        Some(v) => v.as_f64().or(default),
        None => default,
    }
}

/// Extracts a `usize` from `params[name]`, returning `default` if missing,
/// negative, fractional, or the wrong type.
pub fn param_usize(params: &Value, name: &str, default: usize) -> usize {
    params
        .get(name)
        .and_then(Value::as_u64)
        .and_then(|v| usize::try_from(v).ok())
        .unwrap_or(default)
}

/// Extracts a hex color from `params[name]`.
///
/// Missing keys and non-string values give `default`; a string that is not a
/// valid `#rrggbb` color is an error.
pub fn param_color(params: &Value, name: &str, default: Srgb) -> Result<Srgb, FieldError> {
    match params.get(name).and_then(Value::as_str) {
        Some(hex) => Srgb::from_hex(hex).map_err(|e| FieldError::config(name, e.to_string())),
        None => Ok(default),
    }
}
