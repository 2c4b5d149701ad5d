//! Environment variable accessors
//!
//! An empty value is treated the same as an unset one.

use crate::core::error::{LoggerError, Result};

/// Read `key`, falling back to `default` when it is unset or empty.
pub fn get_env(key: &str, default: &str) -> String {
    match std::env::var(key) {
        Ok(value) if !value.is_empty() => value,
        _ => default.to_string(),
    }
}

/// Read `key`, returning [`LoggerError::MissingEnv`] when it is unset or empty.
pub fn try_require_env(key: &str) -> Result<String> {
    match std::env::var(key) {
        Ok(value) if !value.is_empty() => Ok(value),
        _ => Err(LoggerError::missing_env(key)),
    }
}

/// Read `key` or abort.
///
/// # Panics
///
/// Panics with a message naming `key` when the variable is unset or empty
pub fn require_env(key: &str) -> String {
    match try_require_env(key) {
        Ok(value) => value,
        Err(e) => panic!("{}", e),
    }
}
