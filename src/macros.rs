//! Macros for building field sets and logging formatted messages.
//!
//! # Examples
//!
//! ```
//! use egloo_log::prelude::*;
//! use egloo_log::{fields, info};
//!
//! let logger = Logger::builder().appender(MemoryAppender::new()).build();
//!
//! let port = 8080;
//! info!(logger, "Server listening on port {}", port);
//!
//! logger
//!     .with_fields(fields!("user", "alice", "attempt", 3))
//!     .info("login");
//! ```

/// Build a [`KeyValues`](crate::KeyValues) from a flat `key, value, key, value, ...` list.
///
/// A trailing key without a value is paired with the missing-value sentinel.
///
/// # Examples
///
/// ```
/// use egloo_log::{keyvals, FieldValue, Value};
///
/// let kv = keyvals!("user", "alice", "attempt", 3, "dangling");
/// assert_eq!(kv.len(), 3);
/// assert!(matches!(kv.get("dangling"), Some(Value::Static(FieldValue::Missing))));
/// ```
#[macro_export]
macro_rules! keyvals {
    () => {
        $crate::KeyValues::new()
    };
    ($($rest:tt)+) => {{
        let mut kv = $crate::KeyValues::new();
        $crate::__keyvals_push!(kv; $($rest)+);
        kv
    }};
}

#[doc(hidden)]
#[macro_export]
macro_rules! __keyvals_push {
    ($kv:ident; $key:expr, $value:expr, $($rest:tt)+) => {
        $kv.push($key, $value);
        $crate::__keyvals_push!($kv; $($rest)+);
    };
    ($kv:ident; $key:expr, $value:expr $(,)?) => {
        $kv.push($key, $value);
    };
    ($kv:ident; $key:expr $(,)?) => {
        $kv.push_key($key);
    };
}

/// Build a [`Fields`](crate::Fields) from a flat `key, value, ...` list.
///
/// Later duplicates overwrite earlier ones; a trailing key gets the missing-value sentinel.
///
/// # Examples
///
/// ```
/// use egloo_log::fields;
///
/// let fields = fields!("user", "alice", "user", "bob");
/// assert_eq!(fields.len(), 1);
/// assert_eq!(fields.to_string(), "user=bob");
/// ```
#[macro_export]
macro_rules! fields {
    ($($args:tt)*) => {
        $crate::Fields::from_keyvals($crate::keyvals!($($args)*))
    };
}

/// Log a formatted info-level message.
///
/// Works with anything exposing `info(String)`: a [`Logger`](crate::Logger), an
/// [`EglooLogger`](crate::EglooLogger) or an [`Entry`](crate::Entry).
#[macro_export]
macro_rules! info {
    ($logger:expr, $($arg:tt)+) => {
        $logger.info(format!($($arg)+))
    };
}

/// Log a formatted warn-level message.
///
/// # Examples
///
/// ```
/// # use egloo_log::prelude::*;
/// # let logger = Logger::builder().appender(MemoryAppender::new()).build();
/// use egloo_log::warn;
/// warn!(logger, "Disk usage at {}%", 91);
/// ```
#[macro_export]
macro_rules! warn {
    ($logger:expr, $($arg:tt)+) => {
        $logger.warn(format!($($arg)+))
    };
}

/// Log a formatted message at Info on a facade regardless of its thresholds.
#[macro_export]
macro_rules! kinfo {
    ($logger:expr, $($arg:tt)+) => {
        $logger.kinfo(format!($($arg)+))
    };
}

/// Log a formatted fatal message and terminate.
///
/// The config's exit handler runs after the record is flushed; by default it exits the
/// process with status 1.
#[macro_export]
macro_rules! fatal {
    ($logger:expr, $($arg:tt)+) => {
        $logger.fatal(format!($($arg)+))
    };
}

#[cfg(test)]
mod tests {
    use crate::core::value::{FieldValue, Value};

    #[test]
    fn test_keyvals_macro_pads_trailing_key() {
        let kv = keyvals!("a", 1, "b");
        assert_eq!(kv.len(), 2);
        assert!(matches!(kv.get("a"), Some(Value::Static(FieldValue::Int(1)))));
        assert!(matches!(kv.get("b"), Some(Value::Static(FieldValue::Missing))));
    }

    #[test]
    fn test_keyvals_macro_trailing_comma_and_empty() {
        assert_eq!(keyvals!("a", true,).len(), 1);
        assert!(keyvals!().is_empty());
    }

    #[test]
    fn test_fields_macro() {
        let fields = fields!("user", "alice", "count", 2, "user", "bob");
        assert_eq!(fields.len(), 2);
        assert_eq!(fields.to_string(), "user=bob count=2");
        assert!(fields!().is_empty());
    }
}
