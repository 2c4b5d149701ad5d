//! # egloo_log
//!
//! Structured, leveled JSON logging for service processes.
//!
//! ## Features
//!
//! - **Service facade**: [`EglooLogger`] writes every level to stderr and persists Info and
//!   Error records to an hourly rotated file with a stable link to the current file
//! - **Late-bound fields**: [`Valuer`]s are evaluated at emission, e.g. the caller's
//!   `file:line` via [`Valuer::caller`]
//! - **Transient override**: [`EglooLogger::kinfo`] emits at Info whatever the thresholds are
//! - **Injectable configuration**: thresholds and the fatal exit handler live in a shared
//!   [`LoggerConfig`], so tests can run in isolation
//!
//! ## Example
//!
//! ```no_run
//! use egloo_log::prelude::*;
//!
//! let logger = EglooLogger::new("auth")?;
//! logger.info("service started");
//!
//! let config = std::fs::read_to_string("/etc/auth.toml");
//! logger.log_fatal_if_error(config.as_ref().err(), "failed to read config");
//! # Ok::<(), LoggerError>(())
//! ```

pub mod appenders;
pub mod core;
pub mod macros;
pub mod util;

pub mod prelude {
    pub use crate::appenders::{ConsoleAppender, MemoryAppender, RotatingFileAppender, RotationPolicy};
    pub use crate::core::{
        Appender, Clock, EglooLogger, EglooLoggerBuilder, Entry, FieldValue, Fields, KeyValues,
        LevelMask, LogEntry, LogLevel, Logger, LoggerBuilder, LoggerConfig, LoggerError,
        LoggerMetrics, ManualClock, OutputFormat, Result, SystemClock, TimestampFormat, Value,
        Valuer,
    };
    pub use crate::{fields, keyvals};
}

pub use appenders::{ConsoleAppender, MemoryAppender, RotatingFileAppender, RotationPolicy};
pub use core::global;
pub use core::{
    bind_values, default_caller, Appender, CallSite, Clock, Destination, EglooLogger,
    EglooLoggerBuilder, Entry, ExitHandler, FieldValue, Fields, KeyValues, LevelMask, LogEntry,
    LogLevel, Logger, LoggerBuilder, LoggerConfig, LoggerError, LoggerMetrics, ManualClock,
    OutputFormat, Result, SystemClock, TimestampFormat, Value, Valuer, DEFAULT_DESTINATION,
    FATAL_EXIT_CODE, MISSING_VALUE,
};
pub use util::{clear_bit, get_env, has_bit, require_env, set_bit, try_require_env};
