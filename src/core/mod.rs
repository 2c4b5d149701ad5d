//! Core logger types and traits

pub mod appender;
pub mod clock;
pub mod config;
pub mod error;
pub mod facade;
pub mod fields;
pub mod global;
pub mod log_entry;
pub mod log_level;
pub mod logger;
pub mod metrics;
pub mod output_format;
pub mod timestamp;
pub mod value;

pub use appender::Appender;
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{ExitHandler, LoggerConfig, FATAL_EXIT_CODE};
pub use error::{LoggerError, Result};
pub use facade::{EglooLogger, EglooLoggerBuilder, DEFAULT_LOG_DIR, FILE_DESTINATION};
pub use fields::Fields;
pub use log_entry::LogEntry;
pub use log_level::{LevelMask, LogLevel};
pub use logger::{Destination, Entry, Logger, LoggerBuilder, DEFAULT_DESTINATION};
pub use metrics::LoggerMetrics;
pub use output_format::OutputFormat;
pub use timestamp::TimestampFormat;
pub use value::{
    bind_values, default_caller, CallSite, FieldValue, KeyValues, Value, Valuer, MISSING_VALUE,
};
