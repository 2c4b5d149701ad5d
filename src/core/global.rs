//! Process-wide logger
//!
//! A lazily built [`Logger`] bound to [`LoggerConfig::global`] that writes every level to
//! stderr as JSON. The free functions here are shortcuts for code that has no facade at hand.

use super::config::LoggerConfig;
use super::fields::Fields;
use super::log_level::{LevelMask, LogLevel};
use super::logger::{Entry, Logger, DEFAULT_DESTINATION};
use crate::appenders::ConsoleAppender;
use std::sync::{Arc, OnceLock};

static PROCESS_LOGGER: OnceLock<Arc<Logger>> = OnceLock::new();

fn shared() -> &'static Arc<Logger> {
    PROCESS_LOGGER.get_or_init(|| {
        Arc::new(
            Logger::builder()
                .config(LoggerConfig::global())
                .min_level(LogLevel::Trace)
                .destination(DEFAULT_DESTINATION, LevelMask::all(), ConsoleAppender::new())
                .build(),
        )
    })
}

/// Handle to the process-wide logger
pub fn process_logger() -> Arc<Logger> {
    Arc::clone(shared())
}

#[track_caller]
pub fn info(message: impl Into<String>) {
    shared().info(message);
}

#[track_caller]
pub fn warn(message: impl Into<String>) {
    shared().warn(message);
}

/// Log at Fatal on the process-wide logger and terminate
#[track_caller]
pub fn fatal(message: impl Into<String>) {
    shared().fatal(message);
}

pub fn with_fields(fields: Fields) -> Entry<'static> {
    shared().with_fields(fields)
}

/// Set the process-wide threshold shared by every logger bound to the default config
pub fn set_level(level: LogLevel) {
    LoggerConfig::global().set_level(level);
}

pub fn level() -> LogLevel {
    LoggerConfig::global().level()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_process_logger_is_shared() {
        let a = process_logger();
        let b = process_logger();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(a.destination_names(), vec![DEFAULT_DESTINATION.to_string()]);
    }

    #[test]
    fn test_process_logger_uses_global_config() {
        assert!(Arc::ptr_eq(process_logger().config(), &LoggerConfig::global()));
        assert_eq!(level(), LoggerConfig::global().level());
    }
}
