//! Leveled backend logger
//!
//! A `Logger` frames each entry once and fans it out to named destinations. Every
//! destination declares the levels it accepts, so one logger can send everything to the
//! default output while persisting only a subset to a file.

use super::{
    appender::Appender,
    config::{LoggerConfig, FATAL_EXIT_CODE},
    error::Result,
    fields::Fields,
    log_entry::LogEntry,
    log_level::{LevelMask, LogLevel},
    metrics::LoggerMetrics,
    output_format::OutputFormat,
    timestamp::TimestampFormat,
    value::{CallSite, Value},
};
use parking_lot::RwLock;
use std::any::Any;
use std::fmt;
use std::panic::Location;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

/// Name of the destination every logger writes all levels to by default
pub const DEFAULT_DESTINATION: &str = "default";

/// A named output with the set of levels it accepts
pub struct Destination {
    name: String,
    levels: LevelMask,
    appender: Box<dyn Appender>,
}

impl Destination {
    pub fn new(name: impl Into<String>, levels: LevelMask, appender: Box<dyn Appender>) -> Self {
        Self {
            name: name.into(),
            levels,
            appender,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn accepts(&self, level: LogLevel) -> bool {
        self.levels.contains(level)
    }
}

impl fmt::Debug for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Destination")
            .field("name", &self.name)
            .field("levels", &self.levels)
            .field("appender", &self.appender.name())
            .finish()
    }
}

pub struct Logger {
    min_level: AtomicU8,
    config: Arc<LoggerConfig>,
    destinations: RwLock<Vec<Destination>>,
    output_format: OutputFormat,
    timestamp_format: TimestampFormat,
    /// Metrics for observability (written, dropped, filtered)
    metrics: LoggerMetrics,
}

impl Logger {
    /// Logger bound to the process-wide config, with no destinations
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(LoggerConfig::global())
    }

    #[must_use]
    pub fn with_config(config: Arc<LoggerConfig>) -> Self {
        Self {
            min_level: AtomicU8::new(LogLevel::Info as u8),
            config,
            destinations: RwLock::new(Vec::new()),
            output_format: OutputFormat::default(),
            timestamp_format: TimestampFormat::default(),
            metrics: LoggerMetrics::new(),
        }
    }

    /// Add an appender that receives every level
    pub fn add_appender(&self, appender: Box<dyn Appender>) {
        self.add_destination(Destination::new(
            appender.name().to_string(),
            LevelMask::all(),
            appender,
        ));
    }

    pub fn add_destination(&self, destination: Destination) {
        self.destinations.write().push(destination);
    }

    pub fn destination_names(&self) -> Vec<String> {
        self.destinations
            .read()
            .iter()
            .map(|d| d.name.clone())
            .collect()
    }

    /// Instance threshold
    pub fn level(&self) -> LogLevel {
        LogLevel::from_u8(self.min_level.load(Ordering::Acquire))
    }

    pub fn set_level(&self, level: LogLevel) {
        let _guard = self.config.lock_levels();
        self.store_level(level);
    }

    pub(crate) fn store_level(&self, level: LogLevel) {
        self.min_level.store(level as u8, Ordering::Release);
    }

    pub fn config(&self) -> &Arc<LoggerConfig> {
        &self.config
    }

    /// Whether `level` passes both the instance and the shared threshold
    pub fn is_enabled(&self, level: LogLevel) -> bool {
        level >= self.level() && level >= self.config.level()
    }

    #[track_caller]
    pub fn log(&self, level: LogLevel, message: impl Into<String>) {
        self.log_with_fields(level, message, &Fields::new());
    }

    /// Log with structured fields; deferred values are resolved here
    #[track_caller]
    pub fn log_with_fields(&self, level: LogLevel, message: impl Into<String>, fields: &Fields) {
        if !self.is_enabled(level) {
            self.metrics.record_filtered();
            return;
        }

        let _site = CallSite::enter(Location::caller());
        let entry = LogEntry::new(level, message).with_fields(fields);
        self.write_entry(&entry);
    }

    /// Write a fatal entry, flush, then hand control to the config's exit handler
    #[track_caller]
    pub fn fatal_with_fields(&self, message: impl Into<String>, fields: &Fields) {
        self.log_with_fields(LogLevel::Fatal, message, fields);
        self.terminate();
    }

    /// Flush every destination and run the exit handler
    pub(crate) fn terminate(&self) {
        if let Err(e) = self.flush() {
            eprintln!("[LOGGER ERROR] Failed to flush before exit: {}", e);
        }
        self.config.exit(FATAL_EXIT_CODE);
    }

    fn write_entry(&self, entry: &LogEntry) {
        let line = self.output_format.format(entry, &self.timestamp_format);
        let mut destinations = self.destinations.write();
        let mut has_error = false;

        // Per-destination panic isolation: one broken sink must not starve the others
        for destination in destinations.iter_mut().filter(|d| d.accepts(entry.level)) {
            let append_result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                destination.appender.append(entry, &line)
            }));

            match append_result {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    eprintln!(
                        "[LOGGER ERROR] Destination '{}' failed: {}",
                        destination.name, e
                    );
                    has_error = true;
                }
                Err(panic_info) => {
                    eprintln!(
                        "[LOGGER CRITICAL] Destination '{}' panicked: {}. \
                         Other destinations continue to function.",
                        destination.name,
                        panic_message(panic_info.as_ref())
                    );
                    has_error = true;
                }
            }
        }

        if has_error {
            self.metrics.record_dropped();
        } else {
            self.metrics.record_logged();
        }
    }

    pub fn metrics(&self) -> &LoggerMetrics {
        &self.metrics
    }

    /// Number of entries at least one destination failed to write
    pub fn dropped_count(&self) -> u64 {
        self.metrics.dropped_count()
    }

    pub fn flush(&self) -> Result<()> {
        let mut destinations = self.destinations.write();
        for destination in destinations.iter_mut() {
            destination.appender.flush()?;
        }
        Ok(())
    }

    #[inline]
    #[track_caller]
    pub fn trace(&self, message: impl Into<String>) {
        self.log(LogLevel::Trace, message);
    }

    #[inline]
    #[track_caller]
    pub fn debug(&self, message: impl Into<String>) {
        self.log(LogLevel::Debug, message);
    }

    #[inline]
    #[track_caller]
    pub fn info(&self, message: impl Into<String>) {
        self.log(LogLevel::Info, message);
    }

    #[inline]
    #[track_caller]
    pub fn warn(&self, message: impl Into<String>) {
        self.log(LogLevel::Warn, message);
    }

    #[inline]
    #[track_caller]
    pub fn error(&self, message: impl Into<String>) {
        self.log(LogLevel::Error, message);
    }

    /// Log at Fatal and terminate through the config's exit handler
    #[track_caller]
    pub fn fatal(&self, message: impl Into<String>) {
        self.fatal_with_fields(message, &Fields::new());
    }

    /// Entry carrying `fields` for the emissions made through it
    pub fn with_fields(&self, fields: Fields) -> Entry<'_> {
        Entry::new(self, fields)
    }

    /// Create a builder for Logger
    ///
    /// # Example
    /// ```
    /// use egloo_log::prelude::*;
    ///
    /// let logger = Logger::builder()
    ///     .min_level(LogLevel::Debug)
    ///     .appender(MemoryAppender::new())
    ///     .build();
    /// logger.debug("ready");
    /// ```
    #[must_use]
    pub fn builder() -> LoggerBuilder {
        LoggerBuilder::new()
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Logger {
    fn drop(&mut self) {
        if let Err(e) = self.flush() {
            eprintln!("[LOGGER ERROR] Failed to flush during shutdown: {}", e);
        }

        let dropped = self.metrics.dropped_count();
        if dropped > 0 {
            eprintln!(
                "[LOGGER WARNING] Logger shutting down with {} dropped logs (drop rate: {:.2}%)",
                dropped,
                self.metrics.drop_rate()
            );
        }
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("level", &self.level())
            .field("config", &self.config)
            .field("destinations", &self.destination_names())
            .field("output_format", &self.output_format)
            .finish()
    }
}

fn panic_message(panic_info: &(dyn Any + Send)) -> String {
    if let Some(s) = panic_info.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic_info.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}

/// Emission handle carrying fields
///
/// Created by `with_fields` on a logger or facade. Deferred values inside the fields are
/// evaluated on each emission, not when the entry is created.
#[derive(Debug, Clone)]
pub struct Entry<'a> {
    logger: &'a Logger,
    fields: Fields,
}

impl<'a> Entry<'a> {
    pub fn new(logger: &'a Logger, fields: Fields) -> Self {
        Self { logger, fields }
    }

    /// New entry with `fields` added; they win on key collisions
    #[must_use]
    pub fn with_fields(&self, fields: Fields) -> Entry<'a> {
        Entry {
            logger: self.logger,
            fields: self.fields.merged(&fields),
        }
    }

    #[must_use]
    pub fn with_field<K, V>(&self, key: K, value: V) -> Entry<'a>
    where
        K: Into<String>,
        V: Into<Value>,
    {
        self.with_fields(Fields::new().with(key, value))
    }

    pub fn fields(&self) -> &Fields {
        &self.fields
    }

    #[track_caller]
    pub fn log(&self, level: LogLevel, message: impl Into<String>) {
        self.logger.log_with_fields(level, message, &self.fields);
    }

    #[track_caller]
    pub fn debug(&self, message: impl Into<String>) {
        self.log(LogLevel::Debug, message);
    }

    #[track_caller]
    pub fn info(&self, message: impl Into<String>) {
        self.log(LogLevel::Info, message);
    }

    #[track_caller]
    pub fn warn(&self, message: impl Into<String>) {
        self.log(LogLevel::Warn, message);
    }

    #[track_caller]
    pub fn error(&self, message: impl Into<String>) {
        self.log(LogLevel::Error, message);
    }

    #[track_caller]
    pub fn fatal(&self, message: impl Into<String>) {
        self.logger.fatal_with_fields(message, &self.fields);
    }
}

/// Builder for constructing Logger with a fluent API
///
/// # Example
/// ```
/// use egloo_log::prelude::*;
/// use std::sync::Arc;
///
/// let config = Arc::new(LoggerConfig::new());
/// let logger = Logger::builder()
///     .config(config)
///     .min_level(LogLevel::Warn)
///     .destination("alerts", LevelMask::at_least(LogLevel::Error), MemoryAppender::new())
///     .build();
/// ```
pub struct LoggerBuilder {
    min_level: LogLevel,
    config: Option<Arc<LoggerConfig>>,
    destinations: Vec<Destination>,
    output_format: OutputFormat,
    timestamp_format: TimestampFormat,
}

impl LoggerBuilder {
    /// Create a new builder with default values
    pub fn new() -> Self {
        Self {
            min_level: LogLevel::Info,
            config: None,
            destinations: Vec::new(),
            output_format: OutputFormat::default(),
            timestamp_format: TimestampFormat::default(),
        }
    }

    /// Set the instance threshold
    #[must_use = "builder methods return a new value"]
    pub fn min_level(mut self, level: LogLevel) -> Self {
        self.min_level = level;
        self
    }

    /// Bind to `config` instead of the process-wide one
    #[must_use = "builder methods return a new value"]
    pub fn config(mut self, config: Arc<LoggerConfig>) -> Self {
        self.config = Some(config);
        self
    }

    /// Add an appender receiving every level, named after the appender
    #[must_use = "builder methods return a new value"]
    pub fn appender<A: Appender + 'static>(self, appender: A) -> Self {
        let name = appender.name().to_string();
        self.destination(name, LevelMask::all(), appender)
    }

    /// Add a named destination accepting only `levels`
    #[must_use = "builder methods return a new value"]
    pub fn destination<A: Appender + 'static>(
        mut self,
        name: impl Into<String>,
        levels: LevelMask,
        appender: A,
    ) -> Self {
        self.destinations
            .push(Destination::new(name, levels, Box::new(appender)));
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn output_format(mut self, format: OutputFormat) -> Self {
        self.output_format = format;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn timestamp_format(mut self, format: TimestampFormat) -> Self {
        self.timestamp_format = format;
        self
    }

    /// Build the Logger
    pub fn build(self) -> Logger {
        let config = self.config.unwrap_or_else(LoggerConfig::global);
        let mut logger = Logger::with_config(config);
        logger.output_format = self.output_format;
        logger.timestamp_format = self.timestamp_format;
        logger.store_level(self.min_level);
        for destination in self.destinations {
            logger.add_destination(destination);
        }
        logger
    }
}

impl Default for LoggerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
