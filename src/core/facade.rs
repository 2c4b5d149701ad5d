//! Service logging facade
//!
//! [`EglooLogger`] is the object a service holds for its whole lifetime. It writes JSON
//! records to stderr for every level and persists Info and Error records to an hourly
//! rotated file under the log directory, e.g. `/var/log/<service>.log.202501081000`, with
//! `/var/log/<service>.log` always pointing at the current file.
//!
//! # Example
//!
//! ```no_run
//! use egloo_log::prelude::*;
//!
//! let logger = EglooLogger::new_with_fields("auth", fields!("region", "eu-west-1"))?;
//! logger.info("service started");
//! logger
//!     .with_fields(fields!("user", "alice", "caller", Valuer::caller()))
//!     .warn("password expires soon");
//! # Ok::<(), LoggerError>(())
//! ```

use super::config::LoggerConfig;
use super::error::{LoggerError, Result};
use super::fields::Fields;
use super::global::process_logger;
use super::log_level::{LevelMask, LogLevel};
use super::logger::{Destination, Entry, Logger, DEFAULT_DESTINATION};
use super::output_format::OutputFormat;
use super::Appender;
use crate::appenders::{ConsoleAppender, RotatingFileAppender, RotationPolicy};
use crate::util::env::get_env;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Directory holding rotated files unless configured otherwise
pub const DEFAULT_LOG_DIR: &str = "/var/log";

/// Name of the rotating file destination
pub const FILE_DESTINATION: &str = "file";

pub const LOG_DIR_ENV: &str = "EGLOO_LOG_DIR";
pub const LOG_LEVEL_ENV: &str = "EGLOO_LOG_LEVEL";

/// Levels persisted to the rotating file
pub fn persisted_levels() -> LevelMask {
    LevelMask::of(&[LogLevel::Info, LogLevel::Error])
}

pub struct EglooLogger {
    service: String,
    logger: Logger,
    fields: Fields,
    process: Arc<Logger>,
    file: RotatingFileAppender,
}

impl EglooLogger {
    /// Facade for `service` with default settings and no base fields
    ///
    /// # Errors
    ///
    /// Returns [`LoggerError::SinkCreation`] if the rotating file cannot be created. The
    /// failure is also logged on the process-wide logger.
    pub fn new(service: impl Into<String>) -> Result<Self> {
        Self::builder(service).build()
    }

    /// Facade for `service` whose records all carry `fields`
    pub fn new_with_fields(service: impl Into<String>, fields: Fields) -> Result<Self> {
        Self::builder(service).fields(fields).build()
    }

    pub fn builder(service: impl Into<String>) -> EglooLoggerBuilder {
        EglooLoggerBuilder::new(service)
    }

    pub fn service_name(&self) -> &str {
        &self.service
    }

    /// Base fields attached to every record
    pub fn fields(&self) -> &Fields {
        &self.fields
    }

    /// Backend logger behind this facade
    pub fn logger(&self) -> &Logger {
        &self.logger
    }

    pub fn file_appender(&self) -> &RotatingFileAppender {
        &self.file
    }

    pub fn config(&self) -> &Arc<LoggerConfig> {
        self.logger.config()
    }

    /// Log `err` at Error severity as `"<msg>: <err>"`, or just the error text if `msg` is empty
    #[track_caller]
    pub fn error<E>(&self, err: &E, msg: &str)
    where
        E: fmt::Display + ?Sized,
    {
        let message = if msg.is_empty() {
            err.to_string()
        } else {
            format!("{}: {}", msg, err)
        };
        self.emit(LogLevel::Error, message);
    }

    /// Same as [`info`](Self::info)
    #[track_caller]
    pub fn log(&self, message: impl Into<String>) {
        self.emit(LogLevel::Info, message);
    }

    #[track_caller]
    pub fn info(&self, message: impl Into<String>) {
        self.emit(LogLevel::Info, message);
    }

    #[track_caller]
    pub fn warn(&self, message: impl Into<String>) {
        self.emit(LogLevel::Warn, message);
    }

    /// Log at Fatal, flush, and terminate through the config's exit handler
    #[track_caller]
    pub fn fatal(&self, message: impl Into<String>) {
        self.logger.fatal_with_fields(message, &self.fields);
    }

    /// Log at Info whatever the current thresholds are
    ///
    /// Both the shared and the instance threshold are forced to Info for the duration of
    /// the call and restored afterwards, even if a destination panics. Other threshold
    /// mutations on the same config wait until the call returns.
    #[track_caller]
    pub fn kinfo(&self, message: impl Into<String>) {
        let config = self.logger.config();
        let _lock = config.lock_levels();
        let _restore = ThresholdRestore {
            config,
            logger: &self.logger,
            shared: config.level(),
            instance: self.logger.level(),
        };

        config.store_level(LogLevel::Info);
        self.logger.store_level(LogLevel::Info);
        self.emit(LogLevel::Info, message);
    }

    /// Entry carrying the base fields plus `fields`, which win on collisions
    pub fn with_fields(&self, fields: Fields) -> Entry<'_> {
        Entry::new(&self.logger, self.fields.merged(&fields))
    }

    /// Terminate with `"<msg>: <err>"` if `err` is present
    ///
    /// The record goes to the process-wide logger and to this facade, both are flushed, and
    /// then the exit handler runs once.
    #[track_caller]
    pub fn log_fatal_if_error<E>(&self, err: Option<&E>, msg: &str)
    where
        E: fmt::Display + ?Sized,
    {
        let Some(err) = err else {
            return;
        };

        let message = format!("{}: {}", msg, err);
        self.process
            .log_with_fields(LogLevel::Fatal, message.as_str(), &Fields::new());
        self.logger
            .log_with_fields(LogLevel::Fatal, message, &self.fields);

        if let Err(e) = self.process.flush() {
            eprintln!("[LOGGER ERROR] Failed to flush process logger before exit: {}", e);
        }
        self.logger.terminate();
    }

    /// Set the instance threshold
    pub fn set_level(&self, level: LogLevel) {
        self.logger.set_level(level);
    }

    pub fn level(&self) -> LogLevel {
        self.logger.level()
    }

    pub fn flush(&self) -> Result<()> {
        self.logger.flush()
    }

    #[track_caller]
    fn emit(&self, level: LogLevel, message: impl Into<String>) {
        self.logger.log_with_fields(level, message, &self.fields);
    }
}

impl fmt::Debug for EglooLogger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EglooLogger")
            .field("service", &self.service)
            .field("logger", &self.logger)
            .field("fields", &self.fields)
            .finish_non_exhaustive()
    }
}

/// Puts both thresholds back when a transient override ends
struct ThresholdRestore<'a> {
    config: &'a LoggerConfig,
    logger: &'a Logger,
    shared: LogLevel,
    instance: LogLevel,
}

impl Drop for ThresholdRestore<'_> {
    fn drop(&mut self) {
        self.config.store_level(self.shared);
        self.logger.store_level(self.instance);
    }
}

/// Builder for [`EglooLogger`]
///
/// # Example
/// ```no_run
/// use egloo_log::prelude::*;
/// use std::time::Duration;
///
/// let logger = EglooLogger::builder("billing")
///     .log_dir("/srv/logs")
///     .policy(RotationPolicy::new().with_max_age(Duration::from_secs(7 * 24 * 3600)))
///     .level(LogLevel::Debug)
///     .build()?;
/// # Ok::<(), LoggerError>(())
/// ```
pub struct EglooLoggerBuilder {
    service: String,
    log_dir: PathBuf,
    policy: RotationPolicy,
    fields: Fields,
    level: LogLevel,
    config: Option<Arc<LoggerConfig>>,
    default_output: Option<Box<dyn Appender>>,
    process: Option<Arc<Logger>>,
    output_format: OutputFormat,
}

impl EglooLoggerBuilder {
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            log_dir: PathBuf::from(DEFAULT_LOG_DIR),
            policy: RotationPolicy::default(),
            fields: Fields::new(),
            level: LogLevel::Info,
            config: None,
            default_output: None,
            process: None,
            output_format: OutputFormat::Json,
        }
    }

    /// Builder seeded from `EGLOO_LOG_DIR` and `EGLOO_LOG_LEVEL`
    ///
    /// # Errors
    ///
    /// Returns [`LoggerError::InvalidConfiguration`] if `EGLOO_LOG_LEVEL` is not a level name
    pub fn from_env(service: impl Into<String>) -> Result<Self> {
        let level_name = get_env(LOG_LEVEL_ENV, LogLevel::Info.as_json_str());
        let level = level_name.parse::<LogLevel>().map_err(|_| {
            LoggerError::config(
                LOG_LEVEL_ENV,
                format!("unknown log level '{}'", level_name),
            )
        })?;

        Ok(Self::new(service)
            .log_dir(get_env(LOG_DIR_ENV, DEFAULT_LOG_DIR))
            .level(level))
    }

    #[must_use = "builder methods return a new value"]
    pub fn log_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.log_dir = dir.as_ref().to_path_buf();
        self
    }

    /// Rotation interval, retention and clock; the link name is always derived from the service
    #[must_use = "builder methods return a new value"]
    pub fn policy(mut self, policy: RotationPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Base fields attached to every record
    #[must_use = "builder methods return a new value"]
    pub fn fields(mut self, fields: Fields) -> Self {
        self.fields = fields;
        self
    }

    /// Instance threshold
    #[must_use = "builder methods return a new value"]
    pub fn level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }

    /// Shared config; defaults to [`LoggerConfig::global`]
    #[must_use = "builder methods return a new value"]
    pub fn config(mut self, config: Arc<LoggerConfig>) -> Self {
        self.config = Some(config);
        self
    }

    /// Replace the stderr destination
    #[must_use = "builder methods return a new value"]
    pub fn default_output<A: Appender + 'static>(mut self, appender: A) -> Self {
        self.default_output = Some(Box::new(appender));
        self
    }

    /// Logger that fatal-on-error records are mirrored to; defaults to the process-wide one
    #[must_use = "builder methods return a new value"]
    pub fn process_logger(mut self, logger: Arc<Logger>) -> Self {
        self.process = Some(logger);
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn output_format(mut self, format: OutputFormat) -> Self {
        self.output_format = format;
        self
    }

    pub fn file_pattern(&self) -> PathBuf {
        self.log_dir.join(format!("{}.log.%Y%m%d%H%M", self.service))
    }

    pub fn link_path(&self) -> PathBuf {
        self.log_dir.join(format!("{}.log", self.service))
    }

    /// Create the rotating file and assemble the facade
    ///
    /// # Errors
    ///
    /// Returns [`LoggerError::SinkCreation`] naming the service if the file sink cannot be
    /// created; the cause is logged on the process logger first.
    pub fn build(self) -> Result<EglooLogger> {
        let process = self.process.clone().unwrap_or_else(process_logger);
        let pattern = self.file_pattern().to_string_lossy().into_owned();
        let policy = self.policy.clone().with_link_name(self.link_path());

        let file = match RotatingFileAppender::new(pattern, policy) {
            Ok(file) => file,
            Err(e) => {
                process
                    .with_fields(
                        Fields::new()
                            .with("serviceName", self.service.as_str())
                            .with("err", e.to_string()),
                    )
                    .error("Failed to create rotating log sink");
                return Err(LoggerError::sink_creation(self.service, e.to_string()));
            }
        };

        let default_output = self
            .default_output
            .unwrap_or_else(|| Box::new(ConsoleAppender::new()));
        let config = self.config.unwrap_or_else(LoggerConfig::global);

        let logger = Logger::builder()
            .config(config)
            .min_level(self.level)
            .output_format(self.output_format)
            .build();
        logger.add_destination(Destination::new(
            DEFAULT_DESTINATION,
            LevelMask::all(),
            default_output,
        ));
        logger.add_destination(Destination::new(
            FILE_DESTINATION,
            persisted_levels(),
            Box::new(file.clone()),
        ));

        Ok(EglooLogger {
            service: self.service,
            logger,
            fields: self.fields,
            process,
            file,
        })
    }
}

impl fmt::Debug for EglooLoggerBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EglooLoggerBuilder")
            .field("service", &self.service)
            .field("log_dir", &self.log_dir)
            .field("policy", &self.policy)
            .field("level", &self.level)
            .finish_non_exhaustive()
    }
}
