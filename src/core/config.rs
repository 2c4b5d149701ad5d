//! Shared logger configuration
//!
//! A `LoggerConfig` carries the threshold that every logger bound to it must also pass,
//! plus the handler invoked after a fatal record is written. One default instance backs
//! the process-wide logger; tests and embedders can build isolated ones and hand them to
//! each logger and facade they create.

use super::log_level::LogLevel;
use parking_lot::{ReentrantMutex, ReentrantMutexGuard};
use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, OnceLock};

/// Callback invoked with the exit code after a fatal record is flushed
pub type ExitHandler = Arc<dyn Fn(i32) + Send + Sync>;

/// Exit code used for fatal emissions
pub const FATAL_EXIT_CODE: i32 = 1;

static GLOBAL_CONFIG: OnceLock<Arc<LoggerConfig>> = OnceLock::new();

pub struct LoggerConfig {
    level: AtomicU8,
    /// Serializes threshold mutations, including the save/force/restore of a transient override
    mutation: ReentrantMutex<()>,
    exit_handler: ExitHandler,
}

impl LoggerConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::with_exit_handler(Arc::new(|code| {
            std::process::exit(code);
        }))
    }

    /// Create a config whose fatal emissions call `handler` instead of exiting the process
    #[must_use]
    pub fn with_exit_handler(handler: ExitHandler) -> Self {
        Self {
            level: AtomicU8::new(LogLevel::Info as u8),
            mutation: ReentrantMutex::new(()),
            exit_handler: handler,
        }
    }

    /// The process-wide default instance
    pub fn global() -> Arc<LoggerConfig> {
        Arc::clone(GLOBAL_CONFIG.get_or_init(|| Arc::new(LoggerConfig::new())))
    }

    pub fn level(&self) -> LogLevel {
        LogLevel::from_u8(self.level.load(Ordering::Acquire))
    }

    pub fn set_level(&self, level: LogLevel) {
        let _guard = self.lock_levels();
        self.store_level(level);
    }

    /// Hold off every other threshold mutation on this config until the guard drops
    ///
    /// The lock is reentrant, so the holder may still call [`set_level`](Self::set_level).
    pub fn lock_levels(&self) -> ReentrantMutexGuard<'_, ()> {
        self.mutation.lock()
    }

    pub(crate) fn store_level(&self, level: LogLevel) {
        self.level.store(level as u8, Ordering::Release);
    }

    pub(crate) fn exit(&self, code: i32) {
        (self.exit_handler)(code);
    }
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for LoggerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoggerConfig")
            .field("level", &self.level())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicI32;

    #[test]
    fn test_default_level_is_info() {
        let config = LoggerConfig::new();
        assert_eq!(config.level(), LogLevel::Info);
    }

    #[test]
    fn test_set_level() {
        let config = LoggerConfig::new();
        config.set_level(LogLevel::Error);
        assert_eq!(config.level(), LogLevel::Error);
    }

    #[test]
    fn test_set_level_while_holding_lock() {
        let config = LoggerConfig::new();
        let _guard = config.lock_levels();
        config.set_level(LogLevel::Debug);
        assert_eq!(config.level(), LogLevel::Debug);
    }

    #[test]
    fn test_exit_handler_receives_code() {
        let code = Arc::new(AtomicI32::new(-1));
        let seen = Arc::clone(&code);
        let config = LoggerConfig::with_exit_handler(Arc::new(move |c| {
            seen.store(c, Ordering::SeqCst);
        }));

        config.exit(FATAL_EXIT_CODE);
        assert_eq!(code.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_global_is_shared() {
        assert!(Arc::ptr_eq(&LoggerConfig::global(), &LoggerConfig::global()));
    }
}
