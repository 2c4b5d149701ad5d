//! Appender trait for log output destinations

use super::{error::Result, log_entry::LogEntry};

pub trait Appender: Send + Sync {
    /// Write one already-framed line for `entry`
    fn append(&mut self, entry: &LogEntry, line: &str) -> Result<()>;
    fn flush(&mut self) -> Result<()>;
    fn name(&self) -> &str;
}
