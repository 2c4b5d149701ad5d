//! Default output: the process's standard error stream

use crate::core::{Appender, LogEntry, Result, TimestampFormat};
#[cfg(feature = "console")]
use colored::Colorize;
use std::io::Write;

/// Writes each line to stderr
///
/// By default the line framed by the logger is written as is (JSON unless configured
/// otherwise). With colors enabled, a human-readable, level-colored line is rendered
/// instead, which is handy during local development.
pub struct ConsoleAppender {
    use_colors: bool,
    timestamp_format: TimestampFormat,
}

impl ConsoleAppender {
    pub fn new() -> Self {
        Self {
            use_colors: false,
            timestamp_format: TimestampFormat::default(),
        }
    }

    pub fn with_colors(use_colors: bool) -> Self {
        Self {
            use_colors,
            timestamp_format: TimestampFormat::default(),
        }
    }

    /// Timestamp format used by the colored rendering
    ///
    /// # Examples
    ///
    /// ```
    /// use egloo_log::appenders::ConsoleAppender;
    /// use egloo_log::TimestampFormat;
    ///
    /// let appender = ConsoleAppender::with_colors(true)
    ///     .with_timestamp_format(TimestampFormat::Iso8601);
    /// ```
    #[must_use]
    pub fn with_timestamp_format(mut self, format: TimestampFormat) -> Self {
        self.timestamp_format = format;
        self
    }

    pub fn uses_colors(&self) -> bool {
        self.use_colors
    }

    #[cfg(feature = "console")]
    fn format_colored(&self, entry: &LogEntry) -> String {
        let level_str = format!("{:5}", entry.level.to_str())
            .color(entry.level.color_code())
            .to_string();

        let mut line = format!(
            "[{}] [{}] {}",
            self.timestamp_format.format(&entry.timestamp),
            level_str,
            entry.message
        );
        for (key, value) in &entry.fields {
            line.push_str(&format!(" {}={}", key.as_str().dimmed(), value));
        }
        line
    }

    #[cfg(not(feature = "console"))]
    fn format_colored(&self, _entry: &LogEntry) -> String {
        String::new()
    }

    fn render(&self, entry: &LogEntry, line: &str) -> String {
        if self.use_colors && cfg!(feature = "console") {
            self.format_colored(entry)
        } else {
            line.to_string()
        }
    }
}

impl Default for ConsoleAppender {
    fn default() -> Self {
        Self::new()
    }
}

impl Appender for ConsoleAppender {
    fn append(&mut self, entry: &LogEntry, line: &str) -> Result<()> {
        let output = self.render(entry, line);
        let mut stderr = std::io::stderr().lock();
        writeln!(stderr, "{}", output)?;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        std::io::stderr().flush()?;
        Ok(())
    }

    fn name(&self) -> &str {
        "console"
    }
}
