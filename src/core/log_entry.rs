//! Log entry structure

use super::fields::Fields;
use super::log_level::LogLevel;
use super::value::{CallSite, FieldValue};
use chrono::{DateTime, Utc};

/// A single record, with every field already resolved
#[derive(Debug, Clone)]
pub struct LogEntry {
    pub level: LogLevel,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub fields: Vec<(String, FieldValue)>,
    pub call_site: Option<CallSite>,
}

impl LogEntry {
    /// Sanitize log message to prevent log injection attacks
    ///
    /// Replaces newlines, carriage returns, and tabs with escape sequences
    /// to prevent attackers from injecting fake log entries.
    fn sanitize_message(message: &str) -> String {
        message
            .replace('\n', "\\n")
            .replace('\r', "\\r")
            .replace('\t', "\\t")
    }

    pub fn new(level: LogLevel, message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            level,
            message: Self::sanitize_message(&message),
            timestamp: Utc::now(),
            fields: Vec::new(),
            call_site: CallSite::current(),
        }
    }

    /// Resolve `fields` and attach the results
    ///
    /// Deferred values run here, on the calling thread.
    pub fn with_fields(mut self, fields: &Fields) -> Self {
        self.fields = fields.resolve();
        self
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn field(&self, key: &str) -> Option<&FieldValue> {
        self.fields.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }
}
