//! Output framing for log entries
//!
//! - Json: one JSON object per line (default)
//! - Text: human-readable line for terminals

use super::log_entry::LogEntry;
use super::timestamp::TimestampFormat;

/// Keys owned by the record envelope
pub const TIME_KEY: &str = "time";
pub const LEVEL_KEY: &str = "level";
pub const MESSAGE_KEY: &str = "msg";

/// Output format for log entries
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// JSON format for machine processing
    ///
    /// Example: `{"time":"2025-01-08T10:30:45Z","level":"info","msg":"Request processed","user":"alice"}`
    #[default]
    Json,

    /// Human-readable text format
    ///
    /// Example: `[2025-01-08T10:30:45Z] [INFO ] Request processed user=alice`
    Text,
}

impl OutputFormat {
    /// Format a log entry according to this output format
    pub fn format(&self, entry: &LogEntry, timestamp_format: &TimestampFormat) -> String {
        match self {
            OutputFormat::Json => self.format_json(entry, timestamp_format),
            OutputFormat::Text => self.format_text(entry, timestamp_format),
        }
    }

    fn format_text(&self, entry: &LogEntry, timestamp_format: &TimestampFormat) -> String {
        let mut line = format!(
            "[{}] [{:5}] {}",
            timestamp_format.format(&entry.timestamp),
            entry.level.to_str(),
            entry.message
        );

        for (key, value) in &entry.fields {
            line.push(' ');
            line.push_str(key);
            line.push('=');
            line.push_str(&value.to_string());
        }

        line
    }

    fn format_json(&self, entry: &LogEntry, timestamp_format: &TimestampFormat) -> String {
        let mut json_obj = serde_json::Map::new();

        json_obj.insert(
            TIME_KEY.to_string(),
            timestamp_format.to_json_value(&entry.timestamp),
        );
        json_obj.insert(
            LEVEL_KEY.to_string(),
            serde_json::Value::String(entry.level.as_json_str().to_string()),
        );
        json_obj.insert(
            MESSAGE_KEY.to_string(),
            serde_json::Value::String(entry.message.clone()),
        );

        for (key, value) in &entry.fields {
            json_obj.insert(Self::field_key(key), value.to_json_value());
        }

        serde_json::to_string(&serde_json::Value::Object(json_obj)).unwrap_or_default()
    }

    /// User fields never overwrite the envelope; clashing keys move under `fields.`
    fn field_key(key: &str) -> String {
        match key {
            TIME_KEY | LEVEL_KEY | MESSAGE_KEY => format!("fields.{}", key),
            _ => key.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::fields::Fields;
    use crate::core::log_level::LogLevel;

    #[test]
    fn test_json_format() {
        let entry = LogEntry::new(LogLevel::Info, "Request processed")
            .with_fields(&Fields::new().with("user", "alice").with("status", 200));
        let output = OutputFormat::Json.format(&entry, &TimestampFormat::Rfc3339);

        let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed["level"], "info");
        assert_eq!(parsed["msg"], "Request processed");
        assert_eq!(parsed["user"], "alice");
        assert_eq!(parsed["status"], 200);
        assert!(parsed["time"].is_string());
    }

    #[test]
    fn test_json_envelope_keys_are_protected() {
        let entry = LogEntry::new(LogLevel::Error, "real message")
            .with_fields(&Fields::new().with("msg", "spoofed").with("level", "debug"));
        let output = OutputFormat::Json.format(&entry, &TimestampFormat::Rfc3339);

        let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed["msg"], "real message");
        assert_eq!(parsed["level"], "error");
        assert_eq!(parsed["fields.msg"], "spoofed");
        assert_eq!(parsed["fields.level"], "debug");
    }

    #[test]
    fn test_json_single_line() {
        let entry = LogEntry::new(LogLevel::Warn, "a\nb");
        let output = OutputFormat::Json.format(&entry, &TimestampFormat::Rfc3339);
        assert_eq!(output.lines().count(), 1);
    }

    #[test]
    fn test_text_format() {
        let entry = LogEntry::new(LogLevel::Warn, "Disk almost full")
            .with_fields(&Fields::new().with("percent", 91));
        let output = OutputFormat::Text.format(&entry, &TimestampFormat::Rfc3339);

        assert!(output.contains("[WARN ]"));
        assert!(output.ends_with("Disk almost full percent=91"));
    }

    #[test]
    fn test_output_format_default() {
        assert_eq!(OutputFormat::default(), OutputFormat::Json);
    }
}
