//! In-memory capture destination
//!
//! Keeps every framed line in a shared buffer. Clones share the buffer, so a test can hand
//! one clone to a logger and read the lines back through another.

use crate::core::{Appender, LogEntry, LogLevel, Result};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
pub struct MemoryAppender {
    lines: Arc<Mutex<Vec<String>>>,
    levels: Arc<Mutex<Vec<LogLevel>>>,
    flushes: Arc<AtomicUsize>,
}

impl MemoryAppender {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of every captured line, oldest first
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().clone()
    }

    /// Take every captured line, leaving the buffer empty
    pub fn drain_lines(&self) -> Vec<String> {
        self.levels.lock().clear();
        std::mem::take(&mut *self.lines.lock())
    }

    /// Level of each captured line, in the same order as [`lines`](Self::lines)
    pub fn levels(&self) -> Vec<LogLevel> {
        self.levels.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lines.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.lock().is_empty()
    }

    pub fn flush_count(&self) -> usize {
        self.flushes.load(Ordering::Acquire)
    }
}

impl Appender for MemoryAppender {
    fn append(&mut self, entry: &LogEntry, line: &str) -> Result<()> {
        let mut lines = self.lines.lock();
        self.levels.lock().push(entry.level);
        lines.push(line.to_string());
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.flushes.fetch_add(1, Ordering::AcqRel);
        Ok(())
    }

    fn name(&self) -> &str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_buffer() {
        let reader = MemoryAppender::new();
        let mut writer = reader.clone();

        writer
            .append(&LogEntry::new(LogLevel::Warn, "w"), "line one")
            .unwrap();
        writer.flush().unwrap();

        assert_eq!(reader.lines(), vec!["line one".to_string()]);
        assert_eq!(reader.levels(), vec![LogLevel::Warn]);
        assert_eq!(reader.flush_count(), 1);
    }

    #[test]
    fn test_drain_empties_buffer() {
        let mut appender = MemoryAppender::new();
        appender
            .append(&LogEntry::new(LogLevel::Info, "i"), "x")
            .unwrap();

        assert_eq!(appender.drain_lines().len(), 1);
        assert!(appender.is_empty());
        assert!(appender.levels().is_empty());
    }
}
