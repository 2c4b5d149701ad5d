//! Rotating sink with a bare file-name pattern
//!
//! Kept in its own binary: the test changes the process working directory.

use egloo_log::appenders::{RotatingFileAppender, RotationPolicy};
use egloo_log::ManualClock;
use chrono::Utc;
use std::env;
use std::fs;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

#[test]
fn test_zero_retention_never_removes_current_file() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let previous = env::current_dir().expect("Failed to read working directory");
    env::set_current_dir(temp_dir.path()).expect("Failed to enter temp dir");

    let clock = ManualClock::new(Utc::now());
    let appender = RotatingFileAppender::new(
        "app.log.%Y%m%d%H%M",
        RotationPolicy::new()
            .with_max_age(Duration::ZERO)
            .with_clock(Arc::new(clock.clone())),
    )
    .expect("Failed to create appender");
    appender.write_line("first").unwrap();
    let first = appender.current_path();

    clock.advance(Duration::from_secs(3600));
    appender.write_line("second").unwrap();
    appender.flush_file().unwrap();
    let current = appender.current_path();

    assert!(current.is_relative());
    assert!(!first.exists());
    assert_eq!(fs::read_to_string(&current).unwrap(), "second\n");

    env::set_current_dir(previous).expect("Failed to restore working directory");
}
