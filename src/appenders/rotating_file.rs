//! Time-rotated file appender
//!
//! Files are named by formatting a strftime pattern at the start of the current rotation
//! bucket, e.g. `/var/log/auth.log.%Y%m%d%H%M` becomes `/var/log/auth.log.202501081000`.
//! A stable link always points at the file being written, and files older than the
//! retention window are purged whenever a new bucket starts. Rotation is checked on write;
//! there is no background timer.

use crate::core::appender::Appender;
use crate::core::clock::{Clock, SystemClock};
use crate::core::error::{LoggerError, Result};
use crate::core::log_entry::LogEntry;
use chrono::format::{Item, Parsed, StrftimeItems};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::fs::{self, File, OpenOptions};
use std::io::{LineWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

pub const DEFAULT_ROTATION_INTERVAL: Duration = Duration::from_secs(60 * 60);
pub const DEFAULT_MAX_AGE: Duration = Duration::from_secs(24 * 60 * 60);

/// When to start a new file, how long to keep old ones, and where the stable link lives
///
/// # Examples
///
/// ```
/// use egloo_log::appenders::RotationPolicy;
/// use std::time::Duration;
///
/// let policy = RotationPolicy::new()
///     .with_interval(Duration::from_secs(15 * 60))
///     .with_max_age(Duration::from_secs(6 * 60 * 60))
///     .with_link_name("/var/log/auth.log");
/// assert_eq!(policy.interval(), Duration::from_secs(900));
/// ```
#[derive(Debug, Clone)]
pub struct RotationPolicy {
    interval: Duration,
    max_age: Duration,
    link_name: Option<PathBuf>,
    clock: Arc<dyn Clock>,
}

impl Default for RotationPolicy {
    fn default() -> Self {
        Self {
            interval: DEFAULT_ROTATION_INTERVAL,
            max_age: DEFAULT_MAX_AGE,
            link_name: None,
            clock: Arc::new(SystemClock),
        }
    }
}

impl RotationPolicy {
    /// Hourly rotation, 24 hour retention, no link, system clock
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_max_age(mut self, max_age: Duration) -> Self {
        self.max_age = max_age;
        self
    }

    /// Maintain a link at `path` pointing at the current file
    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_link_name(mut self, path: impl Into<PathBuf>) -> Self {
        self.link_name = Some(path.into());
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn max_age(&self) -> Duration {
        self.max_age
    }

    pub fn link_name(&self) -> Option<&Path> {
        self.link_name.as_deref()
    }

    /// Start of the bucket containing `now`, aligned to the Unix epoch
    pub fn bucket_start(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let width = self.interval.as_secs().max(1) as i64;
        let start = now.timestamp().div_euclid(width) * width;
        DateTime::<Utc>::from_timestamp(start, 0).unwrap_or(now)
    }

    fn validate(&self) -> Result<()> {
        if self.interval.as_secs() == 0 {
            return Err(LoggerError::config(
                "RotationPolicy",
                "rotation interval must be at least one second",
            ));
        }
        Ok(())
    }
}

struct RotationState {
    pattern: String,
    dir: PathBuf,
    file_pattern: String,
    policy: RotationPolicy,
    current_path: PathBuf,
    writer: Option<LineWriter<File>>,
}

/// Rotating file appender
///
/// Clones share the same file and state, so a host can keep a handle after moving one
/// into a logger.
///
/// # Examples
///
/// ```no_run
/// use egloo_log::appenders::{RotatingFileAppender, RotationPolicy};
///
/// let appender = RotatingFileAppender::new(
///     "/var/log/auth.log.%Y%m%d%H%M",
///     RotationPolicy::new().with_link_name("/var/log/auth.log"),
/// )?;
/// appender.write_line(r#"{"level":"info","msg":"started"}"#)?;
/// # Ok::<(), egloo_log::LoggerError>(())
/// ```
#[derive(Clone)]
pub struct RotatingFileAppender {
    state: Arc<Mutex<RotationState>>,
}

impl RotatingFileAppender {
    /// Create the appender and open the file for the current bucket
    ///
    /// # Errors
    ///
    /// Returns an error if the pattern has no time token, the interval is zero, or the
    /// directory, file or link cannot be created.
    pub fn new(pattern: impl Into<String>, policy: RotationPolicy) -> Result<Self> {
        let pattern = pattern.into();
        policy.validate()?;
        let (dir, file_pattern) = split_pattern(&pattern)?;

        fs::create_dir_all(&dir).map_err(|e| {
            LoggerError::io_operation(
                "create log directory",
                format!("Failed to create directory '{}'", dir.display()),
                e,
            )
        })?;

        let now = policy.clock.now();
        let current_path = PathBuf::from(policy.bucket_start(now).format(&pattern).to_string());
        let writer = open_append(&current_path)?;

        let state = RotationState {
            pattern,
            dir,
            file_pattern,
            policy,
            current_path,
            writer: Some(writer),
        };
        state.repoint_link()?;
        state.purge(now)?;

        Ok(Self {
            state: Arc::new(Mutex::new(state)),
        })
    }

    /// Hourly rotation with 24 hour retention
    pub fn with_defaults(pattern: impl Into<String>) -> Result<Self> {
        Self::new(pattern, RotationPolicy::default())
    }

    /// Write one line, rotating first if the clock has entered a new bucket
    pub fn write_line(&self, line: &str) -> Result<()> {
        let mut state = self.state.lock();
        state.rotate_if_needed();

        let path = state.current_path.display().to_string();
        let writer = state
            .writer
            .as_mut()
            .ok_or_else(|| LoggerError::writer("Writer not initialized"))?;
        writer
            .write_all(line.as_bytes())
            .and_then(|_| writer.write_all(b"\n"))
            .map_err(|e| {
                LoggerError::file_rotation(path, format!("Failed to write log entry: {}", e))
            })
    }

    pub fn flush_file(&self) -> Result<()> {
        let mut state = self.state.lock();
        if let Some(writer) = state.writer.as_mut() {
            writer.flush()?;
        }
        Ok(())
    }

    /// Path of the file currently being written
    pub fn current_path(&self) -> PathBuf {
        self.state.lock().current_path.clone()
    }

    pub fn link_path(&self) -> Option<PathBuf> {
        self.state.lock().policy.link_name.clone()
    }

    pub fn pattern(&self) -> String {
        self.state.lock().pattern.clone()
    }
}

impl RotationState {
    fn rotate_if_needed(&mut self) {
        let now = self.policy.clock.now();
        let next_path = PathBuf::from(
            self.policy
                .bucket_start(now)
                .format(&self.pattern)
                .to_string(),
        );
        if next_path == self.current_path && self.writer.is_some() {
            return;
        }

        if let Some(mut writer) = self.writer.take() {
            if let Err(e) = writer.flush() {
                eprintln!(
                    "[LOGGER WARNING] Failed to flush {} before rotation: {}",
                    self.current_path.display(),
                    e
                );
            }
        }

        match open_append(&next_path) {
            Ok(writer) => {
                self.writer = Some(writer);
                self.current_path = next_path;
            }
            Err(e) => {
                eprintln!(
                    "[LOGGER WARNING] Log rotation failed: {}. Continuing with current file.",
                    e
                );
                match open_append(&self.current_path) {
                    Ok(writer) => self.writer = Some(writer),
                    Err(reopen_err) => eprintln!(
                        "[LOGGER ERROR] Failed to reopen log file after rotation failure: {}",
                        reopen_err
                    ),
                }
                return;
            }
        }

        if let Err(e) = self.repoint_link() {
            eprintln!("[LOGGER ERROR] {}", e);
        }
        if let Err(e) = self.purge(now) {
            eprintln!("[LOGGER ERROR] {}", e);
        }
    }

    #[cfg(unix)]
    fn repoint_link(&self) -> Result<()> {
        let Some(link) = self.policy.link_name.as_deref() else {
            return Ok(());
        };

        // Same directory: store a relative target so the directory can be moved
        let target = match (self.current_path.parent(), link.parent()) {
            (Some(a), Some(b)) if a == b => self
                .current_path
                .file_name()
                .map(PathBuf::from)
                .unwrap_or_else(|| self.current_path.clone()),
            _ => self.current_path.clone(),
        };

        let mut tmp = link.as_os_str().to_owned();
        tmp.push(".symlink");
        let tmp = PathBuf::from(tmp);

        let link_error = |message: String| {
            LoggerError::file_rotation(link.display().to_string(), message)
        };

        if let Some(parent) = link.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| link_error(format!("Failed to create link directory: {}", e)))?;
        }
        if fs::symlink_metadata(&tmp).is_ok() {
            fs::remove_file(&tmp)
                .map_err(|e| link_error(format!("Failed to remove stale temp link: {}", e)))?;
        }
        std::os::unix::fs::symlink(&target, &tmp)
            .map_err(|e| link_error(format!("Failed to create link: {}", e)))?;
        fs::rename(&tmp, link).map_err(|e| {
            let _ = fs::remove_file(&tmp);
            link_error(format!("Failed to repoint link: {}", e))
        })
    }

    #[cfg(not(unix))]
    fn repoint_link(&self) -> Result<()> {
        Ok(())
    }

    /// Remove pattern-matching files last modified before `now - max_age`
    ///
    /// A retention reaching past the representable time range keeps everything.
    fn purge(&self, now: DateTime<Utc>) -> Result<()> {
        let Some(cutoff) = chrono::Duration::from_std(self.policy.max_age)
            .ok()
            .and_then(|max_age| now.checked_sub_signed(max_age))
        else {
            return Ok(());
        };

        let entries = fs::read_dir(&self.dir).map_err(|e| {
            LoggerError::io_operation(
                "purge old log files",
                format!("Failed to read directory '{}'", self.dir.display()),
                e,
            )
        })?;

        // Entries come back joined onto `dir`, which is "." for a bare pattern
        let current_name = self.current_path.file_name();
        for entry in entries.flatten() {
            let path = entry.path();
            if path.file_name() == current_name || Some(path.as_path()) == self.policy.link_name() {
                continue;
            }
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if !matches_pattern(name, &self.file_pattern) {
                continue;
            }

            let Ok(metadata) = fs::symlink_metadata(&path) else {
                continue;
            };
            if !metadata.file_type().is_file() {
                continue;
            }
            let modified: DateTime<Utc> = metadata
                .modified()
                .unwrap_or_else(|_| SystemTime::now())
                .into();
            if modified >= cutoff {
                continue;
            }

            if let Err(e) = fs::remove_file(&path) {
                eprintln!(
                    "[LOGGER WARNING] Failed to remove expired log file {}: {}",
                    path.display(),
                    e
                );
            }
        }
        Ok(())
    }
}

impl Appender for RotatingFileAppender {
    fn name(&self) -> &str {
        "RotatingFileAppender"
    }

    fn append(&mut self, _entry: &LogEntry, line: &str) -> Result<()> {
        self.write_line(line)
    }

    fn flush(&mut self) -> Result<()> {
        self.flush_file()
    }
}

impl std::fmt::Debug for RotatingFileAppender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("RotatingFileAppender")
            .field("pattern", &state.pattern)
            .field("current_path", &state.current_path)
            .field("policy", &state.policy)
            .finish()
    }
}

impl Drop for RotationState {
    fn drop(&mut self) {
        if let Some(mut writer) = self.writer.take() {
            let _ = writer.flush();
        }
    }
}

fn open_append(path: &Path) -> Result<LineWriter<File>> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map(LineWriter::new)
        .map_err(|e| {
            LoggerError::file_rotation(
                path.display().to_string(),
                format!("Failed to open: {}", e),
            )
        })
}

/// Split a pattern into its directory and the file-name pattern purge matches against
///
/// Time tokens are only allowed in the file name, and there must be at least one.
fn split_pattern(pattern: &str) -> Result<(PathBuf, String)> {
    let path = Path::new(pattern);
    let file_pattern = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| LoggerError::invalid_pattern(pattern, "pattern has no file name"))?
        .to_string();
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };

    if dir.to_string_lossy().contains('%') {
        return Err(LoggerError::invalid_pattern(
            pattern,
            "time tokens are only supported in the file name",
        ));
    }

    let items: Vec<Item<'_>> = StrftimeItems::new(&file_pattern).collect();
    if items.iter().any(|item| matches!(item, Item::Error)) {
        return Err(LoggerError::invalid_pattern(
            pattern,
            "pattern contains an invalid time token",
        ));
    }
    if !items
        .iter()
        .any(|item| matches!(item, Item::Numeric(..) | Item::Fixed(..)))
    {
        return Err(LoggerError::invalid_pattern(
            pattern,
            "pattern must contain a time token such as %Y%m%d%H%M",
        ));
    }

    Ok((dir, file_pattern))
}

fn matches_pattern(name: &str, file_pattern: &str) -> bool {
    let mut parsed = Parsed::new();
    chrono::format::parse(&mut parsed, name, StrftimeItems::new(file_pattern)).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::clock::ManualClock;
    use chrono::TimeZone;
    use tempfile::tempdir;

    fn at(h: u32, m: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 8, h, m, s).single().unwrap()
    }

    #[test]
    fn test_bucket_start_alignment() {
        let policy = RotationPolicy::new();
        assert_eq!(policy.bucket_start(at(10, 59, 59)), at(10, 0, 0));
        assert_eq!(policy.bucket_start(at(11, 0, 0)), at(11, 0, 0));

        let quarter = RotationPolicy::new().with_interval(Duration::from_secs(900));
        assert_eq!(quarter.bucket_start(at(10, 44, 12)), at(10, 30, 0));
    }

    #[test]
    fn test_pattern_validation() {
        assert!(matches!(
            split_pattern("/tmp/app.log"),
            Err(LoggerError::InvalidPattern { .. })
        ));
        assert!(matches!(
            split_pattern("/tmp/%Y/app.log.%H"),
            Err(LoggerError::InvalidPattern { .. })
        ));
        let (dir, file) = split_pattern("/tmp/logs/app.log.%Y%m%d%H%M").unwrap();
        assert_eq!(dir, PathBuf::from("/tmp/logs"));
        assert_eq!(file, "app.log.%Y%m%d%H%M");
    }

    #[test]
    fn test_zero_interval_rejected() {
        let dir = tempdir().unwrap();
        let pattern = dir.path().join("app.log.%Y%m%d%H%M");
        let policy = RotationPolicy::new().with_interval(Duration::ZERO);
        let result = RotatingFileAppender::new(pattern.to_string_lossy(), policy);
        assert!(matches!(
            result,
            Err(LoggerError::InvalidConfiguration { .. })
        ));
    }

    #[test]
    fn test_matches_pattern() {
        assert!(matches_pattern("app.log.202501081000", "app.log.%Y%m%d%H%M"));
        assert!(!matches_pattern("app.log", "app.log.%Y%m%d%H%M"));
        assert!(!matches_pattern("app.log.202501081000.bak", "app.log.%Y%m%d%H%M"));
        assert!(!matches_pattern("other.log.202501081000", "app.log.%Y%m%d%H%M"));
    }

    #[test]
    fn test_creation_opens_current_bucket_file() {
        let dir = tempdir().unwrap();
        let pattern = dir.path().join("nested/app.log.%Y%m%d%H%M");
        let clock = ManualClock::new(at(10, 17, 3));
        let appender = RotatingFileAppender::new(
            pattern.to_string_lossy(),
            RotationPolicy::new().with_clock(Arc::new(clock)),
        )
        .unwrap();

        let expected = dir.path().join("nested/app.log.202501081000");
        assert_eq!(appender.current_path(), expected);
        assert!(expected.exists());
    }

    #[test]
    fn test_writes_within_bucket_share_file() {
        let dir = tempdir().unwrap();
        let pattern = dir.path().join("app.log.%Y%m%d%H%M");
        let clock = ManualClock::new(at(10, 0, 0));
        let appender = RotatingFileAppender::new(
            pattern.to_string_lossy(),
            RotationPolicy::new().with_clock(Arc::new(clock.clone())),
        )
        .unwrap();

        appender.write_line("first").unwrap();
        clock.set(at(10, 59, 59));
        appender.write_line("second").unwrap();
        appender.flush_file().unwrap();

        let content = fs::read_to_string(appender.current_path()).unwrap();
        assert_eq!(content, "first\nsecond\n");
    }

    #[test]
    fn test_rotation_opens_new_file() {
        let dir = tempdir().unwrap();
        let pattern = dir.path().join("app.log.%Y%m%d%H%M");
        let clock = ManualClock::new(at(10, 30, 0));
        let appender = RotatingFileAppender::new(
            pattern.to_string_lossy(),
            RotationPolicy::new().with_clock(Arc::new(clock.clone())),
        )
        .unwrap();

        appender.write_line("before").unwrap();
        let first = appender.current_path();
        clock.advance(Duration::from_secs(3600));
        appender.write_line("after").unwrap();
        let second = appender.current_path();

        assert_ne!(first, second);
        assert_eq!(fs::read_to_string(&first).unwrap(), "before\n");
        assert_eq!(fs::read_to_string(&second).unwrap(), "after\n");
    }

    #[cfg(unix)]
    #[test]
    fn test_link_follows_current_file() {
        let dir = tempdir().unwrap();
        let pattern = dir.path().join("app.log.%Y%m%d%H%M");
        let link = dir.path().join("app.log");
        let clock = ManualClock::new(at(10, 0, 0));
        let appender = RotatingFileAppender::new(
            pattern.to_string_lossy(),
            RotationPolicy::new()
                .with_link_name(&link)
                .with_clock(Arc::new(clock.clone())),
        )
        .unwrap();

        assert_eq!(fs::canonicalize(&link).unwrap(), fs::canonicalize(appender.current_path()).unwrap());

        clock.advance(Duration::from_secs(3600));
        appender.write_line("rotated").unwrap();
        assert_eq!(fs::canonicalize(&link).unwrap(), fs::canonicalize(appender.current_path()).unwrap());
        assert_eq!(fs::read_to_string(&link).unwrap(), "rotated\n");
    }

    #[test]
    fn test_purge_removes_expired_files_only() {
        let dir = tempdir().unwrap();
        let pattern = dir.path().join("app.log.%Y%m%d%H%M");
        let unrelated = dir.path().join("keep-me.txt");
        fs::write(&unrelated, "x").unwrap();

        // Real mtimes are close to Utc::now(), so simulated time starts there
        let clock = ManualClock::new(Utc::now());
        let appender = RotatingFileAppender::new(
            pattern.to_string_lossy(),
            RotationPolicy::new().with_clock(Arc::new(clock.clone())),
        )
        .unwrap();
        appender.write_line("old").unwrap();
        let old = appender.current_path();

        clock.advance(DEFAULT_MAX_AGE + DEFAULT_ROTATION_INTERVAL + Duration::from_secs(60));
        appender.write_line("new").unwrap();

        assert!(!old.exists());
        assert!(appender.current_path().exists());
        assert!(unrelated.exists());
    }

    #[test]
    fn test_unbounded_max_age_keeps_old_files() {
        let dir = tempdir().unwrap();
        let pattern = dir.path().join("app.log.%Y%m%d%H%M");
        let clock = ManualClock::new(Utc::now());
        let appender = RotatingFileAppender::new(
            pattern.to_string_lossy(),
            RotationPolicy::new()
                .with_max_age(Duration::MAX)
                .with_clock(Arc::new(clock.clone())),
        )
        .unwrap();
        appender.write_line("old").unwrap();
        let old = appender.current_path();

        clock.advance(Duration::from_secs(3600));
        appender.write_line("new").unwrap();

        assert_ne!(old, appender.current_path());
        assert_eq!(fs::read_to_string(&old).unwrap(), "old\n");
    }

    #[test]
    fn test_max_age_beyond_time_range_keeps_old_files() {
        let dir = tempdir().unwrap();
        let pattern = dir.path().join("app.log.%Y%m%d%H%M");
        let clock = ManualClock::new(Utc::now());
        let four_hundred_millennia = Duration::from_secs(400_000 * 365 * 24 * 3600);

        let appender = RotatingFileAppender::new(
            pattern.to_string_lossy(),
            RotationPolicy::new()
                .with_max_age(four_hundred_millennia)
                .with_clock(Arc::new(clock.clone())),
        )
        .unwrap();
        appender.write_line("old").unwrap();
        let old = appender.current_path();

        clock.advance(DEFAULT_MAX_AGE * 2);
        appender.write_line("new").unwrap();

        assert!(old.exists());
        assert!(appender.current_path().exists());
    }
}
