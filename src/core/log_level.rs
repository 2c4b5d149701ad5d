//! Log level definitions

use crate::util::bitwise::{clear_bit, has_bit, set_bit};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[derive(Default)]
pub enum LogLevel {
    Trace = 0,
    Debug = 1,
    #[default]
    Info = 2,
    Warn = 3,
    Error = 4,
    Fatal = 5,
}

impl LogLevel {
    pub const ALL: [LogLevel; 6] = [
        LogLevel::Trace,
        LogLevel::Debug,
        LogLevel::Info,
        LogLevel::Warn,
        LogLevel::Error,
        LogLevel::Fatal,
    ];

    pub fn to_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "TRACE",
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
            LogLevel::Fatal => "FATAL",
        }
    }

    /// Lowercase name used in the `level` key of JSON records
    pub fn as_json_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warning",
            LogLevel::Error => "error",
            LogLevel::Fatal => "fatal",
        }
    }

    pub(crate) fn from_u8(value: u8) -> Self {
        match value {
            0 => LogLevel::Trace,
            1 => LogLevel::Debug,
            2 => LogLevel::Info,
            3 => LogLevel::Warn,
            4 => LogLevel::Error,
            _ => LogLevel::Fatal,
        }
    }

    #[cfg(feature = "console")]
    pub fn color_code(&self) -> colored::Color {
        use colored::Color::*;
        match self {
            LogLevel::Trace => BrightBlack,
            LogLevel::Debug => Blue,
            LogLevel::Info => Green,
            LogLevel::Warn => Yellow,
            LogLevel::Error => Red,
            LogLevel::Fatal => BrightRed,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_str())
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "TRACE" => Ok(LogLevel::Trace),
            "DEBUG" => Ok(LogLevel::Debug),
            "INFO" => Ok(LogLevel::Info),
            "WARN" | "WARNING" => Ok(LogLevel::Warn),
            "ERROR" => Ok(LogLevel::Error),
            "FATAL" => Ok(LogLevel::Fatal),
            _ => Err(format!("Invalid log level: '{}'", s)),
        }
    }
}

/// Set of levels a destination accepts, one bit per level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LevelMask(u8);

impl LevelMask {
    /// Accepts nothing
    pub const fn none() -> Self {
        LevelMask(0)
    }

    /// Accepts every level
    pub fn all() -> Self {
        Self::of(&LogLevel::ALL)
    }

    pub fn of(levels: &[LogLevel]) -> Self {
        levels.iter().fold(Self::none(), |mask, level| mask.with(*level))
    }

    /// Accepts `level` and everything more severe
    pub fn at_least(level: LogLevel) -> Self {
        LogLevel::ALL
            .iter()
            .filter(|l| **l >= level)
            .fold(Self::none(), |mask, l| mask.with(*l))
    }

    #[must_use]
    pub fn with(self, level: LogLevel) -> Self {
        LevelMask(set_bit(self.0, level as u8))
    }

    #[must_use]
    pub fn without(self, level: LogLevel) -> Self {
        LevelMask(clear_bit(self.0, level as u8))
    }

    pub fn contains(&self, level: LogLevel) -> bool {
        has_bit(self.0, level as u8)
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }
}
