//! Appender implementations

pub mod console;
pub mod memory;
pub mod rotating_file;

pub use console::ConsoleAppender;
pub use memory::MemoryAppender;
pub use rotating_file::{
    RotatingFileAppender, RotationPolicy, DEFAULT_MAX_AGE, DEFAULT_ROTATION_INTERVAL,
};

pub use crate::core::Appender;
