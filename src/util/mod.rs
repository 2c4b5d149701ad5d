//! Small stateless helpers that sit beside the logger

pub mod bitwise;
pub mod env;

pub use bitwise::{clear_bit, has_bit, set_bit};
pub use env::{get_env, require_env, try_require_env};
