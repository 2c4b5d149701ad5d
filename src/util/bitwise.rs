//! Single-byte bit manipulation
//!
//! Positions are zero-based and must be in `0..=7`.

/// Number of addressable bits in a byte
pub const BITS: u8 = 8;

#[inline]
fn mask(pos: u8) -> u8 {
    assert!(pos < BITS, "Bit position must be between 0 and 7, got {}", pos);
    1 << pos
}

/// Sets the bit at `pos` in `n`.
///
/// # Panics
///
/// Panics if `pos` is greater than 7
#[inline]
#[must_use]
pub fn set_bit(n: u8, pos: u8) -> u8 {
    n | mask(pos)
}

/// Clears the bit at `pos` in `n`.
///
/// # Panics
///
/// Panics if `pos` is greater than 7
#[inline]
#[must_use]
pub fn clear_bit(n: u8, pos: u8) -> u8 {
    n & !mask(pos)
}

/// Checks if the bit at `pos` in `n` is set.
///
/// # Panics
///
/// Panics if `pos` is greater than 7
#[inline]
#[must_use]
pub fn has_bit(n: u8, pos: u8) -> bool {
    n & mask(pos) != 0
}
