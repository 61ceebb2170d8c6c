//! Common utilities for shpkit.
//!
//! This crate provides the foundational pieces used across all shpkit crates:
//!
//! - [`BinaryReader`] - Zero-copy, endian-aware reading from byte slices
//! - [`Endian`] - The byte order mode a reader is currently in
//! - [`Error`] - Stream-level errors shared by the format crates

mod error;
mod reader;

pub use error::{Error, Result};
pub use reader::{BinaryReader, Endian};

/// Re-export zerocopy traits for convenience
pub use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

/// Re-export memchr for fast byte searching
pub use memchr;

/// Trim trailing NUL and space bytes from a fixed-width field.
#[inline]
pub fn trim_trailing_padding(bytes: &[u8]) -> &[u8] {
    let end = bytes
        .iter()
        .rposition(|&b| b != 0 && b != b' ')
        .map_or(0, |p| p + 1);
    &bytes[..end]
}

/// Trim NUL and ASCII whitespace from both ends of a fixed-width field.
#[inline]
pub fn trim_padding(bytes: &[u8]) -> &[u8] {
    let is_pad = |b: &u8| *b == 0 || b.is_ascii_whitespace();
    let start = bytes.iter().position(|b| !is_pad(b)).unwrap_or(bytes.len());
    let end = bytes.iter().rposition(|b| !is_pad(b)).map_or(start, |p| p + 1);
    &bytes[start..end]
}
