//! Error types for shpkit-common.

use thiserror::Error;

/// Common error type for shpkit stream operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Fewer bytes remain in the stream than a read demands.
    #[error("truncated stream: needed {needed} bytes but only {available} available")]
    Truncated { needed: usize, available: usize },

    /// Value did not match expected.
    #[error("expected value {expected}, got {actual}")]
    ExpectedValue { expected: String, actual: String },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias using the common Error type.
pub type Result<T> = std::result::Result<T, Error>;
