//! Error types for DBF handling.

use thiserror::Error;

/// Errors that can occur when reading or writing DBF files.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Common library error.
    #[error("{0}")]
    Common(#[from] shpkit_common::Error),

    /// Header values that cannot describe a DBF file.
    #[error("invalid DBF header: {0}")]
    InvalidHeader(String),

    /// A row handed to the writer has the wrong number of values.
    #[error("row {row} has {actual} values, expected {expected}")]
    RowWidth {
        row: usize,
        expected: usize,
        actual: usize,
    },
}

/// Result type for DBF operations.
pub type Result<T> = std::result::Result<T, Error>;
