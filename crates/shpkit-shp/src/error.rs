//! Error types for shapefile geometry handling.

use thiserror::Error;

use crate::shape_type::ShapeType;

/// Errors that can occur when reading or writing `.shp` and `.shx` files.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Common library error.
    #[error("{0}")]
    Common(#[from] shpkit_common::Error),

    /// The file does not start with the shapefile magic number.
    #[error("invalid file code {0}, expected 9994")]
    InvalidFileCode(i32),

    /// The header declares a shape type that cannot be decoded.
    #[error("unsupported shape type {0}")]
    UnsupportedShapeType(i32),

    /// A record carries a shape type other than null or the file's type.
    #[error("record {record}: shape type {actual} does not match file type {expected}")]
    ShapeTypeMismatch {
        record: i32,
        expected: ShapeType,
        actual: i32,
    },

    /// A record whose counts or offsets are inconsistent.
    #[error("record {record}: {reason}")]
    MalformedRecord { record: i32, reason: String },

    /// The writer was handed a geometry its shape type cannot store.
    #[error("cannot write {geometry} as {shape_type}")]
    GeometryMismatch {
        shape_type: ShapeType,
        geometry: &'static str,
    },

    /// An index entry that points outside the main file.
    #[error("invalid index entry {entry}: {reason}")]
    MalformedIndex { entry: usize, reason: String },
}

/// Result type for shapefile operations.
pub type Result<T> = std::result::Result<T, Error>;
