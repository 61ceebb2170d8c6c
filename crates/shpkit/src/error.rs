//! Error types for bundle loading.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur when loading a shapefile bundle.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Common library error.
    #[error("{0}")]
    Common(#[from] shpkit_common::Error),

    /// Attribute table error.
    #[error("DBF: {0}")]
    Dbf(#[from] shpkit_dbf::Error),

    /// Geometry file error.
    #[error("SHP: {0}")]
    Shp(#[from] shpkit_shp::Error),

    /// ZIP archive error.
    #[cfg(feature = "zip")]
    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// A required file of the bundle is absent.
    #[error("{bundle}: missing .{extension} member")]
    MissingMember { bundle: String, extension: String },

    /// The path is neither a `.shp` nor a supported archive.
    #[error("unsupported bundle path: {}", .0.display())]
    UnsupportedPath(PathBuf),

    /// A feature does not fit its schema.
    #[error("schema violation: {0}")]
    Schema(String),
}

/// Result type for bundle operations.
pub type Result<T> = std::result::Result<T, Error>;
