//! ESRI shapefile geometry (`.shp`) and index (`.shx`) support.
//!
//! # File Format
//!
//! - 100 bytes: main header (file code and length big-endian; version,
//!   shape type and extents little-endian)
//! - Records: an 8-byte big-endian header (record number, content length in
//!   16-bit words) followed by little-endian content starting with the
//!   record's shape type code
//!
//! The `.shx` index repeats the header and lists the offset and length of
//! every record, which lets readers seek instead of scanning.
//!
//! Decoded shapes are returned as [`Geometry`] values. PolyLines with one
//! part become line strings and polygon rings are grouped into polygons by
//! their winding order. M values are read for alignment and dropped.

mod error;

pub mod geometry;
pub mod header;
pub mod index;
pub mod reader;
pub mod record;
pub mod shape_type;
pub mod writer;

pub use error::{Error, Result};
pub use geometry::{BoundingBox, Coordinate, Geometry, Polygon};
pub use header::ShpHeader;
pub use index::{ShapeIndex, ShapeIndexEntry};
pub use reader::ShapefileReader;
pub use record::RecordHeader;
pub use shape_type::{ShapeFamily, ShapeType};
pub use writer::ShapefileWriter;
