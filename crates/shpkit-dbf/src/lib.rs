//! dBase (`.dbf`) attribute table support for shapefiles.
//!
//! A shapefile keeps its attributes in a dBase III table next to the `.shp`.
//! This crate reads (and writes) those tables and decodes each column into a
//! typed [`Value`].
//!
//! # File Format
//!
//! - 32 bytes: header (version, last update, record count, header and
//!   record lengths, all little-endian)
//! - N x 32 bytes: field descriptors (name, type tag, length, decimals)
//! - 1 byte: `0x0D` terminator
//! - Records: one deletion flag byte (`*` when deleted) followed by the
//!   fixed-width columns in descriptor order
//! - 1 byte: optional `0x1A` end marker
//!
//! The field count is derived from the header length; text is decoded with
//! the charset named by the `.cpg` sidecar (see [`codepage`]).
//!
//! # Example
//!
//! ```no_run
//! use shpkit_dbf::{Charset, DbfTable};
//!
//! let data = std::fs::read("cities.dbf")?;
//! let charset = Charset::from_cpg_bytes(&std::fs::read("cities.cpg")?);
//! let table = DbfTable::read(&data, &charset)?;
//!
//! for field in &table.fields {
//!     println!("{} {} ({})", field.name, field.field_type, field.attribute_type());
//! }
//! println!("{} rows", table.len());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod error;
mod file;
mod types;
mod value;

pub mod codepage;
pub mod decoder;
pub mod field;
pub mod header;
pub mod writer;

pub use codepage::Charset;
pub use decoder::DbfDecoder;
pub use error::{Error, Result};
pub use field::{FieldDefinition, FieldType};
pub use file::{DbfReader, DbfRow, DbfTable};
pub use header::DbfHeader;
pub use types::AttributeType;
pub use value::Value;
pub use writer::DbfWriter;
