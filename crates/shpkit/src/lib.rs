//! shpkit - ESRI shapefile bundle reader.
//!
//! Loads a shapefile bundle (`.shp` geometry, optional `.shx` index, `.dbf`
//! attributes and `.cpg` code page) into a [`FeatureCollection`]: one
//! [`Feature`] per record with a decoded geometry and typed attribute values.
//!
//! # Crates
//!
//! - [`shpkit_common`] - Endian-aware binary reading
//! - [`shpkit_dbf`] - dBase attribute tables and code pages
//! - [`shpkit_shp`] - Geometry records and the record index
//!
//! # Features
//!
//! - `zip` (default): read bundles packed in ZIP archives
//! - `parallel`: load independent bundles on the rayon pool
//! - `serde`: `Serialize` for geometries, values, schemas and features
//!
//! # Example
//!
//! ```no_run
//! use shpkit::prelude::*;
//!
//! let collection = read_shapefile_bundle("data/countries.shp")?;
//! for feature in &collection {
//!     println!("{} {:?}", feature.geometry(), feature.get(collection.schema(), "NAME"));
//! }
//!
//! let options = ReadOptions::new().with_charset("1252").include_deleted(true);
//! let bundle = ShapefileBundle::open("data/countries.zip", &options)?;
//! println!("{} features from {}", bundle.collection().len(), bundle.name());
//! # Ok::<(), shpkit::Error>(())
//! ```

mod error;

pub mod assemble;
pub mod bundle;
pub mod feature;
pub mod schema;
pub mod source;

pub use shpkit_common as common;
pub use shpkit_dbf as dbf;
pub use shpkit_shp as shp;

pub use assemble::assemble;
#[cfg(feature = "parallel")]
pub use bundle::read_bundles_parallel;
pub use bundle::{read_shapefile_bundle, read_shapefile_bundle_with, ReadOptions, ShapefileBundle};
pub use error::{Error, Result};
pub use feature::{Feature, FeatureCollection};
pub use schema::{AttributeDescriptor, FeatureSchema, GEOMETRY_ATTRIBUTE};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::bundle::{read_shapefile_bundle, read_shapefile_bundle_with, ReadOptions, ShapefileBundle};
    pub use crate::feature::{Feature, FeatureCollection};
    pub use crate::schema::FeatureSchema;
    pub use crate::source::{BundleSource, DirectorySource, MemberData};
    #[cfg(feature = "zip")]
    pub use crate::source::ZipSource;
    pub use shpkit_dbf::{AttributeType, Charset, Value};
    pub use shpkit_shp::{Coordinate, Geometry, Polygon, ShapeType};
}

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
