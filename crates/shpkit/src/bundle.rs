//! Loading a whole shapefile bundle into a feature collection.

use std::path::Path;

use shpkit_dbf::{Charset, DbfHeader, DbfTable};
use shpkit_shp::{ShapefileReader, ShpHeader};
use tracing::debug;

use crate::assemble::assemble;
use crate::feature::FeatureCollection;
use crate::source::{BundleSource, DirectorySource};
use crate::{Error, Result};

/// Options controlling how a bundle is read.
#[derive(Debug, Clone)]
pub struct ReadOptions {
    /// Charset for DBF text, overriding the `.cpg` sidecar. Accepts code
    /// page numbers as well as encoding names.
    pub charset: Option<String>,
    /// Keep rows flagged as deleted.
    pub include_deleted: bool,
    /// Use the `.shx` index when present.
    pub use_index: bool,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self {
            charset: None,
            include_deleted: false,
            use_index: true,
        }
    }
}

impl ReadOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Force the DBF charset.
    pub fn with_charset(mut self, charset: impl Into<String>) -> Self {
        self.charset = Some(charset.into());
        self
    }

    /// Keep or drop rows flagged as deleted.
    pub fn include_deleted(mut self, include: bool) -> Self {
        self.include_deleted = include;
        self
    }

    /// Read through the `.shx` index or scan sequentially.
    pub fn use_index(mut self, use_index: bool) -> Self {
        self.use_index = use_index;
        self
    }
}

/// A loaded bundle: the features plus what was learned about the files.
#[derive(Debug, Clone)]
pub struct ShapefileBundle {
    name: String,
    header: ShpHeader,
    dbf_header: Option<DbfHeader>,
    charset: Charset,
    shape_count: usize,
    indexed: bool,
    collection: FeatureCollection,
}

impl ShapefileBundle {
    /// Load a bundle from `source`.
    pub fn read<S: BundleSource + ?Sized>(source: &mut S, options: &ReadOptions) -> Result<Self> {
        let shp = source.member("shp")?.ok_or_else(|| Error::MissingMember {
            bundle: source.name().to_string(),
            extension: "shp".to_string(),
        })?;

        let mut reader = ShapefileReader::new(&shp)?;
        if options.use_index {
            if let Some(shx) = source.member("shx")? {
                reader = reader.with_index(&shx);
            }
        }
        let indexed = reader.index().is_some();
        let header = reader.header().clone();
        let geometries = reader.read_all()?;
        let shape_count = geometries.len();

        let charset = match &options.charset {
            Some(name) => Charset::resolve(name),
            None => match source.member("cpg")? {
                Some(cpg) => Charset::from_cpg_bytes(&cpg),
                None => Charset::default(),
            },
        };

        let table = match source.member("dbf")? {
            Some(dbf) => Some(DbfTable::read(&dbf, &charset)?),
            None => None,
        };
        let dbf_header = table.as_ref().map(|t| t.header.clone());

        let collection = assemble(header.shape_type, geometries, table, options.include_deleted)?;
        debug!(
            bundle = source.name(),
            shape_type = %header.shape_type,
            charset = charset.name(),
            indexed,
            features = collection.len(),
            "loaded shapefile bundle"
        );

        Ok(Self {
            name: source.name().to_string(),
            header,
            dbf_header,
            charset,
            shape_count,
            indexed,
            collection,
        })
    }

    /// Load the bundle at `path`: a `.shp` with its siblings, or a `.zip`
    /// archive holding one bundle.
    pub fn open<P: AsRef<Path>>(path: P, options: &ReadOptions) -> Result<Self> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .map(|e| e.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_default();
        match extension.as_str() {
            "shp" => Self::read(&mut DirectorySource::new(path), options),
            #[cfg(feature = "zip")]
            "zip" => Self::read(&mut crate::source::ZipSource::open(path)?, options),
            _ => Err(Error::UnsupportedPath(path.to_path_buf())),
        }
    }

    /// Source name (the path it was opened from).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The `.shp` header.
    pub fn header(&self) -> &ShpHeader {
        &self.header
    }

    /// The `.dbf` header, when the bundle has attributes.
    pub fn dbf_header(&self) -> Option<&DbfHeader> {
        self.dbf_header.as_ref()
    }

    /// Charset used for DBF text.
    pub fn charset(&self) -> &Charset {
        &self.charset
    }

    /// Number of records in the `.shp`.
    pub fn shape_count(&self) -> usize {
        self.shape_count
    }

    /// Whether records were located through the `.shx` index.
    pub fn is_indexed(&self) -> bool {
        self.indexed
    }

    pub fn collection(&self) -> &FeatureCollection {
        &self.collection
    }

    pub fn into_collection(self) -> FeatureCollection {
        self.collection
    }
}

/// Load the bundle at `path` with default options.
pub fn read_shapefile_bundle<P: AsRef<Path>>(path: P) -> Result<FeatureCollection> {
    read_shapefile_bundle_with(path, &ReadOptions::default())
}

/// Load the bundle at `path`.
pub fn read_shapefile_bundle_with<P: AsRef<Path>>(
    path: P,
    options: &ReadOptions,
) -> Result<FeatureCollection> {
    ShapefileBundle::open(path, options).map(ShapefileBundle::into_collection)
}

/// Load independent bundles on the rayon pool. Results keep input order.
#[cfg(feature = "parallel")]
pub fn read_bundles_parallel<P>(paths: &[P], options: &ReadOptions) -> Vec<Result<ShapefileBundle>>
where
    P: AsRef<Path> + Sync,
{
    use rayon::prelude::*;

    paths
        .par_iter()
        .map(|path| ShapefileBundle::open(path, options))
        .collect()
}
