//! Reading whole `.shp` files, optionally through a `.shx` index.

use shpkit_common::BinaryReader;
use tracing::{debug, warn};

use crate::geometry::Geometry;
use crate::header::{ShpHeader, HEADER_SIZE};
use crate::index::ShapeIndex;
use crate::record::{read_record, RecordHeader, RECORD_HEADER_SIZE};
use crate::Result;

/// A parsed `.shp` over borrowed bytes.
///
/// # Example
///
/// ```no_run
/// use shpkit_shp::ShapefileReader;
///
/// let shp = std::fs::read("roads.shp")?;
/// let shx = std::fs::read("roads.shx")?;
/// let reader = ShapefileReader::new(&shp)?.with_index(&shx);
///
/// println!("{}", reader.header().shape_type);
/// for geometry in reader.read_all()? {
///     println!("{geometry}");
/// }
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone)]
pub struct ShapefileReader<'a> {
    data: &'a [u8],
    header: ShpHeader,
    index: Option<ShapeIndex>,
}

impl<'a> ShapefileReader<'a> {
    /// Parse the main file header.
    pub fn new(data: &'a [u8]) -> Result<Self> {
        let header = ShpHeader::load(&mut BinaryReader::new(data))?;
        if header.file_length != data.len() {
            debug!(
                declared = header.file_length,
                actual = data.len(),
                "shp length differs from header"
            );
        }
        Ok(Self {
            data,
            header,
            index: None,
        })
    }

    /// Attach a `.shx` index.
    ///
    /// An index that fails to parse or points outside this file is logged
    /// and ignored; records are then read sequentially.
    pub fn with_index(mut self, shx: &[u8]) -> Self {
        match ShapeIndex::parse(shx).and_then(|index| {
            index.validate(self.data.len())?;
            Ok(index)
        }) {
            Ok(index) => self.index = Some(index),
            Err(e) => warn!(error = %e, "ignoring invalid shape index"),
        }
        self
    }

    /// The main file header.
    pub fn header(&self) -> &ShpHeader {
        &self.header
    }

    /// The attached index, if it was valid.
    pub fn index(&self) -> Option<&ShapeIndex> {
        self.index.as_ref()
    }

    /// Number of records when known up front from the index.
    pub fn record_count_hint(&self) -> Option<usize> {
        self.index.as_ref().map(ShapeIndex::len)
    }

    /// Decode record `i` (0-based).
    ///
    /// Uses the index when present, otherwise walks the file from the start.
    pub fn record(&self, i: usize) -> Result<Option<Geometry>> {
        if let Some(index) = &self.index {
            return match index.entries().get(i) {
                Some(entry) => self.read_at(entry.offset).map(Some),
                None => Ok(None),
            };
        }
        for (n, geometry) in self.records().enumerate() {
            let geometry = geometry?;
            if n == i {
                return Ok(Some(geometry));
            }
        }
        Ok(None)
    }

    /// Decode every record in file order.
    pub fn read_all(&self) -> Result<Vec<Geometry>> {
        match &self.index {
            Some(index) => index
                .entries()
                .iter()
                .map(|entry| self.read_at(entry.offset))
                .collect(),
            None => self.records().collect(),
        }
    }

    /// Iterate the records sequentially, ignoring any index.
    pub fn records(&self) -> Records<'a> {
        let end = if (HEADER_SIZE..=self.data.len()).contains(&self.header.file_length) {
            self.header.file_length
        } else {
            self.data.len()
        };
        let mut reader = BinaryReader::new(&self.data[..end]);
        reader.seek(HEADER_SIZE);
        Records {
            reader,
            header: self.header.clone(),
            done: false,
        }
    }

    fn read_at(&self, offset: usize) -> Result<Geometry> {
        let mut reader = BinaryReader::new(self.data);
        reader.seek(offset);
        let record = RecordHeader::load(&mut reader)?;
        read_record(&mut reader, self.header.shape_type, record)
    }
}

/// Sequential record iterator. Stops after the first error.
#[derive(Debug, Clone)]
pub struct Records<'a> {
    reader: BinaryReader<'a>,
    header: ShpHeader,
    done: bool,
}

impl Iterator for Records<'_> {
    type Item = Result<Geometry>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done || self.reader.remaining() < RECORD_HEADER_SIZE {
            return None;
        }
        let result = RecordHeader::load(&mut self.reader)
            .and_then(|record| read_record(&mut self.reader, self.header.shape_type, record));
        if result.is_err() {
            self.done = true;
        }
        Some(result)
    }
}
