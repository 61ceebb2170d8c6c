//! The `.shx` record index.
//!
//! An index is the same 100-byte header as the main file followed by one
//! 8-byte entry per record: the record's offset and content length, both
//! big-endian and counted in 16-bit words.

use byteorder::{BigEndian, WriteBytesExt};
use shpkit_common::{BinaryReader, Endian};

use crate::header::{ShpHeader, HEADER_SIZE};
use crate::record::RECORD_HEADER_SIZE;
use crate::{Error, Result};

/// Size of one index entry in bytes.
pub const ENTRY_SIZE: usize = 8;

/// Location of one record in the `.shp`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShapeIndexEntry {
    /// Byte offset of the record header.
    pub offset: usize,
    /// Length of the record content in bytes.
    pub content_length: usize,
}

impl ShapeIndexEntry {
    /// Offset one past the end of the record.
    #[inline]
    pub fn end(&self) -> usize {
        self.offset + RECORD_HEADER_SIZE + self.content_length
    }
}

/// A parsed `.shx` file.
#[derive(Debug, Clone, PartialEq)]
pub struct ShapeIndex {
    header: ShpHeader,
    entries: Vec<ShapeIndexEntry>,
}

impl ShapeIndex {
    /// Parse an index.
    ///
    /// With `record_count` set exactly that many entries are read; otherwise
    /// the count is derived from the header's file length.
    pub fn load(reader: &mut BinaryReader<'_>, record_count: Option<usize>) -> Result<Self> {
        let header = ShpHeader::load(reader)?;
        let count = record_count
            .unwrap_or_else(|| header.file_length.saturating_sub(HEADER_SIZE) / ENTRY_SIZE);

        reader.set_endian(Endian::Big);
        reader.peek_bytes(count.saturating_mul(ENTRY_SIZE))?;
        let mut entries = Vec::with_capacity(count);
        for _ in 0..count {
            let offset = reader.read_i32()?;
            let length = reader.read_i32()?;
            entries.push(ShapeIndexEntry {
                offset: offset.max(0) as usize * 2,
                content_length: length.max(0) as usize * 2,
            });
        }
        reader.set_endian(Endian::Little);

        Ok(Self { header, entries })
    }

    /// Parse an index from a byte slice.
    pub fn parse(data: &[u8]) -> Result<Self> {
        Self::load(&mut BinaryReader::new(data), None)
    }

    /// The index file header.
    pub fn header(&self) -> &ShpHeader {
        &self.header
    }

    /// All entries in record order.
    pub fn entries(&self) -> &[ShapeIndexEntry] {
        &self.entries
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check whether the index is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Check that every entry lies inside a main file of `shp_len` bytes.
    pub fn validate(&self, shp_len: usize) -> Result<()> {
        for (i, entry) in self.entries.iter().enumerate() {
            if entry.offset < HEADER_SIZE {
                return Err(Error::MalformedIndex {
                    entry: i,
                    reason: format!("offset {} inside the file header", entry.offset),
                });
            }
            if entry.end() > shp_len {
                return Err(Error::MalformedIndex {
                    entry: i,
                    reason: format!("record ends at {} past file length {}", entry.end(), shp_len),
                });
            }
        }
        Ok(())
    }

    /// Serialize an index.
    pub fn write_to(header: &ShpHeader, entries: &[ShapeIndexEntry], out: &mut Vec<u8>) -> Result<()> {
        let mut header = header.clone();
        header.file_length = HEADER_SIZE + entries.len() * ENTRY_SIZE;
        header.write_to(out)?;
        for entry in entries {
            out.write_i32::<BigEndian>((entry.offset / 2) as i32)?;
            out.write_i32::<BigEndian>((entry.content_length / 2) as i32)?;
        }
        Ok(())
    }
}
