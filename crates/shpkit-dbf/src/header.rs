//! DBF file header.

use chrono::NaiveDate;
use shpkit_common::BinaryReader;
use zerocopy::little_endian::{U16, U32};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

use crate::{Error, Result};

/// Size of the fixed file header in bytes.
pub const HEADER_SIZE: usize = 32;

/// Size of one field descriptor in bytes.
pub const FIELD_DESCRIPTOR_SIZE: usize = 32;

/// Byte terminating the field descriptor array.
pub const FIELD_TERMINATOR: u8 = 0x0D;

/// Byte marking the end of the record area.
pub const END_OF_FILE: u8 = 0x1A;

/// Years in the header are stored as an offset from this century.
pub const YEAR_BASE: i32 = 1900;

/// On-disk layout of the 32-byte DBF header.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
#[repr(C)]
pub struct RawDbfHeader {
    /// Version / file type byte.
    pub version: u8,
    /// Last update as (year - 1900, month, day).
    pub last_update: [u8; 3],
    /// Number of records.
    pub record_count: U32,
    /// Header length including field descriptors and terminator.
    pub header_length: U16,
    /// Length of one record including the deletion flag.
    pub record_length: U16,
    /// Reserved.
    pub reserved: [u8; 20],
}

/// Parsed DBF header. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbfHeader {
    /// Version / file type byte.
    pub version: u8,
    /// Last update date, if the stored bytes form a valid date.
    pub last_update: Option<NaiveDate>,
    /// Number of records declared by the header.
    pub record_count: u32,
    /// Offset of the first record.
    pub header_length: u16,
    /// Size of one record including the deletion flag byte.
    pub record_length: u16,
}

impl DbfHeader {
    /// Read the header from the start of a DBF stream.
    pub fn load(reader: &mut BinaryReader<'_>) -> Result<Self> {
        let raw: RawDbfHeader = reader.read_struct()?;
        let header = Self::from_raw(&raw);

        if (header.header_length as usize) < HEADER_SIZE + 1 {
            return Err(Error::InvalidHeader(format!(
                "header length {} is smaller than the fixed header",
                header.header_length
            )));
        }
        Ok(header)
    }

    fn from_raw(raw: &RawDbfHeader) -> Self {
        let [year, month, day] = raw.last_update;
        Self {
            version: raw.version,
            last_update: NaiveDate::from_ymd_opt(
                YEAR_BASE + year as i32,
                month as u32,
                day as u32,
            ),
            record_count: raw.record_count.get(),
            header_length: raw.header_length.get(),
            record_length: raw.record_length.get(),
        }
    }

    /// Number of field descriptors, derived from the header length.
    pub fn field_count(&self) -> usize {
        (self.header_length as usize).saturating_sub(HEADER_SIZE + 1) / FIELD_DESCRIPTOR_SIZE
    }

    /// Offset of the first record in the file.
    pub fn data_offset(&self) -> usize {
        self.header_length as usize
    }

    /// Build the on-disk layout for this header.
    pub fn to_raw(&self) -> RawDbfHeader {
        let last_update = self
            .last_update
            .map(|d| {
                use chrono::Datelike;
                [
                    (d.year() - YEAR_BASE).clamp(0, 255) as u8,
                    d.month() as u8,
                    d.day() as u8,
                ]
            })
            .unwrap_or([0; 3]);
        RawDbfHeader {
            version: self.version,
            last_update,
            record_count: U32::new(self.record_count),
            header_length: U16::new(self.header_length),
            record_length: U16::new(self.record_length),
            reserved: [0; 20],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header_bytes(count: u32, header_len: u16, record_len: u16) -> Vec<u8> {
        let mut data = vec![0x03, 124, 3, 15];
        data.extend_from_slice(&count.to_le_bytes());
        data.extend_from_slice(&header_len.to_le_bytes());
        data.extend_from_slice(&record_len.to_le_bytes());
        data.extend_from_slice(&[0u8; 20]);
        data
    }

    #[test]
    fn test_layout_size() {
        assert_eq!(std::mem::size_of::<RawDbfHeader>(), HEADER_SIZE);
    }

    #[test]
    fn test_load_header() {
        let data = header_bytes(42, 32 + 3 * 32 + 1, 61);
        let mut reader = BinaryReader::new(&data);
        let header = DbfHeader::load(&mut reader).unwrap();

        assert_eq!(header.version, 0x03);
        assert_eq!(header.record_count, 42);
        assert_eq!(header.record_length, 61);
        assert_eq!(header.field_count(), 3);
        assert_eq!(header.data_offset(), 129);
        assert_eq!(header.last_update, NaiveDate::from_ymd_opt(2024, 3, 15));
        assert_eq!(reader.position(), HEADER_SIZE);
    }

    #[test]
    fn test_invalid_date_is_none() {
        let mut data = header_bytes(0, 33, 1);
        data[2] = 13;
        let header = DbfHeader::load(&mut BinaryReader::new(&data)).unwrap();
        assert_eq!(header.last_update, None);
        assert_eq!(header.field_count(), 0);
    }

    #[test]
    fn test_rejects_short_header_length() {
        let data = header_bytes(0, 10, 1);
        assert!(DbfHeader::load(&mut BinaryReader::new(&data)).is_err());
    }

    #[test]
    fn test_truncated_header() {
        let data = header_bytes(1, 33, 1);
        assert!(DbfHeader::load(&mut BinaryReader::new(&data[..20])).is_err());
    }

    #[test]
    fn test_raw_round_trip() {
        let data = header_bytes(7, 97, 20);
        let header = DbfHeader::load(&mut BinaryReader::new(&data)).unwrap();
        assert_eq!(header.to_raw().as_bytes(), &data[..]);
    }
}
