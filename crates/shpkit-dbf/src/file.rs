//! DBF file handling.

use shpkit_common::BinaryReader;
use tracing::{debug, warn};

use crate::codepage::Charset;
use crate::decoder::DbfDecoder;
use crate::field::{load_fields, FieldDefinition};
use crate::header::{DbfHeader, HEADER_SIZE};
use crate::value::Value;
use crate::{Error, Result};

/// A borrowed view over a DBF file: header, field directory and raw records.
#[derive(Debug, Clone)]
pub struct DbfReader<'a> {
    header: DbfHeader,
    fields: Vec<FieldDefinition>,
    data: &'a [u8],
}

impl<'a> DbfReader<'a> {
    /// Parse the header and field directory of a DBF file.
    ///
    /// Field names are decoded with `charset`. Records are not touched until
    /// they are requested.
    pub fn parse(data: &'a [u8], charset: &Charset) -> Result<Self> {
        let mut reader = BinaryReader::new(data);
        let header = DbfHeader::load(&mut reader)?;

        if header.record_length == 0 {
            return Err(Error::InvalidHeader("record length is zero".to_string()));
        }

        reader.seek(HEADER_SIZE);
        let fields = load_fields(&mut reader, charset, header.field_count())?;

        let implied: usize = fields.iter().map(|f| f.length).sum::<usize>() + 1;
        if implied != header.record_length as usize {
            warn!(
                declared = header.record_length,
                implied, "DBF record length does not match field layout"
            );
        }

        Ok(Self {
            header,
            fields,
            data,
        })
    }

    /// The file header.
    pub fn header(&self) -> &DbfHeader {
        &self.header
    }

    /// The field directory, in record order.
    pub fn fields(&self) -> &[FieldDefinition] {
        &self.fields
    }

    /// Number of records declared by the header.
    pub fn record_count(&self) -> usize {
        self.header.record_count as usize
    }

    /// Check that the field lengths plus the deletion flag fill a record.
    pub fn layout_matches(&self) -> bool {
        self.fields.iter().map(|f| f.length).sum::<usize>() + 1 == self.header.record_length as usize
    }

    /// Get the raw bytes of record `index`, deletion flag included.
    pub fn record(&self, index: usize) -> Result<&'a [u8]> {
        let len = self.header.record_length as usize;
        let start = self.header.data_offset() + index * len;
        let mut reader = BinaryReader::new(self.data);
        reader.seek(start.min(self.data.len()));
        Ok(reader.read_bytes(len)?)
    }

    /// Iterate over the raw bytes of every declared record.
    pub fn records(&self) -> impl Iterator<Item = Result<&'a [u8]>> + '_ {
        (0..self.record_count()).map(move |i| self.record(i))
    }

    /// Decode every record into an owned table.
    pub fn read_table(&self, decoder: &mut DbfDecoder) -> Result<DbfTable> {
        let len = self.header.record_length as usize;
        let available = self.data.len().saturating_sub(self.header.data_offset());
        let needed = self.record_count().saturating_mul(len);
        if needed > available {
            return Err(shpkit_common::Error::Truncated { needed, available }.into());
        }

        let mut rows = Vec::with_capacity(self.record_count());
        for record in self.records() {
            let record = record?;
            rows.push(DbfRow {
                deleted: DbfDecoder::is_deleted(record),
                values: decoder.decode_record(record, &self.fields),
            });
        }
        debug!(
            rows = rows.len(),
            fields = self.fields.len(),
            interned = decoder.interned_len(),
            "decoded DBF table"
        );
        Ok(DbfTable {
            header: self.header.clone(),
            fields: self.fields.clone(),
            rows,
        })
    }
}

/// One decoded record.
#[derive(Debug, Clone, PartialEq)]
pub struct DbfRow {
    /// Whether the record carries the deletion marker.
    pub deleted: bool,
    /// One value per field, in field order.
    pub values: Vec<Value>,
}

/// A fully decoded DBF table.
#[derive(Debug, Clone)]
pub struct DbfTable {
    pub header: DbfHeader,
    pub fields: Vec<FieldDefinition>,
    pub rows: Vec<DbfRow>,
}

impl DbfTable {
    /// Parse and decode a whole DBF file with a fresh decoder.
    pub fn read(data: &[u8], charset: &Charset) -> Result<Self> {
        let reader = DbfReader::parse(data, charset)?;
        let mut decoder = DbfDecoder::new(charset.clone());
        reader.read_table(&mut decoder)
    }

    /// Number of rows, deleted ones included.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Check if the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of the field called `name`.
    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }
}
