//! DBF writer.
//!
//! Produces files the reader in this crate decodes back to the same values:
//! text is left-aligned and space padded, numbers are right-aligned (or
//! filled with `*` when they do not fit), logicals are `T`/`F`/`?` and dates
//! are `yyyyMMdd`.

use chrono::NaiveDate;
use zerocopy::IntoBytes;

use crate::codepage::Charset;
use crate::field::{layout, FieldDefinition, FieldType};
use crate::header::{DbfHeader, END_OF_FILE, FIELD_DESCRIPTOR_SIZE, FIELD_TERMINATOR, HEADER_SIZE};
use crate::value::Value;
use crate::{Error, Result};

/// dBase III version byte without memo.
pub const DBASE_III: u8 = 0x03;

/// Builds a DBF file in memory.
#[derive(Debug, Clone)]
pub struct DbfWriter {
    fields: Vec<FieldDefinition>,
    charset: Charset,
    last_update: Option<NaiveDate>,
    rows: Vec<(bool, Vec<Value>)>,
}

impl DbfWriter {
    /// Create a writer for the given columns. Offsets are recomputed.
    pub fn new(mut fields: Vec<FieldDefinition>, charset: Charset) -> Self {
        layout(&mut fields);
        Self {
            fields,
            charset,
            last_update: None,
            rows: Vec::new(),
        }
    }

    /// Set the last-update date stored in the header.
    pub fn with_last_update(mut self, date: NaiveDate) -> Self {
        self.last_update = Some(date);
        self
    }

    /// The columns being written.
    pub fn fields(&self) -> &[FieldDefinition] {
        &self.fields
    }

    /// Append a live record.
    pub fn push_row(&mut self, values: Vec<Value>) {
        self.rows.push((false, values));
    }

    /// Append a record carrying the deletion marker.
    pub fn push_deleted_row(&mut self, values: Vec<Value>) {
        self.rows.push((true, values));
    }

    /// Serialize the table.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let record_length = self.fields.iter().map(|f| f.length).sum::<usize>() + 1;
        let header_length = HEADER_SIZE + self.fields.len() * FIELD_DESCRIPTOR_SIZE + 1;
        if record_length > u16::MAX as usize || header_length > u16::MAX as usize {
            return Err(Error::InvalidHeader(format!(
                "{} fields with record length {} do not fit a DBF header",
                self.fields.len(),
                record_length
            )));
        }

        let header = DbfHeader {
            version: DBASE_III,
            last_update: self.last_update,
            record_count: self.rows.len() as u32,
            header_length: header_length as u16,
            record_length: record_length as u16,
        };

        let mut out = Vec::with_capacity(header_length + record_length * self.rows.len() + 1);
        out.extend_from_slice(header.to_raw().as_bytes());
        for field in &self.fields {
            out.extend_from_slice(field.to_raw(&self.charset).as_bytes());
        }
        out.push(FIELD_TERMINATOR);

        for (index, (deleted, values)) in self.rows.iter().enumerate() {
            if values.len() != self.fields.len() {
                return Err(Error::RowWidth {
                    row: index,
                    expected: self.fields.len(),
                    actual: values.len(),
                });
            }
            out.push(if *deleted { b'*' } else { b' ' });
            for (field, value) in self.fields.iter().zip(values) {
                self.encode_value(&mut out, field, value);
            }
        }
        out.push(END_OF_FILE);

        Ok(out)
    }

    fn encode_value(&self, out: &mut Vec<u8>, field: &FieldDefinition, value: &Value) {
        let width = field.length;
        match field.field_type {
            FieldType::Numeric | FieldType::Float => {
                let text = match value {
                    Value::Null => String::new(),
                    Value::Integer(v) => v.to_string(),
                    Value::Long(v) => v.to_string(),
                    Value::Double(v) => format!("{:.*}", field.decimals, v),
                    other => other.to_string(),
                };
                if text.len() > width {
                    out.extend(std::iter::repeat(b'*').take(width));
                } else {
                    out.extend(std::iter::repeat(b' ').take(width - text.len()));
                    out.extend_from_slice(text.as_bytes());
                }
            }
            FieldType::Logical => {
                let flag = match value {
                    Value::Boolean(true) => b'T',
                    Value::Boolean(false) => b'F',
                    _ => b'?',
                };
                pad_left_aligned(out, &[flag], width);
            }
            FieldType::Date => {
                let text = match value {
                    Value::Date(d) => d.format("%Y%m%d").to_string(),
                    _ => String::new(),
                };
                pad_left_aligned(out, text.as_bytes(), width);
            }
            FieldType::Character | FieldType::Other(_) => {
                let text = match value {
                    Value::Null => String::new(),
                    other => other.to_string(),
                };
                pad_left_aligned(out, &self.charset.encode(&text), width);
            }
        }
    }
}

fn pad_left_aligned(out: &mut Vec<u8>, bytes: &[u8], width: usize) {
    let len = bytes.len().min(width);
    out.extend_from_slice(&bytes[..len]);
    out.extend(std::iter::repeat(b' ').take(width - len));
}
