//! DBF field directory.
//!
//! The header is followed by one 32-byte descriptor per column. Each
//! descriptor carries the column name, a one-character type tag, the byte
//! length of the column inside a record and its decimal count.

use std::fmt;

use hashbrown::HashSet;
use shpkit_common::{trim_trailing_padding, BinaryReader};
use tracing::warn;
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

use crate::codepage::Charset;
use crate::header::FIELD_DESCRIPTOR_SIZE;
use crate::types::AttributeType;
use crate::Result;

/// Maximum length of a field name in bytes.
pub const FIELD_NAME_SIZE: usize = 11;

/// Numeric fields wider than this are read as 64-bit integers.
pub const MAX_INTEGER_DIGITS: usize = 9;

/// On-disk layout of a 32-byte field descriptor.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
#[repr(C)]
pub struct RawFieldDescriptor {
    /// NUL-padded field name.
    pub name: [u8; FIELD_NAME_SIZE],
    /// Type tag.
    pub field_type: u8,
    /// Reserved (field data address in some dialects).
    pub reserved1: [u8; 4],
    /// Field length in bytes.
    pub length: u8,
    /// Decimal count.
    pub decimals: u8,
    /// Reserved.
    pub reserved2: [u8; 14],
}

/// DBF column type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldType {
    /// `C`: fixed-width text.
    Character,
    /// `N`: decimal number stored as text.
    Numeric,
    /// `F`: floating point number stored as text.
    Float,
    /// `D`: date as `yyyyMMdd`.
    Date,
    /// `L`: logical.
    Logical,
    /// Any other tag, decoded as text.
    Other(u8),
}

impl FieldType {
    /// Map a raw tag byte (case-insensitive).
    pub fn from_tag(tag: u8) -> Self {
        match tag.to_ascii_uppercase() {
            b'C' => Self::Character,
            b'N' => Self::Numeric,
            b'F' => Self::Float,
            b'D' => Self::Date,
            b'L' => Self::Logical,
            _ => Self::Other(tag),
        }
    }

    /// The tag byte written to disk.
    pub fn tag(self) -> u8 {
        match self {
            Self::Character => b'C',
            Self::Numeric => b'N',
            Self::Float => b'F',
            Self::Date => b'D',
            Self::Logical => b'L',
            Self::Other(tag) => tag,
        }
    }

    /// Tags whose decimal byte carries no meaning.
    fn ignores_decimals(self) -> bool {
        match self {
            Self::Character | Self::Date | Self::Logical => true,
            Self::Other(tag) => matches!(tag.to_ascii_uppercase(), b'M' | b'G'),
            Self::Numeric | Self::Float => false,
        }
    }

    fn is_known(self) -> bool {
        match self {
            Self::Other(tag) => matches!(tag.to_ascii_uppercase(), b'M' | b'G'),
            _ => true,
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tag() as char)
    }
}

/// One column of a DBF table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDefinition {
    /// Column name, trimmed and unique within the table.
    pub name: String,
    /// Type tag.
    pub field_type: FieldType,
    /// Width of the column in bytes.
    pub length: usize,
    /// Decimal count (zero for non-numeric tags).
    pub decimals: usize,
    /// Start of the column within a record; offset 0 is the deletion flag.
    pub offset: usize,
}

impl FieldDefinition {
    /// Create a field; the offset is assigned when the layout is built.
    pub fn new(name: impl Into<String>, field_type: FieldType, length: usize, decimals: usize) -> Self {
        let decimals = if field_type.ignores_decimals() { 0 } else { decimals };
        Self {
            name: name.into(),
            field_type,
            length,
            decimals,
            offset: 0,
        }
    }

    /// The attribute type values of this column decode to.
    pub fn attribute_type(&self) -> AttributeType {
        match self.field_type {
            FieldType::Numeric if self.decimals == 0 && self.length > MAX_INTEGER_DIGITS => {
                AttributeType::Long
            }
            FieldType::Numeric if self.decimals == 0 => AttributeType::Integer,
            FieldType::Numeric | FieldType::Float => AttributeType::Double,
            FieldType::Character => AttributeType::String,
            FieldType::Date => AttributeType::Date,
            FieldType::Logical => AttributeType::Boolean,
            FieldType::Other(_) => AttributeType::String,
        }
    }

    /// Byte range of this column inside a record.
    #[inline]
    pub fn range(&self) -> std::ops::Range<usize> {
        self.offset..self.offset + self.length
    }

    /// Build the on-disk descriptor, encoding the name with `charset`.
    pub fn to_raw(&self, charset: &Charset) -> RawFieldDescriptor {
        let mut name = [0u8; FIELD_NAME_SIZE];
        let encoded = charset.encode(&self.name);
        let len = encoded.len().min(FIELD_NAME_SIZE);
        name[..len].copy_from_slice(&encoded[..len]);
        RawFieldDescriptor {
            name,
            field_type: self.field_type.tag(),
            reserved1: [0; 4],
            length: self.length.min(u8::MAX as usize) as u8,
            decimals: self.decimals.min(u8::MAX as usize) as u8,
            reserved2: [0; 14],
        }
    }
}

/// Read `count` field descriptors following the header.
///
/// Names are decoded with `charset`; duplicates are renamed by appending
/// `_1`, `_2`, ... so every column name is unique. Unknown type tags are
/// kept as-is and decoded as text.
pub fn load_fields(
    reader: &mut BinaryReader<'_>,
    charset: &Charset,
    count: usize,
) -> Result<Vec<FieldDefinition>> {
    reader.peek_bytes(count.saturating_mul(FIELD_DESCRIPTOR_SIZE))?;

    let mut fields = Vec::with_capacity(count);
    let mut seen = HashSet::with_capacity(count);
    let mut offset = 1;

    for index in 0..count {
        let raw: RawFieldDescriptor = reader.read_struct()?;

        let name_bytes = match shpkit_common::memchr::memchr(0, &raw.name) {
            Some(end) => &raw.name[..end],
            None => &raw.name[..],
        };
        let decoded = charset.decode(trim_trailing_padding(name_bytes));
        let name = unique_name(decoded.trim(), index, &mut seen);

        let field_type = FieldType::from_tag(raw.field_type);
        if !field_type.is_known() {
            warn!(
                field = %name,
                tag = %(raw.field_type as char),
                "unknown DBF field type, reading as text"
            );
        }

        let mut field = FieldDefinition::new(name, field_type, raw.length as usize, raw.decimals as usize);
        field.offset = offset;
        offset += field.length;
        fields.push(field);
    }

    Ok(fields)
}

fn unique_name(base: &str, index: usize, seen: &mut HashSet<String>) -> String {
    let base = if base.is_empty() {
        format!("FIELD{}", index + 1)
    } else {
        base.to_string()
    };
    if seen.insert(base.clone()) {
        return base;
    }
    let mut n = 1;
    loop {
        let candidate = format!("{base}_{n}");
        if seen.insert(candidate.clone()) {
            return candidate;
        }
        n += 1;
    }
}

/// Assign running offsets to `fields`, returning the implied record length.
pub fn layout(fields: &mut [FieldDefinition]) -> usize {
    let mut offset = 1;
    for field in fields.iter_mut() {
        field.offset = offset;
        offset += field.length;
    }
    offset
}
