//! Per-column decoding of DBF records.
//!
//! [`DbfDecoder`] turns the raw bytes of a record into [`Value`]s according to
//! each column's type tag. Decoding is total: malformed numbers, dates and
//! logicals become [`Value::Null`] and are logged at debug level, they never
//! abort a record.
//!
//! The decoder owns two caches that live exactly as long as one file load:
//! a string intern set, so repeated text values share one allocation, and the
//! date pattern that last parsed successfully.

use std::hash::BuildHasherDefault;
use std::sync::Arc;

use chrono::NaiveDate;
use hashbrown::HashSet;
use rustc_hash::FxHasher;
use shpkit_common::{trim_padding, trim_trailing_padding};
use tracing::debug;

use crate::codepage::Charset;
use crate::field::{FieldDefinition, FieldType, MAX_INTEGER_DIGITS};
use crate::value::Value;

type FxHashSet<T> = HashSet<T, BuildHasherDefault<FxHasher>>;

/// First byte of a record that has been deleted.
pub const DELETED_MARKER: u8 = b'*';

/// Date layouts accepted in `D` columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatePattern {
    /// `yyyyMMdd`
    Compact,
    /// `yy/mm/dd`
    Slashed,
}

impl DatePattern {
    const FALLBACK_ORDER: [DatePattern; 2] = [DatePattern::Compact, DatePattern::Slashed];

    fn format(self) -> &'static str {
        match self {
            Self::Compact => "%Y%m%d",
            Self::Slashed => "%y/%m/%d",
        }
    }

    fn parse(self, text: &str) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(text, self.format()).ok()
    }
}

/// Decodes record bytes into values for one file.
#[derive(Debug)]
pub struct DbfDecoder {
    charset: Charset,
    strings: FxHashSet<Arc<str>>,
    last_date_pattern: Option<DatePattern>,
}

impl DbfDecoder {
    /// Create a decoder with empty caches.
    pub fn new(charset: Charset) -> Self {
        Self {
            charset,
            strings: FxHashSet::default(),
            last_date_pattern: None,
        }
    }

    /// The charset used for text columns.
    pub fn charset(&self) -> &Charset {
        &self.charset
    }

    /// Number of distinct strings interned so far.
    pub fn interned_len(&self) -> usize {
        self.strings.len()
    }

    /// Check the deletion flag of a raw record.
    #[inline]
    pub fn is_deleted(record: &[u8]) -> bool {
        record.first() == Some(&DELETED_MARKER)
    }

    /// Decode every column of `record`.
    pub fn decode_record(&mut self, record: &[u8], fields: &[FieldDefinition]) -> Vec<Value> {
        fields.iter().map(|f| self.decode_field(record, f)).collect()
    }

    /// Decode one column of `record`.
    ///
    /// Columns that extend past the end of the record decode to null.
    pub fn decode_field(&mut self, record: &[u8], field: &FieldDefinition) -> Value {
        let Some(bytes) = record.get(field.range()) else {
            debug!(field = %field.name, record_len = record.len(), "field extends past record");
            return Value::Null;
        };

        match field.field_type {
            FieldType::Character | FieldType::Other(_) => self.decode_string(bytes),
            FieldType::Numeric | FieldType::Float => Self::decode_number(bytes, field),
            FieldType::Logical => Self::decode_logical(bytes),
            FieldType::Date => self.decode_date(bytes, field),
        }
    }

    fn decode_string(&mut self, bytes: &[u8]) -> Value {
        let text = self.charset.decode(trim_trailing_padding(bytes));
        Value::String(self.intern(&text))
    }

    /// Return the shared allocation for `text`, creating it on first use.
    pub fn intern(&mut self, text: &str) -> Arc<str> {
        if let Some(existing) = self.strings.get(text) {
            return Arc::clone(existing);
        }
        let shared: Arc<str> = Arc::from(text);
        self.strings.insert(Arc::clone(&shared));
        shared
    }

    fn decode_number(bytes: &[u8], field: &FieldDefinition) -> Value {
        let trimmed = trim_padding(bytes);
        if trimmed.is_empty() {
            return Value::Null;
        }
        let Ok(text) = std::str::from_utf8(trimmed) else {
            debug!(field = %field.name, "numeric field is not ASCII");
            return Value::Null;
        };

        let parsed = match (field.field_type, field.decimals) {
            (FieldType::Numeric, 0) if field.length > MAX_INTEGER_DIGITS => {
                text.parse::<i64>().ok().map(Value::Long)
            }
            (FieldType::Numeric, 0) => text.parse::<i32>().ok().map(Value::Integer),
            _ => text.parse::<f64>().ok().map(Value::Double),
        };

        parsed.unwrap_or_else(|| {
            debug!(field = %field.name, value = text, "unparseable numeric value");
            Value::Null
        })
    }

    fn decode_logical(bytes: &[u8]) -> Value {
        match trim_padding(bytes).first().map(u8::to_ascii_lowercase) {
            Some(b'?') => Value::Null,
            Some(b't' | b'y' | b'1') => Value::Boolean(true),
            _ => Value::Boolean(false),
        }
    }

    fn decode_date(&mut self, bytes: &[u8], field: &FieldDefinition) -> Value {
        let trimmed = trim_padding(bytes);
        if trimmed.is_empty() || trimmed.iter().all(|&b| b == b'0') {
            return Value::Null;
        }
        let Ok(text) = std::str::from_utf8(trimmed) else {
            debug!(field = %field.name, "date field is not ASCII");
            return Value::Null;
        };

        if let Some(pattern) = self.last_date_pattern {
            if let Some(date) = pattern.parse(text) {
                return Value::Date(date);
            }
        }

        for pattern in DatePattern::FALLBACK_ORDER {
            if Some(pattern) == self.last_date_pattern {
                continue;
            }
            if let Some(date) = pattern.parse(text) {
                self.last_date_pattern = Some(pattern);
                return Value::Date(date);
            }
        }

        debug!(field = %field.name, value = text, "unparseable date value");
        Value::Null
    }

    /// The date pattern that most recently parsed successfully.
    pub fn last_date_pattern(&self) -> Option<DatePattern> {
        self.last_date_pattern
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::layout;

    fn field(tag: FieldType, length: usize, decimals: usize) -> FieldDefinition {
        let mut fields = vec![FieldDefinition::new("F", tag, length, decimals)];
        layout(&mut fields);
        fields.remove(0)
    }

    fn record(content: &[u8]) -> Vec<u8> {
        let mut out = vec![b' '];
        out.extend_from_slice(content);
        out
    }

    fn decode(tag: FieldType, length: usize, decimals: usize, content: &[u8]) -> Value {
        let mut decoder = DbfDecoder::new(Charset::default());
        decoder.decode_field(&record(content), &field(tag, length, decimals))
    }

    #[test]
    fn test_overflow_marker_is_null() {
        assert_eq!(decode(FieldType::Numeric, 8, 0, b"********"), Value::Null);
        assert_eq!(decode(FieldType::Numeric, 12, 3, b"************"), Value::Null);
    }

    #[test]
    fn test_numeric_widths() {
        assert_eq!(decode(FieldType::Numeric, 9, 0, b"   123456"), Value::Integer(123456));
        assert_eq!(decode(FieldType::Numeric, 9, 0, b"      -42"), Value::Integer(-42));
        assert_eq!(
            decode(FieldType::Numeric, 12, 0, b"  9876543210"),
            Value::Long(9876543210)
        );
        assert_eq!(decode(FieldType::Numeric, 10, 2, b"   1234.50"), Value::Double(1234.5));
        assert_eq!(decode(FieldType::Float, 8, 0, b"  3.0e2 "), Value::Double(300.0));
    }

    #[test]
    fn test_numeric_malformed_is_null() {
        assert_eq!(decode(FieldType::Numeric, 5, 0, b"     "), Value::Null);
        assert_eq!(decode(FieldType::Numeric, 5, 0, b"1.5  "), Value::Null);
        assert_eq!(decode(FieldType::Numeric, 9, 0, b"999999999"), Value::Integer(999999999));
        assert_eq!(decode(FieldType::Numeric, 9, 0, b"-99999999"), Value::Integer(-99999999));
        assert_eq!(decode(FieldType::Numeric, 4, 0, &[0xFF, b'1', b'2', b'3']), Value::Null);
        assert_eq!(decode(FieldType::Float, 4, 1, b"abc "), Value::Null);
    }

    #[test]
    fn test_logical() {
        assert_eq!(decode(FieldType::Logical, 1, 0, b"T"), Value::Boolean(true));
        assert_eq!(decode(FieldType::Logical, 1, 0, b"y"), Value::Boolean(true));
        assert_eq!(decode(FieldType::Logical, 1, 0, b"1"), Value::Boolean(true));
        assert_eq!(decode(FieldType::Logical, 1, 0, b"F"), Value::Boolean(false));
        assert_eq!(decode(FieldType::Logical, 1, 0, b"N"), Value::Boolean(false));
        assert_eq!(decode(FieldType::Logical, 1, 0, b"?"), Value::Null);
        assert_eq!(decode(FieldType::Logical, 1, 0, b" "), Value::Boolean(false));
    }

    #[test]
    fn test_dates() {
        let expected = NaiveDate::from_ymd_opt(2021, 7, 4).unwrap();
        assert_eq!(decode(FieldType::Date, 8, 0, b"20210704"), Value::Date(expected));
        assert_eq!(decode(FieldType::Date, 8, 0, b"21/07/04"), Value::Date(expected));
        assert_eq!(decode(FieldType::Date, 8, 0, b"00000000"), Value::Null);
        assert_eq!(decode(FieldType::Date, 8, 0, b"        "), Value::Null);
        assert_eq!(decode(FieldType::Date, 8, 0, b"2021XX04"), Value::Null);
        assert_eq!(decode(FieldType::Date, 8, 0, b"20211304"), Value::Null);
    }

    #[test]
    fn test_date_pattern_memo_is_per_decoder() {
        let f = field(FieldType::Date, 8, 0);
        let mut first = DbfDecoder::new(Charset::default());
        assert!(first.last_date_pattern().is_none());

        first.decode_field(&record(b"99/12/31"), &f);
        assert_eq!(first.last_date_pattern(), Some(DatePattern::Slashed));

        // Falls back to the compact layout and remembers it.
        let v = first.decode_field(&record(b"19991231"), &f);
        assert_eq!(v, Value::Date(NaiveDate::from_ymd_opt(1999, 12, 31).unwrap()));
        assert_eq!(first.last_date_pattern(), Some(DatePattern::Compact));

        let second = DbfDecoder::new(Charset::default());
        assert!(second.last_date_pattern().is_none());
    }

    #[test]
    fn test_strings_trimmed_and_interned() {
        let f = field(FieldType::Character, 8, 0);
        let mut decoder = DbfDecoder::new(Charset::default());

        let a = decoder.decode_field(&record(b"Paris   "), &f);
        let b = decoder.decode_field(&record(b"Paris\0\0\0"), &f);
        assert_eq!(a, Value::from("Paris"));
        match (&a, &b) {
            (Value::String(x), Value::String(y)) => assert!(Arc::ptr_eq(x, y)),
            _ => panic!("expected strings"),
        }
        assert_eq!(decoder.interned_len(), 1);

        // Leading spaces are significant.
        assert_eq!(decoder.decode_field(&record(b"  Lyon  "), &f), Value::from("  Lyon"));
    }

    #[test]
    fn test_string_charset() {
        let f = field(FieldType::Character, 4, 0);
        let mut decoder = DbfDecoder::new(Charset::for_name("windows-1251"));
        let v = decoder.decode_field(&record(&[0xCC, 0xE8, 0xF0, b' ']), &f);
        assert_eq!(v, Value::from("Мир"));
    }

    #[test]
    fn test_unknown_tag_as_string() {
        assert_eq!(decode(FieldType::Other(b'M'), 4, 0, b"12  "), Value::from("12"));
    }

    #[test]
    fn test_field_past_record_end() {
        let mut decoder = DbfDecoder::new(Charset::default());
        let f = field(FieldType::Numeric, 10, 0);
        assert_eq!(decoder.decode_field(b" 12", &f), Value::Null);
    }

    #[test]
    fn test_total_over_garbage() {
        let tags = [
            FieldType::Character,
            FieldType::Numeric,
            FieldType::Float,
            FieldType::Date,
            FieldType::Logical,
            FieldType::Other(b'Q'),
        ];
        let mut decoder = DbfDecoder::new(Charset::default());
        let mut seed = 0x2545_F491u32;
        for _ in 0..500 {
            let mut bytes = [0u8; 12];
            for b in bytes.iter_mut() {
                seed ^= seed << 13;
                seed ^= seed >> 17;
                seed ^= seed << 5;
                *b = seed as u8;
            }
            for tag in tags {
                for decimals in [0, 2] {
                    let f = field(tag, 11, decimals);
                    let _ = decoder.decode_field(&bytes, &f);
                }
            }
        }
    }

    #[test]
    fn test_deleted_flag() {
        assert!(DbfDecoder::is_deleted(b"*abc"));
        assert!(!DbfDecoder::is_deleted(b" abc"));
        assert!(!DbfDecoder::is_deleted(b""));
    }
}
