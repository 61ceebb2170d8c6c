//! Decoded attribute values.

use std::fmt;
use std::sync::Arc;

use chrono::NaiveDate;

use crate::types::AttributeType;

/// A single decoded attribute value.
///
/// Strings are reference counted so that identical values decoded from the
/// same file share one allocation.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum Value {
    /// Missing or unparseable value.
    Null,
    /// Text value.
    String(Arc<str>),
    /// 32-bit integer.
    Integer(i32),
    /// 64-bit integer.
    Long(i64),
    /// Double precision number.
    Double(f64),
    /// Logical value.
    Boolean(bool),
    /// Calendar date.
    Date(NaiveDate),
}

impl Value {
    /// Check if this is the null value.
    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// The attribute type of this value, or `None` for null.
    pub fn attribute_type(&self) -> Option<AttributeType> {
        match self {
            Self::Null => None,
            Self::String(_) => Some(AttributeType::String),
            Self::Integer(_) => Some(AttributeType::Integer),
            Self::Long(_) => Some(AttributeType::Long),
            Self::Double(_) => Some(AttributeType::Double),
            Self::Boolean(_) => Some(AttributeType::Boolean),
            Self::Date(_) => Some(AttributeType::Date),
        }
    }

    /// Check whether this value may be stored in a column of type `ty`.
    ///
    /// Null conforms to every type; `Object` columns accept anything.
    pub fn conforms_to(&self, ty: AttributeType) -> bool {
        match self.attribute_type() {
            None => true,
            Some(_) if ty == AttributeType::Object => true,
            Some(actual) => actual == ty,
        }
    }

    /// Get as string slice if this is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get as i64 if this is an integer of either width.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(v) => Some(*v as i64),
            Self::Long(v) => Some(*v),
            _ => None,
        }
    }

    /// Get as f64 if this is numeric.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Integer(v) => Some(*v as f64),
            Self::Long(v) => Some(*v as f64),
            Self::Double(v) => Some(*v),
            _ => None,
        }
    }

    /// Get as bool if this is a logical value.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(v) => Some(*v),
            _ => None,
        }
    }

    /// Get as date if this is a date.
    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Self::Date(d) => Some(*d),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::String(s) => f.write_str(s),
            Self::Integer(v) => write!(f, "{}", v),
            Self::Long(v) => write!(f, "{}", v),
            Self::Double(v) => write!(f, "{}", v),
            Self::Boolean(v) => write!(f, "{}", v),
            Self::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(Arc::from(s))
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Integer(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Long(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Double(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Boolean(v)
    }
}

impl From<NaiveDate> for Value {
    fn from(d: NaiveDate) -> Self {
        Self::Date(d)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conformance() {
        assert!(Value::Null.conforms_to(AttributeType::Date));
        assert!(Value::from(3).conforms_to(AttributeType::Integer));
        assert!(!Value::from(3).conforms_to(AttributeType::Long));
        assert!(Value::from("x").conforms_to(AttributeType::Object));
        assert!(!Value::from(true).conforms_to(AttributeType::String));
    }

    #[test]
    fn test_accessors() {
        assert_eq!(Value::Long(7).as_i64(), Some(7));
        assert_eq!(Value::Integer(2).as_f64(), Some(2.0));
        assert_eq!(Value::from("abc").as_str(), Some("abc"));
        assert_eq!(Value::Null.as_bool(), None);
    }
}
