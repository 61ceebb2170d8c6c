//! Attribute type system shared by DBF fields and feature schemas.

use std::fmt;

/// The value type of a feature attribute.
///
/// Every DBF field maps to exactly one of these; `Geometry` is reserved for
/// the synthetic geometry column of a feature schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "UPPERCASE"))]
pub enum AttributeType {
    Boolean,
    Date,
    Double,
    Geometry,
    Integer,
    Long,
    Object,
    String,
}

impl AttributeType {
    /// Upper-case name of the type.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Boolean => "BOOLEAN",
            Self::Date => "DATE",
            Self::Double => "DOUBLE",
            Self::Geometry => "GEOMETRY",
            Self::Integer => "INTEGER",
            Self::Long => "LONG",
            Self::Object => "OBJECT",
            Self::String => "STRING",
        }
    }
}

impl fmt::Display for AttributeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
