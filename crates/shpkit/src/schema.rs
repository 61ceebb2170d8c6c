//! Feature schemas.

use std::hash::BuildHasherDefault;

use hashbrown::HashMap;
use rustc_hash::FxHasher;
use shpkit_dbf::{AttributeType, FieldDefinition};
use tracing::warn;

/// Name of the synthetic geometry attribute every schema starts with.
pub const GEOMETRY_ATTRIBUTE: &str = "GEOMETRY";

type FxHashMap<K, V> = HashMap<K, V, BuildHasherDefault<FxHasher>>;

/// A named, typed attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct AttributeDescriptor {
    pub name: String,
    #[cfg_attr(feature = "serde", serde(rename = "type"))]
    pub attribute_type: AttributeType,
}

/// Ordered attribute list shared by all features of a collection.
///
/// Position 0 is always the geometry; feature values line up with positions
/// 1 and onwards.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct FeatureSchema {
    attributes: Vec<AttributeDescriptor>,
    #[cfg_attr(feature = "serde", serde(skip))]
    lookup: FxHashMap<String, usize>,
}

impl FeatureSchema {
    /// Build a schema from non-geometry attributes.
    ///
    /// A column that reuses the geometry name or an earlier name gets a
    /// numeric suffix.
    pub fn new(attributes: impl IntoIterator<Item = (String, AttributeType)>) -> Self {
        let mut schema = Self::geometry_only();
        for (name, attribute_type) in attributes {
            let unique = schema.unique_name(name);
            schema.lookup.insert(unique.clone(), schema.attributes.len());
            schema.attributes.push(AttributeDescriptor {
                name: unique,
                attribute_type,
            });
        }
        schema
    }

    /// A schema holding only the geometry attribute.
    pub fn geometry_only() -> Self {
        let mut lookup = FxHashMap::default();
        lookup.insert(GEOMETRY_ATTRIBUTE.to_string(), 0);
        Self {
            attributes: vec![AttributeDescriptor {
                name: GEOMETRY_ATTRIBUTE.to_string(),
                attribute_type: AttributeType::Geometry,
            }],
            lookup,
        }
    }

    /// Build a schema from DBF columns.
    pub fn from_fields(fields: &[FieldDefinition]) -> Self {
        Self::new(
            fields
                .iter()
                .map(|f| (f.name.clone(), f.attribute_type())),
        )
    }

    fn unique_name(&self, name: String) -> String {
        if !self.lookup.contains_key(&name) {
            return name;
        }
        let unique = (1..)
            .map(|n| format!("{name}_{n}"))
            .find(|candidate| !self.lookup.contains_key(candidate))
            .unwrap_or_default();
        warn!(column = %name, renamed = %unique, "renaming clashing attribute");
        unique
    }

    /// All attributes, geometry first.
    pub fn attributes(&self) -> &[AttributeDescriptor] {
        &self.attributes
    }

    /// The non-geometry attributes, in value order.
    pub fn value_attributes(&self) -> &[AttributeDescriptor] {
        &self.attributes[1..]
    }

    /// Number of attributes including the geometry.
    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    /// Always false; the geometry attribute is always present.
    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    /// Number of values each feature carries.
    pub fn value_count(&self) -> usize {
        self.attributes.len() - 1
    }

    /// Schema position of the attribute called `name`.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.lookup.get(name).copied()
    }

    /// The attribute at schema position `index`.
    pub fn attribute(&self, index: usize) -> Option<&AttributeDescriptor> {
        self.attributes.get(index)
    }
}

impl PartialEq for FeatureSchema {
    fn eq(&self, other: &Self) -> bool {
        self.attributes == other.attributes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shpkit_dbf::FieldType;

    #[test]
    fn test_from_fields() {
        let fields = vec![
            FieldDefinition::new("NAME", FieldType::Character, 20, 0),
            FieldDefinition::new("POP", FieldType::Numeric, 12, 0),
            FieldDefinition::new("AREA", FieldType::Numeric, 10, 2),
        ];
        let schema = FeatureSchema::from_fields(&fields);

        assert_eq!(schema.len(), 4);
        assert_eq!(schema.value_count(), 3);
        assert_eq!(schema.attributes()[0].attribute_type, AttributeType::Geometry);
        assert_eq!(schema.index_of("POP"), Some(2));
        assert_eq!(schema.attribute(2).unwrap().attribute_type, AttributeType::Long);
        assert_eq!(schema.attribute(3).unwrap().attribute_type, AttributeType::Double);
        assert_eq!(schema.index_of("MISSING"), None);
    }

    #[test]
    fn test_geometry_name_clash() {
        let schema = FeatureSchema::new([
            (GEOMETRY_ATTRIBUTE.to_string(), AttributeType::String),
            ("GEOMETRY_1".to_string(), AttributeType::Integer),
        ]);
        assert_eq!(schema.index_of(GEOMETRY_ATTRIBUTE), Some(0));
        assert_eq!(schema.attributes()[1].name, "GEOMETRY_1");
        assert_eq!(schema.attributes()[2].name, "GEOMETRY_1_1");
        assert_eq!(schema.index_of("GEOMETRY_1_1"), Some(2));
    }
}
