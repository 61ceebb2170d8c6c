//! Features and feature collections.

use shpkit_dbf::Value;
use shpkit_shp::Geometry;

use crate::schema::FeatureSchema;
use crate::{Error, Result};

/// One geometry with its attribute values.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Feature {
    geometry: Geometry,
    values: Vec<Value>,
}

impl Feature {
    /// Create a feature, checking `values` against `schema`.
    pub fn new(schema: &FeatureSchema, geometry: Geometry, values: Vec<Value>) -> Result<Self> {
        if values.len() != schema.value_count() {
            return Err(Error::Schema(format!(
                "expected {} values, got {}",
                schema.value_count(),
                values.len()
            )));
        }
        for (attribute, value) in schema.value_attributes().iter().zip(&values) {
            if !value.conforms_to(attribute.attribute_type) {
                return Err(Error::Schema(format!(
                    "attribute {} is {}, got {:?}",
                    attribute.name, attribute.attribute_type, value
                )));
            }
        }
        Ok(Self { geometry, values })
    }

    /// Create a feature whose attributes are all null.
    pub fn with_null_attributes(schema: &FeatureSchema, geometry: Geometry) -> Self {
        Self {
            geometry,
            values: vec![Value::Null; schema.value_count()],
        }
    }

    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    /// Replace the geometry.
    pub fn set_geometry(&mut self, geometry: Geometry) {
        self.geometry = geometry;
    }

    /// Attribute values in schema order, geometry excluded.
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Look up a value by attribute name.
    pub fn get(&self, schema: &FeatureSchema, name: &str) -> Option<&Value> {
        let index = schema.index_of(name)?;
        self.values.get(index.checked_sub(1)?)
    }

    pub fn into_parts(self) -> (Geometry, Vec<Value>) {
        (self.geometry, self.values)
    }
}

/// Features sharing one schema, in file order.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct FeatureCollection {
    schema: FeatureSchema,
    features: Vec<Feature>,
}

impl FeatureCollection {
    /// Create an empty collection.
    pub fn new(schema: FeatureSchema) -> Self {
        Self {
            schema,
            features: Vec::new(),
        }
    }

    pub(crate) fn with_capacity(schema: FeatureSchema, capacity: usize) -> Self {
        Self {
            schema,
            features: Vec::with_capacity(capacity),
        }
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    /// Validate and append a feature.
    pub fn push(&mut self, geometry: Geometry, values: Vec<Value>) -> Result<()> {
        let feature = Feature::new(&self.schema, geometry, values)?;
        self.features.push(feature);
        Ok(())
    }

    pub(crate) fn push_null_attributes(&mut self, geometry: Geometry) {
        let feature = Feature::with_null_attributes(&self.schema, geometry);
        self.features.push(feature);
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Feature> {
        self.features.iter()
    }

    pub fn into_features(self) -> Vec<Feature> {
        self.features
    }
}

impl<'a> IntoIterator for &'a FeatureCollection {
    type Item = &'a Feature;
    type IntoIter = std::slice::Iter<'a, Feature>;

    fn into_iter(self) -> Self::IntoIter {
        self.features.iter()
    }
}
