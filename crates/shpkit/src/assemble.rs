//! Pairing geometries with attribute rows.

use shpkit_dbf::DbfTable;
use shpkit_shp::{Geometry, ShapeType};
use tracing::{debug, warn};

use crate::feature::FeatureCollection;
use crate::schema::FeatureSchema;
use crate::Result;

/// Build a feature collection from decoded geometries and an optional table.
///
/// Without a table every geometry becomes a feature with no attributes.
/// Otherwise geometries and rows are paired by position; rows flagged as
/// deleted are dropped together with their geometry unless
/// `include_deleted` is set. When the counts differ, surplus geometries get
/// null attributes and surplus rows get the empty geometry of `shape_type`.
pub fn assemble(
    shape_type: ShapeType,
    geometries: Vec<Geometry>,
    table: Option<DbfTable>,
    include_deleted: bool,
) -> Result<FeatureCollection> {
    let Some(table) = table else {
        let mut collection =
            FeatureCollection::with_capacity(FeatureSchema::geometry_only(), geometries.len());
        for geometry in geometries {
            collection.push(geometry, Vec::new())?;
        }
        return Ok(collection);
    };

    let schema = FeatureSchema::from_fields(&table.fields);
    let (shapes, rows) = (geometries.len(), table.rows.len());
    if shapes != rows {
        warn!(
            shapes,
            rows, "shp and dbf record counts differ, padding the shorter side"
        );
    }

    let mut collection = FeatureCollection::with_capacity(schema, shapes.max(rows));
    let mut geometries = geometries.into_iter();
    let mut rows = table.rows.into_iter();
    let mut skipped = 0usize;

    loop {
        let (geometry, row) = match (geometries.next(), rows.next()) {
            (None, None) => break,
            (Some(geometry), None) => {
                collection.push_null_attributes(geometry);
                continue;
            }
            (geometry, Some(row)) => (geometry, row),
        };
        if row.deleted && !include_deleted {
            skipped += 1;
            continue;
        }
        let geometry = geometry.unwrap_or_else(|| shape_type.empty_geometry());
        collection.push(geometry, row.values)?;
    }

    debug!(
        features = collection.len(),
        skipped_deleted = skipped,
        "assembled features"
    );
    Ok(collection)
}

#[cfg(test)]
mod tests {
    use super::*;
    use shpkit_dbf::{Charset, DbfWriter, FieldDefinition, FieldType, Value};
    use shpkit_shp::Coordinate;

    fn points(n: usize) -> Vec<Geometry> {
        (0..n)
            .map(|i| Geometry::Point(Coordinate::new(i as f64, i as f64)))
            .collect()
    }

    fn table(names: &[&str], deleted: &[usize]) -> DbfTable {
        let mut writer = DbfWriter::new(
            vec![
                FieldDefinition::new("NAME", FieldType::Character, 10, 0),
                FieldDefinition::new("RANK", FieldType::Numeric, 4, 0),
            ],
            Charset::default(),
        );
        for (i, name) in names.iter().enumerate() {
            let row = vec![Value::from(*name), Value::Integer(i as i32)];
            if deleted.contains(&i) {
                writer.push_deleted_row(row);
            } else {
                writer.push_row(row);
            }
        }
        let bytes = writer.to_bytes().unwrap();
        DbfTable::read(&bytes, &Charset::default()).unwrap()
    }

    #[test]
    fn test_geometry_only() {
        let collection = assemble(ShapeType::Point, points(3), None, false).unwrap();
        assert_eq!(collection.len(), 3);
        assert_eq!(collection.schema().len(), 1);
        assert!(collection.iter().all(|f| f.values().is_empty()));
    }

    #[test]
    fn test_equal_counts() {
        let collection = assemble(
            ShapeType::Point,
            points(3),
            Some(table(&["a", "b", "c"], &[])),
            false,
        )
        .unwrap();
        assert_eq!(collection.len(), 3);
        for (i, feature) in collection.iter().enumerate() {
            assert_eq!(feature.values().len(), collection.schema().value_count());
            assert_eq!(feature.values()[1], Value::Integer(i as i32));
            assert_eq!(feature.geometry(), &points(3)[i]);
        }
    }

    #[test]
    fn test_more_rows_than_shapes() {
        let collection = assemble(
            ShapeType::Point,
            points(2),
            Some(table(&["a", "b", "c"], &[])),
            false,
        )
        .unwrap();
        assert_eq!(collection.len(), 3);
        assert!(collection.features()[2].geometry().is_empty());
        assert_eq!(collection.features()[2].values()[0], Value::from("c"));
    }

    #[test]
    fn test_more_shapes_than_rows() {
        let collection = assemble(
            ShapeType::Point,
            points(3),
            Some(table(&["a"], &[])),
            false,
        )
        .unwrap();
        assert_eq!(collection.len(), 3);
        assert_eq!(collection.features()[2].values(), &[Value::Null, Value::Null]);
        assert_eq!(collection.features()[2].geometry(), &points(3)[2]);
    }

    #[test]
    fn test_deleted_rows() {
        let skipped = assemble(
            ShapeType::Point,
            points(3),
            Some(table(&["a", "b", "c"], &[1])),
            false,
        )
        .unwrap();
        assert_eq!(skipped.len(), 2);
        assert_eq!(skipped.features()[1].geometry(), &points(3)[2]);

        let kept = assemble(
            ShapeType::Point,
            points(3),
            Some(table(&["a", "b", "c"], &[1])),
            true,
        )
        .unwrap();
        assert_eq!(kept.len(), 3);
    }
}
