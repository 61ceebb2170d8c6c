//! Writing `.shp` and `.shx` files.
//!
//! The output mirrors the layout the reader expects. Every record of a Z or
//! M type carries an M section filled with the "no data" value; missing Z
//! values are written as 0.

use byteorder::{BigEndian, LittleEndian, WriteBytesExt};

use crate::geometry::{is_clockwise, BoundingBox, Coordinate, Geometry, Polygon};
use crate::header::{ShpHeader, HEADER_SIZE, VERSION};
use crate::index::{ShapeIndex, ShapeIndexEntry};
use crate::shape_type::{ShapeFamily, ShapeType};
use crate::{Error, Result};

/// M value meaning "no measure" (anything below -1e38).
pub const NO_DATA: f64 = -1e40;

/// Serializes geometries of one shape type.
#[derive(Debug, Clone, Copy)]
pub struct ShapefileWriter {
    shape_type: ShapeType,
}

impl ShapefileWriter {
    pub fn new(shape_type: ShapeType) -> Self {
        Self { shape_type }
    }

    pub fn shape_type(&self) -> ShapeType {
        self.shape_type
    }

    /// Serialize `geometries` into `(shp, shx)` bytes.
    ///
    /// Empty geometries become null records. A geometry the shape type
    /// cannot hold fails with [`Error::GeometryMismatch`].
    pub fn write(&self, geometries: &[Geometry]) -> Result<(Vec<u8>, Vec<u8>)> {
        let mut shp = vec![0u8; HEADER_SIZE];
        let mut entries = Vec::with_capacity(geometries.len());
        let mut bbox: Option<BoundingBox> = None;
        let mut z_range: Option<(f64, f64)> = None;

        for (i, geometry) in geometries.iter().enumerate() {
            let content = self.encode(geometry)?;

            if let Some(b) = geometry.bounding_box() {
                match bbox.as_mut() {
                    Some(total) => total.merge(&b),
                    None => bbox = Some(b),
                }
            }
            geometry.for_each_coordinate(|c| {
                let z = z_or_zero(c.z);
                z_range = Some(match z_range {
                    Some((lo, hi)) => (lo.min(z), hi.max(z)),
                    None => (z, z),
                });
            });

            entries.push(ShapeIndexEntry {
                offset: shp.len(),
                content_length: content.len(),
            });
            shp.write_i32::<BigEndian>(i as i32 + 1)?;
            shp.write_i32::<BigEndian>((content.len() / 2) as i32)?;
            shp.extend_from_slice(&content);
        }

        let header = ShpHeader {
            file_length: shp.len(),
            version: VERSION,
            shape_type: self.shape_type,
            bbox: bbox.unwrap_or_default(),
            z_range: if self.shape_type.has_z() {
                z_range.unwrap_or_default()
            } else {
                (0.0, 0.0)
            },
            m_range: if self.shape_type.has_m() {
                (NO_DATA, NO_DATA)
            } else {
                (0.0, 0.0)
            },
        };
        let mut head = Vec::with_capacity(HEADER_SIZE);
        header.write_to(&mut head)?;
        shp[..HEADER_SIZE].copy_from_slice(&head);

        let mut shx = Vec::with_capacity(HEADER_SIZE + entries.len() * 8);
        ShapeIndex::write_to(&header, &entries, &mut shx)?;

        Ok((shp, shx))
    }

    /// Encode the content of one record.
    fn encode(&self, geometry: &Geometry) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        let family = match self.shape_type.family() {
            Some(family) if !geometry.is_empty() => family,
            _ => {
                out.write_i32::<LittleEndian>(ShapeType::Null.code())?;
                return Ok(out);
            }
        };

        out.write_i32::<LittleEndian>(self.shape_type.code())?;
        match (family, geometry) {
            (ShapeFamily::Point, Geometry::Point(c)) => {
                out.write_f64::<LittleEndian>(c.x)?;
                out.write_f64::<LittleEndian>(c.y)?;
                if self.shape_type.has_z() {
                    out.write_f64::<LittleEndian>(z_or_zero(c.z))?;
                }
                if self.shape_type.has_m() {
                    out.write_f64::<LittleEndian>(NO_DATA)?;
                }
            }
            (ShapeFamily::MultiPoint, Geometry::Point(c)) => {
                self.write_multipoint(&mut out, std::slice::from_ref(c))?;
            }
            (ShapeFamily::MultiPoint, Geometry::MultiPoint(points)) => {
                self.write_multipoint(&mut out, points)?;
            }
            (ShapeFamily::PolyLine, Geometry::LineString(line)) => {
                self.write_parts(&mut out, std::slice::from_ref(line))?;
            }
            (ShapeFamily::PolyLine, Geometry::MultiLineString(lines)) => {
                self.write_parts(&mut out, lines)?;
            }
            (ShapeFamily::Polygon, Geometry::Polygon(polygon)) => {
                self.write_parts(&mut out, &oriented_rings(std::slice::from_ref(polygon)))?;
            }
            (ShapeFamily::Polygon, Geometry::MultiPolygon(polygons)) => {
                self.write_parts(&mut out, &oriented_rings(polygons))?;
            }
            _ => {
                return Err(Error::GeometryMismatch {
                    shape_type: self.shape_type,
                    geometry: geometry.type_name(),
                })
            }
        }
        Ok(out)
    }

    fn write_multipoint(&self, out: &mut Vec<u8>, points: &[Coordinate]) -> Result<()> {
        write_bbox(out, points)?;
        out.write_i32::<LittleEndian>(points.len() as i32)?;
        self.write_coordinates(out, points)
    }

    fn write_parts(&self, out: &mut Vec<u8>, parts: &[Vec<Coordinate>]) -> Result<()> {
        let points: Vec<Coordinate> = parts.iter().flatten().copied().collect();
        write_bbox(out, &points)?;
        out.write_i32::<LittleEndian>(parts.len() as i32)?;
        out.write_i32::<LittleEndian>(points.len() as i32)?;
        let mut offset = 0;
        for part in parts {
            out.write_i32::<LittleEndian>(offset as i32)?;
            offset += part.len();
        }
        self.write_coordinates(out, &points)
    }

    /// XY pairs, then the Z and M sections the shape type calls for.
    fn write_coordinates(&self, out: &mut Vec<u8>, points: &[Coordinate]) -> Result<()> {
        for c in points {
            out.write_f64::<LittleEndian>(c.x)?;
            out.write_f64::<LittleEndian>(c.y)?;
        }
        if self.shape_type.has_z() {
            let zs: Vec<f64> = points.iter().map(|c| z_or_zero(c.z)).collect();
            let lo = zs.iter().copied().fold(f64::INFINITY, f64::min);
            let hi = zs.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            out.write_f64::<LittleEndian>(lo)?;
            out.write_f64::<LittleEndian>(hi)?;
            for z in zs {
                out.write_f64::<LittleEndian>(z)?;
            }
        }
        if self.shape_type.has_m() {
            for _ in 0..points.len() + 2 {
                out.write_f64::<LittleEndian>(NO_DATA)?;
            }
        }
        Ok(())
    }
}

#[inline]
fn z_or_zero(z: f64) -> f64 {
    if z.is_nan() {
        0.0
    } else {
        z
    }
}

fn write_bbox(out: &mut Vec<u8>, points: &[Coordinate]) -> Result<()> {
    let bbox = points
        .split_first()
        .map(|(first, rest)| {
            let mut bbox = BoundingBox::from_coordinate(first);
            rest.iter().for_each(|c| bbox.expand(c));
            bbox
        })
        .unwrap_or_default();
    for value in [bbox.min_x, bbox.min_y, bbox.max_x, bbox.max_y] {
        out.write_f64::<LittleEndian>(value)?;
    }
    Ok(())
}

/// Flatten polygons into rings with shells clockwise and holes
/// counter-clockwise.
fn oriented_rings(polygons: &[Polygon]) -> Vec<Vec<Coordinate>> {
    let mut rings = Vec::new();
    for polygon in polygons {
        for (i, ring) in polygon.rings.iter().enumerate() {
            let mut ring = ring.clone();
            if is_clockwise(&ring) != (i == 0) {
                ring.reverse();
            }
            rings.push(ring);
        }
    }
    rings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::ShapefileReader;

    fn round_trip(shape_type: ShapeType, geometries: &[Geometry]) -> Vec<Geometry> {
        let (shp, shx) = ShapefileWriter::new(shape_type).write(geometries).unwrap();
        let reader = ShapefileReader::new(&shp).unwrap().with_index(&shx);
        assert!(reader.index().is_some());
        assert_eq!(reader.header().shape_type, shape_type);
        reader.read_all().unwrap()
    }

    fn ring(x0: f64, y0: f64, size: f64, clockwise: bool, z: Option<f64>) -> Vec<Coordinate> {
        let at = |x: f64, y: f64| match z {
            Some(z) => Coordinate::new_3d(x, y, z),
            None => Coordinate::new(x, y),
        };
        let mut ring = vec![
            at(x0, y0),
            at(x0, y0 + size),
            at(x0 + size, y0 + size),
            at(x0 + size, y0),
            at(x0, y0),
        ];
        if !clockwise {
            ring.reverse();
        }
        ring
    }

    #[test]
    fn test_points() {
        let geometries = vec![
            Geometry::Point(Coordinate::new(1.5, -2.5)),
            Geometry::Point(Coordinate::new(100.0, 45.0)),
        ];
        assert_eq!(round_trip(ShapeType::Point, &geometries), geometries);
        assert_eq!(round_trip(ShapeType::PointM, &geometries), geometries);

        let with_z = vec![Geometry::Point(Coordinate::new_3d(1.0, 2.0, 3.0))];
        assert_eq!(round_trip(ShapeType::PointZ, &with_z), with_z);
    }

    #[test]
    fn test_lines() {
        let geometries = vec![
            Geometry::LineString(vec![Coordinate::new(0.0, 0.0), Coordinate::new(3.0, 4.0)]),
            Geometry::MultiLineString(vec![
                vec![Coordinate::new(0.0, 0.0), Coordinate::new(1.0, 0.0)],
                vec![
                    Coordinate::new(5.0, 5.0),
                    Coordinate::new(6.0, 5.0),
                    Coordinate::new(7.0, 6.0),
                ],
            ]),
        ];
        assert_eq!(round_trip(ShapeType::PolyLine, &geometries), geometries);
        assert_eq!(round_trip(ShapeType::PolyLineM, &geometries), geometries);
    }

    #[test]
    fn test_lines_with_z() {
        let geometries = vec![
            Geometry::LineString(vec![
                Coordinate::new_3d(0.0, 0.0, 10.0),
                Coordinate::new_3d(3.0, 4.0, 12.5),
            ]),
            Geometry::MultiLineString(vec![
                vec![Coordinate::new_3d(0.0, 0.0, 1.0), Coordinate::new_3d(1.0, 0.0, 2.0)],
                vec![
                    Coordinate::new_3d(5.0, 5.0, -3.0),
                    Coordinate::new_3d(6.0, 5.0, -4.0),
                    Coordinate::new_3d(7.0, 6.0, -5.0),
                ],
            ]),
        ];
        assert_eq!(round_trip(ShapeType::PolyLineZ, &geometries), geometries);

        let (shp, _) = ShapefileWriter::new(ShapeType::PolyLineZ).write(&geometries).unwrap();
        let header = ShapefileReader::new(&shp).unwrap().header().clone();
        assert_eq!(header.z_range, (-5.0, 12.5));
    }

    #[test]
    fn test_multipoints() {
        let flat = vec![
            Geometry::MultiPoint(vec![Coordinate::new(1.0, 1.0), Coordinate::new(-2.0, 3.0)]),
            Geometry::MultiPoint(vec![Coordinate::new(9.0, 9.0)]),
        ];
        assert_eq!(round_trip(ShapeType::MultiPoint, &flat), flat);
        assert_eq!(round_trip(ShapeType::MultiPointM, &flat), flat);

        let with_z = vec![Geometry::MultiPoint(vec![
            Coordinate::new_3d(1.0, 1.0, 100.0),
            Coordinate::new_3d(2.0, 2.0, 200.0),
            Coordinate::new_3d(3.0, 3.0, 300.0),
        ])];
        assert_eq!(round_trip(ShapeType::MultiPointZ, &with_z), with_z);

        // A lone point is written as a one-point multipoint.
        let read = round_trip(
            ShapeType::MultiPointZ,
            &[Geometry::Point(Coordinate::new_3d(4.0, 5.0, 6.0))],
        );
        assert_eq!(
            read,
            vec![Geometry::MultiPoint(vec![Coordinate::new_3d(4.0, 5.0, 6.0)])]
        );
    }

    #[test]
    fn test_polygons_with_and_without_z() {
        for z in [None, Some(7.5)] {
            let geometries = vec![
                Geometry::Polygon(Polygon::new(
                    ring(0.0, 0.0, 10.0, true, z),
                    vec![ring(2.0, 2.0, 2.0, false, z)],
                )),
                Geometry::MultiPolygon(vec![
                    Polygon::new(ring(0.0, 0.0, 1.0, true, z), vec![]),
                    Polygon::new(
                        ring(5.0, 5.0, 4.0, true, z),
                        vec![ring(6.0, 6.0, 1.0, false, z)],
                    ),
                ]),
            ];
            let shape_type = if z.is_some() {
                ShapeType::PolygonZ
            } else {
                ShapeType::Polygon
            };
            assert_eq!(round_trip(shape_type, &geometries), geometries);
        }
    }

    #[test]
    fn test_rings_reoriented() {
        let written = vec![Geometry::Polygon(Polygon::new(
            ring(0.0, 0.0, 10.0, false, None),
            vec![ring(2.0, 2.0, 2.0, true, None)],
        ))];
        let expected = vec![Geometry::Polygon(Polygon::new(
            ring(0.0, 0.0, 10.0, true, None),
            vec![ring(2.0, 2.0, 2.0, false, None)],
        ))];
        assert_eq!(round_trip(ShapeType::Polygon, &written), expected);
    }

    #[test]
    fn test_missing_z_written_as_zero() {
        let read = round_trip(
            ShapeType::PointZ,
            &[Geometry::Point(Coordinate::new(1.0, 2.0))],
        );
        assert_eq!(read, vec![Geometry::Point(Coordinate::new_3d(1.0, 2.0, 0.0))]);
    }

    #[test]
    fn test_empty_geometry_is_null_record() {
        let geometries = vec![
            Geometry::MultiLineString(vec![]),
            Geometry::LineString(vec![Coordinate::new(0.0, 0.0), Coordinate::new(1.0, 1.0)]),
        ];
        let (shp, _) = ShapefileWriter::new(ShapeType::PolyLine)
            .write(&geometries)
            .unwrap();
        assert_eq!(&shp[108..112], &0i32.to_le_bytes());
        assert_eq!(round_trip(ShapeType::PolyLine, &geometries), geometries);
    }

    #[test]
    fn test_header_extent() {
        let geometries = vec![
            Geometry::Point(Coordinate::new(-1.0, 5.0)),
            Geometry::Point(Coordinate::new(3.0, -2.0)),
        ];
        let (shp, shx) = ShapefileWriter::new(ShapeType::Point).write(&geometries).unwrap();
        let header = ShapefileReader::new(&shp).unwrap().header().clone();
        assert_eq!(header.file_length, shp.len());
        assert_eq!(header.bbox.min_x, -1.0);
        assert_eq!(header.bbox.max_y, 5.0);
        assert_eq!(shx.len(), HEADER_SIZE + 16);
    }

    #[test]
    fn test_geometry_mismatch() {
        let err = ShapefileWriter::new(ShapeType::Polygon)
            .write(&[Geometry::Point(Coordinate::new(0.0, 0.0))])
            .unwrap_err();
        assert!(matches!(
            err,
            Error::GeometryMismatch {
                geometry: "Point",
                ..
            }
        ));
    }
}
