//! Decoding of individual `.shp` records.
//!
//! Every record starts with an 8-byte big-endian header (record number and
//! content length in 16-bit words) followed by little-endian content that
//! begins with the shape type code. The layout of the content depends on the
//! shape family:
//!
//! | Family     | Content after the type code                                   |
//! |------------|---------------------------------------------------------------|
//! | Point      | x, y                                                          |
//! | MultiPoint | bbox, numPoints, points                                       |
//! | PolyLine   | bbox, numParts, numPoints, part offsets, points               |
//! | Polygon    | same as PolyLine, parts are rings                             |
//!
//! Z types append a Z range and one Z per point. Z and M types may append an
//! M range and one M per point; whether they do is only visible from the
//! content length. M values are read past and discarded.

use shpkit_common::{BinaryReader, Endian};
use tracing::debug;

use crate::geometry::{is_clockwise, Coordinate, Geometry, Polygon};
use crate::shape_type::{ShapeFamily, ShapeType};
use crate::{Error, Result};

/// Size of the per-record header in bytes.
pub const RECORD_HEADER_SIZE: usize = 8;

/// The header in front of every record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordHeader {
    /// 1-based record number.
    pub number: i32,
    /// Length of the record content in bytes.
    pub content_length: usize,
}

impl RecordHeader {
    /// Read a record header, leaving the reader little-endian.
    pub fn load(reader: &mut BinaryReader<'_>) -> Result<Self> {
        reader.set_endian(Endian::Big);
        let number = reader.read_i32()?;
        let words = reader.read_i32()?;
        reader.set_endian(Endian::Little);

        if words < 0 {
            return Err(Error::MalformedRecord {
                record: number,
                reason: format!("negative content length {words}"),
            });
        }
        Ok(Self {
            number,
            content_length: words as usize * 2,
        })
    }
}

/// Decode the content of one record of a file whose header declares
/// `expected`.
///
/// A null shape (code 0) yields the empty geometry of the file's family. Any
/// other code that differs from `expected` is a format error. On success the
/// reader is positioned at the end of the declared content.
pub fn read_record(
    reader: &mut BinaryReader<'_>,
    expected: ShapeType,
    header: RecordHeader,
) -> Result<Geometry> {
    reader.set_endian(Endian::Little);
    let start = reader.position();
    let mut content = RecordContent {
        reader,
        start,
        length: header.content_length,
        record: header.number,
        shape_type: expected,
    };

    let code = content.reader.read_i32()?;
    let geometry = if code == ShapeType::Null.code() {
        expected.empty_geometry()
    } else if code != expected.code() {
        return Err(Error::ShapeTypeMismatch {
            record: header.number,
            expected,
            actual: code,
        });
    } else {
        match expected.family() {
            Some(ShapeFamily::Point) => content.read_point()?,
            Some(ShapeFamily::MultiPoint) => content.read_multipoint()?,
            Some(ShapeFamily::PolyLine) => content.read_polyline()?,
            Some(ShapeFamily::Polygon) => content.read_polygon()?,
            None => expected.empty_geometry(),
        }
    };

    content.skip_remaining()?;
    Ok(geometry)
}

/// Cursor over the content of a single record.
struct RecordContent<'r, 'a> {
    reader: &'r mut BinaryReader<'a>,
    start: usize,
    length: usize,
    record: i32,
    shape_type: ShapeType,
}

impl RecordContent<'_, '_> {
    fn consumed(&self) -> usize {
        self.reader.position() - self.start
    }

    fn left(&self) -> usize {
        self.length.saturating_sub(self.consumed())
    }

    fn malformed(&self, reason: impl Into<String>) -> Error {
        Error::MalformedRecord {
            record: self.record,
            reason: reason.into(),
        }
    }

    fn read_count(&mut self, what: &str) -> Result<usize> {
        let value = self.reader.read_i32()?;
        if value < 0 {
            return Err(self.malformed(format!("negative {what} {value}")));
        }
        Ok(value as usize)
    }

    fn read_coordinates(&mut self, count: usize) -> Result<Vec<Coordinate>> {
        let flat = self.reader.read_f64_vec(count.saturating_mul(2))?;
        Ok(flat
            .chunks_exact(2)
            .map(|xy| Coordinate::new(xy[0], xy[1]))
            .collect())
    }

    /// Read the Z range and per-point Z values into `coords`.
    ///
    /// Content too short to hold them leaves Z unset.
    fn read_z(&mut self, coords: &mut [Coordinate]) -> Result<()> {
        if !self.shape_type.has_z() {
            return Ok(());
        }
        let needed = 16usize.saturating_add(coords.len().saturating_mul(8));
        if self.left() < needed {
            debug!(record = self.record, left = self.left(), "record has no Z section");
            return Ok(());
        }
        self.reader.skip(16)?;
        let zs = self.reader.read_f64_vec(coords.len())?;
        for (c, z) in coords.iter_mut().zip(zs) {
            c.z = z;
        }
        Ok(())
    }

    /// Skip the M range and values when the content is long enough to hold
    /// them.
    fn skip_m(&mut self, points: usize) -> Result<()> {
        if !self.shape_type.has_m() {
            return Ok(());
        }
        let needed = 16 + 8 * points;
        if self.left() >= needed {
            self.reader.skip(needed)?;
        }
        Ok(())
    }

    fn skip_remaining(&mut self) -> Result<()> {
        let consumed = self.consumed();
        if consumed > self.length {
            return Err(self.malformed(format!(
                "content needs {consumed} bytes but declares {}",
                self.length
            )));
        }
        let left = self.length - consumed;
        if left > 0 {
            debug!(record = self.record, bytes = left, "skipping unread record content");
            self.reader.skip(left)?;
        }
        Ok(())
    }

    fn read_point(&mut self) -> Result<Geometry> {
        let x = self.reader.read_f64()?;
        let y = self.reader.read_f64()?;
        let mut coordinate = Coordinate::new(x, y);
        if self.shape_type.has_z() && self.left() >= 8 {
            coordinate.z = self.reader.read_f64()?;
        }
        if self.shape_type.has_m() && self.left() >= 8 {
            self.reader.skip(8)?;
        }
        Ok(Geometry::Point(coordinate))
    }

    fn read_multipoint(&mut self) -> Result<Geometry> {
        self.reader.skip(32)?;
        let num_points = self.read_count("point count")?;
        let mut points = self.read_coordinates(num_points)?;
        self.read_z(&mut points)?;
        self.skip_m(num_points)?;
        Ok(Geometry::MultiPoint(points))
    }

    /// Read the shared PolyLine/Polygon layout and split it into parts.
    fn read_parts(&mut self) -> Result<Vec<Vec<Coordinate>>> {
        self.reader.skip(32)?;
        let num_parts = self.read_count("part count")?;
        let num_points = self.read_count("point count")?;

        self.reader.peek_bytes(num_parts.saturating_mul(4))?;
        let mut offsets = Vec::with_capacity(num_parts);
        for _ in 0..num_parts {
            offsets.push(self.read_count("part offset")?);
        }

        let mut points = self.read_coordinates(num_points)?;
        self.read_z(&mut points)?;
        self.skip_m(num_points)?;

        let mut parts = Vec::with_capacity(num_parts);
        for (i, &begin) in offsets.iter().enumerate() {
            let end = offsets.get(i + 1).copied().unwrap_or(num_points);
            if begin > end || end > num_points {
                return Err(self.malformed(format!(
                    "part {i} spans points {begin}..{end} of {num_points}"
                )));
            }
            parts.push(points[begin..end].to_vec());
        }
        Ok(parts)
    }

    fn read_polyline(&mut self) -> Result<Geometry> {
        let mut parts = self.read_parts()?;
        Ok(if parts.len() == 1 {
            Geometry::LineString(parts.remove(0))
        } else {
            Geometry::MultiLineString(parts)
        })
    }

    fn read_polygon(&mut self) -> Result<Geometry> {
        let rings = self.read_parts()?;
        let mut polygons = assemble_polygons(rings);
        Ok(if polygons.len() == 1 {
            Geometry::Polygon(polygons.remove(0))
        } else {
            Geometry::MultiPolygon(polygons)
        })
    }
}

/// Group rings into polygons by orientation.
///
/// Clockwise rings start a new polygon; counter-clockwise rings are holes of
/// the polygon before them. A hole with no preceding shell becomes a shell.
pub fn assemble_polygons(rings: Vec<Vec<Coordinate>>) -> Vec<Polygon> {
    let mut polygons: Vec<Polygon> = Vec::new();
    for ring in rings {
        match polygons.last_mut() {
            Some(current) if !is_clockwise(&ring) => current.rings.push(ring),
            _ => polygons.push(Polygon { rings: vec![ring] }),
        }
    }
    polygons
}

#[cfg(test)]
mod tests {
    use super::*;
    use byteorder::{BigEndian, LittleEndian, WriteBytesExt};

    /// Build a record (header + content) by hand.
    fn record(number: i32, content: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        out.write_i32::<BigEndian>(number).unwrap();
        out.write_i32::<BigEndian>((content.len() / 2) as i32).unwrap();
        out.extend_from_slice(content);
        out
    }

    fn decode(expected: ShapeType, bytes: &[u8]) -> Result<Geometry> {
        let mut reader = BinaryReader::new(bytes);
        let header = RecordHeader::load(&mut reader)?;
        let geometry = read_record(&mut reader, expected, header)?;
        assert_eq!(reader.position(), bytes.len(), "reader left mid-record");
        Ok(geometry)
    }

    fn polyline_content(code: i32, parts: &[i32], points: &[(f64, f64)]) -> Vec<u8> {
        let mut c = Vec::new();
        c.write_i32::<LittleEndian>(code).unwrap();
        for _ in 0..4 {
            c.write_f64::<LittleEndian>(0.0).unwrap();
        }
        c.write_i32::<LittleEndian>(parts.len() as i32).unwrap();
        c.write_i32::<LittleEndian>(points.len() as i32).unwrap();
        for p in parts {
            c.write_i32::<LittleEndian>(*p).unwrap();
        }
        for (x, y) in points {
            c.write_f64::<LittleEndian>(*x).unwrap();
            c.write_f64::<LittleEndian>(*y).unwrap();
        }
        c
    }

    #[test]
    fn test_single_part_polyline_is_linestring() {
        let content = polyline_content(3, &[0], &[(0.0, 0.0), (1.0, 1.0), (2.0, 0.0)]);
        let geometry = decode(ShapeType::PolyLine, &record(1, &content)).unwrap();
        assert_eq!(
            geometry,
            Geometry::LineString(vec![
                Coordinate::new(0.0, 0.0),
                Coordinate::new(1.0, 1.0),
                Coordinate::new(2.0, 0.0),
            ])
        );
    }

    #[test]
    fn test_multi_part_polyline() {
        let content = polyline_content(3, &[0, 2], &[(0.0, 0.0), (1.0, 1.0), (5.0, 5.0), (6.0, 6.0)]);
        match decode(ShapeType::PolyLine, &record(1, &content)).unwrap() {
            Geometry::MultiLineString(lines) => {
                assert_eq!(lines.len(), 2);
                assert_eq!(lines[0].len(), 2);
                assert_eq!(lines[1][1], Coordinate::new(6.0, 6.0));
            }
            other => panic!("expected MultiLineString, got {other}"),
        }
    }

    #[test]
    fn test_null_record_is_empty_family_geometry() {
        let content = 0i32.to_le_bytes();
        let geometry = decode(ShapeType::PolyLine, &record(1, &content)).unwrap();
        assert_eq!(geometry, Geometry::MultiLineString(vec![]));
    }

    #[test]
    fn test_type_mismatch_is_fatal() {
        let content = polyline_content(5, &[0], &[(0.0, 0.0)]);
        match decode(ShapeType::PolyLine, &record(7, &content)) {
            Err(Error::ShapeTypeMismatch {
                record,
                expected,
                actual,
            }) => {
                assert_eq!(record, 7);
                assert_eq!(expected, ShapeType::PolyLine);
                assert_eq!(actual, 5);
            }
            other => panic!("expected mismatch, got {other:?}"),
        }
    }

    #[test]
    fn test_bad_part_offsets() {
        let content = polyline_content(3, &[0, 5], &[(0.0, 0.0), (1.0, 1.0)]);
        assert!(matches!(
            decode(ShapeType::PolyLine, &record(1, &content)),
            Err(Error::MalformedRecord { .. })
        ));
    }

    #[test]
    fn test_huge_point_count_is_truncation() {
        let mut content = Vec::new();
        content.write_i32::<LittleEndian>(8).unwrap();
        content.extend_from_slice(&[0u8; 32]);
        content.write_i32::<LittleEndian>(i32::MAX).unwrap();
        let err = decode(ShapeType::MultiPoint, &record(1, &content)).unwrap_err();
        assert!(matches!(err, Error::Common(shpkit_common::Error::Truncated { .. })));
    }

    #[test]
    fn test_point_z_with_and_without_m() {
        let mut base = Vec::new();
        base.write_i32::<LittleEndian>(11).unwrap();
        for v in [1.0, 2.0, 3.0] {
            base.write_f64::<LittleEndian>(v).unwrap();
        }
        let expected = Geometry::Point(Coordinate::new_3d(1.0, 2.0, 3.0));
        assert_eq!(decode(ShapeType::PointZ, &record(1, &base)).unwrap(), expected);

        let mut with_m = base.clone();
        with_m.write_f64::<LittleEndian>(-1e40).unwrap();
        assert_eq!(decode(ShapeType::PointZ, &record(1, &with_m)).unwrap(), expected);
    }

    #[test]
    fn test_short_z_record_keeps_stream_aligned() {
        let mut short = Vec::new();
        short.write_i32::<LittleEndian>(11).unwrap();
        short.write_f64::<LittleEndian>(1.0).unwrap();
        short.write_f64::<LittleEndian>(2.0).unwrap();
        let mut full = Vec::new();
        full.write_i32::<LittleEndian>(11).unwrap();
        for v in [4.0, 5.0, 6.0] {
            full.write_f64::<LittleEndian>(v).unwrap();
        }
        let mut bytes = record(1, &short);
        bytes.extend(record(2, &full));

        let mut reader = BinaryReader::new(&bytes);
        let header = RecordHeader::load(&mut reader).unwrap();
        let first = read_record(&mut reader, ShapeType::PointZ, header).unwrap();
        assert_eq!(first, Geometry::Point(Coordinate::new(1.0, 2.0)));

        let header = RecordHeader::load(&mut reader).unwrap();
        assert_eq!(header.number, 2);
        let second = read_record(&mut reader, ShapeType::PointZ, header).unwrap();
        assert_eq!(second, Geometry::Point(Coordinate::new_3d(4.0, 5.0, 6.0)));
        assert!(reader.is_empty());
    }

    #[test]
    fn test_short_z_polyline_has_no_z() {
        let content = polyline_content(13, &[0], &[(0.0, 0.0), (1.0, 1.0)]);
        let geometry = decode(ShapeType::PolyLineZ, &record(1, &content)).unwrap();
        assert_eq!(
            geometry,
            Geometry::LineString(vec![Coordinate::new(0.0, 0.0), Coordinate::new(1.0, 1.0)])
        );
    }

    #[test]
    fn test_content_overrunning_declared_length() {
        let mut content = Vec::new();
        content.write_i32::<LittleEndian>(1).unwrap();
        content.write_f64::<LittleEndian>(1.0).unwrap();
        content.write_f64::<LittleEndian>(2.0).unwrap();
        let mut bytes = record(1, &content);
        // Declare only the type code and x.
        bytes[4..8].copy_from_slice(&6i32.to_be_bytes());

        let mut reader = BinaryReader::new(&bytes);
        let header = RecordHeader::load(&mut reader).unwrap();
        assert!(matches!(
            read_record(&mut reader, ShapeType::Point, header),
            Err(Error::MalformedRecord { record: 1, .. })
        ));
    }

    #[test]
    fn test_polyline_m_optional() {
        let mut content = polyline_content(23, &[0], &[(0.0, 0.0), (1.0, 0.0)]);
        let without_m = decode(ShapeType::PolyLineM, &record(1, &content)).unwrap();

        for v in [0.0, 1.0, 10.0, 11.0] {
            content.write_f64::<LittleEndian>(v).unwrap();
        }
        let with_m = decode(ShapeType::PolyLineM, &record(1, &content)).unwrap();
        assert_eq!(without_m, with_m);
        assert!(matches!(with_m, Geometry::LineString(ref c) if !c[0].has_z()));
    }

    #[test]
    fn test_trailing_content_skipped() {
        let mut content = Vec::new();
        content.write_i32::<LittleEndian>(1).unwrap();
        content.write_f64::<LittleEndian>(4.0).unwrap();
        content.write_f64::<LittleEndian>(5.0).unwrap();
        content.extend_from_slice(&[0xEE; 6]);
        let mut bytes = record(1, &content);
        bytes.extend(record(2, &content));

        let mut reader = BinaryReader::new(&bytes);
        for number in 1..=2 {
            let header = RecordHeader::load(&mut reader).unwrap();
            assert_eq!(header.number, number);
            let g = read_record(&mut reader, ShapeType::Point, header).unwrap();
            assert_eq!(g, Geometry::Point(Coordinate::new(4.0, 5.0)));
        }
        assert!(reader.is_empty());
    }

    #[test]
    fn test_polygon_grouping() {
        let shell = |x0: f64| {
            vec![
                Coordinate::new(x0, 0.0),
                Coordinate::new(x0, 10.0),
                Coordinate::new(x0 + 10.0, 10.0),
                Coordinate::new(x0 + 10.0, 0.0),
                Coordinate::new(x0, 0.0),
            ]
        };
        let hole = |x0: f64| {
            let mut ring = shell(x0);
            ring.reverse();
            ring
        };

        let polygons = assemble_polygons(vec![shell(0.0), hole(2.0), shell(20.0), hole(22.0), hole(24.0)]);
        assert_eq!(polygons.len(), 2);
        assert_eq!(polygons[0].rings.len(), 2);
        assert_eq!(polygons[1].rings.len(), 3);

        // A leading hole is promoted to a shell.
        let polygons = assemble_polygons(vec![hole(0.0), hole(2.0)]);
        assert_eq!(polygons.len(), 1);
        assert_eq!(polygons[0].rings.len(), 2);
    }
}
