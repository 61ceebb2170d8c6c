//! Shape type codes.

use std::fmt;

use crate::geometry::Geometry;

/// The geometry family shared by a base shape type and its Z/M variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShapeFamily {
    Point,
    MultiPoint,
    PolyLine,
    Polygon,
}

/// Shape type of a `.shp` file or record.
///
/// Z variants are offset by 10 from their base type and M variants by 20.
/// Z variants may additionally carry M values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum ShapeType {
    Null = 0,
    Point = 1,
    PolyLine = 3,
    Polygon = 5,
    MultiPoint = 8,
    PointZ = 11,
    PolyLineZ = 13,
    PolygonZ = 15,
    MultiPointZ = 18,
    PointM = 21,
    PolyLineM = 23,
    PolygonM = 25,
    MultiPointM = 28,
}

impl ShapeType {
    /// Map a raw type code. MultiPatch (31) and unknown codes yield `None`.
    pub fn from_code(code: i32) -> Option<Self> {
        Some(match code {
            0 => Self::Null,
            1 => Self::Point,
            3 => Self::PolyLine,
            5 => Self::Polygon,
            8 => Self::MultiPoint,
            11 => Self::PointZ,
            13 => Self::PolyLineZ,
            15 => Self::PolygonZ,
            18 => Self::MultiPointZ,
            21 => Self::PointM,
            23 => Self::PolyLineM,
            25 => Self::PolygonM,
            28 => Self::MultiPointM,
            _ => return None,
        })
    }

    /// The raw type code.
    #[inline]
    pub const fn code(self) -> i32 {
        self as i32
    }

    /// The geometry family, or `None` for the null type.
    pub const fn family(self) -> Option<ShapeFamily> {
        match self {
            Self::Null => None,
            Self::Point | Self::PointZ | Self::PointM => Some(ShapeFamily::Point),
            Self::MultiPoint | Self::MultiPointZ | Self::MultiPointM => {
                Some(ShapeFamily::MultiPoint)
            }
            Self::PolyLine | Self::PolyLineZ | Self::PolyLineM => Some(ShapeFamily::PolyLine),
            Self::Polygon | Self::PolygonZ | Self::PolygonM => Some(ShapeFamily::Polygon),
        }
    }

    /// Records carry a Z range and one Z value per point.
    pub const fn has_z(self) -> bool {
        matches!(
            self,
            Self::PointZ | Self::PolyLineZ | Self::PolygonZ | Self::MultiPointZ
        )
    }

    /// Records may carry an M range and one M value per point.
    pub const fn has_m(self) -> bool {
        self.has_z()
            || matches!(
                self,
                Self::PointM | Self::PolyLineM | Self::PolygonM | Self::MultiPointM
            )
    }

    /// The geometry a null record of this type decodes to.
    ///
    /// Point files have no empty point, so they use an empty multipoint.
    pub fn empty_geometry(self) -> Geometry {
        match self.family() {
            Some(ShapeFamily::PolyLine) => Geometry::MultiLineString(Vec::new()),
            Some(ShapeFamily::Polygon) => Geometry::MultiPolygon(Vec::new()),
            Some(ShapeFamily::Point) | Some(ShapeFamily::MultiPoint) | None => {
                Geometry::MultiPoint(Vec::new())
            }
        }
    }

    /// Human readable name.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Null => "Null",
            Self::Point => "Point",
            Self::PolyLine => "PolyLine",
            Self::Polygon => "Polygon",
            Self::MultiPoint => "MultiPoint",
            Self::PointZ => "PointZ",
            Self::PolyLineZ => "PolyLineZ",
            Self::PolygonZ => "PolygonZ",
            Self::MultiPointZ => "MultiPointZ",
            Self::PointM => "PointM",
            Self::PolyLineM => "PolyLineM",
            Self::PolygonM => "PolygonM",
            Self::MultiPointM => "MultiPointM",
        }
    }
}

impl fmt::Display for ShapeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name(), self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_round_trip() {
        for code in -1..40 {
            if let Some(ty) = ShapeType::from_code(code) {
                assert_eq!(ty.code(), code);
            }
        }
        assert_eq!(ShapeType::from_code(31), None);
        assert_eq!(ShapeType::from_code(2), None);
    }

    #[test]
    fn test_dimensions() {
        assert!(ShapeType::PolygonZ.has_z());
        assert!(ShapeType::PolygonZ.has_m());
        assert!(!ShapeType::PolygonM.has_z());
        assert!(ShapeType::PolygonM.has_m());
        assert!(!ShapeType::Polygon.has_m());
        assert_eq!(ShapeType::MultiPointM.family(), Some(ShapeFamily::MultiPoint));
        assert_eq!(ShapeType::Null.family(), None);
    }

    #[test]
    fn test_empty_geometry() {
        assert!(ShapeType::PolyLineZ.empty_geometry().is_empty());
        assert_eq!(
            ShapeType::PolyLine.empty_geometry(),
            Geometry::MultiLineString(Vec::new())
        );
    }
}
