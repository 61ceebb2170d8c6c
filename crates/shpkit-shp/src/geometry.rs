//! In-memory geometry model.

use std::fmt;

/// A 2D or 3D coordinate. `z` is NaN when the source carries no elevation.
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Coordinate {
    pub x: f64,
    pub y: f64,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "is_nan"))]
    pub z: f64,
}

#[cfg(feature = "serde")]
fn is_nan(value: &f64) -> bool {
    value.is_nan()
}

impl Coordinate {
    /// Create a coordinate without elevation.
    #[inline]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y, z: f64::NAN }
    }

    /// Create a coordinate with elevation.
    #[inline]
    pub const fn new_3d(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Check whether an elevation is present.
    #[inline]
    pub fn has_z(&self) -> bool {
        !self.z.is_nan()
    }
}

/// Two missing elevations compare equal.
impl PartialEq for Coordinate {
    fn eq(&self, other: &Self) -> bool {
        self.x == other.x
            && self.y == other.y
            && (self.z == other.z || (self.z.is_nan() && other.z.is_nan()))
    }
}

/// A polygon: the first ring is the shell, the rest are holes.
///
/// Ring closure is not checked; rings are kept exactly as read.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Polygon {
    pub rings: Vec<Vec<Coordinate>>,
}

impl Polygon {
    /// Create a polygon from a shell and holes.
    pub fn new(shell: Vec<Coordinate>, holes: Vec<Vec<Coordinate>>) -> Self {
        let mut rings = Vec::with_capacity(holes.len() + 1);
        rings.push(shell);
        rings.extend(holes);
        Self { rings }
    }

    /// The outer ring.
    pub fn shell(&self) -> Option<&[Coordinate]> {
        self.rings.first().map(Vec::as_slice)
    }

    /// The inner rings.
    pub fn holes(&self) -> &[Vec<Coordinate>] {
        self.rings.get(1..).unwrap_or(&[])
    }
}

/// Twice the signed area of a ring; negative for clockwise rings.
pub fn signed_area2(ring: &[Coordinate]) -> f64 {
    if ring.len() < 3 {
        return 0.0;
    }
    let mut sum = 0.0;
    for pair in ring.windows(2) {
        sum += pair[0].x * pair[1].y - pair[1].x * pair[0].y;
    }
    let (first, last) = (ring[0], ring[ring.len() - 1]);
    sum + last.x * first.y - first.x * last.y
}

/// Check whether a ring winds clockwise (the shapefile shell orientation).
#[inline]
pub fn is_clockwise(ring: &[Coordinate]) -> bool {
    signed_area2(ring) < 0.0
}

/// A decoded shape.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(tag = "type", content = "coordinates"))]
pub enum Geometry {
    Point(Coordinate),
    MultiPoint(Vec<Coordinate>),
    LineString(Vec<Coordinate>),
    MultiLineString(Vec<Vec<Coordinate>>),
    Polygon(Polygon),
    MultiPolygon(Vec<Polygon>),
}

impl Geometry {
    /// Name of the variant.
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Point(_) => "Point",
            Self::MultiPoint(_) => "MultiPoint",
            Self::LineString(_) => "LineString",
            Self::MultiLineString(_) => "MultiLineString",
            Self::Polygon(_) => "Polygon",
            Self::MultiPolygon(_) => "MultiPolygon",
        }
    }

    /// Check whether the geometry has no coordinates.
    pub fn is_empty(&self) -> bool {
        self.num_points() == 0
    }

    /// Total number of coordinates.
    pub fn num_points(&self) -> usize {
        match self {
            Self::Point(_) => 1,
            Self::MultiPoint(points) | Self::LineString(points) => points.len(),
            Self::MultiLineString(lines) => lines.iter().map(Vec::len).sum(),
            Self::Polygon(polygon) => polygon.rings.iter().map(Vec::len).sum(),
            Self::MultiPolygon(polygons) => polygons
                .iter()
                .flat_map(|p| p.rings.iter())
                .map(Vec::len)
                .sum(),
        }
    }

    /// Visit every coordinate in storage order.
    pub fn for_each_coordinate(&self, mut f: impl FnMut(&Coordinate)) {
        match self {
            Self::Point(c) => f(c),
            Self::MultiPoint(points) | Self::LineString(points) => points.iter().for_each(f),
            Self::MultiLineString(lines) => lines.iter().flatten().for_each(f),
            Self::Polygon(polygon) => polygon.rings.iter().flatten().for_each(f),
            Self::MultiPolygon(polygons) => polygons
                .iter()
                .flat_map(|p| p.rings.iter())
                .flatten()
                .for_each(f),
        }
    }

    /// The XY extent, or `None` when empty.
    pub fn bounding_box(&self) -> Option<BoundingBox> {
        let mut bbox: Option<BoundingBox> = None;
        self.for_each_coordinate(|c| match bbox.as_mut() {
            Some(b) => b.expand(c),
            None => bbox = Some(BoundingBox::from_coordinate(c)),
        });
        bbox
    }
}

impl fmt::Display for Geometry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{} points]", self.type_name(), self.num_points())
    }
}

/// An axis-aligned XY extent.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BoundingBox {
    /// A zero-area box around one coordinate.
    pub fn from_coordinate(c: &Coordinate) -> Self {
        Self {
            min_x: c.x,
            min_y: c.y,
            max_x: c.x,
            max_y: c.y,
        }
    }

    /// Grow the box to include `c`.
    pub fn expand(&mut self, c: &Coordinate) {
        self.min_x = self.min_x.min(c.x);
        self.min_y = self.min_y.min(c.y);
        self.max_x = self.max_x.max(c.x);
        self.max_y = self.max_y.max(c.y);
    }

    /// Grow the box to include `other`.
    pub fn merge(&mut self, other: &BoundingBox) {
        self.min_x = self.min_x.min(other.min_x);
        self.min_y = self.min_y.min(other.min_y);
        self.max_x = self.max_x.max(other.max_x);
        self.max_y = self.max_y.max(other.max_y);
    }
}
