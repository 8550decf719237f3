//! Zone polygon and the builder used to collect its vertices

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::geometry::{point_in_polygon, BoundingBox, Point};
use crate::ZoneError;

/// Minimum number of vertices for a zone polygon
pub const MIN_VERTICES: usize = 3;

/// Restricted zone as an implicitly closed polygon (last vertex joins the first).
///
/// Immutable once built. Self-intersection is not checked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Point>", into = "Vec<Point>")]
pub struct ZonePolygon {
    vertices: Vec<Point>,
}

impl ZonePolygon {
    pub fn new(vertices: Vec<Point>) -> Result<Self, ZoneError> {
        if vertices.len() < MIN_VERTICES {
            return Err(ZoneError::TooFewVertices {
                min: MIN_VERTICES,
                actual: vertices.len(),
            });
        }
        Ok(Self { vertices })
    }

    pub fn vertices(&self) -> &[Point] {
        &self.vertices
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Boundary-inclusive containment
    pub fn contains(&self, point: Point) -> bool {
        point_in_polygon(point, &self.vertices)
    }

    /// Whether the center of `bbox` lies in the zone
    pub fn contains_center(&self, bbox: &BoundingBox) -> bool {
        self.contains(bbox.center())
    }

    /// Axis-aligned extent of the polygon
    pub fn bounds(&self) -> BoundingBox {
        let (mut x1, mut y1) = (i32::MAX, i32::MAX);
        let (mut x2, mut y2) = (i32::MIN, i32::MIN);
        for p in &self.vertices {
            x1 = x1.min(p.x);
            y1 = y1.min(p.y);
            x2 = x2.max(p.x);
            y2 = y2.max(p.y);
        }
        BoundingBox::new(x1, y1, x2, y2)
    }
}

impl TryFrom<Vec<Point>> for ZonePolygon {
    type Error = ZoneError;

    fn try_from(vertices: Vec<Point>) -> Result<Self, Self::Error> {
        Self::new(vertices)
    }
}

impl From<ZonePolygon> for Vec<Point> {
    fn from(zone: ZonePolygon) -> Self {
        zone.vertices
    }
}

/// Accumulates vertices (e.g. from clicks on a reference frame) and hands
/// back an immutable [`ZonePolygon`].
#[derive(Debug, Clone, Default)]
pub struct ZoneBuilder {
    points: Vec<Point>,
}

impl ZoneBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a vertex
    pub fn push(&mut self, point: Point) -> &mut Self {
        debug!("Zone point added: {}", point);
        self.points.push(point);
        self
    }

    /// Builder-style append
    pub fn with_point(mut self, x: i32, y: i32) -> Self {
        self.push(Point::new(x, y));
        self
    }

    /// Remove the most recent vertex
    pub fn undo(&mut self) -> Option<Point> {
        self.points.pop()
    }

    pub fn clear(&mut self) {
        self.points.clear();
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Whether enough vertices have been collected to close a polygon
    pub fn is_closable(&self) -> bool {
        self.points.len() >= MIN_VERTICES
    }

    pub fn build(self) -> Result<ZonePolygon, ZoneError> {
        ZonePolygon::new(self.points)
    }
}

impl FromIterator<Point> for ZoneBuilder {
    fn from_iter<I: IntoIterator<Item = Point>>(iter: I) -> Self {
        Self {
            points: iter.into_iter().collect(),
        }
    }
}
