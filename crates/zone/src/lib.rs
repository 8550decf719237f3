//! Zone Geometry
//!
//! Pixel-space primitives for restricted-zone monitoring:
//! - Integer points and normalized bounding boxes
//! - Boundary-inclusive point-in-polygon test
//! - Intersection-over-union between boxes
//! - Zone polygons and an explicit builder for collecting vertices

mod geometry;
mod polygon;

pub use geometry::{iou, point_in_polygon, BoundingBox, Point};
pub use polygon::{ZoneBuilder, ZonePolygon, MIN_VERTICES};

use thiserror::Error;

/// Zone geometry errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ZoneError {
    /// Polygon needs at least three vertices to enclose an area
    #[error("Zone polygon needs at least {min} vertices, got {actual}")]
    TooFewVertices { min: usize, actual: usize },

    /// Point could not be parsed from text
    #[error("Invalid point '{0}': expected \"x,y\" with integer coordinates")]
    InvalidPoint(String),
}
