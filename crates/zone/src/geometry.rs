//! Points, bounding boxes and the two geometry tests the monitor relies on

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::ZoneError;

/// Integer pixel coordinate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "[i32; 2]", into = "[i32; 2]")]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl From<[i32; 2]> for Point {
    fn from([x, y]: [i32; 2]) -> Self {
        Self { x, y }
    }
}

impl From<Point> for [i32; 2] {
    fn from(p: Point) -> Self {
        [p.x, p.y]
    }
}

impl From<(i32, i32)> for Point {
    fn from((x, y): (i32, i32)) -> Self {
        Self { x, y }
    }
}

impl FromStr for Point {
    type Err = ZoneError;

    /// Parse "x,y" (whitespace around either coordinate is ignored)
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ZoneError::InvalidPoint(s.to_string());
        let (x, y) = s.split_once(',').ok_or_else(invalid)?;
        let x = x.trim().parse().map_err(|_| invalid())?;
        let y = y.trim().parse().map_err(|_| invalid())?;
        Ok(Self { x, y })
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Axis-aligned box in corner form `(x1, y1, x2, y2)`.
///
/// Corners are normalized on construction so that `x1 <= x2` and `y1 <= y2`;
/// a box whose corners coincide on an axis has zero area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "[i32; 4]", into = "[i32; 4]")]
pub struct BoundingBox {
    x1: i32,
    y1: i32,
    x2: i32,
    y2: i32,
}

impl BoundingBox {
    pub fn new(x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        Self {
            x1: x1.min(x2),
            y1: y1.min(y2),
            x2: x1.max(x2),
            y2: y1.max(y2),
        }
    }

    /// Build from float corners, truncating toward zero like a pixel cast
    pub fn from_f32(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self::new(x1 as i32, y1 as i32, x2 as i32, y2 as i32)
    }

    pub fn x1(&self) -> i32 {
        self.x1
    }

    pub fn y1(&self) -> i32 {
        self.y1
    }

    pub fn x2(&self) -> i32 {
        self.x2
    }

    pub fn y2(&self) -> i32 {
        self.y2
    }

    pub fn width(&self) -> i64 {
        self.x2 as i64 - self.x1 as i64
    }

    pub fn height(&self) -> i64 {
        self.y2 as i64 - self.y1 as i64
    }

    /// Area in square pixels; `i128` so extreme `i32` corners cannot overflow
    pub fn area(&self) -> i128 {
        self.width() as i128 * self.height() as i128
    }

    pub fn is_degenerate(&self) -> bool {
        self.area() == 0
    }

    /// Center point using floor division on the integer corners
    pub fn center(&self) -> Point {
        let cx = (self.x1 as i64 + self.x2 as i64).div_euclid(2);
        let cy = (self.y1 as i64 + self.y2 as i64).div_euclid(2);
        Point::new(cx as i32, cy as i32)
    }

    /// Full-width strip covering the top `fraction` of the box height.
    ///
    /// The strip height is truncated to whole pixels.
    pub fn top_fraction(&self, fraction: f64) -> BoundingBox {
        let strip = (fraction * self.height() as f64) as i64;
        let y2 = (self.y1 as i64 + strip).clamp(self.y1 as i64, self.y2 as i64);
        BoundingBox::new(self.x1, self.y1, self.x2, y2 as i32)
    }

    pub fn intersection_area(&self, other: &BoundingBox) -> i128 {
        let ix1 = self.x1.max(other.x1) as i128;
        let iy1 = self.y1.max(other.y1) as i128;
        let ix2 = self.x2.min(other.x2) as i128;
        let iy2 = self.y2.min(other.y2) as i128;
        (ix2 - ix1).max(0) * (iy2 - iy1).max(0)
    }
}

impl From<[i32; 4]> for BoundingBox {
    fn from([x1, y1, x2, y2]: [i32; 4]) -> Self {
        Self::new(x1, y1, x2, y2)
    }
}

impl From<BoundingBox> for [i32; 4] {
    fn from(b: BoundingBox) -> Self {
        [b.x1, b.y1, b.x2, b.y2]
    }
}

impl fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}, {}, {}]", self.x1, self.y1, self.x2, self.y2)
    }
}

/// Intersection-over-union of two boxes, in `[0, 1]`.
///
/// When the union is empty (two zero-area boxes) the union is taken as 1,
/// which yields the intersection area, i.e. 0.
pub fn iou(a: &BoundingBox, b: &BoundingBox) -> f64 {
    let inter = a.intersection_area(b);
    let union = a.area() + b.area() - inter;
    let union = if union > 0 { union } else { 1 };
    inter as f64 / union as f64
}

/// Boundary-inclusive containment test against an implicitly closed polygon.
///
/// A point lying on any edge or vertex counts as inside. Uses exact `i128`
/// arithmetic, so results do not depend on float rounding and products of
/// full-range `i32` differences cannot overflow.
pub fn point_in_polygon(point: Point, vertices: &[Point]) -> bool {
    let n = vertices.len();
    if n == 0 {
        return false;
    }

    let (px, py) = (point.x as i128, point.y as i128);
    let mut inside = false;
    let mut j = n - 1;

    for i in 0..n {
        let (xi, yi) = (vertices[i].x as i128, vertices[i].y as i128);
        let (xj, yj) = (vertices[j].x as i128, vertices[j].y as i128);

        if on_segment((px, py), (xi, yi), (xj, yj)) {
            return true;
        }

        // Horizontal ray toward +x; count edges crossing it
        if (yi > py) != (yj > py) {
            let dy = yj - yi;
            let lhs = (px - xi) * dy;
            let rhs = (py - yi) * (xj - xi);
            let crosses = if dy > 0 { lhs < rhs } else { lhs > rhs };
            if crosses {
                inside = !inside;
            }
        }

        j = i;
    }

    inside
}

fn on_segment(p: (i128, i128), a: (i128, i128), b: (i128, i128)) -> bool {
    let cross = (b.0 - a.0) * (p.1 - a.1) - (b.1 - a.1) * (p.0 - a.0);
    cross == 0
        && p.0 >= a.0.min(b.0)
        && p.0 <= a.0.max(b.0)
        && p.1 >= a.1.min(b.1)
        && p.1 <= a.1.max(b.1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn square() -> Vec<Point> {
        vec![
            Point::new(0, 0),
            Point::new(100, 0),
            Point::new(100, 100),
            Point::new(0, 100),
        ]
    }

    #[test]
    fn test_point_in_square_boundary_inclusive() {
        let sq = square();
        assert!(point_in_polygon(Point::new(0, 0), &sq));
        assert!(point_in_polygon(Point::new(100, 100), &sq));
        assert!(point_in_polygon(Point::new(50, 0), &sq));
        assert!(point_in_polygon(Point::new(50, 50), &sq));
        assert!(!point_in_polygon(Point::new(101, 50), &sq));
        assert!(!point_in_polygon(Point::new(-1, -1), &sq));
    }

    #[test]
    fn test_point_in_concave_polygon() {
        // U shape opening upward
        let u = vec![
            Point::new(0, 0),
            Point::new(30, 0),
            Point::new(30, 70),
            Point::new(70, 70),
            Point::new(70, 0),
            Point::new(100, 0),
            Point::new(100, 100),
            Point::new(0, 100),
        ];
        assert!(point_in_polygon(Point::new(15, 20), &u));
        assert!(point_in_polygon(Point::new(85, 20), &u));
        assert!(!point_in_polygon(Point::new(50, 20), &u));
        assert!(point_in_polygon(Point::new(50, 85), &u));
        assert!(point_in_polygon(Point::new(50, 70), &u));
    }

    #[test]
    fn test_extreme_coordinates_do_not_overflow() {
        let tri = vec![
            Point::new(i32::MIN, i32::MIN),
            Point::new(i32::MAX, i32::MIN),
            Point::new(i32::MAX, i32::MAX),
        ];
        assert!(point_in_polygon(Point::new(i32::MAX, 0), &tri));
        assert!(point_in_polygon(Point::new(0, 0), &tri));
        assert!(point_in_polygon(Point::new(1, -5), &tri));
        assert!(!point_in_polygon(Point::new(-5, 1), &tri));
        assert!(!point_in_polygon(Point::new(i32::MIN, i32::MAX), &tri));

        let huge = BoundingBox::new(i32::MIN, i32::MIN, i32::MAX, i32::MAX);
        assert_eq!(huge.area(), (u32::MAX as i128) * (u32::MAX as i128));
        assert!((iou(&huge, &huge) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_empty_polygon_contains_nothing() {
        assert!(!point_in_polygon(Point::new(0, 0), &[]));
    }

    #[test]
    fn test_box_normalization() {
        let b = BoundingBox::new(50, 90, 10, 10);
        assert_eq!((b.x1(), b.y1(), b.x2(), b.y2()), (10, 10, 50, 90));
        assert_eq!(b.area(), 40 * 80);
    }

    #[test]
    fn test_center_uses_floor_division() {
        assert_eq!(BoundingBox::new(10, 10, 51, 91).center(), Point::new(30, 50));
        assert_eq!(BoundingBox::new(-3, -3, 0, 0).center(), Point::new(-2, -2));
    }

    #[test]
    fn test_top_fraction_head_region() {
        let person = BoundingBox::new(10, 10, 50, 90);
        assert_eq!(person.top_fraction(0.35), BoundingBox::new(10, 10, 50, 38));
    }

    #[test]
    fn test_iou_known_values() {
        let head = BoundingBox::new(10, 10, 50, 38);
        let helmet = BoundingBox::new(12, 10, 48, 30);
        let v = iou(&head, &helmet);
        assert!((v - 720.0 / 1120.0).abs() < 1e-12);

        let a = BoundingBox::new(0, 0, 10, 10);
        let b = BoundingBox::new(5, 0, 15, 10);
        assert!((iou(&a, &b) - 50.0 / 150.0).abs() < 1e-12);
    }

    #[test]
    fn test_iou_degenerate_boxes() {
        let a = BoundingBox::new(5, 5, 5, 5);
        let b = BoundingBox::new(9, 9, 9, 20);
        assert_eq!(iou(&a, &b), 0.0);
        assert_eq!(iou(&a, &a), 0.0);
    }

    #[test]
    fn test_point_parse() {
        assert_eq!("120, 340".parse::<Point>().unwrap(), Point::new(120, 340));
        assert!("120".parse::<Point>().is_err());
        assert!("a,b".parse::<Point>().is_err());
    }

    #[test]
    fn test_box_serde_normalizes() {
        let b: BoundingBox = serde_json::from_str("[50, 90, 10, 10]").unwrap();
        assert_eq!(b, BoundingBox::new(10, 10, 50, 90));
        assert_eq!(serde_json::to_string(&b).unwrap(), "[10,10,50,90]");
    }

    fn arb_box() -> impl Strategy<Value = BoundingBox> {
        (-500i32..500, -500i32..500, -500i32..500, -500i32..500)
            .prop_map(|(a, b, c, d)| BoundingBox::new(a, b, c, d))
    }

    proptest! {
        #[test]
        fn prop_iou_symmetric_and_bounded(a in arb_box(), b in arb_box()) {
            let ab = iou(&a, &b);
            prop_assert_eq!(ab, iou(&b, &a));
            prop_assert!((0.0..=1.0).contains(&ab));
        }

        #[test]
        fn prop_iou_identity(a in arb_box()) {
            prop_assume!(!a.is_degenerate());
            prop_assert_eq!(iou(&a, &a), 1.0);
        }

        #[test]
        fn prop_iou_disjoint_is_zero(a in arb_box(), gap in 0i32..100) {
            let shifted = BoundingBox::new(
                a.x2() + gap,
                a.y1(),
                a.x2() + gap + 10,
                a.y2(),
            );
            prop_assert_eq!(iou(&a, &shifted), 0.0);
        }

        #[test]
        fn prop_square_matches_bounds(x in -50i32..150, y in -50i32..150) {
            let expected = (0..=100).contains(&x) && (0..=100).contains(&y);
            prop_assert_eq!(point_in_polygon(Point::new(x, y), &square()), expected);
        }
    }
}
