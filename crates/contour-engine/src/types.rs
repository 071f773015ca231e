//! Rings, polylines and polygons produced by the pipeline.

use crate::threshold::Threshold;
use contour_common::{BoundingBox, Point};
use serde::{Deserialize, Serialize};

/// Where a point lies relative to a ring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointLocation {
    Inside,
    Outside,
    Boundary,
}

/// Closed point sequence; the edge from the last point back to the first is
/// implicit.
///
/// Positive signed area (counter-clockwise with y up) marks an outer
/// boundary, negative a hole.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ring {
    points: Vec<Point>,
}

impl Ring {
    pub fn new(points: Vec<Point>) -> Self {
        Self { points }
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn into_points(self) -> Vec<Point> {
        self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Shoelace area, positive for counter-clockwise rings.
    pub fn signed_area(&self) -> f64 {
        let n = self.points.len();
        if n < 3 {
            return 0.0;
        }
        let mut twice = 0.0;
        for k in 0..n {
            let a = self.points[k];
            let b = self.points[(k + 1) % n];
            twice += a.cross(b);
        }
        twice / 2.0
    }

    pub fn area(&self) -> f64 {
        self.signed_area().abs()
    }

    pub fn is_ccw(&self) -> bool {
        self.signed_area() > 0.0
    }

    pub fn perimeter(&self) -> f64 {
        self.edges().map(|(a, b)| a.distance(b)).sum()
    }

    pub fn reverse(&mut self) {
        self.points.reverse();
    }

    /// Reverse in place if needed so the ring is counter-clockwise when
    /// `ccw` is set, clockwise otherwise.
    pub fn orient(&mut self, ccw: bool) {
        let area = self.signed_area();
        if (ccw && area < 0.0) || (!ccw && area > 0.0) {
            self.reverse();
        }
    }

    pub fn bbox(&self) -> BoundingBox {
        BoundingBox::from_points(self.points.iter().copied())
            .unwrap_or(BoundingBox::new(0.0, 0.0, 0.0, 0.0))
    }

    /// Edges including the closing one.
    pub fn edges(&self) -> impl Iterator<Item = (Point, Point)> + '_ {
        let n = self.points.len();
        (0..n).map(move |k| (self.points[k], self.points[(k + 1) % n]))
    }

    /// Even-odd point location with exact boundary detection.
    pub fn locate(&self, p: Point) -> PointLocation {
        let mut inside = false;
        for (a, b) in self.edges() {
            if on_segment(a, b, p) {
                return PointLocation::Boundary;
            }
            if (a.y > p.y) != (b.y > p.y) {
                let x = a.x + (p.y - a.y) * (b.x - a.x) / (b.y - a.y);
                if p.x < x {
                    inside = !inside;
                }
            }
        }
        if inside {
            PointLocation::Inside
        } else {
            PointLocation::Outside
        }
    }

    pub fn contains(&self, p: Point) -> bool {
        self.locate(p) == PointLocation::Inside
    }

    /// Whether `other` lies inside this ring, decided on the first vertex of
    /// `other` that is not on this ring's boundary.
    pub fn encloses(&self, other: &Ring) -> bool {
        other
            .points
            .iter()
            .map(|p| self.locate(*p))
            .find(|loc| *loc != PointLocation::Boundary)
            == Some(PointLocation::Inside)
    }

    pub fn is_simple(&self) -> bool {
        self.simplicity_violation().is_none()
    }

    /// Describe the first reason this ring is not simple, if any.
    ///
    /// Edges are swept in order of their minimum x so only edges with
    /// overlapping x extents are compared. Non-adjacent edges may not meet at
    /// all; adjacent edges may only share their common vertex.
    pub fn simplicity_violation(&self) -> Option<String> {
        let n = self.points.len();
        if n < 3 {
            return Some(format!("ring has only {} vertices", n));
        }

        let edges: Vec<(Point, Point)> = self.edges().collect();
        if let Some(k) = edges.iter().position(|(a, b)| a == b) {
            return Some(format!("repeated vertex at index {}", k));
        }

        let min_x = |e: &(Point, Point)| e.0.x.min(e.1.x);
        let max_x = |e: &(Point, Point)| e.0.x.max(e.1.x);

        let mut order: Vec<usize> = (0..n).collect();
        order.sort_by(|&a, &b| min_x(&edges[a]).total_cmp(&min_x(&edges[b])));

        for (pos, &a) in order.iter().enumerate() {
            let ea = edges[a];
            let reach = max_x(&ea);
            for &b in &order[pos + 1..] {
                let eb = edges[b];
                if min_x(&eb) > reach {
                    break;
                }
                if ea.0.y.max(ea.1.y) < eb.0.y.min(eb.1.y)
                    || eb.0.y.max(eb.1.y) < ea.0.y.min(ea.1.y)
                {
                    continue;
                }

                let (first, second) = if (a + 1) % n == b {
                    (a, b)
                } else if (b + 1) % n == a {
                    (b, a)
                } else {
                    if segments_touch(ea, eb) {
                        return Some(format!("edges {} and {} intersect", a.min(b), a.max(b)));
                    }
                    continue;
                };

                // Adjacent: edges[first].1 == edges[second].0
                let shared = edges[first].1;
                let u = edges[first].0 - shared;
                let w = edges[second].1 - shared;
                if u.cross(w) == 0.0 && u.dot(w) > 0.0 {
                    return Some(format!("edges {} and {} overlap", first, second));
                }
            }
        }

        None
    }
}

fn orientation(a: Point, b: Point, p: Point) -> f64 {
    (b - a).cross(p - a)
}

fn within_extent(a: Point, b: Point, p: Point) -> bool {
    p.x >= a.x.min(b.x) && p.x <= a.x.max(b.x) && p.y >= a.y.min(b.y) && p.y <= a.y.max(b.y)
}

fn on_segment(a: Point, b: Point, p: Point) -> bool {
    orientation(a, b, p) == 0.0 && within_extent(a, b, p)
}

/// Closed-segment intersection test, touching included.
pub(crate) fn segments_touch(s: (Point, Point), t: (Point, Point)) -> bool {
    let d1 = orientation(t.0, t.1, s.0);
    let d2 = orientation(t.0, t.1, s.1);
    let d3 = orientation(s.0, s.1, t.0);
    let d4 = orientation(s.0, s.1, t.1);

    if ((d1 > 0.0 && d2 < 0.0) || (d1 < 0.0 && d2 > 0.0))
        && ((d3 > 0.0 && d4 < 0.0) || (d3 < 0.0 && d4 > 0.0))
    {
        return true;
    }

    (d1 == 0.0 && within_extent(t.0, t.1, s.0))
        || (d2 == 0.0 && within_extent(t.0, t.1, s.1))
        || (d3 == 0.0 && within_extent(s.0, s.1, t.0))
        || (d4 == 0.0 && within_extent(s.0, s.1, t.1))
}

/// Open point sequence left over when a chain never closed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polyline {
    points: Vec<Point>,
}

impl Polyline {
    pub fn new(points: Vec<Point>) -> Self {
        Self { points }
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

    pub fn length(&self) -> f64 {
        self.points.windows(2).map(|w| w[0].distance(w[1])).sum()
    }

    pub fn bbox(&self) -> Option<BoundingBox> {
        BoundingBox::from_points(self.points.iter().copied())
    }
}

/// An outer ring with its immediate holes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContourPolygon {
    pub outer: Ring,
    pub holes: Vec<Ring>,
    /// Number of rings strictly enclosing the outer ring
    pub depth: usize,
    pub threshold: Threshold,
}

impl ContourPolygon {
    /// Filled area: outer minus holes.
    pub fn area(&self) -> f64 {
        self.outer.area() - self.holes.iter().map(Ring::area).sum::<f64>()
    }

    /// Outer ring followed by holes.
    pub fn rings(&self) -> impl Iterator<Item = &Ring> {
        std::iter::once(&self.outer).chain(self.holes.iter())
    }

    pub fn vertex_count(&self) -> usize {
        self.rings().map(Ring::len).sum()
    }

    pub fn bbox(&self) -> BoundingBox {
        self.outer.bbox()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ring(coords: &[(f64, f64)]) -> Ring {
        Ring::new(coords.iter().map(|&(x, y)| Point::new(x, y)).collect())
    }

    #[test]
    fn test_signed_area_and_orientation() {
        let mut square = ring(&[(0.0, 0.0), (2.0, 0.0), (2.0, 2.0), (0.0, 2.0)]);
        assert_eq!(square.signed_area(), 4.0);
        square.reverse();
        assert_eq!(square.signed_area(), -4.0);
        square.orient(true);
        assert!(square.is_ccw());
    }

    #[test]
    fn test_locate() {
        let square = ring(&[(0.0, 0.0), (2.0, 0.0), (2.0, 2.0), (0.0, 2.0)]);
        assert_eq!(square.locate(Point::new(1.0, 1.0)), PointLocation::Inside);
        assert_eq!(square.locate(Point::new(3.0, 1.0)), PointLocation::Outside);
        assert_eq!(square.locate(Point::new(2.0, 1.0)), PointLocation::Boundary);
        assert_eq!(square.locate(Point::new(0.0, 0.0)), PointLocation::Boundary);
    }

    #[test]
    fn test_encloses_skips_shared_vertices() {
        let outer = ring(&[(0.0, 0.0), (4.0, 0.0), (4.0, 4.0), (0.0, 4.0)]);
        // First vertex sits on the outer boundary
        let inner = ring(&[(0.0, 2.0), (2.0, 1.0), (2.0, 3.0)]);
        assert!(outer.encloses(&inner));
        assert!(!inner.encloses(&outer));
    }

    #[test]
    fn test_simplicity() {
        let square = ring(&[(0.0, 0.0), (2.0, 0.0), (2.0, 2.0), (0.0, 2.0)]);
        assert!(square.is_simple());

        let bowtie = ring(&[(0.0, 0.0), (2.0, 2.0), (2.0, 0.0), (0.0, 2.0)]);
        assert!(!bowtie.is_simple());

        // Touches itself at (1, 1)
        let pinched = ring(&[
            (0.0, 0.0),
            (1.0, 1.0),
            (2.0, 0.0),
            (2.0, 2.0),
            (1.0, 1.0),
            (0.0, 2.0),
        ]);
        assert!(!pinched.is_simple());

        let spike = ring(&[(0.0, 0.0), (2.0, 0.0), (1.0, 0.0), (1.0, 1.0)]);
        assert!(!spike.is_simple());
    }

    #[test]
    fn test_polygon_area() {
        let polygon = ContourPolygon {
            outer: ring(&[(0.0, 0.0), (4.0, 0.0), (4.0, 4.0), (0.0, 4.0)]),
            holes: vec![ring(&[(1.0, 1.0), (1.0, 2.0), (2.0, 2.0), (2.0, 1.0)])],
            depth: 0,
            threshold: Threshold::Level(0.0),
        };
        assert_eq!(polygon.area(), 15.0);
        assert_eq!(polygon.vertex_count(), 8);
    }
}
