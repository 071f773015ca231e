//! Vector paths made of lines and cubic Béziers.

use contour_common::{BoundingBox, Point};
use serde::{Deserialize, Serialize};
use std::fmt::Write;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum PathElement {
    MoveTo(Point),
    LineTo(Point),
    CubicTo { c1: Point, c2: Point, to: Point },
    Close,
}

/// A cubic Bézier segment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CubicSegment {
    pub p0: Point,
    pub c1: Point,
    pub c2: Point,
    pub p3: Point,
}

impl CubicSegment {
    pub fn new(p0: Point, c1: Point, c2: Point, p3: Point) -> Self {
        Self { p0, c1, c2, p3 }
    }

    /// A straight line expressed as a cubic with controls at the thirds.
    pub fn from_line(a: Point, b: Point) -> Self {
        Self::new(a, a.lerp(b, 1.0 / 3.0), a.lerp(b, 2.0 / 3.0), b)
    }

    /// Point at parameter `t` in `[0, 1]`.
    pub fn eval(&self, t: f64) -> Point {
        let mt = 1.0 - t;
        let a = mt * mt * mt;
        let b = 3.0 * mt * mt * t;
        let c = 3.0 * mt * t * t;
        let d = t * t * t;
        Point::new(
            a * self.p0.x + b * self.c1.x + c * self.c2.x + d * self.p3.x,
            a * self.p0.y + b * self.c1.y + c * self.c2.y + d * self.p3.y,
        )
    }

    /// First derivative at `t`.
    pub fn derivative(&self, t: f64) -> Point {
        let mt = 1.0 - t;
        (self.c1 - self.p0) * (3.0 * mt * mt)
            + (self.c2 - self.c1) * (6.0 * mt * t)
            + (self.p3 - self.c2) * (3.0 * t * t)
    }

    /// Second derivative at `t`.
    pub fn second_derivative(&self, t: f64) -> Point {
        let mt = 1.0 - t;
        (self.c2 - self.c1 * 2.0 + self.p0) * (6.0 * mt)
            + (self.p3 - self.c2 * 2.0 + self.c1) * (6.0 * t)
    }
}

/// An ordered list of drawing commands.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Path {
    elements: Vec<PathElement>,
}

impl Path {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn move_to(&mut self, p: Point) -> &mut Self {
        self.elements.push(PathElement::MoveTo(p));
        self
    }

    pub fn line_to(&mut self, p: Point) -> &mut Self {
        self.elements.push(PathElement::LineTo(p));
        self
    }

    pub fn cubic_to(&mut self, c1: Point, c2: Point, to: Point) -> &mut Self {
        self.elements.push(PathElement::CubicTo { c1, c2, to });
        self
    }

    pub fn close(&mut self) -> &mut Self {
        self.elements.push(PathElement::Close);
        self
    }

    pub fn elements(&self) -> &[PathElement] {
        &self.elements
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Append all elements of `other`.
    pub fn append(&mut self, other: Path) {
        self.elements.extend(other.elements);
    }

    /// Straight-line path through `points`, closed when `closed` is set.
    pub fn from_polyline(points: &[Point], closed: bool) -> Self {
        let mut path = Path::new();
        let Some((first, rest)) = points.split_first() else {
            return path;
        };
        path.move_to(*first);
        for p in rest {
            path.line_to(*p);
        }
        if closed {
            path.close();
        }
        path
    }

    /// Every cubic in drawing order, with the current point as `p0`.
    pub fn cubics(&self) -> impl Iterator<Item = CubicSegment> + '_ {
        let mut current = Point::default();
        let mut start = Point::default();
        self.elements.iter().filter_map(move |element| match *element {
            PathElement::MoveTo(p) => {
                current = p;
                start = p;
                None
            }
            PathElement::LineTo(p) => {
                current = p;
                None
            }
            PathElement::CubicTo { c1, c2, to } => {
                let seg = CubicSegment::new(current, c1, c2, to);
                current = to;
                Some(seg)
            }
            PathElement::Close => {
                current = start;
                None
            }
        })
    }

    /// Box around all points and control points.
    pub fn control_bounds(&self) -> Option<BoundingBox> {
        BoundingBox::from_points(self.elements.iter().flat_map(|element| {
            let points: Vec<Point> = match *element {
                PathElement::MoveTo(p) | PathElement::LineTo(p) => vec![p],
                PathElement::CubicTo { c1, c2, to } => vec![c1, c2, to],
                PathElement::Close => vec![],
            };
            points
        }))
    }

    /// SVG path data (`d` attribute).
    pub fn to_svg_data(&self) -> String {
        let mut out = String::new();
        for element in &self.elements {
            if !out.is_empty() {
                out.push(' ');
            }
            // Writing to a String cannot fail
            let _ = match *element {
                PathElement::MoveTo(p) => write!(out, "M{} {}", p.x, p.y),
                PathElement::LineTo(p) => write!(out, "L{} {}", p.x, p.y),
                PathElement::CubicTo { c1, c2, to } => write!(
                    out,
                    "C{} {} {} {} {} {}",
                    c1.x, c1.y, c2.x, c2.y, to.x, to.y
                ),
                PathElement::Close => write!(out, "Z"),
            };
        }
        out
    }
}
