//! Marching squares segment extraction.
//!
//! Every 2x2 cell of lattice points is classified against the threshold's
//! level(s) and emits directed crossing segments. Cell corners are numbered
//! counter-clockwise from the lower-left lattice point:
//!
//! ```text
//!   c3 (i,j+1) ---e2--- c2 (i+1,j+1)
//!      |                   |
//!     e3                  e1
//!      |                   |
//!   c0 (i,j)   ---e0--- c1 (i+1,j)
//! ```
//!
//! Walking the perimeter counter-clockwise, a crossing where the walk leaves
//! the above-level side is an *exit* and one where it comes back is an
//! *entry*. Each segment runs exit -> entry, which puts the above-level side
//! on its left. Outer boundaries therefore come out counter-clockwise
//! (positive area) and holes clockwise.
//!
//! Saddle cells (diagonal corners above) are resolved by comparing the
//! bilinear cell-centre value with the level: at or above joins the two
//! above corners through the centre, below separates them. The rule is the
//! same for every cell and for both levels of a band.

use crate::cancel::TaskGuard;
use crate::threshold::Threshold;
use contour_common::{ContourResult, Grid, Point};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// Crossing fractions are kept this far from lattice points so that
/// crossings on different edges never share a coordinate.
const CROSSING_MARGIN: f64 = 1e-6;

/// Snap size for keys of segments that don't come from the extractor.
const KEY_QUANTUM: f64 = 1e-9;

/// (exit edge, entry edge) pairs per corner case, above corners separated.
///
/// Bit `k` of the case index is set when corner `ck` is at or above the level.
const EDGE_PAIRS: [&[(u8, u8)]; 16] = [
    &[],
    &[(0, 3)],
    &[(1, 0)],
    &[(1, 3)],
    &[(2, 1)],
    &[(0, 3), (2, 1)],
    &[(2, 0)],
    &[(2, 3)],
    &[(3, 2)],
    &[(0, 2)],
    &[(1, 0), (3, 2)],
    &[(1, 2)],
    &[(3, 1)],
    &[(0, 1)],
    &[(3, 0)],
    &[],
];

/// Saddle cases 5 and 10 with the above corners joined through the centre.
const SADDLE_JOINED: [&[(u8, u8)]; 2] = [&[(0, 1), (2, 3)], &[(1, 2), (3, 0)]];

/// Segment connections for a corner case.
pub(crate) fn edge_pairs(case: usize, centre_above: bool) -> &'static [(u8, u8)] {
    match (case, centre_above) {
        (5, true) => SADDLE_JOINED[0],
        (10, true) => SADDLE_JOINED[1],
        _ => EDGE_PAIRS[case & 0xF],
    }
}

/// Orientation of a lattice edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EdgeAxis {
    /// From `(i, j)` to `(i + 1, j)`
    Horizontal,
    /// From `(i, j)` to `(i, j + 1)`
    Vertical,
}

/// Which level of a threshold a crossing belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LevelId {
    /// The isoline level, or the band's `lo`
    Lower,
    /// The band's `hi`
    Upper,
}

/// Canonical identity of a segment endpoint.
///
/// Two segments meet exactly when their keys are equal; stitching never
/// compares raw coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKey {
    /// A level crossing on the lattice edge starting at `(i, j)`
    Crossing {
        axis: EdgeAxis,
        i: u32,
        j: u32,
        level: LevelId,
    },
    /// A lattice point on the grid frame
    Lattice { i: u32, j: u32 },
    /// A world coordinate snapped to a fixed quantum
    Quantized { x: i64, y: i64 },
}

impl NodeKey {
    pub fn crossing(axis: EdgeAxis, i: usize, j: usize, level: LevelId) -> Self {
        NodeKey::Crossing {
            axis,
            i: i as u32,
            j: j as u32,
            level,
        }
    }

    pub fn lattice(i: usize, j: usize) -> Self {
        NodeKey::Lattice {
            i: i as u32,
            j: j as u32,
        }
    }

    pub fn quantize(p: Point) -> Self {
        NodeKey::Quantized {
            x: (p.x / KEY_QUANTUM).round() as i64,
            y: (p.y / KEY_QUANTUM).round() as i64,
        }
    }
}

impl fmt::Display for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            NodeKey::Crossing { axis, i, j, level } => {
                let a = match axis {
                    EdgeAxis::Horizontal => 'H',
                    EdgeAxis::Vertical => 'V',
                };
                let l = match level {
                    LevelId::Lower => "lower",
                    LevelId::Upper => "upper",
                };
                write!(f, "{}({},{})/{}", a, i, j, l)
            }
            NodeKey::Lattice { i, j } => write!(f, "lattice({},{})", i, j),
            NodeKey::Quantized { x, y } => write!(
                f,
                "point({}, {})",
                x as f64 * KEY_QUANTUM,
                y as f64 * KEY_QUANTUM
            ),
        }
    }
}

/// Side of a directed segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub fn flipped(self) -> Self {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }
}

/// What produced a segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentKind {
    /// Crossing segment of one level
    Isoline(LevelId),
    /// Piece of the grid frame inside the filled region
    Frame,
}

/// A directed crossing segment inside one cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub start: Point,
    pub end: Point,
    pub start_key: NodeKey,
    pub end_key: NodeKey,
    pub kind: SegmentKind,
    /// Side of `start -> end` on which the threshold's filled region lies
    pub interior: Side,
}

impl Segment {
    /// Segment between arbitrary points, keyed by quantized coordinates,
    /// with the filled region on its left.
    pub fn from_points(start: Point, end: Point) -> Self {
        Self {
            start,
            end,
            start_key: NodeKey::quantize(start),
            end_key: NodeKey::quantize(end),
            kind: SegmentKind::Isoline(LevelId::Lower),
            interior: Side::Left,
        }
    }

    pub fn reversed(&self) -> Self {
        Self {
            start: self.end,
            end: self.start,
            start_key: self.end_key,
            end_key: self.start_key,
            kind: self.kind,
            interior: self.interior.flipped(),
        }
    }

    /// The same segment directed so the filled region is on its left.
    pub fn oriented(self) -> Self {
        match self.interior {
            Side::Left => self,
            Side::Right => self.reversed(),
        }
    }

    pub fn length(&self) -> f64 {
        self.start.distance(self.end)
    }
}

/// Extraction switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractOptions {
    /// Emit segments along the outer grid frame so regions touching it close
    /// into rings instead of ending as open polylines.
    pub close_frame: bool,
}

/// Marching squares over a borrowed grid.
#[derive(Debug, Clone, Copy)]
pub struct SegmentExtractor<'g, 'a> {
    grid: &'g Grid<'a>,
    options: ExtractOptions,
}

impl<'g, 'a> SegmentExtractor<'g, 'a> {
    pub fn new(grid: &'g Grid<'a>, options: ExtractOptions) -> Self {
        Self { grid, options }
    }

    pub fn extract(&self, threshold: &Threshold) -> ContourResult<Vec<Segment>> {
        self.extract_with(threshold, &TaskGuard::unbounded())
    }

    /// Extract all segments for one threshold, checking `guard` once per row.
    pub fn extract_with(
        &self,
        threshold: &Threshold,
        guard: &TaskGuard,
    ) -> ContourResult<Vec<Segment>> {
        threshold.validate()?;

        let width = self.grid.width();
        let height = self.grid.height();
        if width < 2 || height < 2 {
            return Ok(vec![]);
        }

        let mut segments = Vec::new();
        let mut skipped = 0usize;

        for j in 0..(height - 1) {
            guard.check()?;
            for i in 0..(width - 1) {
                // Cells touching a missing corner emit nothing
                let Some(corners) = self.grid.cell_corners(i, j) else {
                    skipped += 1;
                    continue;
                };

                self.cell_isolines(i, j, &corners, threshold.lower(), LevelId::Lower, &mut segments);
                if let Some(hi) = threshold.upper() {
                    self.cell_isolines(i, j, &corners, hi, LevelId::Upper, &mut segments);
                }
                if self.options.close_frame {
                    self.cell_frame(i, j, &corners, threshold, &mut segments);
                }
            }
        }

        debug!(
            threshold = %threshold,
            segments = segments.len(),
            skipped_cells = skipped,
            "extracted segments"
        );

        Ok(segments)
    }

    fn cell_isolines(
        &self,
        i: usize,
        j: usize,
        corners: &[f64; 4],
        level: f64,
        id: LevelId,
        out: &mut Vec<Segment>,
    ) {
        let case = classify(corners, level);
        if case == 0 || case == 15 {
            return;
        }

        let centre = corners.iter().sum::<f64>() / 4.0;
        // Raw direction keeps `>= level` on the left; for a band's upper
        // level the filled region is the other side
        let interior = match id {
            LevelId::Lower => Side::Left,
            LevelId::Upper => Side::Right,
        };

        for &(exit, entry) in edge_pairs(case, centre >= level) {
            let (start_key, start) = self.cell_edge_crossing(i, j, exit, level, id);
            let (end_key, end) = self.cell_edge_crossing(i, j, entry, level, id);
            out.push(Segment {
                start,
                end,
                start_key,
                end_key,
                kind: SegmentKind::Isoline(id),
                interior,
            });
        }
    }

    fn cell_edge_crossing(
        &self,
        i: usize,
        j: usize,
        edge: u8,
        level: f64,
        id: LevelId,
    ) -> (NodeKey, Point) {
        let (axis, li, lj) = lattice_edge(i, j, edge);
        let (_, point) = self.crossing(axis, li, lj, level);
        (NodeKey::crossing(axis, li, lj, id), point)
    }

    /// Interpolated crossing on a lattice edge, always computed from the
    /// edge's lower-index end so neighbouring cells agree bit for bit.
    /// Returns the unclamped fraction along with the point.
    fn crossing(&self, axis: EdgeAxis, i: usize, j: usize, level: f64) -> (f64, Point) {
        let (bi, bj) = match axis {
            EdgeAxis::Horizontal => (i + 1, j),
            EdgeAxis::Vertical => (i, j + 1),
        };
        let va = self.grid.value(i, j) as f64;
        let vb = self.grid.value(bi, bj) as f64;

        let raw = (level - va) / (vb - va);
        let t = if raw.is_finite() {
            raw.clamp(CROSSING_MARGIN, 1.0 - CROSSING_MARGIN)
        } else {
            0.5
        };

        (raw, self.grid.point(i, j).lerp(self.grid.point(bi, bj), t))
    }

    fn cell_frame(
        &self,
        i: usize,
        j: usize,
        corners: &[f64; 4],
        threshold: &Threshold,
        out: &mut Vec<Segment>,
    ) {
        let on_frame = [
            j == 0,
            i + 2 == self.grid.width(),
            j + 2 == self.grid.height(),
            i == 0,
        ];
        for edge in 0..4u8 {
            if on_frame[edge as usize] {
                self.frame_edge(i, j, edge, corners, threshold, out);
            }
        }
    }

    /// Emit the parts of a frame edge lying in the filled region, walking the
    /// edge in the cell's counter-clockwise direction.
    fn frame_edge(
        &self,
        i: usize,
        j: usize,
        edge: u8,
        corners: &[f64; 4],
        threshold: &Threshold,
        out: &mut Vec<Segment>,
    ) {
        let k = edge as usize;
        let (a_val, b_val) = (corners[k], corners[(k + 1) % 4]);
        let (ai, aj) = corner_lattice(i, j, k);
        let (bi, bj) = corner_lattice(i, j, (k + 1) % 4);
        let (axis, li, lj) = lattice_edge(i, j, edge);
        // Top and left edges run against the lattice edge direction
        let reversed = edge >= 2;

        let lo = threshold.lower();
        let hi = threshold.upper();

        let mut crossings: Vec<(f64, NodeKey, Point, LevelId)> = Vec::with_capacity(2);
        for (id, level) in [(LevelId::Lower, Some(lo)), (LevelId::Upper, hi)] {
            let Some(level) = level else { continue };
            if (a_val >= level) != (b_val >= level) {
                let (raw, point) = self.crossing(axis, li, lj, level);
                let along = if reversed { 1.0 - raw } else { raw };
                crossings.push((along, NodeKey::crossing(axis, li, lj, id), point, id));
            }
        }
        crossings.sort_by(|a, b| a.0.total_cmp(&b.0));

        let mut above_lo = a_val >= lo;
        let mut above_hi = hi.is_some_and(|hi| a_val >= hi);
        let mut from = (NodeKey::lattice(ai, aj), self.grid.point(ai, aj));

        for (_, key, point, id) in crossings {
            if above_lo && !above_hi {
                out.push(frame_segment(from, (key, point)));
            }
            match id {
                LevelId::Lower => above_lo = !above_lo,
                LevelId::Upper => above_hi = !above_hi,
            }
            from = (key, point);
        }

        if above_lo && !above_hi {
            out.push(frame_segment(
                from,
                (NodeKey::lattice(bi, bj), self.grid.point(bi, bj)),
            ));
        }
    }
}

/// Extract segments with default options.
pub fn extract_segments(grid: &Grid<'_>, threshold: &Threshold) -> ContourResult<Vec<Segment>> {
    SegmentExtractor::new(grid, ExtractOptions::default()).extract(threshold)
}

/// Corner case index for a level.
fn classify(corners: &[f64; 4], level: f64) -> usize {
    corners
        .iter()
        .enumerate()
        .filter(|(_, v)| **v >= level)
        .fold(0, |case, (k, _)| case | (1 << k))
}

/// Lattice edge underlying cell edge `edge` of cell `(i, j)`.
fn lattice_edge(i: usize, j: usize, edge: u8) -> (EdgeAxis, usize, usize) {
    match edge {
        0 => (EdgeAxis::Horizontal, i, j),
        1 => (EdgeAxis::Vertical, i + 1, j),
        2 => (EdgeAxis::Horizontal, i, j + 1),
        _ => (EdgeAxis::Vertical, i, j),
    }
}

fn corner_lattice(i: usize, j: usize, corner: usize) -> (usize, usize) {
    match corner {
        0 => (i, j),
        1 => (i + 1, j),
        2 => (i + 1, j + 1),
        _ => (i, j + 1),
    }
}

fn frame_segment(from: (NodeKey, Point), to: (NodeKey, Point)) -> Segment {
    Segment {
        start: from.1,
        end: to.1,
        start_key: from.0,
        end_key: to.0,
        kind: SegmentKind::Frame,
        interior: Side::Left,
    }
}
