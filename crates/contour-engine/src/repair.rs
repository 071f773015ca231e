//! Clip polygons to a window and make every ring simple.

use crate::cancel::TaskGuard;
use crate::extract::NodeKey;
use crate::threshold::Threshold;
use crate::tree::build_polygons;
use crate::types::{ContourPolygon, Ring};
use crate::warning::ContourWarning;
use contour_common::{BoundingBox, ContourResult, Point};
use geo::{BooleanOps, Coord, LineString, Polygon, Rect};
use serde::{Deserialize, Serialize};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use tracing::{debug, warn};

/// Repair stage settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RepairConfig {
    /// Run the repair stage at all
    pub enabled: bool,
    /// Clip window in world coordinates
    pub clip: Option<BoundingBox>,
}

impl Default for RepairConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            clip: None,
        }
    }
}

/// Repaired polygons, rings that stayed invalid, and what went wrong.
#[derive(Debug, Clone, Default)]
pub struct RepairOutput {
    pub polygons: Vec<ContourPolygon>,
    pub failed: Vec<Ring>,
    /// Repaired clockwise loops that no outer encloses
    pub orphan_holes: Vec<Ring>,
    pub warnings: Vec<ContourWarning>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PolygonRepair {
    clip: Option<BoundingBox>,
}

impl PolygonRepair {
    pub fn new(clip: Option<BoundingBox>) -> Self {
        Self { clip }
    }

    pub fn from_config(config: &RepairConfig) -> Self {
        Self::new(config.clip)
    }

    pub fn repair(
        &self,
        polygons: Vec<ContourPolygon>,
        threshold: Threshold,
    ) -> ContourResult<RepairOutput> {
        self.repair_with(polygons, threshold, &TaskGuard::unbounded())
    }

    /// Clip, split pinches, validate, then rebuild nesting from the loops
    /// that survived. `guard` is checked between polygons.
    pub fn repair_with(
        &self,
        polygons: Vec<ContourPolygon>,
        threshold: Threshold,
        guard: &TaskGuard,
    ) -> ContourResult<RepairOutput> {
        let input = polygons.len();
        let mut loops = Vec::new();
        let mut failed = Vec::new();
        let mut warnings = Vec::new();

        for polygon in polygons {
            guard.check()?;

            let rings = match self.clip {
                Some(window) => clip_polygon(polygon, &window),
                None => std::iter::once(polygon.outer).chain(polygon.holes).collect(),
            };

            for piece in rings.into_iter().flat_map(split_pinches) {
                if piece.len() < 3 || piece.signed_area() == 0.0 {
                    continue;
                }
                match piece.simplicity_violation() {
                    None => loops.push(piece),
                    Some(reason) => {
                        let warning = ContourWarning::RepairFailed {
                            ring_vertices: piece.len(),
                            reason,
                        };
                        warn!(threshold = %threshold, warning = %warning, "ring left out of repaired output");
                        warnings.push(warning);
                        failed.push(piece);
                    }
                }
            }
        }

        let tree = build_polygons(loops, threshold);
        for hole in &tree.orphan_holes {
            warnings.push(ContourWarning::OrphanHole { area: hole.area() });
        }

        debug!(
            threshold = %threshold,
            input_polygons = input,
            polygons = tree.polygons.len(),
            failed = failed.len(),
            "repaired polygons"
        );

        Ok(RepairOutput {
            polygons: tree.polygons,
            failed,
            orphan_holes: tree.orphan_holes,
            warnings,
        })
    }
}

/// Split a ring at every repeated vertex into separate loops.
///
/// Loops keep the winding of the part of the ring they came from, so a
/// ring that pinches off an enclosed pocket yields an outer and a hole.
pub fn split_pinches(ring: Ring) -> Vec<Ring> {
    let mut out = Vec::new();
    let mut stack = vec![ring.into_points()];

    while let Some(mut points) = stack.pop() {
        points.dedup();
        while points.len() > 1 && points.first() == points.last() {
            points.pop();
        }

        let mut seen: HashMap<NodeKey, usize> = HashMap::with_capacity(points.len());
        let mut repeat = None;
        for (k, p) in points.iter().enumerate() {
            match seen.entry(NodeKey::quantize(*p)) {
                Entry::Occupied(first) => {
                    repeat = Some((*first.get(), k));
                    break;
                }
                Entry::Vacant(slot) => {
                    slot.insert(k);
                }
            }
        }

        match repeat {
            Some((a, b)) => {
                let pocket = points[a..b].to_vec();
                let mut rest = points[..a].to_vec();
                rest.extend_from_slice(&points[b..]);
                stack.push(rest);
                stack.push(pocket);
            }
            None => out.push(Ring::new(points)),
        }
    }

    out
}

fn to_coords(ring: &Ring) -> LineString<f64> {
    LineString::new(
        ring.points()
            .iter()
            .map(|p| Coord { x: p.x, y: p.y })
            .collect(),
    )
}

fn from_coords(line: &LineString<f64>, ccw: bool) -> Ring {
    let mut points: Vec<Point> = line.coords().map(|c| Point::new(c.x, c.y)).collect();
    // geo closes rings explicitly
    points.dedup();
    while points.len() > 1 && points.first() == points.last() {
        points.pop();
    }
    let mut ring = Ring::new(points);
    ring.orient(ccw);
    ring
}

/// Intersect one polygon with the window; returns outer and hole rings
/// oriented by the usual convention.
fn clip_polygon(polygon: ContourPolygon, window: &BoundingBox) -> Vec<Ring> {
    let bbox = polygon.bbox();
    if window.contains_bbox(&bbox) {
        return std::iter::once(polygon.outer).chain(polygon.holes).collect();
    }
    if !window.intersects(&bbox) {
        return Vec::new();
    }

    let subject = Polygon::new(
        to_coords(&polygon.outer),
        polygon.holes.iter().map(to_coords).collect(),
    );
    let frame = Rect::new(
        Coord {
            x: window.min_x,
            y: window.min_y,
        },
        Coord {
            x: window.max_x,
            y: window.max_y,
        },
    )
    .to_polygon();

    let clipped = BooleanOps::intersection(&subject, &frame);

    let mut rings = Vec::new();
    for part in clipped.iter() {
        rings.push(from_coords(part.exterior(), true));
        rings.extend(part.interiors().iter().map(|hole| from_coords(hole, false)));
    }
    rings
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ring(coords: &[(f64, f64)]) -> Ring {
        Ring::new(coords.iter().map(|&(x, y)| Point::new(x, y)).collect())
    }

    #[test]
    fn test_split_figure_eight() {
        // Two triangles sharing the vertex (1, 1)
        let eight = ring(&[
            (0.0, 0.0),
            (1.0, 1.0),
            (2.0, 0.0),
            (2.0, 2.0),
            (1.0, 1.0),
            (0.0, 2.0),
        ]);
        let mut loops = split_pinches(eight);
        loops.sort_by(|a, b| a.points()[0].x.total_cmp(&b.points()[0].x));
        assert_eq!(loops.len(), 2);
        assert!(loops.iter().all(Ring::is_simple));
        assert!(loops.iter().all(|l| l.len() == 3));
    }

    #[test]
    fn test_simple_ring_unchanged() {
        let square = ring(&[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)]);
        let loops = split_pinches(square.clone());
        assert_eq!(loops, vec![square]);
    }

    #[test]
    fn test_clip_fast_paths() {
        let polygon = ContourPolygon {
            outer: ring(&[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)]),
            holes: vec![],
            depth: 0,
            threshold: Threshold::Level(0.0),
        };
        let inside = clip_polygon(polygon.clone(), &BoundingBox::new(-1.0, -1.0, 2.0, 2.0));
        assert_eq!(inside.len(), 1);
        assert_eq!(inside[0], polygon.outer);

        let outside = clip_polygon(polygon, &BoundingBox::new(5.0, 5.0, 6.0, 6.0));
        assert!(outside.is_empty());
    }
}
