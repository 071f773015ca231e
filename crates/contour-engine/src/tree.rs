//! Assemble rings into polygons with holes and nesting depth.

use crate::threshold::Threshold;
use crate::types::{ContourPolygon, Ring};
use contour_common::BoundingBox;
use rstar::primitives::{GeomWithData, Rectangle};
use rstar::{RTree, AABB};
use tracing::debug;

type RingEnvelope = GeomWithData<Rectangle<[f64; 2]>, usize>;

/// Polygons plus holes that had no enclosing outer ring.
#[derive(Debug, Clone, Default)]
pub struct TreeOutput {
    pub polygons: Vec<ContourPolygon>,
    pub orphan_holes: Vec<Ring>,
}

struct Entry {
    ring: Ring,
    area: f64,
    bbox: BoundingBox,
}

impl Entry {
    fn is_outer(&self) -> bool {
        self.area > 0.0
    }

    /// Whether this ring strictly encloses `other`.
    fn encloses(&self, other: &Entry) -> bool {
        self.area.abs() > other.area.abs()
            && self.bbox.contains_bbox(&other.bbox)
            && self.ring.encloses(&other.ring)
    }
}

fn aabb(bbox: &BoundingBox) -> AABB<[f64; 2]> {
    AABB::from_corners([bbox.min_x, bbox.min_y], [bbox.max_x, bbox.max_y])
}

/// Build polygons from oriented rings.
///
/// Counter-clockwise rings are outers, clockwise rings holes, zero-area
/// rings are dropped. Each hole joins the smallest outer enclosing it.
/// Depth counts every ring, outer or hole, strictly enclosing the outer.
pub fn build_polygons(rings: Vec<Ring>, threshold: Threshold) -> TreeOutput {
    let total = rings.len();
    let entries: Vec<Entry> = rings
        .into_iter()
        .filter_map(|ring| {
            let area = ring.signed_area();
            if area == 0.0 || !area.is_finite() {
                return None;
            }
            let bbox = ring.bbox();
            Some(Entry { ring, area, bbox })
        })
        .collect();

    let index: RTree<RingEnvelope> = RTree::bulk_load(
        entries
            .iter()
            .enumerate()
            .map(|(idx, e)| {
                GeomWithData::new(
                    Rectangle::from_corners(
                        [e.bbox.min_x, e.bbox.min_y],
                        [e.bbox.max_x, e.bbox.max_y],
                    ),
                    idx,
                )
            })
            .collect(),
    );

    // Rings that could enclose `idx`: envelope overlap, then the exact test
    let all = &entries;
    let enclosing = |idx: usize| {
        let target = &all[idx];
        index
            .locate_in_envelope_intersecting(&aabb(&target.bbox))
            .map(|candidate| candidate.data)
            .filter(move |&other| other != idx && all[other].encloses(target))
    };

    let mut parent_of_hole: Vec<Option<usize>> = vec![None; entries.len()];
    for (idx, entry) in entries.iter().enumerate() {
        if entry.is_outer() {
            continue;
        }
        parent_of_hole[idx] = enclosing(idx)
            .filter(|&other| entries[other].is_outer())
            .min_by(|&a, &b| {
                entries[a]
                    .area
                    .total_cmp(&entries[b].area)
                    .then(a.cmp(&b))
            });
    }

    let depths: Vec<usize> = (0..entries.len())
        .map(|idx| {
            if entries[idx].is_outer() {
                enclosing(idx).count()
            } else {
                0
            }
        })
        .collect();

    let mut holes_of: Vec<Vec<usize>> = vec![Vec::new(); entries.len()];
    let mut orphan_idx = Vec::new();
    for (idx, entry) in entries.iter().enumerate() {
        if entry.is_outer() {
            continue;
        }
        match parent_of_hole[idx] {
            Some(parent) => holes_of[parent].push(idx),
            None => orphan_idx.push(idx),
        }
    }

    let mut slots: Vec<Option<Entry>> = entries.into_iter().map(Some).collect();
    let mut polygons = Vec::new();
    for idx in 0..slots.len() {
        let is_outer = slots[idx].as_ref().is_some_and(Entry::is_outer);
        if !is_outer {
            continue;
        }
        let Some(outer) = slots[idx].take() else {
            continue;
        };
        let holes = holes_of[idx]
            .iter()
            .filter_map(|&h| slots[h].take().map(|e| e.ring))
            .collect();
        polygons.push(ContourPolygon {
            outer: outer.ring,
            holes,
            depth: depths[idx],
            threshold,
        });
    }

    let orphan_holes: Vec<Ring> = orphan_idx
        .into_iter()
        .filter_map(|h| slots[h].take().map(|e| e.ring))
        .collect();

    polygons.sort_by(|a, b| {
        a.depth
            .cmp(&b.depth)
            .then(b.outer.area().total_cmp(&a.outer.area()))
    });

    debug!(
        threshold = %threshold,
        rings = total,
        polygons = polygons.len(),
        orphan_holes = orphan_holes.len(),
        "built contour tree"
    );

    TreeOutput {
        polygons,
        orphan_holes,
    }
}
