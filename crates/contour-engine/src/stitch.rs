//! Connect directed segments into closed rings and open polylines.
//!
//! Segments live in an arena and are linked by index; chains record their
//! head and tail links. Open chain ends are indexed by canonical endpoint key
//! so each segment is attached in constant time. Closing a ring or merging
//! two chains only rewires `next` indices.

use crate::extract::{NodeKey, Segment};
use crate::types::{Polyline, Ring};
use contour_common::{ContourError, ContourResult, Point};
use std::collections::HashMap;
use tracing::debug;

#[derive(Debug, Clone, Copy)]
struct Link {
    start: Point,
    end: Point,
    next: Option<usize>,
}

#[derive(Debug, Clone, Copy)]
struct Chain {
    head: usize,
    tail: usize,
    head_key: NodeKey,
    tail_key: NodeKey,
    open: bool,
}

/// Rings and leftover open chains for one threshold.
#[derive(Debug, Clone, Default)]
pub struct StitchOutput {
    pub rings: Vec<Ring>,
    pub polylines: Vec<Polyline>,
}

/// Index-addressed segment stitcher.
#[derive(Debug, Default)]
pub struct EdgeStitcher {
    links: Vec<Link>,
    chains: Vec<Chain>,
    /// Open chain whose first segment starts at the key
    heads: HashMap<NodeKey, usize>,
    /// Open chain whose last segment ends at the key
    tails: HashMap<NodeKey, usize>,
    rings: Vec<Ring>,
}

impl EdgeStitcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(segments: usize) -> Self {
        Self {
            links: Vec::with_capacity(segments),
            heads: HashMap::with_capacity(segments / 4),
            tails: HashMap::with_capacity(segments / 4),
            ..Default::default()
        }
    }

    /// Add one segment, normalised so the filled region is on its left.
    pub fn push(&mut self, segment: Segment) -> ContourResult<()> {
        let seg = segment.oriented();
        let (a, b) = (seg.start_key, seg.end_key);
        if a == b {
            return Ok(());
        }

        if self.tails.contains_key(&b) {
            return Err(conflict(b, "two segments end at the same crossing"));
        }
        if self.heads.contains_key(&a) {
            return Err(conflict(a, "two segments start at the same crossing"));
        }

        let link = self.links.len();
        self.links.push(Link {
            start: seg.start,
            end: seg.end,
            next: None,
        });

        match (self.tails.remove(&a), self.heads.remove(&b)) {
            (Some(before), Some(after)) if before == after => {
                // Closes a ring
                let chain = self.chains[before];
                self.links[chain.tail].next = Some(link);
                self.links[link].next = Some(chain.head);
                self.chains[before].open = false;
                self.emit_ring(chain.head, link);
            }
            (Some(before), Some(after)) => {
                // Bridges two chains: before + link + after
                let after_chain = self.chains[after];
                let tail_of_before = self.chains[before].tail;
                self.links[tail_of_before].next = Some(link);
                self.links[link].next = Some(after_chain.head);

                self.chains[before].tail = after_chain.tail;
                self.chains[before].tail_key = after_chain.tail_key;
                self.chains[after].open = false;
                self.tails.insert(after_chain.tail_key, before);
            }
            (Some(before), None) => {
                let tail = self.chains[before].tail;
                self.links[tail].next = Some(link);
                self.chains[before].tail = link;
                self.chains[before].tail_key = b;
                self.tails.insert(b, before);
            }
            (None, Some(after)) => {
                self.links[link].next = Some(self.chains[after].head);
                self.chains[after].head = link;
                self.chains[after].head_key = a;
                self.heads.insert(a, after);
            }
            (None, None) => {
                let chain = self.chains.len();
                self.chains.push(Chain {
                    head: link,
                    tail: link,
                    head_key: a,
                    tail_key: b,
                    open: true,
                });
                self.heads.insert(a, chain);
                self.tails.insert(b, chain);
            }
        }

        Ok(())
    }

    /// Collect the ring that starts at `head` and whose last link is `last`.
    fn emit_ring(&mut self, head: usize, last: usize) {
        let mut points = Vec::new();
        let mut cursor = head;
        loop {
            points.push(self.links[cursor].start);
            if cursor == last {
                break;
            }
            match self.links[cursor].next {
                Some(next) => cursor = next,
                None => break,
            }
        }

        dedup_closed(&mut points);
        if points.len() >= 3 {
            self.rings.push(Ring::new(points));
        }
    }

    /// Finish stitching; chains still open become polylines.
    pub fn finish(self) -> StitchOutput {
        let mut polylines = Vec::new();
        for chain in self.chains.iter().filter(|c| c.open) {
            let mut points = vec![self.links[chain.head].start];
            let mut cursor = Some(chain.head);
            while let Some(idx) = cursor {
                points.push(self.links[idx].end);
                if idx == chain.tail {
                    break;
                }
                cursor = self.links[idx].next;
            }
            points.dedup();
            if points.len() >= 2 {
                polylines.push(Polyline::new(points));
            }
        }

        debug!(
            links = self.links.len(),
            rings = self.rings.len(),
            polylines = polylines.len(),
            "stitched segments"
        );

        StitchOutput {
            rings: self.rings,
            polylines,
        }
    }
}

/// Stitch a batch of segments.
pub fn stitch_segments<I>(segments: I) -> ContourResult<StitchOutput>
where
    I: IntoIterator<Item = Segment>,
{
    let iter = segments.into_iter();
    let mut stitcher = EdgeStitcher::with_capacity(iter.size_hint().0);
    for segment in iter {
        stitcher.push(segment)?;
    }
    Ok(stitcher.finish())
}

fn conflict(key: NodeKey, reason: &str) -> ContourError {
    ContourError::invalid_topology(key.to_string(), reason)
}

/// Drop consecutive duplicates, including a last point equal to the first.
fn dedup_closed(points: &mut Vec<Point>) {
    points.dedup();
    while points.len() > 1 && points.first() == points.last() {
        points.pop();
    }
}
