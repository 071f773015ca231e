use super::bezier::{fit_run, RunFit};
use super::FitSequence;
use crate::path::Path;
use contour_common::Point;

/// Corner-preserving fit with the fewest cubics per smooth stretch.
///
/// Vertices turning by more than `corner_angle_deg` are corners: the curve
/// breaks there and uses one-sided tangents on each side. Between corners the
/// longest run of points a single cubic can follow within `tolerance` is
/// taken greedily, found by doubling the run and then bisecting.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TightFit {
    pub tolerance: f64,
    pub corner_angle_deg: f64,
}

impl TightFit {
    pub fn fit(&self, seq: &FitSequence) -> Path {
        let (seq, breaks) = self.prepare(seq);
        let points = seq.points();
        let last = points.len() - 1;

        let mut path = Path::new();
        path.move_to(points[0]);

        let mut start = 0;
        while start < last {
            // Next corner (or the end) bounds the greedy search
            let bound = (start + 1..=last).find(|&k| breaks[k]).unwrap_or(last);
            let end = self.longest_run(&seq, &breaks, start, bound);
            let cubic = self.run_fit(&seq, &breaks, start, end).cubic;
            path.cubic_to(cubic.c1, cubic.c2, cubic.p3);
            start = end;
        }

        path
    }

    /// Detect corners; closed rings with corners are rotated to start on one.
    /// Returns the sequence to fit and a break flag per point.
    fn prepare(&self, seq: &FitSequence) -> (FitSequence, Vec<bool>) {
        let points = seq.points();
        let threshold = self.corner_angle_deg.to_radians();

        if !seq.is_closed() {
            let n = points.len();
            let breaks = (0..n)
                .map(|i| {
                    i == 0
                        || i == n - 1
                        || turning_angle(points[i - 1], points[i], points[i + 1]) > threshold
                })
                .collect();
            return (seq.clone(), breaks);
        }

        // Unique vertices, without the repeated seam point
        let ring = &points[..points.len() - 1];
        let m = ring.len();
        let corners: Vec<usize> = (0..m)
            .filter(|&i| {
                let prev = ring[(i + m - 1) % m];
                let next = ring[(i + 1) % m];
                turning_angle(prev, ring[i], next) > threshold
            })
            .collect();

        let Some(&first) = corners.first() else {
            return (seq.clone(), vec![false; points.len()]);
        };

        let rotated: Vec<Point> = ring[first..].iter().chain(&ring[..first]).copied().collect();
        let rotated = FitSequence::new(&rotated, true);
        let mut breaks = vec![false; rotated.len()];
        for c in corners {
            breaks[(c + m - first) % m] = true;
        }
        breaks[m] = true;
        (rotated, breaks)
    }

    /// Largest `end` in `(start, bound]` whose run fits within tolerance.
    fn longest_run(&self, seq: &FitSequence, breaks: &[bool], start: usize, bound: usize) -> usize {
        let fits = |end: usize| self.run_fit(seq, breaks, start, end).error <= self.tolerance;

        // A single edge always fits
        let mut good = start + 1;
        let mut bad = None;
        let mut step = 2;
        loop {
            let candidate = (start + step).min(bound);
            if candidate <= good {
                break;
            }
            if fits(candidate) {
                good = candidate;
                step *= 2;
            } else {
                bad = Some(candidate);
                break;
            }
        }

        if let Some(mut hi) = bad {
            while hi - good > 1 {
                let mid = good + (hi - good) / 2;
                if fits(mid) {
                    good = mid;
                } else {
                    hi = mid;
                }
            }
        }

        good
    }

    fn run_fit(&self, seq: &FitSequence, breaks: &[bool], start: usize, end: usize) -> RunFit {
        let left = if breaks[start] {
            seq.forward_tangent(start)
        } else {
            seq.central_tangent(start)
        };
        let right = if breaks[end] {
            seq.backward_tangent(end)
        } else {
            -seq.central_tangent(end)
        };
        fit_run(&seq.points()[start..=end], left, right, self.tolerance)
    }
}

/// Absolute change of direction at `b`, in radians.
fn turning_angle(a: Point, b: Point, c: Point) -> f64 {
    let d1 = b - a;
    let d2 = c - b;
    d1.cross(d2).atan2(d1.dot(d2)).abs()
}
