use super::FitSequence;
use crate::path::Path;
use contour_common::Point;

/// Cardinal spline through every vertex.
///
/// The tangent at `P[i]` is `(1 - tension) * (P[i+1] - P[i-1]) / 2`; open
/// ends use the one-sided difference. Each edge becomes one cubic in Hermite
/// form, so the curve passes through every input point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CardinalFit {
    pub tension: f64,
}

impl Default for CardinalFit {
    fn default() -> Self {
        Self { tension: 0.0 }
    }
}

impl CardinalFit {
    pub fn fit(&self, seq: &FitSequence) -> Path {
        let points = seq.points();
        let mut path = Path::new();
        path.move_to(points[0]);
        self.append_run(seq, 0, points.len() - 1, &mut path);
        path
    }

    /// Append cubics for the edges between `start` and `end`.
    pub(crate) fn append_run(&self, seq: &FitSequence, start: usize, end: usize, path: &mut Path) {
        let points = seq.points();
        for i in start..end {
            let c1 = points[i] + self.tangent(seq, i) * (1.0 / 3.0);
            let c2 = points[i + 1] - self.tangent(seq, i + 1) * (1.0 / 3.0);
            path.cubic_to(c1, c2, points[i + 1]);
        }
    }

    fn tangent(&self, seq: &FitSequence, i: usize) -> Point {
        let last = seq.len() - 1;
        let scale = if !seq.is_closed() && (i == 0 || i == last) {
            1.0
        } else {
            0.5
        };
        seq.central_difference(i) * ((1.0 - self.tension) * scale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_tension_gives_straight_edges() {
        let points = vec![Point::new(0.0, 0.0), Point::new(1.0, 1.0), Point::new(2.0, 0.0)];
        let seq = FitSequence::new(&points, false);
        let path = CardinalFit { tension: 1.0 }.fit(&seq);
        let cubics: Vec<_> = path.cubics().collect();
        assert_eq!(cubics.len(), 2);
        assert_eq!(cubics[0].c1, points[0]);
        assert_eq!(cubics[0].c2, points[1]);
    }

    #[test]
    fn test_catmull_rom_tangent() {
        let points = vec![Point::new(0.0, 0.0), Point::new(1.0, 0.0), Point::new(2.0, 2.0)];
        let seq = FitSequence::new(&points, false);
        let path = CardinalFit::default().fit(&seq);
        let cubics: Vec<_> = path.cubics().collect();
        // m1 = (P2 - P0) / 2 = (1, 1); c2 of the first edge is P1 - m1 / 3
        let c2 = cubics[0].c2;
        assert!((c2.x - (1.0 - 1.0 / 3.0)).abs() < 1e-12);
        assert!((c2.y + 1.0 / 3.0).abs() < 1e-12);
    }
}
