//! Curve fitting of rings and polylines into cubic paths.
//!
//! [`CurveFitter`] picks one of three policies:
//!
//! - [`ApproximateFit`]: least-squares cubics, split at the worst point until
//!   the curve stays within tolerance of the polyline (fewest control points)
//! - [`CardinalFit`]: one cubic per edge through every vertex
//! - [`TightFit`]: corners kept sharp, greedy longest runs in between
//!
//! Every cubic starts and ends exactly on an input vertex.

mod approximate;
mod bezier;
mod cardinal;
mod tight;

pub use approximate::ApproximateFit;
pub use cardinal::CardinalFit;
pub use tight::TightFit;

use crate::path::Path;
use crate::types::{ContourPolygon, Polyline, Ring};
use crate::warning::ContourWarning;
use contour_common::{ContourError, ContourResult, Point};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which fitting algorithm to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FitPolicy {
    #[default]
    Approximate,
    Cardinal,
    Tight,
}

impl FitPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            FitPolicy::Approximate => "approximate",
            FitPolicy::Cardinal => "cardinal",
            FitPolicy::Tight => "tight",
        }
    }
}

impl fmt::Display for FitPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FitPolicy {
    type Err = ContourError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "approximate" => Ok(FitPolicy::Approximate),
            "cardinal" => Ok(FitPolicy::Cardinal),
            "tight" => Ok(FitPolicy::Tight),
            other => Err(ContourError::config(format!("unknown fit policy: {}", other))),
        }
    }
}

/// Curve fitting settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FitConfig {
    pub policy: FitPolicy,
    /// Maximum distance between the fitted curve and the source polyline (world units)
    pub tolerance: f64,
    /// Cardinal spline tension in `[0, 1]`; 0 is Catmull-Rom, 1 gives straight edges
    pub tension: f64,
    /// Turning angle above which a vertex is a corner (Tight policy)
    pub corner_angle_deg: f64,
    /// Bound on fit attempts per sequence (Approximate policy)
    pub max_iterations: usize,
    /// Bound on recursive splits of one run (Approximate policy)
    pub max_depth: usize,
}

impl Default for FitConfig {
    fn default() -> Self {
        Self {
            policy: FitPolicy::Approximate,
            tolerance: 0.1,
            tension: 0.0,
            corner_angle_deg: 60.0,
            max_iterations: 4096,
            max_depth: 32,
        }
    }
}

impl FitConfig {
    pub fn validate(&self) -> ContourResult<()> {
        if !(self.tolerance > 0.0) || !self.tolerance.is_finite() {
            return Err(ContourError::config(format!(
                "fit tolerance must be positive, got {}",
                self.tolerance
            )));
        }
        if !(0.0..=1.0).contains(&self.tension) {
            return Err(ContourError::config(format!(
                "fit tension must be within [0, 1], got {}",
                self.tension
            )));
        }
        if !(self.corner_angle_deg > 0.0 && self.corner_angle_deg < 180.0) {
            return Err(ContourError::config(format!(
                "corner angle must be within (0, 180) degrees, got {}",
                self.corner_angle_deg
            )));
        }
        if self.max_iterations == 0 || self.max_depth == 0 {
            return Err(ContourError::config(
                "fit iteration and depth bounds must be positive",
            ));
        }
        Ok(())
    }
}

/// A fitted path and any fallbacks taken while producing it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FitOutcome {
    pub path: Path,
    pub warnings: Vec<ContourWarning>,
}

/// Points prepared for fitting.
///
/// Consecutive duplicates are removed. A closed sequence is unrolled: its
/// first point is repeated at the end so the seam is an ordinary joint.
#[derive(Debug, Clone)]
pub struct FitSequence {
    points: Vec<Point>,
    closed: bool,
}

impl FitSequence {
    pub fn new(points: &[Point], closed: bool) -> Self {
        let mut unique = points.to_vec();
        unique.dedup();
        if closed {
            while unique.len() > 1 && unique.first() == unique.last() {
                unique.pop();
            }
            if unique.len() >= 2 {
                unique.push(unique[0]);
            }
        }
        Self {
            points: unique,
            closed,
        }
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

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Neighbour indices used for the tangent at `i`. Closed sequences wrap
    /// around the seam; open ends fall back to the vertex itself.
    fn neighbours(&self, i: usize) -> (usize, usize) {
        let last = self.points.len() - 1;
        if self.closed && (i == 0 || i == last) {
            (last - 1, 1)
        } else {
            (i.saturating_sub(1), (i + 1).min(last))
        }
    }

    /// `P[next] - P[prev]` around `i`, not normalised.
    pub fn central_difference(&self, i: usize) -> Point {
        let (prev, next) = self.neighbours(i);
        self.points[next] - self.points[prev]
    }

    /// Unit tangent at `i` in the direction of travel.
    pub fn central_tangent(&self, i: usize) -> Point {
        self.central_difference(i)
            .normalized()
            .unwrap_or_else(|| self.forward_tangent(i))
    }

    /// Unit direction from `i` towards the next point.
    pub fn forward_tangent(&self, i: usize) -> Point {
        let last = self.points.len() - 1;
        let (a, b) = if i < last { (i, i + 1) } else { (i - 1, i) };
        (self.points[b] - self.points[a])
            .normalized()
            .unwrap_or(Point::new(1.0, 0.0))
    }

    /// Unit direction from `i` back towards the previous point.
    pub fn backward_tangent(&self, i: usize) -> Point {
        let (a, b) = if i > 0 { (i, i - 1) } else { (1, 0) };
        (self.points[b] - self.points[a])
            .normalized()
            .unwrap_or(Point::new(-1.0, 0.0))
    }

    /// Path with a single MoveTo, for sequences too short to fit.
    fn trivial_path(&self) -> Path {
        let mut path = Path::new();
        if let Some(first) = self.points.first() {
            path.move_to(*first);
        }
        path
    }
}

/// Curve fitting policy with its parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CurveFitter {
    Approximate(ApproximateFit),
    Cardinal(CardinalFit),
    Tight(TightFit),
}

impl Default for CurveFitter {
    fn default() -> Self {
        Self::from_config(&FitConfig::default())
    }
}

impl CurveFitter {
    pub fn from_config(config: &FitConfig) -> Self {
        match config.policy {
            FitPolicy::Approximate => CurveFitter::Approximate(ApproximateFit {
                tolerance: config.tolerance,
                max_iterations: config.max_iterations,
                max_depth: config.max_depth,
                tension: config.tension,
            }),
            FitPolicy::Cardinal => CurveFitter::Cardinal(CardinalFit {
                tension: config.tension,
            }),
            FitPolicy::Tight => CurveFitter::Tight(TightFit {
                tolerance: config.tolerance,
                corner_angle_deg: config.corner_angle_deg,
            }),
        }
    }

    pub fn policy(&self) -> FitPolicy {
        match self {
            CurveFitter::Approximate(_) => FitPolicy::Approximate,
            CurveFitter::Cardinal(_) => FitPolicy::Cardinal,
            CurveFitter::Tight(_) => FitPolicy::Tight,
        }
    }

    /// Fit a point sequence; closed sequences end with `Close`.
    pub fn fit(&self, points: &[Point], closed: bool) -> FitOutcome {
        let seq = FitSequence::new(points, closed);
        if seq.len() < 2 {
            return FitOutcome {
                path: seq.trivial_path(),
                warnings: Vec::new(),
            };
        }

        let mut outcome = match self {
            CurveFitter::Approximate(fit) => fit.fit(&seq),
            CurveFitter::Cardinal(fit) => FitOutcome {
                path: fit.fit(&seq),
                warnings: Vec::new(),
            },
            CurveFitter::Tight(fit) => FitOutcome {
                path: fit.fit(&seq),
                warnings: Vec::new(),
            },
        };
        if closed {
            outcome.path.close();
        }
        outcome
    }

    pub fn fit_ring(&self, ring: &Ring) -> FitOutcome {
        self.fit(ring.points(), true)
    }

    pub fn fit_polyline(&self, polyline: &Polyline) -> FitOutcome {
        self.fit(polyline.points(), false)
    }

    /// Outer ring then holes, each as its own closed subpath.
    pub fn fit_polygon(&self, polygon: &ContourPolygon) -> FitOutcome {
        let mut combined = FitOutcome::default();
        for ring in polygon.rings() {
            let outcome = self.fit_ring(ring);
            combined.path.append(outcome.path);
            combined.warnings.extend(outcome.warnings);
        }
        combined
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_parse() {
        assert_eq!("Tight".parse::<FitPolicy>().unwrap(), FitPolicy::Tight);
        assert_eq!(" cardinal ".parse::<FitPolicy>().unwrap(), FitPolicy::Cardinal);
        assert!("bspline".parse::<FitPolicy>().is_err());
        assert_eq!(FitPolicy::Approximate.to_string(), "approximate");
    }

    #[test]
    fn test_sequence_unrolls_closed() {
        let points = vec![
            Point::new(0.0, 0.0),
            Point::new(1.0, 0.0),
            Point::new(1.0, 0.0),
            Point::new(1.0, 1.0),
            Point::new(0.0, 0.0),
        ];
        let seq = FitSequence::new(&points, true);
        assert_eq!(seq.len(), 4);
        assert_eq!(seq.points()[3], seq.points()[0]);
        // Seam tangent from cyclic neighbours (1,1) -> (1,0)
        assert_eq!(seq.central_difference(0), Point::new(0.0, -1.0));
        assert_eq!(seq.central_difference(3), Point::new(0.0, -1.0));
    }

    #[test]
    fn test_config_validation() {
        assert!(FitConfig::default().validate().is_ok());
        let config = FitConfig {
            tension: 1.5,
            ..Default::default()
        };
        assert!(config.validate().is_err());
        let config = FitConfig {
            tolerance: 0.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_short_sequences() {
        let fitter = CurveFitter::default();
        assert!(fitter.fit(&[], false).path.is_empty());
        let outcome = fitter.fit(&[Point::new(1.0, 1.0)], true);
        assert_eq!(outcome.path.len(), 1);
    }
}
