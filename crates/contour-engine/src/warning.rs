//! Non-fatal diagnostics attached to a threshold's output.

use serde::Serialize;
use thiserror::Error;

/// Something the pipeline worked around instead of failing the threshold.
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ContourWarning {
    /// A ring could not be made simple and was left out of the repaired set.
    #[error("ring with {ring_vertices} vertices could not be repaired: {reason}")]
    RepairFailed { ring_vertices: usize, reason: String },

    /// Curve fitting hit its iteration or depth bound on a run of points and
    /// fell back to a cardinal spline there.
    #[error("curve fit did not converge on points {run_start}..={run_end} after {iterations} iterations")]
    FitConvergence {
        run_start: usize,
        run_end: usize,
        iterations: usize,
    },

    /// A clockwise ring has no enclosing outer ring. It is kept as a bare
    /// isoline in [`ThresholdOutput::orphan_rings`](crate::pipeline::ThresholdOutput)
    /// but bounds no polygon.
    #[error("hole of area {area} has no enclosing outer ring, kept as an isoline only")]
    OrphanHole { area: f64 },
}

impl ContourWarning {
    pub fn kind(&self) -> &'static str {
        match self {
            ContourWarning::RepairFailed { .. } => "repair_failed",
            ContourWarning::FitConvergence { .. } => "fit_convergence",
            ContourWarning::OrphanHole { .. } => "orphan_hole",
        }
    }
}
