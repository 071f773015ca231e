use super::bezier::fit_run;
use super::{CardinalFit, FitOutcome, FitSequence};
use crate::path::Path;
use crate::warning::ContourWarning;
use contour_common::Point;

/// Least-squares cubic fitting with splitting at the worst vertex.
///
/// Runs are kept on an explicit stack instead of recursing. When the number
/// of fit attempts passes `max_iterations`, or a run has been split more than
/// `max_depth` times, the affected points are drawn as a cardinal spline
/// instead and a [`ContourWarning::FitConvergence`] is reported.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ApproximateFit {
    pub tolerance: f64,
    pub max_iterations: usize,
    pub max_depth: usize,
    /// Tension of the cardinal fallback
    pub tension: f64,
}

#[derive(Debug, Clone, Copy)]
struct Run {
    first: usize,
    last: usize,
    /// Unit tangent leaving `first`
    left: Point,
    /// Unit tangent leaving `last` backwards
    right: Point,
    depth: usize,
}

impl ApproximateFit {
    pub fn fit(&self, seq: &FitSequence) -> FitOutcome {
        let points = seq.points();
        let last = points.len() - 1;
        let fallback = CardinalFit {
            tension: self.tension,
        };

        let mut path = Path::new();
        path.move_to(points[0]);
        let mut warnings = Vec::new();

        // Left halves are pushed last so cubics come off in drawing order.
        // Pending runs are always contiguous up to the end of the sequence.
        let mut stack = vec![Run {
            first: 0,
            last,
            left: seq.central_tangent(0),
            right: -seq.central_tangent(last),
            depth: 0,
        }];
        let mut iterations = 0usize;

        while let Some(run) = stack.pop() {
            iterations += 1;

            if iterations > self.max_iterations {
                let run_end = stack.first().map_or(run.last, |r| r.last);
                warnings.push(ContourWarning::FitConvergence {
                    run_start: run.first,
                    run_end,
                    iterations,
                });
                fallback.append_run(seq, run.first, run_end, &mut path);
                break;
            }

            if run.depth > self.max_depth {
                warnings.push(ContourWarning::FitConvergence {
                    run_start: run.first,
                    run_end: run.last,
                    iterations,
                });
                fallback.append_run(seq, run.first, run.last, &mut path);
                continue;
            }

            let fit = fit_run(&points[run.first..=run.last], run.left, run.right, self.tolerance);
            if fit.error <= self.tolerance || run.last - run.first < 2 {
                path.cubic_to(fit.cubic.c1, fit.cubic.c2, fit.cubic.p3);
                continue;
            }

            let mut split = run.first + fit.worst;
            if split <= run.first || split >= run.last {
                split = (run.first + run.last) / 2;
            }
            let tangent = seq.central_tangent(split);

            stack.push(Run {
                first: split,
                last: run.last,
                left: tangent,
                right: run.right,
                depth: run.depth + 1,
            });
            stack.push(Run {
                first: run.first,
                last: split,
                left: run.left,
                right: -tangent,
                depth: run.depth + 1,
            });
        }

        FitOutcome { path, warnings }
    }
}
