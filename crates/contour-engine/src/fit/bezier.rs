//! Least-squares single-cubic fitting shared by the fitting policies.

use crate::path::CubicSegment;
use contour_common::Point;

/// Newton passes tried on a fit that is close to tolerance.
const MAX_REPARAMETERIZE: usize = 4;

/// Bounds on curve samples taken when measuring a fit.
const MIN_SAMPLES: usize = 16;
const MAX_SAMPLES: usize = 1024;

/// Handle halvings tried on a single edge before it is drawn straight.
const MAX_HANDLE_HALVINGS: usize = 6;

/// A single cubic fitted to a run of points, with its worst deviation.
#[derive(Debug, Clone, Copy)]
pub(crate) struct RunFit {
    pub cubic: CubicSegment,
    /// Upper bound on the distance from any curve point to the run's
    /// polyline, and from any run vertex to the curve
    pub error: f64,
    /// Offset of the vertex nearest the worst deviation
    pub worst: usize,
}

/// Fit one cubic to `points` with fixed unit end tangents.
///
/// `left` points from the first point into the run, `right` from the last
/// point back into the run. The cubic starts and ends exactly on the first
/// and last points. A two-point run always comes back within `tolerance`.
pub(crate) fn fit_run(points: &[Point], left: Point, right: Point, tolerance: f64) -> RunFit {
    let n = points.len();
    if n <= 2 {
        return fit_edge(points[0], points[n - 1], left, right, tolerance);
    }

    let mut params = chord_parameters(points);
    let mut best = measure(least_squares(points, &params, left, right), points, &params, tolerance);

    if best.error > tolerance && best.error <= tolerance * 4.0 {
        for _ in 0..MAX_REPARAMETERIZE {
            params = reparameterize(&best.cubic, points, &params);
            let candidate = measure(least_squares(points, &params, left, right), points, &params, tolerance);
            if candidate.error < best.error {
                best = candidate;
            }
            if best.error <= tolerance {
                break;
            }
        }
    }

    best
}

/// Single edge: keep the tangents while the bulge stays within tolerance,
/// shortening the handles, and fall back to a straight cubic.
fn fit_edge(p0: Point, p3: Point, left: Point, right: Point, tolerance: f64) -> RunFit {
    let edge = [p0, p3];
    let params = [0.0, 1.0];
    let mut handle = p0.distance(p3) / 3.0;
    for _ in 0..=MAX_HANDLE_HALVINGS {
        let cubic = CubicSegment::new(p0, p0 + left * handle, p3 + right * handle, p3);
        let fit = measure(cubic, &edge, &params, tolerance);
        if fit.error <= tolerance {
            return fit;
        }
        handle *= 0.5;
    }
    RunFit {
        cubic: CubicSegment::from_line(p0, p3),
        error: 0.0,
        worst: 1,
    }
}

/// Cumulative chord length normalised to `[0, 1]`.
pub(crate) fn chord_parameters(points: &[Point]) -> Vec<f64> {
    let mut params = Vec::with_capacity(points.len());
    let mut total = 0.0;
    params.push(0.0);
    for w in points.windows(2) {
        total += w[0].distance(w[1]);
        params.push(total);
    }
    if total > 0.0 {
        for u in params.iter_mut() {
            *u /= total;
        }
    } else {
        let last = (points.len().max(2) - 1) as f64;
        for (k, u) in params.iter_mut().enumerate() {
            *u = k as f64 / last;
        }
    }
    params
}

fn bernstein(u: f64) -> [f64; 4] {
    let mu = 1.0 - u;
    [mu * mu * mu, 3.0 * u * mu * mu, 3.0 * u * u * mu, u * u * u]
}

/// Control points along the fixed tangents minimising squared error.
fn least_squares(points: &[Point], params: &[f64], left: Point, right: Point) -> CubicSegment {
    let p0 = points[0];
    let p3 = points[points.len() - 1];

    let mut c = [[0.0f64; 2]; 2];
    let mut x = [0.0f64; 2];

    for (p, &u) in points.iter().zip(params) {
        let b = bernstein(u);
        let a0 = left * b[1];
        let a1 = right * b[2];

        c[0][0] += a0.dot(a0);
        c[0][1] += a0.dot(a1);
        c[1][1] += a1.dot(a1);

        let tmp = *p - (p0 * (b[0] + b[1]) + p3 * (b[2] + b[3]));
        x[0] += a0.dot(tmp);
        x[1] += a1.dot(tmp);
    }
    c[1][0] = c[0][1];

    let det = c[0][0] * c[1][1] - c[1][0] * c[0][1];
    let (mut alpha_l, mut alpha_r) = if det.abs() > f64::EPSILON {
        (
            (x[0] * c[1][1] - x[1] * c[0][1]) / det,
            (c[0][0] * x[1] - c[1][0] * x[0]) / det,
        )
    } else {
        (0.0, 0.0)
    };

    // Handles past the chord length loop the curve away from the run
    let chord = p0.distance(p3);
    let eps = 1e-6 * chord;
    if !(alpha_l >= eps && alpha_l <= chord) || !(alpha_r >= eps && alpha_r <= chord) {
        alpha_l = chord / 3.0;
        alpha_r = chord / 3.0;
    }

    CubicSegment::new(p0, p0 + left * alpha_l, p3 + right * alpha_r, p3)
}

/// Measure `cubic` against the polyline through `points` in both directions.
///
/// The curve is sampled densely. Between two samples the curve strays from
/// their chord by at most `M·Δt²/8`, where `M` bounds the second derivative,
/// and a chord point is no further from the polyline than its endpoints are
/// from a common segment, or than half the chord plus their mean distance.
/// The reported error is therefore an upper bound, not an estimate.
fn measure(cubic: CubicSegment, points: &[Point], params: &[f64], tolerance: f64) -> RunFit {
    let n = points.len();
    let control_length =
        cubic.p0.distance(cubic.c1) + cubic.c1.distance(cubic.c2) + cubic.c2.distance(cubic.p3);
    let count = ((4.0 * control_length / tolerance).ceil() as usize).clamp(MIN_SAMPLES, MAX_SAMPLES);

    let samples: Vec<Point> = (0..=count)
        .map(|k| cubic.eval(k as f64 / count as f64))
        .collect();
    let nearest: Vec<(f64, usize)> = samples
        .iter()
        .map(|s| nearest_segment(*s, points))
        .collect();

    let accel = (cubic.p0 - cubic.c1 * 2.0 + cubic.c2)
        .length()
        .max((cubic.c1 - cubic.c2 * 2.0 + cubic.p3).length())
        * 6.0;
    let dt = 1.0 / count as f64;
    let sag = accel * dt * dt / 8.0;

    let mut error = 0.0;
    let mut worst_t = 0.5;
    for k in 0..count {
        let (da, sa) = nearest[k];
        let (db, sb) = nearest[k + 1];
        let gap = samples[k].distance(samples[k + 1]);
        let mut bound = (da + db + gap) / 2.0;
        if sa == sb {
            bound = bound.min(da.max(db));
        } else {
            let (a, b) = (samples[k], samples[k + 1]);
            for s in [sa, sb] {
                let shared = segment_distance(a, points[s], points[s + 1])
                    .max(segment_distance(b, points[s], points[s + 1]));
                bound = bound.min(shared);
            }
        }
        bound += sag;
        if bound > error {
            error = bound;
            worst_t = (k as f64 + 0.5) * dt;
        }
    }

    let mut worst = nearest_interior(params, worst_t);
    for (k, p) in points.iter().enumerate().take(n.saturating_sub(1)).skip(1) {
        let d = samples
            .iter()
            .map(|s| s.distance(*p))
            .fold(f64::INFINITY, f64::min);
        if d > error {
            error = d;
            worst = k;
        }
    }

    RunFit {
        cubic,
        error,
        worst,
    }
}

/// Distance from `p` to the polyline and the index of the nearest segment.
fn nearest_segment(p: Point, points: &[Point]) -> (f64, usize) {
    let mut best = (f64::INFINITY, 0);
    for (k, w) in points.windows(2).enumerate() {
        // Cheap reject on the segment's box before the exact distance
        let dx = (w[0].x.min(w[1].x) - p.x).max(p.x - w[0].x.max(w[1].x)).max(0.0);
        let dy = (w[0].y.min(w[1].y) - p.y).max(p.y - w[0].y.max(w[1].y)).max(0.0);
        if dx.max(dy) >= best.0 {
            continue;
        }
        let d = segment_distance(p, w[0], w[1]);
        if d < best.0 {
            best = (d, k);
        }
    }
    best
}

fn segment_distance(p: Point, a: Point, b: Point) -> f64 {
    let ab = b - a;
    let len_sq = ab.dot(ab);
    if len_sq == 0.0 {
        return p.distance(a);
    }
    let t = ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    p.distance(a + ab * t)
}

/// Interior vertex whose parameter is closest to `t`.
fn nearest_interior(params: &[f64], t: f64) -> usize {
    let n = params.len();
    if n <= 2 {
        return n / 2;
    }
    (1..n - 1)
        .min_by(|&a, &b| (params[a] - t).abs().total_cmp(&(params[b] - t).abs()))
        .unwrap_or(n / 2)
}

/// One Newton step per point towards the closest curve parameter.
fn reparameterize(cubic: &CubicSegment, points: &[Point], params: &[f64]) -> Vec<f64> {
    points
        .iter()
        .zip(params)
        .map(|(p, &u)| {
            let diff = cubic.eval(u) - *p;
            let d1 = cubic.derivative(u);
            let d2 = cubic.second_derivative(u);
            let numerator = diff.dot(d1);
            let denominator = d1.dot(d1) + diff.dot(d2);
            if denominator.abs() < f64::EPSILON {
                u
            } else {
                (u - numerator / denominator).clamp(0.0, 1.0)
            }
        })
        .collect()
}
