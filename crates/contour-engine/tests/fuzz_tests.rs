//! Randomised grids through the whole pipeline.
//!
//! Every ring that survives repair must be simple, correctly oriented and
//! nested inside its outer ring, whatever the field looks like.

use contour_engine::{ContourConfig, ContourPipeline, Grid, Point, Ring, Threshold};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const ROUNDS: usize = 60;

/// Brute-force simplicity check: no two non-adjacent edges touch and no
/// vertex repeats.
fn is_simple_brute_force(ring: &Ring) -> bool {
    let pts = ring.points();
    let n = pts.len();
    if n < 3 {
        return false;
    }
    for a in 0..n {
        for b in (a + 1)..n {
            if pts[a] == pts[b] {
                return false;
            }
        }
    }
    let edge = |k: usize| (pts[k], pts[(k + 1) % n]);
    for a in 0..n {
        for b in (a + 1)..n {
            let adjacent = b == a + 1 || (a == 0 && b == n - 1);
            if adjacent {
                continue;
            }
            let (p1, p2) = edge(a);
            let (q1, q2) = edge(b);
            if segments_intersect(p1, p2, q1, q2) {
                return false;
            }
        }
    }
    true
}

fn orient(a: Point, b: Point, c: Point) -> f64 {
    (b - a).cross(c - a)
}

fn on_segment(a: Point, b: Point, p: Point) -> bool {
    p.x >= a.x.min(b.x) && p.x <= a.x.max(b.x) && p.y >= a.y.min(b.y) && p.y <= a.y.max(b.y)
}

fn segments_intersect(p1: Point, p2: Point, q1: Point, q2: Point) -> bool {
    let d1 = orient(q1, q2, p1);
    let d2 = orient(q1, q2, p2);
    let d3 = orient(p1, p2, q1);
    let d4 = orient(p1, p2, q2);

    if ((d1 > 0.0 && d2 < 0.0) || (d1 < 0.0 && d2 > 0.0))
        && ((d3 > 0.0 && d4 < 0.0) || (d3 < 0.0 && d4 > 0.0))
    {
        return true;
    }
    (d1 == 0.0 && on_segment(q1, q2, p1))
        || (d2 == 0.0 && on_segment(q1, q2, p2))
        || (d3 == 0.0 && on_segment(p1, p2, q1))
        || (d4 == 0.0 && on_segment(p1, p2, q2))
}

fn random_grid(rng: &mut StdRng) -> (usize, usize, Vec<f32>) {
    let width = rng.gen_range(2..=24);
    let height = rng.gen_range(2..=24);
    let missing_rate = if rng.gen_bool(0.5) { 0.0 } else { 0.1 };
    let data = (0..width * height)
        .map(|_| {
            if rng.gen_bool(missing_rate) {
                f32::NAN
            } else {
                rng.gen_range(0.0f32..1.0)
            }
        })
        .collect();
    (width, height, data)
}

fn random_threshold(rng: &mut StdRng) -> Threshold {
    let lo: f64 = rng.gen_range(0.05..0.8);
    if rng.gen_bool(0.5) {
        Threshold::Level(lo)
    } else {
        Threshold::band(lo, lo + rng.gen_range(0.05..0.3))
    }
}

#[test]
fn test_random_grids_produce_valid_polygons() {
    let mut rng = StdRng::seed_from_u64(0x5eed_c0de);

    for round in 0..ROUNDS {
        let (width, height, data) = random_grid(&mut rng);
        let grid = Grid::from_values(width, height, &data).unwrap();

        let mut config = ContourConfig::default();
        config.extract.close_frame = rng.gen_bool(0.5);
        let pipeline = ContourPipeline::new(config).unwrap();

        let thresholds: Vec<Threshold> = (0..3).map(|_| random_threshold(&mut rng)).collect();
        let set = pipeline.run_thresholds(&grid, &thresholds);

        for result in &set.results {
            let out = match &result.outcome {
                Ok(out) => out,
                Err(e) => panic!("round {} threshold {} failed: {}", round, result.threshold, e),
            };

            for polygon in &out.polygons {
                assert!(polygon.outer.signed_area() > 0.0, "round {}", round);
                assert!(is_simple_brute_force(&polygon.outer), "round {}", round);
                for hole in &polygon.holes {
                    assert!(hole.signed_area() < 0.0, "round {}", round);
                    assert!(is_simple_brute_force(hole), "round {}", round);
                    assert!(polygon.outer.encloses(hole), "round {}", round);
                }
            }
            for ring in &out.orphan_rings {
                assert!(ring.signed_area() < 0.0, "round {}", round);
            }
            assert_eq!(
                out.paths.len(),
                out.polygons.len() + out.polylines.len() + out.orphan_rings.len(),
                "round {}",
                round
            );
        }
    }
}

#[test]
fn test_random_grids_close_with_frame() {
    let mut rng = StdRng::seed_from_u64(42);

    for round in 0..ROUNDS {
        let width = rng.gen_range(2..=16);
        let height = rng.gen_range(2..=16);
        let data: Vec<f32> = (0..width * height).map(|_| rng.gen_range(0.0f32..1.0)).collect();
        let grid = Grid::from_values(width, height, &data).unwrap();

        let mut config = ContourConfig::default();
        config.extract.close_frame = true;
        let pipeline = ContourPipeline::new(config).unwrap();

        let threshold = random_threshold(&mut rng);
        let out = pipeline.run_threshold(&grid, threshold).unwrap();
        // No missing data: every boundary closes along the frame
        assert!(out.polylines.is_empty(), "round {}", round);

        let filled: f64 = out.polygons.iter().map(|p| p.area()).sum();
        let frame = ((width - 1) * (height - 1)) as f64;
        assert!(filled >= 0.0 && filled <= frame + 1e-9, "round {}", round);
    }
}
