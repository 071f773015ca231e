//! Tests for clipping and simplicity repair.

use contour_engine::repair::split_pinches;
use contour_engine::{
    build_polygons, extract_segments, stitch_segments, BoundingBox, CancelToken, ContourError,
    ContourPolygon, ContourWarning, Grid, Point, PolygonRepair, Ring, TaskGuard, Threshold,
};
use test_utils::create_bump_grid;

fn ring(coords: &[(f64, f64)]) -> Ring {
    Ring::new(coords.iter().map(|&(x, y)| Point::new(x, y)).collect())
}

fn polygon(outer: Ring) -> ContourPolygon {
    ContourPolygon {
        outer,
        holes: vec![],
        depth: 0,
        threshold: Threshold::Level(0.0),
    }
}

fn bump_polygons(threshold: Threshold) -> Vec<ContourPolygon> {
    let data = create_bump_grid(21, 21, 10.0, 10.0, 8.0);
    let grid = Grid::from_values(21, 21, &data).unwrap();
    let segments = extract_segments(&grid, &threshold).unwrap();
    let stitched = stitch_segments(segments).unwrap();
    build_polygons(stitched.rings, threshold).polygons
}

// ============================================================================
// Clipping
// ============================================================================

#[test]
fn test_clip_disc_to_half() {
    let threshold = Threshold::Level(0.5);
    let polygons = bump_polygons(threshold);
    let full = polygons[0].area();

    let window = BoundingBox::new(0.0, 0.0, 10.0, 20.0);
    let out = PolygonRepair::new(Some(window))
        .repair(polygons, threshold)
        .unwrap();

    assert!(out.failed.is_empty());
    assert_eq!(out.polygons.len(), 1);
    let half = &out.polygons[0];
    assert!(half.outer.is_ccw());
    assert!(half.outer.is_simple());
    assert!((half.area() - full / 2.0).abs() < 0.05 * full);

    for p in half.outer.points() {
        assert!(p.x <= 10.0 + 1e-9, "point {:?} outside window", p);
    }
}

#[test]
fn test_clip_annulus_keeps_hole_shape() {
    let threshold = Threshold::band(0.25, 0.75);
    let polygons = bump_polygons(threshold);
    assert_eq!(polygons.len(), 1);
    let full = polygons[0].area();

    // Lower-left quadrant cuts through the hole
    let window = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
    let out = PolygonRepair::new(Some(window))
        .repair(polygons, threshold)
        .unwrap();

    assert!(out.failed.is_empty());
    assert_eq!(out.polygons.len(), 1);
    let quarter = &out.polygons[0];
    assert!(quarter.holes.is_empty());
    assert!(quarter.outer.is_simple());
    assert!((quarter.area() - full / 4.0).abs() < 0.05 * full);
}

#[test]
fn test_clip_window_missing_polygon_drops_it() {
    let threshold = Threshold::Level(0.5);
    let polygons = bump_polygons(threshold);
    let window = BoundingBox::new(100.0, 100.0, 110.0, 110.0);
    let out = PolygonRepair::new(Some(window))
        .repair(polygons, threshold)
        .unwrap();
    assert!(out.polygons.is_empty());
    assert!(out.warnings.is_empty());
}

#[test]
fn test_clip_window_covering_polygon_keeps_it() {
    let threshold = Threshold::Level(0.5);
    let polygons = bump_polygons(threshold);
    let original = polygons[0].clone();
    let window = BoundingBox::new(-1.0, -1.0, 30.0, 30.0);
    let out = PolygonRepair::new(Some(window))
        .repair(polygons, threshold)
        .unwrap();
    assert_eq!(out.polygons.len(), 1);
    assert_eq!(out.polygons[0].outer, original.outer);
}

// ============================================================================
// Simplicity repair
// ============================================================================

#[test]
fn test_pinched_outer_splits_into_two_polygons() {
    let eight = ring(&[
        (0.0, 0.0),
        (1.0, 1.0),
        (2.0, 0.0),
        (2.0, 2.0),
        (1.0, 1.0),
        (0.0, 2.0),
    ]);
    assert!(!eight.is_simple());

    let out = PolygonRepair::default()
        .repair(vec![polygon(eight)], Threshold::Level(0.0))
        .unwrap();

    assert!(out.failed.is_empty());
    assert_eq!(out.polygons.len(), 2);
    for p in &out.polygons {
        assert!(p.outer.is_simple());
        assert!(p.outer.is_ccw());
        assert!((p.area() - 1.0).abs() < 1e-12);
    }
}

#[test]
fn test_pinched_pocket_becomes_hole() {
    // Outer square whose boundary dips in and walks a clockwise diamond
    // through one shared vertex
    let pocket = ring(&[
        (0.0, 0.0),
        (4.0, 0.0),
        (4.0, 4.0),
        (2.0, 4.0),
        (2.0, 3.0),
        (3.0, 2.0),
        (2.0, 1.0),
        (1.0, 2.0),
        (2.0, 3.0),
        (0.0, 4.0),
    ]);
    let loops = split_pinches(pocket.clone());
    assert_eq!(loops.len(), 2);
    assert!(loops.iter().all(Ring::is_simple));

    let out = PolygonRepair::default()
        .repair(vec![polygon(pocket)], Threshold::Level(0.0))
        .unwrap();
    assert_eq!(out.polygons.len(), 1);
    assert_eq!(out.polygons[0].holes.len(), 1);
    assert!((out.polygons[0].area() - 13.0).abs() < 1e-12);
}

#[test]
fn test_crossing_ring_reported_not_fatal() {
    // Edges (0,0)-(3,3) and (3,0)-(0,2) cross
    let crossed = ring(&[(0.0, 0.0), (3.0, 3.0), (3.0, 0.0), (0.0, 2.0)]);
    let square = ring(&[(10.0, 10.0), (11.0, 10.0), (11.0, 11.0), (10.0, 11.0)]);

    let out = PolygonRepair::default()
        .repair(vec![polygon(crossed), polygon(square)], Threshold::Level(0.0))
        .unwrap();

    assert_eq!(out.failed.len(), 1);
    assert_eq!(out.polygons.len(), 1);
    assert_eq!(out.warnings.len(), 1);
    assert!(matches!(
        out.warnings[0],
        ContourWarning::RepairFailed { ring_vertices: 4, .. }
    ));
}

#[test]
fn test_repair_honours_cancellation() {
    let token = CancelToken::new();
    token.cancel();
    let guard = TaskGuard::new(Some(token), None);

    let polygons = bump_polygons(Threshold::Level(0.5));
    let err = PolygonRepair::default()
        .repair_with(polygons, Threshold::Level(0.5), &guard)
        .unwrap_err();
    assert!(matches!(err, ContourError::Cancelled));
}
