//! Tests for joining extracted segments into rings and polylines.

use contour_engine::{
    extract_segments, stitch_segments, ContourError, EdgeStitcher, ExtractOptions, Grid,
    SegmentExtractor, Threshold,
};
use test_utils::{
    assert_approx_eq, create_bump_grid, create_checkerboard_grid, create_radial_grid,
    create_ramp_grid, create_smooth_field,
};

// ============================================================================
// Closed rings
// ============================================================================

#[test]
fn test_bump_gives_single_ccw_ring() {
    let data = create_bump_grid(21, 21, 10.0, 10.0, 8.0);
    let grid = Grid::from_values(21, 21, &data).unwrap();
    let segments = extract_segments(&grid, &Threshold::Level(0.5)).unwrap();
    let count = segments.len();

    let stitched = stitch_segments(segments).unwrap();
    assert_eq!(stitched.rings.len(), 1);
    assert!(stitched.polylines.is_empty());

    let ring = &stitched.rings[0];
    assert!(ring.is_ccw());
    // Every segment contributes exactly one vertex to the closed ring
    assert_eq!(ring.len(), count);
    assert!(ring.is_simple());
}

#[test]
fn test_pit_gives_clockwise_ring() {
    // Values grow away from the centre: the filled side is outside the circle
    let data = create_radial_grid(21, 21, 10.0, 10.0);
    let grid = Grid::from_values(21, 21, &data).unwrap();
    let segments = extract_segments(&grid, &Threshold::Level(5.0)).unwrap();

    let stitched = stitch_segments(segments).unwrap();
    assert_eq!(stitched.rings.len(), 1);
    assert!(stitched.rings[0].signed_area() < 0.0);
    let area = stitched.rings[0].area();
    assert!((area - std::f64::consts::PI * 25.0).abs() < 2.0, "area {}", area);
}

#[test]
fn test_ring_vertices_lie_on_level() {
    let data = create_bump_grid(17, 17, 8.0, 8.0, 6.0);
    let grid = Grid::from_values(17, 17, &data).unwrap();
    let segments = extract_segments(&grid, &Threshold::Level(0.5)).unwrap();
    let stitched = stitch_segments(segments).unwrap();

    // Crossings interpolate the field linearly along lattice edges, which
    // for a cone stays within a fraction of a cell of the true circle
    for p in stitched.rings[0].points() {
        let r = ((p.x - 8.0).powi(2) + (p.y - 8.0).powi(2)).sqrt();
        assert_approx_eq!(r, 3.0, 0.1, "vertex ({}, {})", p.x, p.y);
    }
}

#[test]
fn test_checkerboard_saddles_stitch_cleanly() {
    let data = create_checkerboard_grid(7, 7);
    let grid = Grid::from_values(7, 7, &data).unwrap();
    let segments = extract_segments(&grid, &Threshold::Level(0.5)).unwrap();

    let stitched = stitch_segments(segments).unwrap();
    assert!(!stitched.rings.is_empty());
    for ring in &stitched.rings {
        assert!(ring.is_simple(), "{:?}", ring.simplicity_violation());
    }
}

#[test]
fn test_smooth_field_closed_with_frame() {
    let data = create_smooth_field(40, 30);
    let grid = Grid::from_values(40, 30, &data).unwrap();
    let extractor = SegmentExtractor::new(&grid, ExtractOptions { close_frame: true });

    for level in [-1.0, -0.25, 0.0, 0.5, 1.2] {
        let segments = extractor.extract(&Threshold::Level(level)).unwrap();
        let stitched = stitch_segments(segments).unwrap();
        assert!(
            stitched.polylines.is_empty(),
            "level {} left {} open chains",
            level,
            stitched.polylines.len()
        );
        assert!(stitched.rings.iter().all(|r| r.is_simple()));
    }
}

// ============================================================================
// Open chains
// ============================================================================

#[test]
fn test_frame_touching_isoline_is_polyline() {
    let data = create_ramp_grid(6, 5);
    let grid = Grid::from_values(6, 5, &data).unwrap();
    let segments = extract_segments(&grid, &Threshold::Level(2.5)).unwrap();

    let stitched = stitch_segments(segments).unwrap();
    assert!(stitched.rings.is_empty());
    assert_eq!(stitched.polylines.len(), 1);

    let line = &stitched.polylines[0];
    assert_eq!(line.len(), 5);
    assert_approx_eq!(line.length(), 4.0, 1e-9);
    assert!(line.points().iter().all(|p| (p.x - 2.5).abs() < 1e-9));
}

// ============================================================================
// Topology errors
// ============================================================================

#[test]
fn test_duplicate_segment_is_invalid_topology() {
    let data = create_bump_grid(11, 11, 5.0, 5.0, 4.0);
    let grid = Grid::from_values(11, 11, &data).unwrap();
    let mut segments = extract_segments(&grid, &Threshold::Level(0.5)).unwrap();
    let first = segments[0];
    segments.push(first);

    let err = stitch_segments(segments).unwrap_err();
    assert!(matches!(err, ContourError::InvalidTopology { .. }));
}

#[test]
fn test_incremental_push_matches_batch() {
    let data = create_bump_grid(15, 15, 7.0, 7.0, 5.0);
    let grid = Grid::from_values(15, 15, &data).unwrap();
    let segments = extract_segments(&grid, &Threshold::Level(0.3)).unwrap();

    let mut stitcher = EdgeStitcher::with_capacity(segments.len());
    for segment in segments.iter().rev() {
        stitcher.push(*segment).unwrap();
    }
    let incremental = stitcher.finish();
    let batch = stitch_segments(segments).unwrap();

    assert_eq!(incremental.rings.len(), batch.rings.len());
    assert_approx_eq!(
        incremental.rings[0].signed_area(),
        batch.rings[0].signed_area(),
        1e-9
    );
}
