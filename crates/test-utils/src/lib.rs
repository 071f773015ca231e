//! Shared test utilities for the contouring workspace.
//!
//! This crate provides common testing infrastructure including:
//! - Synthetic scalar field generators with known contours
//! - Approximate floating-point assertion macros
//!
//! # Usage
//!
//! Add to your crate's `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! test-utils = { path = "../test-utils" }
//! ```
//!
//! Then import in your tests:
//!
//! ```ignore
//! use test_utils::{assert_approx_eq, create_radial_grid};
//! ```

pub mod generators;

// Re-export commonly used items at the crate root
pub use generators::*;

/// Assert two scalars agree within `tolerance`.
///
/// An optional trailing format string and arguments are appended to the
/// failure message.
///
/// ```ignore
/// use test_utils::assert_approx_eq;
///
/// assert_approx_eq!(ring.signed_area(), 3.0, 1e-9);
/// assert_approx_eq!(radius, 3.0, 0.1, "vertex {}", k);
/// ```
#[macro_export]
macro_rules! assert_approx_eq {
    ($left:expr, $right:expr, $tolerance:expr $(,)?) => {
        $crate::assert_approx_eq!($left, $right, $tolerance, "")
    };
    ($left:expr, $right:expr, $tolerance:expr, $($msg:tt)+) => {{
        let left: f64 = $left as f64;
        let right: f64 = $right as f64;
        let tolerance: f64 = $tolerance as f64;
        let diff = (left - right).abs();
        if !(diff <= tolerance) {
            panic!(
                "values differ by {:e} (tolerance {:e}): left {:?}, right {:?} {}",
                diff,
                tolerance,
                left,
                right,
                format_args!($($msg)+)
            );
        }
    }};
}

/// Assert two `(x, y)` positions lie within `tolerance` world units of each
/// other, measured as straight-line distance.
///
/// ```ignore
/// use test_utils::assert_coords_approx_eq;
///
/// assert_coords_approx_eq!((seg.start.x, seg.start.y), (0.25, 1.0), 1e-9);
/// ```
#[macro_export]
macro_rules! assert_coords_approx_eq {
    (($x1:expr, $y1:expr), ($x2:expr, $y2:expr), $tolerance:expr $(,)?) => {{
        let (x1, y1): (f64, f64) = ($x1 as f64, $y1 as f64);
        let (x2, y2): (f64, f64) = ($x2 as f64, $y2 as f64);
        let tolerance: f64 = $tolerance as f64;
        let distance = (x1 - x2).hypot(y1 - y2);
        if !(distance <= tolerance) {
            panic!(
                "({}, {}) is {:e} world units from ({}, {}), tolerance {:e}",
                x1, y1, distance, x2, y2, tolerance
            );
        }
    }};
}
