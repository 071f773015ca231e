//! Synthetic scalar fields with known contours.
//!
//! All generators return row-major `Vec<f32>` data (row 0 first), matching
//! the lattice layout the contouring grid expects.

/// Creates a grid whose value at each lattice point is its column index.
///
/// Every isoline is a vertical line, which makes crossing positions easy to
/// predict.
///
/// # Example
///
/// ```
/// use test_utils::create_ramp_grid;
///
/// let grid = create_ramp_grid(4, 2);
/// assert_eq!(grid, vec![0.0, 1.0, 2.0, 3.0, 0.0, 1.0, 2.0, 3.0]);
/// ```
pub fn create_ramp_grid(width: usize, height: usize) -> Vec<f32> {
    let mut data = Vec::with_capacity(width * height);
    for _row in 0..height {
        for col in 0..width {
            data.push(col as f32);
        }
    }
    data
}

/// Creates a grid holding the distance from `(cx, cy)` in lattice units.
///
/// The isoline at level `r` approximates a circle of radius `r`, so the
/// region below the level is a disc of area close to `πr²`.
///
/// # Arguments
///
/// * `width` - Number of columns
/// * `height` - Number of rows
/// * `cx`, `cy` - Centre in lattice coordinates
pub fn create_radial_grid(width: usize, height: usize, cx: f64, cy: f64) -> Vec<f32> {
    let mut data = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            let dx = col as f64 - cx;
            let dy = row as f64 - cy;
            data.push((dx * dx + dy * dy).sqrt() as f32);
        }
    }
    data
}

/// Creates a radial bump: 1 at the centre falling to 0 at `radius`.
///
/// The filled region of level `v` is a disc of radius `(1 - v) * radius`.
pub fn create_bump_grid(width: usize, height: usize, cx: f64, cy: f64, radius: f64) -> Vec<f32> {
    create_radial_grid(width, height, cx, cy)
        .into_iter()
        .map(|d| (1.0 - d as f64 / radius).max(0.0) as f32)
        .collect()
}

/// Creates nested square shells alternating between 0 and 1.
///
/// A lattice point's shell is its distance to the nearest border divided by
/// `shell_width`; even shells are 0 and odd shells 1. Contouring at 0.5
/// gives square annuli nested inside each other's holes.
///
/// # Example
///
/// ```
/// use test_utils::create_concentric_squares_grid;
///
/// let grid = create_concentric_squares_grid(5, 1);
/// assert_eq!(grid[0], 0.0);           // border
/// assert_eq!(grid[5 + 1], 1.0);       // first inner shell
/// assert_eq!(grid[2 * 5 + 2], 0.0);   // centre
/// ```
pub fn create_concentric_squares_grid(size: usize, shell_width: usize) -> Vec<f32> {
    let shell_width = shell_width.max(1);
    let mut data = Vec::with_capacity(size * size);
    for row in 0..size {
        for col in 0..size {
            let border = col.min(row).min(size - 1 - col).min(size - 1 - row);
            data.push(((border / shell_width) % 2) as f32);
        }
    }
    data
}

/// Creates a smooth multi-peak field in roughly `[-2, 2]`.
///
/// Built from a few sine products so it has maxima, minima and saddles at
/// predictable places. Good for benchmarks and topology tests.
pub fn create_smooth_field(width: usize, height: usize) -> Vec<f32> {
    let mut data = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            let x = col as f64 / width.max(1) as f64 * std::f64::consts::TAU;
            let y = row as f64 / height.max(1) as f64 * std::f64::consts::TAU;
            let v = (2.0 * x).sin() * (3.0 * y).cos()
                + 0.5 * (x + y).cos()
                + 0.5 * (5.0 * x).sin() * y.sin();
            data.push(v as f32);
        }
    }
    data
}

/// Creates a grid with temperature-like values in Kelvin.
///
/// The values range from approximately 250K (-23C) to 310K (37C),
/// creating a gradient pattern similar to real weather data.
pub fn create_temperature_grid(width: usize, height: usize) -> Vec<f32> {
    let mut data = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            // Create a gradient from cold (top-left) to warm (bottom-right)
            let x_factor = col as f32 / width.max(1) as f32;
            let y_factor = row as f32 / height.max(1) as f32;
            // Temperature range: 250K to 310K
            let temp = 250.0 + (x_factor * 30.0) + (y_factor * 30.0);
            data.push(temp);
        }
    }
    data
}

/// Creates a grid with deterministic pseudo-random values in `[0, 1)`.
///
/// Uses a simple hash of position and seed for reproducibility.
pub fn create_random_grid(width: usize, height: usize, seed: u32) -> Vec<f32> {
    let mut data = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            let hash = simple_hash(col as u32, row as u32, seed);
            data.push((hash % 10_000) as f32 / 10_000.0);
        }
    }
    data
}

/// Simple deterministic hash for reproducible test data.
fn simple_hash(x: u32, y: u32, seed: u32) -> u32 {
    let mut h = seed;
    h = h.wrapping_mul(31).wrapping_add(x);
    h = h.wrapping_mul(31).wrapping_add(y);
    h ^= h >> 16;
    h = h.wrapping_mul(0x85ebca6b);
    h ^= h >> 13;
    h = h.wrapping_mul(0xc2b2ae35);
    h ^= h >> 16;
    h
}

/// Creates a checkerboard of 0 and 1: every interior cell is a saddle.
pub fn create_checkerboard_grid(width: usize, height: usize) -> Vec<f32> {
    let mut data = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            data.push(((col + row) % 2) as f32);
        }
    }
    data
}

/// Creates a grid filled with a constant value.
///
/// Useful for testing edge cases and simple scenarios.
pub fn create_constant_grid(width: usize, height: usize, value: f32) -> Vec<f32> {
    vec![value; width * height]
}

/// Replaces the values at `positions` (col, row) with NaN.
///
/// Useful for testing missing data handling.
pub fn with_nans(mut data: Vec<f32>, width: usize, positions: &[(usize, usize)]) -> Vec<f32> {
    for &(col, row) in positions {
        let idx = row * width + col;
        if col < width && idx < data.len() {
            data[idx] = f32::NAN;
        }
    }
    data
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_ramp_grid() {
        let grid = create_ramp_grid(10, 5);
        assert_eq!(grid.len(), 50);
        assert_eq!(grid[0], 0.0);
        assert_eq!(grid[9], 9.0);
        assert_eq!(grid[10], 0.0); // col=0, row=1
    }

    #[test]
    fn test_create_radial_grid() {
        let grid = create_radial_grid(11, 11, 5.0, 5.0);
        assert_eq!(grid[5 * 11 + 5], 0.0);
        assert_eq!(grid[5 * 11 + 8], 3.0);
        assert_eq!(grid[0], (50.0f64).sqrt() as f32);
    }

    #[test]
    fn test_create_concentric_squares_grid() {
        let grid = create_concentric_squares_grid(9, 2);
        // Shells by border distance: 0-1 -> 0, 2-3 -> 1, 4 -> 0
        assert_eq!(grid[0], 0.0);
        assert_eq!(grid[9 + 1], 0.0);
        assert_eq!(grid[2 * 9 + 2], 1.0);
        assert_eq!(grid[3 * 9 + 4], 1.0);
        assert_eq!(grid[4 * 9 + 4], 0.0);
    }

    #[test]
    fn test_create_temperature_grid() {
        let grid = create_temperature_grid(100, 100);
        assert_eq!(grid.len(), 10000);
        // Check temperature range
        let min = grid.iter().cloned().fold(f32::INFINITY, f32::min);
        let max = grid.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
        assert!(min >= 250.0);
        assert!(max <= 310.0);
    }

    #[test]
    fn test_random_grid_deterministic() {
        let grid1 = create_random_grid(50, 50, 42);
        let grid2 = create_random_grid(50, 50, 42);
        assert_eq!(grid1, grid2, "Same seed should produce same data");
        assert!(grid1.iter().all(|v| (0.0..1.0).contains(v)));

        let grid3 = create_random_grid(50, 50, 43);
        assert_ne!(grid1, grid3, "Different seed should produce different data");
    }

    #[test]
    fn test_with_nans() {
        let grid = with_nans(create_constant_grid(10, 10, 1.0), 10, &[(5, 5), (0, 0)]);
        assert!(grid[0].is_nan()); // (0, 0)
        assert!(grid[55].is_nan()); // (5, 5) = row 5 * 10 + col 5
        assert!(!grid[1].is_nan());
    }

    #[test]
    fn test_checkerboard() {
        let grid = create_checkerboard_grid(3, 3);
        assert_eq!(grid, vec![0.0, 1.0, 0.0, 1.0, 0.0, 1.0, 0.0, 1.0, 0.0]);
    }
}
