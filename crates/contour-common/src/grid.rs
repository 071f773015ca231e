//! Grid specifications and the read-only field sampler.

use crate::{BoundingBox, ContourError, ContourResult, Point};
use serde::{Deserialize, Serialize};

/// Shape and world placement of a regular lattice.
///
/// Lattice point `(i, j)` sits at `origin + (i * cell_size, j * cell_size)`.
/// Row `j` of the value array holds lattice points `(0..width, j)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridSpec {
    /// Number of lattice points in X direction
    pub width: usize,
    /// Number of lattice points in Y direction
    pub height: usize,
    /// Spacing between neighbouring lattice points (world units)
    pub cell_size: f64,
    /// World position of lattice point (0, 0)
    pub origin: Point,
}

impl GridSpec {
    /// Create a new grid specification.
    pub fn new(width: usize, height: usize, cell_size: f64, origin: Point) -> Self {
        Self {
            width,
            height,
            cell_size,
            origin,
        }
    }

    /// Unit spacing with the origin at (0, 0); lattice and world coordinates coincide.
    pub fn unit(width: usize, height: usize) -> Self {
        Self::new(width, height, 1.0, Point::new(0.0, 0.0))
    }

    /// Check the shape against a value array of `len` samples.
    pub fn validate(&self, len: usize) -> ContourResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(ContourError::invalid_grid(format!(
                "grid dimensions must be positive, got {}x{}",
                self.width, self.height
            )));
        }

        let expected = self.width.checked_mul(self.height).ok_or_else(|| {
            ContourError::invalid_grid(format!(
                "grid dimensions {}x{} overflow",
                self.width, self.height
            ))
        })?;
        if expected != len {
            return Err(ContourError::invalid_grid(format!(
                "value array has {} samples, expected {} ({}x{})",
                len, expected, self.width, self.height
            )));
        }

        if !self.cell_size.is_finite() || self.cell_size <= 0.0 {
            return Err(ContourError::invalid_grid(format!(
                "cell size must be positive and finite, got {}",
                self.cell_size
            )));
        }

        if !self.origin.is_finite() {
            return Err(ContourError::invalid_grid("grid origin is not finite"));
        }

        Ok(())
    }

    /// World coordinates of a lattice point.
    pub fn lattice_to_world(&self, i: usize, j: usize) -> Point {
        Point::new(
            self.origin.x + i as f64 * self.cell_size,
            self.origin.y + j as f64 * self.cell_size,
        )
    }

    /// Convert world coordinates to the nearest lattice index.
    pub fn world_to_lattice(&self, x: f64, y: f64) -> Option<(usize, usize)> {
        let i = ((x - self.origin.x) / self.cell_size).round();
        let j = ((y - self.origin.y) / self.cell_size).round();

        if !i.is_finite() || !j.is_finite() || i < 0.0 || j < 0.0 {
            return None;
        }
        let (i, j) = (i as usize, j as usize);
        if i >= self.width || j >= self.height {
            return None;
        }

        Some((i, j))
    }

    /// Calculate the world bounding box of the lattice.
    pub fn bbox(&self) -> BoundingBox {
        let last = self.lattice_to_world(
            self.width.saturating_sub(1),
            self.height.saturating_sub(1),
        );
        BoundingBox::new(self.origin.x, self.origin.y, last.x, last.y)
    }

    /// Get the 1D array index for a 2D lattice position.
    pub fn flat_index(&self, i: usize, j: usize) -> usize {
        j * self.width + i
    }

    /// Total number of lattice points.
    pub fn len(&self) -> usize {
        self.width * self.height
    }

    /// Check if grid is empty.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Number of 2x2 cells.
    pub fn cell_count(&self) -> usize {
        self.width.saturating_sub(1) * self.height.saturating_sub(1)
    }
}

/// Predicate deciding which samples carry no data.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingValue {
    /// NaN marks missing data
    #[default]
    Nan,
    /// A sentinel fill value marks missing data (NaN is treated as valid input
    /// and will simply never match a level)
    Sentinel(f32),
    /// Either NaN or the sentinel marks missing data
    NanOrSentinel(f32),
    /// Caller-supplied predicate
    #[serde(skip)]
    Custom(fn(f32) -> bool),
}

impl MissingValue {
    pub fn is_missing(&self, value: f32) -> bool {
        match *self {
            MissingValue::Nan => value.is_nan(),
            MissingValue::Sentinel(fill) => value == fill,
            MissingValue::NanOrSentinel(fill) => value.is_nan() || value == fill,
            MissingValue::Custom(pred) => pred(value),
        }
    }
}

/// Read-only view over a scalar field plus its missing-value mask.
///
/// The value array is borrowed: the caller owns the data for the duration of
/// the pipeline and the view can be shared across worker threads.
#[derive(Debug, Clone, Copy)]
pub struct Grid<'a> {
    spec: GridSpec,
    values: &'a [f32],
    missing: MissingValue,
}

impl<'a> Grid<'a> {
    /// Create a grid view, rejecting shapes that do not match the data.
    pub fn new(spec: GridSpec, values: &'a [f32], missing: MissingValue) -> ContourResult<Self> {
        spec.validate(values.len())?;
        Ok(Self {
            spec,
            values,
            missing,
        })
    }

    /// Unit-spaced grid at the origin with NaN as the missing marker.
    pub fn from_values(width: usize, height: usize, values: &'a [f32]) -> ContourResult<Self> {
        Self::new(GridSpec::unit(width, height), values, MissingValue::Nan)
    }

    pub fn spec(&self) -> &GridSpec {
        &self.spec
    }

    pub fn width(&self) -> usize {
        self.spec.width
    }

    pub fn height(&self) -> usize {
        self.spec.height
    }

    pub fn values(&self) -> &'a [f32] {
        self.values
    }

    pub fn missing(&self) -> MissingValue {
        self.missing
    }

    /// Raw sample at a lattice point. Panics when out of range, like slice indexing.
    pub fn value(&self, i: usize, j: usize) -> f32 {
        self.values[self.spec.flat_index(i, j)]
    }

    /// Sample at a lattice point, `None` when missing.
    pub fn sample(&self, i: usize, j: usize) -> Option<f64> {
        let v = self.value(i, j);
        if self.missing.is_missing(v) {
            None
        } else {
            Some(v as f64)
        }
    }

    pub fn is_missing(&self, i: usize, j: usize) -> bool {
        self.missing.is_missing(self.value(i, j))
    }

    /// World coordinates of a lattice point.
    pub fn point(&self, i: usize, j: usize) -> Point {
        self.spec.lattice_to_world(i, j)
    }

    /// Corner samples of cell `(i, j)` counter-clockwise from its lower-left
    /// lattice point: `(i,j), (i+1,j), (i+1,j+1), (i,j+1)`. `None` if any is missing.
    pub fn cell_corners(&self, i: usize, j: usize) -> Option<[f64; 4]> {
        Some([
            self.sample(i, j)?,
            self.sample(i + 1, j)?,
            self.sample(i + 1, j + 1)?,
            self.sample(i, j + 1)?,
        ])
    }

    /// Min/max over the non-missing, finite samples.
    pub fn value_range(&self) -> Option<(f32, f32)> {
        self.values
            .iter()
            .copied()
            .filter(|v| v.is_finite() && !self.missing.is_missing(*v))
            .fold(None, |acc, v| match acc {
                None => Some((v, v)),
                Some((min, max)) => Some((min.min(v), max.max(v))),
            })
    }

    /// Count of missing samples.
    pub fn missing_count(&self) -> usize {
        self.values
            .iter()
            .filter(|v| self.missing.is_missing(**v))
            .count()
    }
}
