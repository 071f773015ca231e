//! Contour thresholds and automatic level generation.

use contour_common::{ContourError, ContourResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single isoline level or a half-open isoband `[lo, hi)`.
///
/// The filled region of `Level(v)` is `value >= v`; the filled region of a
/// band is `lo <= value < hi`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Threshold {
    Level(f64),
    Band { lo: f64, hi: f64 },
}

impl Threshold {
    pub fn band(lo: f64, hi: f64) -> Self {
        Threshold::Band { lo, hi }
    }

    /// Reject non-finite values and bands with `lo >= hi`.
    pub fn validate(&self) -> ContourResult<()> {
        match *self {
            Threshold::Level(v) if v.is_finite() => Ok(()),
            Threshold::Level(v) => Err(ContourError::DegenerateThreshold { lo: v, hi: v }),
            Threshold::Band { lo, hi } if lo.is_finite() && hi.is_finite() && lo < hi => Ok(()),
            Threshold::Band { lo, hi } => Err(ContourError::DegenerateThreshold { lo, hi }),
        }
    }

    /// The level whose crossings bound the region from below.
    pub fn lower(&self) -> f64 {
        match *self {
            Threshold::Level(v) => v,
            Threshold::Band { lo, .. } => lo,
        }
    }

    /// The level bounding the region from above, if any.
    pub fn upper(&self) -> Option<f64> {
        match *self {
            Threshold::Level(_) => None,
            Threshold::Band { hi, .. } => Some(hi),
        }
    }

    /// Whether a sample lies inside the filled region.
    pub fn contains(&self, value: f64) -> bool {
        value >= self.lower() && self.upper().map_or(true, |hi| value < hi)
    }

    pub fn is_band(&self) -> bool {
        matches!(self, Threshold::Band { .. })
    }
}

impl fmt::Display for Threshold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Threshold::Level(v) => write!(f, "{}", format_level(v)),
            Threshold::Band { lo, hi } => {
                write!(f, "[{}, {})", format_level(lo), format_level(hi))
            }
        }
    }
}

fn format_level(value: f64) -> String {
    if value.fract().abs() < 0.01 {
        format!("{:.0}", value)
    } else {
        format!("{:.1}", value)
    }
}

/// Whether thresholds resolve to isolines or to isobands between levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContourMode {
    #[default]
    Isolines,
    Isobands,
}

/// Upper bound on the levels one configuration may resolve to.
pub const MAX_LEVELS: usize = 10_000;

/// Number of levels [`generate_levels`] would produce, without producing them.
pub fn level_count(min_value: f64, max_value: f64, interval: f64) -> u64 {
    if !(interval > 0.0) || !(max_value > min_value) || !min_value.is_finite() || !max_value.is_finite() {
        return 0;
    }
    let span = (max_value / interval).floor() - (min_value / interval).ceil() + 1.0;
    if span >= u64::MAX as f64 {
        u64::MAX
    } else {
        span.max(0.0) as u64
    }
}

/// Generate contour levels automatically based on data range and interval
pub fn generate_levels(min_value: f64, max_value: f64, interval: f64) -> Vec<f64> {
    if !(interval > 0.0) || !(max_value > min_value) || !min_value.is_finite() || !max_value.is_finite() {
        return vec![];
    }

    // Start from first multiple of interval at or above min_value
    let first = (min_value / interval).ceil() as i64;
    let last = (max_value / interval).floor() as i64;

    // Multiply instead of accumulating so long ranges don't drift
    (first..=last).map(|k| k as f64 * interval).collect()
}

/// Consecutive level pairs as half-open bands.
pub fn bands_from_levels(levels: &[f64]) -> Vec<Threshold> {
    levels
        .windows(2)
        .map(|pair| Threshold::band(pair[0], pair[1]))
        .collect()
}

/// Threshold selection: explicit levels, or an interval over the data range.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ThresholdConfig {
    /// Explicit levels (take precedence over `interval`)
    pub levels: Option<Vec<f64>>,
    /// Spacing for generated levels
    pub interval: Option<f64>,
    /// Lower clamp for generated levels (defaults to the data minimum)
    pub min_value: Option<f64>,
    /// Upper clamp for generated levels (defaults to the data maximum)
    pub max_value: Option<f64>,
    pub mode: ContourMode,
}

impl ThresholdConfig {
    pub fn from_levels(levels: Vec<f64>, mode: ContourMode) -> Self {
        Self {
            levels: Some(levels),
            mode,
            ..Default::default()
        }
    }

    pub fn from_interval(interval: f64, mode: ContourMode) -> Self {
        Self {
            interval: Some(interval),
            mode,
            ..Default::default()
        }
    }

    pub fn validate(&self) -> ContourResult<()> {
        if let Some(interval) = self.interval {
            if !(interval > 0.0) || !interval.is_finite() {
                return Err(ContourError::config(format!(
                    "threshold interval must be positive, got {}",
                    interval
                )));
            }
        }

        if let Some(ref levels) = self.levels {
            if levels.iter().any(|l| !l.is_finite()) {
                return Err(ContourError::config("threshold levels must be finite"));
            }
            if self.mode == ContourMode::Isobands && levels.windows(2).any(|w| w[0] >= w[1]) {
                return Err(ContourError::config(
                    "isoband levels must be strictly increasing",
                ));
            }
            if levels.len() > MAX_LEVELS {
                return Err(ContourError::config(format!(
                    "{} threshold levels exceed the limit of {}",
                    levels.len(),
                    MAX_LEVELS
                )));
            }
        }

        if let (Some(min), Some(max)) = (self.min_value, self.max_value) {
            if min >= max {
                return Err(ContourError::config(format!(
                    "min_value {} must be below max_value {}",
                    min, max
                )));
            }
            if let Some(interval) = self.interval {
                check_level_count(min, max, interval)?;
            }
        }

        Ok(())
    }

    /// Resolve to concrete thresholds for data spanning `[data_min, data_max]`.
    ///
    /// Fails with [`ContourError::Config`] when the interval would generate
    /// more than [`MAX_LEVELS`] levels over the range.
    pub fn resolve(&self, data_min: f64, data_max: f64) -> ContourResult<Vec<Threshold>> {
        let levels = if let Some(ref levels) = self.levels {
            levels.clone()
        } else if let Some(interval) = self.interval {
            let min = self.min_value.unwrap_or(data_min);
            let max = self.max_value.unwrap_or(data_max);
            check_level_count(min, max, interval)?;
            generate_levels(min, max, interval)
        } else {
            vec![]
        };

        Ok(match self.mode {
            ContourMode::Isolines => levels.into_iter().map(Threshold::Level).collect(),
            ContourMode::Isobands => bands_from_levels(&levels),
        })
    }
}

fn check_level_count(min: f64, max: f64, interval: f64) -> ContourResult<()> {
    let count = level_count(min, max, interval);
    if count > MAX_LEVELS as u64 {
        return Err(ContourError::config(format!(
            "interval {} over [{}, {}] gives {} levels, limit is {}",
            interval, min, max, count, MAX_LEVELS
        )));
    }
    Ok(())
}
