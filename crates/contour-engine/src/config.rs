//! Pipeline configuration.
//!
//! Loaded from JSON (string or file) with every field optional, then
//! optionally overridden from `CONTOUR_*` environment variables.

use crate::extract::ExtractOptions;
use crate::fit::{FitConfig, FitPolicy};
use crate::repair::RepairConfig;
use crate::threshold::{ContourMode, ThresholdConfig};
use contour_common::{BoundingBox, ContourError, ContourResult};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::warn;

/// Configuration for a contouring run.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ContourConfig {
    /// Which thresholds `run_auto` contours
    pub thresholds: ThresholdConfig,

    pub extract: ExtractOptions,

    pub repair: RepairConfig,

    pub fit: FitConfig,

    /// Deadline per threshold in milliseconds (none when unset)
    pub timeout_ms: Option<u64>,
}

impl ContourConfig {
    /// Load configuration from a JSON string.
    pub fn from_json(json: &str) -> ContourResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> ContourResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Defaults overridden from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env();
        config
    }

    /// Override fields from `CONTOUR_*` environment variables.
    pub fn apply_env(&mut self) {
        self.apply_vars(|key| std::env::var(key).ok());
    }

    /// Override fields from any variable source. Unparseable values are
    /// logged and ignored.
    pub fn apply_vars<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(val) = lookup("CONTOUR_LEVELS") {
            let parsed: Result<Vec<f64>, _> = val
                .split(',')
                .filter(|s| !s.trim().is_empty())
                .map(|s| s.trim().parse::<f64>())
                .collect();
            match parsed {
                Ok(levels) => self.thresholds.levels = Some(levels),
                Err(_) => ignored("CONTOUR_LEVELS", &val),
            }
        }

        if let Some(val) = lookup("CONTOUR_INTERVAL") {
            match val.trim().parse() {
                Ok(interval) => self.thresholds.interval = Some(interval),
                Err(_) => ignored("CONTOUR_INTERVAL", &val),
            }
        }

        if let Some(val) = lookup("CONTOUR_MODE") {
            match val.trim().to_lowercase().as_str() {
                "isolines" => self.thresholds.mode = ContourMode::Isolines,
                "isobands" => self.thresholds.mode = ContourMode::Isobands,
                _ => ignored("CONTOUR_MODE", &val),
            }
        }

        if let Some(val) = lookup("CONTOUR_CLOSE_FRAME") {
            self.extract.close_frame = parse_flag(&val);
        }

        if let Some(val) = lookup("CONTOUR_REPAIR") {
            self.repair.enabled = parse_flag(&val);
        }

        if let Some(val) = lookup("CONTOUR_CLIP_BBOX") {
            match val.parse::<BoundingBox>() {
                Ok(bbox) => self.repair.clip = Some(bbox),
                Err(_) => ignored("CONTOUR_CLIP_BBOX", &val),
            }
        }

        if let Some(val) = lookup("CONTOUR_FIT_POLICY") {
            match val.parse::<FitPolicy>() {
                Ok(policy) => self.fit.policy = policy,
                Err(_) => ignored("CONTOUR_FIT_POLICY", &val),
            }
        }

        if let Some(val) = lookup("CONTOUR_FIT_TOLERANCE") {
            match val.trim().parse() {
                Ok(tolerance) => self.fit.tolerance = tolerance,
                Err(_) => ignored("CONTOUR_FIT_TOLERANCE", &val),
            }
        }

        if let Some(val) = lookup("CONTOUR_FIT_TENSION") {
            match val.trim().parse() {
                Ok(tension) => self.fit.tension = tension,
                Err(_) => ignored("CONTOUR_FIT_TENSION", &val),
            }
        }

        if let Some(val) = lookup("CONTOUR_CORNER_ANGLE") {
            match val.trim().parse() {
                Ok(angle) => self.fit.corner_angle_deg = angle,
                Err(_) => ignored("CONTOUR_CORNER_ANGLE", &val),
            }
        }

        if let Some(val) = lookup("CONTOUR_TIMEOUT_MS") {
            match val.trim().parse() {
                Ok(ms) => self.timeout_ms = Some(ms),
                Err(_) => ignored("CONTOUR_TIMEOUT_MS", &val),
            }
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> ContourResult<()> {
        self.thresholds.validate()?;
        self.fit.validate()?;

        if let Some(clip) = self.repair.clip {
            if !clip.is_valid() {
                return Err(ContourError::config(format!(
                    "clip window {:?} has no area",
                    clip
                )));
            }
        }

        if self.timeout_ms == Some(0) {
            return Err(ContourError::config("timeout_ms must be > 0"));
        }

        Ok(())
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }
}

fn parse_flag(val: &str) -> bool {
    let val = val.trim().to_lowercase();
    val == "true" || val == "1" || val == "yes"
}

fn ignored(key: &str, val: &str) {
    warn!(key = key, value = val, "ignoring unparseable environment override");
}
