//! Per-threshold pipeline driver.
//!
//! Each threshold runs extract -> stitch -> tree -> repair -> fit on its own
//! rayon worker. Thresholds share only the read-only grid, and an error in
//! one threshold never affects the others.

use crate::cancel::{CancelToken, TaskGuard};
use crate::config::ContourConfig;
use crate::extract::SegmentExtractor;
use crate::fit::CurveFitter;
use crate::path::Path;
use crate::repair::PolygonRepair;
use crate::stitch::stitch_segments;
use crate::threshold::Threshold;
use crate::tree::build_polygons;
use crate::types::{ContourPolygon, Polyline, Ring};
use crate::warning::ContourWarning;
use contour_common::{ContourError, ContourResult, Grid};
use rayon::prelude::*;
use serde::Serialize;
use std::time::Instant;
use tracing::{debug, info, warn};

/// One threshold to contour, with an optional cancellation handle.
#[derive(Debug, Clone)]
pub struct ThresholdJob {
    pub threshold: Threshold,
    pub cancel: Option<CancelToken>,
}

impl ThresholdJob {
    pub fn new(threshold: Threshold) -> Self {
        Self {
            threshold,
            cancel: None,
        }
    }

    pub fn with_cancel(threshold: Threshold, cancel: CancelToken) -> Self {
        Self {
            threshold,
            cancel: Some(cancel),
        }
    }
}

impl From<Threshold> for ThresholdJob {
    fn from(threshold: Threshold) -> Self {
        Self::new(threshold)
    }
}

/// What a fitted path was built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PathSource {
    /// Index into [`ThresholdOutput::polygons`]
    Polygon(usize),
    /// Index into [`ThresholdOutput::polylines`]
    Polyline(usize),
    /// Index into [`ThresholdOutput::orphan_rings`]
    Ring(usize),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContourPath {
    pub source: PathSource,
    pub path: Path,
}

/// Geometry for one threshold.
#[derive(Debug, Clone, Serialize)]
pub struct ThresholdOutput {
    pub threshold: Threshold,
    pub polygons: Vec<ContourPolygon>,
    /// Chains that never closed (frame or missing-data boundaries)
    pub polylines: Vec<Polyline>,
    /// Closed clockwise isolines with no enclosing outer ring, such as a pit
    /// inside a region whose boundary runs off the frame
    pub orphan_rings: Vec<Ring>,
    pub paths: Vec<ContourPath>,
    pub warnings: Vec<ContourWarning>,
}

#[derive(Debug)]
pub struct ThresholdResult {
    pub threshold: Threshold,
    pub outcome: ContourResult<ThresholdOutput>,
}

/// Results of a run, in job order.
#[derive(Debug, Default)]
pub struct ContourSet {
    pub results: Vec<ThresholdResult>,
}

impl ContourSet {
    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn successes(&self) -> impl Iterator<Item = &ThresholdOutput> {
        self.results.iter().filter_map(|r| r.outcome.as_ref().ok())
    }

    pub fn failures(&self) -> impl Iterator<Item = (&Threshold, &ContourError)> {
        self.results
            .iter()
            .filter_map(|r| r.outcome.as_ref().err().map(|e| (&r.threshold, e)))
    }

    /// All warnings of successful thresholds, tagged with their threshold.
    pub fn warnings(&self) -> impl Iterator<Item = (&Threshold, &ContourWarning)> {
        self.successes()
            .flat_map(|out| out.warnings.iter().map(move |w| (&out.threshold, w)))
    }
}

/// Contouring pipeline configured once and run over any number of grids.
#[derive(Debug, Clone)]
pub struct ContourPipeline {
    config: ContourConfig,
    fitter: CurveFitter,
    repair: PolygonRepair,
}

impl ContourPipeline {
    pub fn new(config: ContourConfig) -> ContourResult<Self> {
        config.validate()?;
        Ok(Self {
            fitter: CurveFitter::from_config(&config.fit),
            repair: PolygonRepair::from_config(&config.repair),
            config,
        })
    }

    pub fn config(&self) -> &ContourConfig {
        &self.config
    }

    /// Run every job in parallel.
    pub fn run(&self, grid: &Grid<'_>, jobs: &[ThresholdJob]) -> ContourSet {
        let start = Instant::now();

        let results: Vec<ThresholdResult> = jobs
            .par_iter()
            .map(|job| ThresholdResult {
                threshold: job.threshold,
                outcome: self.run_job(grid, job),
            })
            .collect();

        let failed = results.iter().filter(|r| r.outcome.is_err()).count();
        info!(
            thresholds = jobs.len(),
            failed = failed,
            width = grid.width(),
            height = grid.height(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "contour run complete"
        );

        ContourSet { results }
    }

    pub fn run_thresholds(&self, grid: &Grid<'_>, thresholds: &[Threshold]) -> ContourSet {
        let jobs: Vec<ThresholdJob> = thresholds.iter().copied().map(ThresholdJob::new).collect();
        self.run(grid, &jobs)
    }

    /// Contour the thresholds the configuration resolves to over the grid's
    /// value range. Fails only when the thresholds cannot be resolved.
    pub fn run_auto(&self, grid: &Grid<'_>) -> ContourResult<ContourSet> {
        let Some((min, max)) = grid.value_range() else {
            debug!("grid has no valid samples, nothing to contour");
            return Ok(ContourSet::default());
        };
        let thresholds = self.config.thresholds.resolve(min as f64, max as f64)?;
        debug!(
            data_min = min,
            data_max = max,
            thresholds = thresholds.len(),
            "resolved thresholds"
        );
        Ok(self.run_thresholds(grid, &thresholds))
    }

    /// Run a single threshold on the calling thread.
    pub fn run_threshold(&self, grid: &Grid<'_>, threshold: Threshold) -> ContourResult<ThresholdOutput> {
        self.run_job(grid, &ThresholdJob::new(threshold))
    }

    fn run_job(&self, grid: &Grid<'_>, job: &ThresholdJob) -> ContourResult<ThresholdOutput> {
        let threshold = job.threshold;
        let outcome = self.process(grid, job);
        if let Err(ref e) = outcome {
            warn!(threshold = %threshold, error = %e, "threshold failed");
        }
        outcome
    }

    fn process(&self, grid: &Grid<'_>, job: &ThresholdJob) -> ContourResult<ThresholdOutput> {
        let threshold = job.threshold;
        let guard = TaskGuard::new(job.cancel.clone(), self.config.timeout());
        threshold.validate()?;

        let segments =
            SegmentExtractor::new(grid, self.config.extract).extract_with(&threshold, &guard)?;
        guard.check()?;

        let stitched = stitch_segments(segments)?;
        let tree = build_polygons(stitched.rings, threshold);

        let mut warnings: Vec<ContourWarning> = tree
            .orphan_holes
            .iter()
            .map(|hole| ContourWarning::OrphanHole { area: hole.area() })
            .collect();

        let mut orphan_rings = tree.orphan_holes;
        let polygons = if self.config.repair.enabled {
            let repaired = self.repair.repair_with(tree.polygons, threshold, &guard)?;
            warnings.extend(repaired.warnings);
            orphan_rings.extend(repaired.orphan_holes);
            repaired.polygons
        } else {
            tree.polygons
        };
        guard.check()?;

        let mut paths =
            Vec::with_capacity(polygons.len() + stitched.polylines.len() + orphan_rings.len());
        for (idx, polygon) in polygons.iter().enumerate() {
            let fitted = self.fitter.fit_polygon(polygon);
            warnings.extend(fitted.warnings);
            paths.push(ContourPath {
                source: PathSource::Polygon(idx),
                path: fitted.path,
            });
        }
        for (idx, polyline) in stitched.polylines.iter().enumerate() {
            let fitted = self.fitter.fit_polyline(polyline);
            warnings.extend(fitted.warnings);
            paths.push(ContourPath {
                source: PathSource::Polyline(idx),
                path: fitted.path,
            });
        }
        for (idx, ring) in orphan_rings.iter().enumerate() {
            let fitted = self.fitter.fit_ring(ring);
            warnings.extend(fitted.warnings);
            paths.push(ContourPath {
                source: PathSource::Ring(idx),
                path: fitted.path,
            });
        }

        for warning in &warnings {
            warn!(threshold = %threshold, kind = warning.kind(), "{}", warning);
        }

        debug!(
            threshold = %threshold,
            polygons = polygons.len(),
            polylines = stitched.polylines.len(),
            orphan_rings = orphan_rings.len(),
            warnings = warnings.len(),
            elapsed_ms = guard.elapsed().as_millis() as u64,
            "threshold complete"
        );

        Ok(ThresholdOutput {
            threshold,
            polygons,
            polylines: stitched.polylines,
            orphan_rings,
            paths,
            warnings,
        })
    }
}
