//! Vector contours from gridded scalar fields.
//!
//! The pipeline for one threshold:
//!
//! 1. [`extract`]: marching squares turns every 2x2 cell into directed
//!    crossing segments
//! 2. [`stitch`]: segments are joined on shared crossing keys into rings and
//!    open polylines
//! 3. [`tree`]: rings are nested into polygons with holes
//! 4. [`repair`]: optional clipping and simplicity repair
//! 5. [`fit`]: rings and polylines become cubic Bézier paths
//!
//! [`ContourPipeline`] runs this for many thresholds in parallel.

pub mod cancel;
pub mod config;
pub mod extract;
pub mod fit;
pub mod path;
pub mod pipeline;
pub mod repair;
pub mod stitch;
pub mod threshold;
pub mod tree;
pub mod types;
pub mod warning;

pub use cancel::{CancelToken, TaskGuard};
pub use config::ContourConfig;
pub use extract::{extract_segments, ExtractOptions, NodeKey, Segment, SegmentExtractor};
pub use fit::{CurveFitter, FitConfig, FitOutcome, FitPolicy};
pub use path::{CubicSegment, Path, PathElement};
pub use pipeline::{
    ContourPath, ContourPipeline, ContourSet, PathSource, ThresholdJob, ThresholdOutput,
    ThresholdResult,
};
pub use repair::{PolygonRepair, RepairConfig, RepairOutput};
pub use stitch::{stitch_segments, EdgeStitcher, StitchOutput};
pub use threshold::{generate_levels, level_count, ContourMode, Threshold, ThresholdConfig, MAX_LEVELS};
pub use tree::{build_polygons, TreeOutput};
pub use types::{ContourPolygon, PointLocation, Polyline, Ring};
pub use warning::ContourWarning;

// Re-export shared types so callers need only this crate
pub use contour_common::{
    BoundingBox, ContourError, ContourResult, Grid, GridSpec, MissingValue, Point,
};
