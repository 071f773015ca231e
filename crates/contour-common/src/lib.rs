//! Common types shared across the contouring workspace.
//!
//! - [`Point`]: world-space coordinate / 2D vector
//! - [`BoundingBox`]: axis-aligned world rectangle (clip windows, envelopes)
//! - [`GridSpec`] and [`Grid`]: read-only sampler over a gridded scalar field
//! - [`ContourError`]: error taxonomy for the contouring pipeline

pub mod bbox;
pub mod error;
pub mod grid;
pub mod point;

pub use bbox::{BboxParseError, BoundingBox};
pub use error::{ContourError, ContourResult};
pub use grid::{Grid, GridSpec, MissingValue};
pub use point::Point;
