//! Error types for the contouring pipeline.

use thiserror::Error;

/// Result type alias using ContourError.
pub type ContourResult<T> = Result<T, ContourError>;

/// Primary error type for contouring operations.
///
/// Grid and configuration errors invalidate a whole run. Threshold, topology,
/// cancellation and timeout errors are scoped to the single threshold being
/// processed; other thresholds of the same run are unaffected.
#[derive(Debug, Error)]
pub enum ContourError {
    // === Input Errors ===
    #[error("invalid grid: {0}")]
    InvalidGrid(String),

    #[error("degenerate threshold band: lo {lo} must be below hi {hi}")]
    DegenerateThreshold { lo: f64, hi: f64 },

    // === Per-threshold Errors ===
    #[error("invalid topology at {location}: {reason}")]
    InvalidTopology { location: String, reason: String },

    #[error("threshold computation cancelled")]
    Cancelled,

    #[error("threshold computation timed out after {elapsed_ms} ms")]
    TimedOut { elapsed_ms: u64 },

    // === Configuration Errors ===
    #[error("configuration error: {0}")]
    Config(String),

    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ContourError {
    /// Create an InvalidGrid error.
    pub fn invalid_grid(msg: impl Into<String>) -> Self {
        Self::InvalidGrid(msg.into())
    }

    /// Create an InvalidTopology error.
    pub fn invalid_topology(location: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidTopology {
            location: location.into(),
            reason: reason.into(),
        }
    }

    /// Create a Config error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Whether this error only invalidates the threshold it was raised for.
    pub fn is_threshold_scoped(&self) -> bool {
        matches!(
            self,
            Self::DegenerateThreshold { .. }
                | Self::InvalidTopology { .. }
                | Self::Cancelled
                | Self::TimedOut { .. }
        )
    }
}
