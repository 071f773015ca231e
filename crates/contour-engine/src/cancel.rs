//! Cooperative cancellation and per-threshold deadlines.

use contour_common::{ContourError, ContourResult};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Shared flag a caller flips to abandon one threshold's computation.
///
/// Clones share the same flag. Tokens are per job, so cancelling one
/// threshold never affects the others.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Checkpoint consulted between cell rows and between ring repairs.
#[derive(Debug, Clone)]
pub struct TaskGuard {
    cancel: Option<CancelToken>,
    started: Instant,
    timeout: Option<Duration>,
}

impl TaskGuard {
    pub fn new(cancel: Option<CancelToken>, timeout: Option<Duration>) -> Self {
        Self {
            cancel,
            started: Instant::now(),
            timeout,
        }
    }

    /// A guard that never trips.
    pub fn unbounded() -> Self {
        Self::new(None, None)
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn check(&self) -> ContourResult<()> {
        if self.cancel.as_ref().is_some_and(CancelToken::is_cancelled) {
            return Err(ContourError::Cancelled);
        }
        if let Some(timeout) = self.timeout {
            let elapsed = self.started.elapsed();
            if elapsed > timeout {
                return Err(ContourError::TimedOut {
                    elapsed_ms: elapsed.as_millis() as u64,
                });
            }
        }
        Ok(())
    }
}

impl Default for TaskGuard {
    fn default() -> Self {
        Self::unbounded()
    }
}
