//! Engine errors.

use machwatch_adapters::FetchError;
use thiserror::Error;

/// Errors returned by the engine's control surface.
///
/// Fetch failures during ticking are never returned here; they are reported
/// as [`MonitorEvent::FetchFailed`](crate::MonitorEvent::FetchFailed).
#[derive(Debug, Error)]
pub enum EngineError {
    /// The scheduler configuration cannot produce a valid window.
    #[error("invalid scheduler config: {0}")]
    InvalidConfig(String),

    /// The backend failed a monitoring status or enable/disable request.
    #[error("monitoring toggle failed: {0}")]
    Toggle(#[from] FetchError),
}
