//! Fetcher traits implemented by every backend adapter.

use std::fmt::Debug;

use async_trait::async_trait;
use machwatch_types::{RawSnapshot, TimeWindow};

use crate::FetchError;

/// Pulls one raw stats snapshot covering a time window.
///
/// Implementations issue a single request per call and never retry; the
/// caller's next refresh tick is the retry. The payload is only checked for
/// shape: missing categories are returned as `None` fields, not errors.
#[async_trait]
pub trait SnapshotFetcher: Send + Sync + Debug {
    /// Fetch the snapshot for `window`.
    async fn fetch(&self, window: TimeWindow) -> Result<RawSnapshot, FetchError>;

    /// Returns a human-readable description of the source.
    ///
    /// Used in log lines and the CLI banner.
    fn description(&self) -> &str;
}

/// Turns monitoring on or off for a machine on the backend.
#[async_trait]
pub trait MonitoringToggle: Send + Sync + Debug {
    /// Ask the backend whether monitoring is currently enabled.
    async fn monitoring_enabled(&self) -> Result<bool, FetchError>;

    /// Ask the backend to enable (`true`) or disable (`false`) monitoring.
    async fn set_monitoring(&self, enabled: bool) -> Result<(), FetchError>;
}
