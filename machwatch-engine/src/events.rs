//! Notifications published by the engine.

use machwatch_types::{DerivedSeries, MonitoringState, SeriesId, TimeWindow};

use crate::derive::SeriesUnavailable;
use crate::scheduler::SchedulerPhase;

/// Everything a host view can react to.
///
/// Delivered over a `tokio::sync::broadcast` channel; a lagging subscriber
/// misses events but never blocks the scheduler.
#[derive(Debug, Clone)]
pub enum MonitorEvent {
    /// The controller's `{enabled, pending, running}` state changed.
    StateChanged(MonitoringState),
    /// New disk or interface series were registered, in display order.
    Discovered(Vec<DerivedSeries>),
    /// A tick finished and every registered series was evaluated.
    Tick(TickReport),
    /// A series had no data this tick.
    Unavailable {
        series_id: SeriesId,
        reason: SeriesUnavailable,
    },
    /// The tick's fetch failed; the cache keeps its previous snapshot.
    FetchFailed { reason: String },
}

/// Result of one tick.
#[derive(Debug, Clone)]
pub struct TickReport {
    /// Tick number within the current session, starting at 1 for the bootstrap.
    pub tick: u64,
    /// Window the tick's fetch asked for.
    pub window: TimeWindow,
    /// Phase the scheduler was in when the tick fired.
    pub phase: SchedulerPhase,
    /// One reading per registered series, in display order.
    pub readings: Vec<SeriesReading>,
}

impl TickReport {
    /// Find the reading for a series id.
    pub fn reading(&self, id: &str) -> Option<&SeriesReading> {
        self.readings.iter().find(|r| r.series.id == id)
    }
}

/// The values of one series at one tick.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesReading {
    pub series: DerivedSeries,
    pub values: Result<Vec<f64>, SeriesUnavailable>,
}

impl SeriesReading {
    /// The values, or `None` when the series is unavailable.
    pub fn values(&self) -> Option<&[f64]> {
        self.values.as_deref().ok()
    }

    /// The most recent sample, if any.
    pub fn latest(&self) -> Option<f64> {
        self.values().and_then(|v| v.last().copied())
    }

    pub fn is_available(&self) -> bool {
        self.values.is_ok()
    }
}
