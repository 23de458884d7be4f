//! # machwatch-engine
//!
//! Windowed, periodically refreshed metrics engine behind a machine's live
//! performance graphs.
//!
//! One fetch per tick returns a single raw snapshot; every display series is
//! derived from that snapshot. Disk and interface series are discovered the
//! first time they show up.
//!
//! ## Architecture
//!
//! ```text
//! MonitoringController   enabled / visible / pending flags
//!        │
//!        ▼
//! WindowScheduler ──tick──▶ SnapshotFetcher ──▶ SnapshotCache
//!        │                                          │
//!        │                 SeriesRegistry ◀─────────┘
//!        │                 (discover, evaluate)
//!        ▼
//! broadcast::Sender<MonitorEvent>
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use machwatch_adapters::http::HttpStatsFetcher;
//! use machwatch_engine::{MonitorEvent, MonitoringController, SchedulerConfig};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let fetcher = HttpStatsFetcher::builder()
//!         .backend("ec2-eu")
//!         .machine("i-0abc")
//!         .build()?;
//!
//!     let controller = MonitoringController::new(SchedulerConfig::default(), Arc::new(fetcher))?;
//!     let mut events = controller.subscribe();
//!     controller.set_enabled(true);
//!
//!     while let Ok(event) = events.recv().await {
//!         match event {
//!             MonitorEvent::Tick(report) => {
//!                 for reading in &report.readings {
//!                     println!("{}: {:?}", reading.series.label, reading.latest());
//!                 }
//!             }
//!             MonitorEvent::FetchFailed { reason } => eprintln!("fetch failed: {reason}"),
//!             _ => {}
//!         }
//!     }
//!     Ok(())
//! }
//! ```

mod cache;
mod controller;
mod derive;
mod error;
mod events;
mod registry;
mod scheduler;

pub use cache::SnapshotCache;
pub use controller::MonitoringController;
pub use derive::{evaluate, Baselines, SeriesUnavailable};
pub use error::EngineError;
pub use events::{MonitorEvent, SeriesReading, TickReport};
pub use registry::SeriesRegistry;
pub use scheduler::{system_clock, Clock, SchedulerConfig, SchedulerPhase, WindowScheduler};

// Re-export types for convenience
pub use machwatch_types::{DerivedSeries, MonitoringState, RawSnapshot, SeriesId, TimeWindow};
