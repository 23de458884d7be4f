//! # machwatch-adapters
//!
//! Fetchers that pull raw stats snapshots for a monitored machine.
//!
//! Every adapter implements [`SnapshotFetcher`]: one request per call, one
//! [`RawSnapshot`] or one [`FetchError`] back. Retrying is left to the caller's
//! refresh schedule.
//!
//! ## Supported Sources
//!
//! - **HTTP** (`http` feature, on by default) - the dashboard's per-machine
//!   stats API, plus the monitoring enable/disable endpoint
//! - **File** - a JSON payload on disk, re-read on every fetch
//!
//! ## Quick Start (HTTP)
//!
//! ```rust,no_run
//! use machwatch_adapters::http::HttpStatsFetcher;
//! use machwatch_adapters::SnapshotFetcher;
//! use machwatch_types::TimeWindow;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let fetcher = HttpStatsFetcher::builder()
//!         .endpoint("http://localhost:8000")
//!         .backend("ec2-eu")
//!         .machine("i-0abc")
//!         .build()?;
//!
//!     let window = TimeWindow::ending_at(1_700_000_000_000, 60, 5000)?;
//!     let snapshot = fetcher.fetch(window).await?;
//!
//!     println!("Interfaces: {:?}", snapshot.interface_names().collect::<Vec<_>>());
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod file;
mod fetcher;

#[cfg(feature = "http")]
pub mod http;

pub use error::FetchError;
pub use fetcher::{MonitoringToggle, SnapshotFetcher};
pub use file::FileFetcher;

// Re-export types for convenience
pub use machwatch_types::{RawSnapshot, TimeWindow};
