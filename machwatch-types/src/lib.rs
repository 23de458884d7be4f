//! # machwatch-types
//!
//! Core types for live machine monitoring. This crate defines the raw stats
//! payload returned by a monitoring backend, the rolling time window a fetch
//! covers, and the derived series a dashboard draws from each payload.
//!
//! ## Design Goals
//!
//! - **Absence is data**: every category and nested key of a [`RawSnapshot`]
//!   is optional; a missing key means "not yet available", never "malformed"
//! - **Stable ordering**: named mappings (disks, interfaces) keep the order in
//!   which the backend reported them
//! - **Optional serialization**: enable the `serde` feature to decode payloads
//!
//! ## Features
//!
//! - `serde`: JSON (de)serialization via serde
//!
//! ## Example
//!
//! ```rust
//! use machwatch_types::{RawSnapshot, TimeWindow};
//!
//! let window = TimeWindow::new(1_700_000_000_000, 1_700_000_030_000, 5000).unwrap();
//! assert_eq!(window.points(), 6);
//!
//! let snapshot = RawSnapshot::builder()
//!     .cpu(4, vec![40.0, 80.0])
//!     .interface("eth0", |i| i.tx(vec![1.0]).rx(vec![2.0]))
//!     .build();
//!
//! assert_eq!(snapshot.interface_names().collect::<Vec<_>>(), vec!["eth0"]);
//! ```

mod named;
mod series;
mod snapshot;
mod state;
mod window;

pub use named::NamedMap;
pub use series::*;
pub use snapshot::*;
pub use state::MonitoringState;
pub use window::{TimeWindow, TimeWindowError, DEFAULT_STEP_MS};
