//! # machwatch-cli
//!
//! Terminal host for the machwatch engine: prints every series each tick and
//! takes simple commands on stdin.
//!
//! ```text
//! stdin ──▶ command ──▶ MonitoringController ──events──▶ view ──▶ stdout
//!                              ▲
//!             settings ────────┘   (defaults < TOML < MACHWATCH_* < flags)
//! ```
//!
//! - **[`settings`]**: layered configuration
//! - **[`command`]**: stdin command parsing
//! - **[`view`]**: plain-text rendering of engine events

pub mod command;
pub mod settings;
pub mod view;

pub use command::Command;
pub use settings::{Overrides, Settings};
