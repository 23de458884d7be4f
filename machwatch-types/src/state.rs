//! Monitoring lifecycle flags for one machine.

/// Monitoring flags as seen by a host view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MonitoringState {
    /// The backend reports monitoring configured for the machine.
    pub enabled: bool,
    /// An enable/disable request is in progress.
    pub pending: bool,
    /// The scheduler is actively ticking.
    pub running: bool,
}
