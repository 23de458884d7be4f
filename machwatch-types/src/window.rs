//! Rolling time windows covered by one stats fetch.

use thiserror::Error;

/// Refresh step used for a monitoring session, in milliseconds.
pub const DEFAULT_STEP_MS: u64 = 5000;

/// Errors produced when constructing a [`TimeWindow`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimeWindowError {
    /// The step between samples was zero.
    #[error("window step must be greater than zero")]
    ZeroStep,

    /// The window was empty or inverted.
    #[error("window start ({start}) must be before stop ({stop})")]
    Empty { start: u64, stop: u64 },
}

/// A time range `[start, stop)` sampled every `step` milliseconds.
///
/// All values are milliseconds since the Unix epoch. A window always satisfies
/// `start < stop` and `step > 0`; the constructors enforce it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct TimeWindow {
    start: u64,
    stop: u64,
    step: u64,
}

impl TimeWindow {
    /// Create a window, validating its invariants.
    pub fn new(start: u64, stop: u64, step: u64) -> Result<Self, TimeWindowError> {
        if step == 0 {
            return Err(TimeWindowError::ZeroStep);
        }
        if start >= stop {
            return Err(TimeWindowError::Empty { start, stop });
        }
        Ok(Self { start, stop, step })
    }

    /// Create the window of `points` samples that ends at `now_ms`.
    ///
    /// `stop` is aligned down to a multiple of `step` so consecutive ticks
    /// request windows on the same sample grid. `start` saturates at zero.
    pub fn ending_at(now_ms: u64, points: usize, step: u64) -> Result<Self, TimeWindowError> {
        if step == 0 {
            return Err(TimeWindowError::ZeroStep);
        }
        let stop = now_ms - now_ms % step;
        let span = step.saturating_mul(points as u64);
        Self::new(stop.saturating_sub(span), stop, step)
    }

    /// Start of the window in milliseconds.
    pub fn start(&self) -> u64 {
        self.start
    }

    /// End of the window in milliseconds.
    pub fn stop(&self) -> u64 {
        self.stop
    }

    /// Step between samples in milliseconds.
    pub fn step(&self) -> u64 {
        self.step
    }

    /// Start of the window in whole seconds, as the stats endpoint expects.
    pub fn start_secs(&self) -> u64 {
        self.start / 1000
    }

    /// End of the window in whole seconds.
    pub fn stop_secs(&self) -> u64 {
        self.stop / 1000
    }

    /// Number of samples the window spans.
    pub fn points(&self) -> u64 {
        (self.stop - self.start) / self.step
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_zero_step() {
        assert_eq!(TimeWindow::new(0, 10, 0), Err(TimeWindowError::ZeroStep));
    }

    #[test]
    fn rejects_inverted_or_empty_window() {
        assert_eq!(
            TimeWindow::new(10, 10, 5),
            Err(TimeWindowError::Empty { start: 10, stop: 10 })
        );
        assert!(TimeWindow::new(20, 10, 5).is_err());
    }

    #[test]
    fn seconds_are_truncated() {
        let window = TimeWindow::new(1_700_000_000_999, 1_700_000_030_500, 5000).unwrap();
        assert_eq!(window.start_secs(), 1_700_000_000);
        assert_eq!(window.stop_secs(), 1_700_000_030);
    }

    #[test]
    fn ending_at_aligns_to_step() {
        let window = TimeWindow::ending_at(1_700_000_032_123, 6, 5000).unwrap();
        assert_eq!(window.stop(), 1_700_000_030_000);
        assert_eq!(window.start(), 1_700_000_000_000);
        assert_eq!(window.points(), 6);
    }

    #[test]
    fn ending_at_saturates_near_epoch() {
        let window = TimeWindow::ending_at(12_000, 60, 5000).unwrap();
        assert_eq!(window.start(), 0);
        assert_eq!(window.stop(), 10_000);
    }

    #[test]
    fn ending_at_before_first_step_is_empty() {
        assert!(TimeWindow::ending_at(4_000, 60, 5000).is_err());
    }
}
