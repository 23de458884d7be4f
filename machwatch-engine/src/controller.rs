//! Monitoring lifecycle driven by "enabled" and "visible" signals.

use std::sync::Arc;

use machwatch_adapters::{MonitoringToggle, SnapshotFetcher};
use machwatch_types::MonitoringState;
use parking_lot::Mutex;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::cache::SnapshotCache;
use crate::error::EngineError;
use crate::events::{MonitorEvent, SeriesReading};
use crate::registry::SeriesRegistry;
use crate::scheduler::{system_clock, Clock, SchedulerConfig, SchedulerPhase, WindowScheduler};

#[derive(Debug)]
struct Flags {
    enabled: bool,
    pending: bool,
    visible: bool,
    /// Last state published, to suppress duplicate `StateChanged` events.
    published: MonitoringState,
}

/// Owns the scheduler and keeps it in step with the host's signals.
///
/// | enabled | visible | scheduler |
/// |---------|---------|-----------|
/// | false   | any     | stopped, registry reset, cache cleared |
/// | true    | true    | started (bootstraps) or resumed |
/// | true    | false   | paused, cache and series kept; never started |
///
/// # Example
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use machwatch_adapters::FileFetcher;
/// use machwatch_engine::{MonitorEvent, MonitoringController, SchedulerConfig};
///
/// #[tokio::main(flavor = "current_thread")]
/// async fn main() {
///     let fetcher = Arc::new(FileFetcher::new("stats.json"));
///     let controller = MonitoringController::new(SchedulerConfig::default(), fetcher).unwrap();
///     let mut events = controller.subscribe();
///
///     controller.set_enabled(true);
///
///     while let Ok(event) = events.recv().await {
///         if let MonitorEvent::Tick(report) = event {
///             println!("tick {} with {} series", report.tick, report.readings.len());
///         }
///     }
/// }
/// ```
pub struct MonitoringController {
    scheduler: WindowScheduler,
    events: broadcast::Sender<MonitorEvent>,
    flags: Mutex<Flags>,
}

impl std::fmt::Debug for MonitoringController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MonitoringController")
            .field("scheduler", &self.scheduler)
            .field("flags", &*self.flags.lock())
            .finish()
    }
}

impl MonitoringController {
    /// Create a disabled, visible controller using the wall clock.
    pub fn new(
        config: SchedulerConfig,
        fetcher: Arc<dyn SnapshotFetcher>,
    ) -> Result<Self, EngineError> {
        Self::with_clock(config, fetcher, system_clock())
    }

    /// Create a controller with an explicit clock.
    pub fn with_clock(
        config: SchedulerConfig,
        fetcher: Arc<dyn SnapshotFetcher>,
        clock: Clock,
    ) -> Result<Self, EngineError> {
        config.validate()?;
        let (events, _) = broadcast::channel(config.event_capacity);
        let scheduler = WindowScheduler::new(
            config,
            fetcher,
            Arc::new(SnapshotCache::new()),
            Arc::new(Mutex::new(SeriesRegistry::new())),
            events.clone(),
            clock,
        )?;
        Ok(Self {
            scheduler,
            events,
            flags: Mutex::new(Flags {
                enabled: false,
                pending: false,
                visible: true,
                published: MonitoringState::default(),
            }),
        })
    }

    /// The backend reports monitoring enabled or disabled for the machine.
    pub fn set_enabled(&self, enabled: bool) {
        let mut flags = self.flags.lock();
        if flags.enabled != enabled {
            info!(enabled, "monitoring flag changed");
        }
        flags.enabled = enabled;
        self.reconcile(&mut flags);
    }

    /// The view was shown or hidden.
    pub fn set_visible(&self, visible: bool) {
        let mut flags = self.flags.lock();
        flags.visible = visible;
        self.reconcile(&mut flags);
    }

    /// Mark an enable/disable request as in progress or finished.
    pub fn set_pending(&self, pending: bool) {
        let mut flags = self.flags.lock();
        flags.pending = pending;
        self.reconcile(&mut flags);
    }

    /// Ask the backend to enable or disable monitoring, then apply the result.
    ///
    /// `pending` is set for the duration of the request and always cleared.
    /// On failure `enabled` keeps its previous value.
    pub async fn request_enabled(
        &self,
        toggle: &dyn MonitoringToggle,
        enabled: bool,
    ) -> Result<(), EngineError> {
        self.set_pending(true);
        let result = toggle.set_monitoring(enabled).await;

        let mut flags = self.flags.lock();
        flags.pending = false;
        match &result {
            Ok(()) => flags.enabled = enabled,
            Err(e) => warn!(enabled, error = %e, "monitoring toggle failed"),
        }
        self.reconcile(&mut flags);
        result.map_err(EngineError::from)
    }

    /// Adopt the backend's current monitoring status.
    ///
    /// On failure `enabled` keeps its previous value.
    pub async fn sync_enabled(&self, toggle: &dyn MonitoringToggle) -> Result<bool, EngineError> {
        let enabled = toggle.monitoring_enabled().await?;
        debug!(enabled, "backend monitoring status");
        self.set_enabled(enabled);
        Ok(enabled)
    }

    /// Current `{enabled, pending, running}` flags.
    pub fn state(&self) -> MonitoringState {
        let flags = self.flags.lock();
        self.snapshot_state(&flags)
    }

    /// Whether the view is shown. A hidden view keeps the scheduler paused.
    pub fn is_visible(&self) -> bool {
        self.flags.lock().visible
    }

    /// Every registered series with its values from the cached snapshot.
    ///
    /// Empty while monitoring is disabled.
    pub fn current_series(&self) -> Vec<SeriesReading> {
        if !self.flags.lock().enabled {
            return Vec::new();
        }
        let snapshot = self.scheduler.cache().get();
        self.scheduler
            .registry()
            .lock()
            .evaluate_all(snapshot.as_deref())
    }

    /// Subscribe to engine events.
    pub fn subscribe(&self) -> broadcast::Receiver<MonitorEvent> {
        self.events.subscribe()
    }

    pub fn scheduler(&self) -> &WindowScheduler {
        &self.scheduler
    }

    fn snapshot_state(&self, flags: &Flags) -> MonitoringState {
        MonitoringState {
            enabled: flags.enabled,
            pending: flags.pending,
            running: self.scheduler.is_running(),
        }
    }

    /// Bring the scheduler in line with the flags and publish any change.
    fn reconcile(&self, flags: &mut Flags) {
        let phase = self.scheduler.phase();
        match (flags.enabled, flags.visible, phase) {
            (false, _, SchedulerPhase::Idle) => {}
            (false, _, _) => {
                self.scheduler.stop();
            }
            (true, true, SchedulerPhase::Idle) => {
                self.scheduler.start();
            }
            (true, true, SchedulerPhase::Paused) => {
                self.scheduler.resume();
            }
            (true, false, SchedulerPhase::Bootstrapping | SchedulerPhase::SteadyState) => {
                self.scheduler.pause();
            }
            (true, false, SchedulerPhase::Idle) => {
                debug!("monitoring enabled while hidden, waiting for the view");
            }
            (true, _, _) => {}
        }

        let state = self.snapshot_state(flags);
        if state != flags.published {
            flags.published = state;
            let _ = self.events.send(MonitorEvent::StateChanged(state));
        }
    }
}
