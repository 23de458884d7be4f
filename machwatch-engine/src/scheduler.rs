//! Refresh cadence: bootstrap fetch, then one fetch per step.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use machwatch_adapters::SnapshotFetcher;
use machwatch_types::{TimeWindow, DEFAULT_STEP_MS};
use parking_lot::Mutex;
use tokio::sync::{broadcast, watch};
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::cache::SnapshotCache;
use crate::error::EngineError;
use crate::events::{MonitorEvent, TickReport};
use crate::registry::SeriesRegistry;

/// Milliseconds since the Unix epoch, used to place each tick's window.
pub type Clock = Arc<dyn Fn() -> u64 + Send + Sync>;

/// Wall clock in milliseconds.
pub fn system_clock() -> Clock {
    Arc::new(|| {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    })
}

/// Scheduler knobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// Interval between ticks, also the sample step requested from the backend.
    pub step: Duration,
    /// Samples per window.
    pub window_points: usize,
    /// Capacity of the event broadcast channel.
    pub event_capacity: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            step: Duration::from_millis(DEFAULT_STEP_MS),
            window_points: 60,
            event_capacity: 256,
        }
    }
}

impl SchedulerConfig {
    /// Reject settings that cannot produce a window or a channel.
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.step.as_millis() == 0 {
            return Err(EngineError::InvalidConfig(
                "step must be at least 1ms".to_string(),
            ));
        }
        if self.window_points == 0 {
            return Err(EngineError::InvalidConfig(
                "window_points must be greater than zero".to_string(),
            ));
        }
        if self.event_capacity == 0 {
            return Err(EngineError::InvalidConfig(
                "event_capacity must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    fn step_ms(&self) -> u64 {
        self.step.as_millis() as u64
    }
}

/// Where the scheduler is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerPhase {
    /// No timer, empty cache, registry reset.
    Idle,
    /// The first fetch of the session is in flight.
    Bootstrapping,
    /// Ticking every step.
    SteadyState,
    /// Timer cancelled; cache and registry kept.
    Paused,
}

impl SchedulerPhase {
    pub fn is_running(&self) -> bool {
        matches!(self, Self::Bootstrapping | Self::SteadyState)
    }
}

#[derive(Debug)]
struct Control {
    phase: SchedulerPhase,
    stop_tx: Option<watch::Sender<bool>>,
    bootstrapped: bool,
}

struct Shared {
    config: SchedulerConfig,
    fetcher: Arc<dyn SnapshotFetcher>,
    cache: Arc<SnapshotCache>,
    registry: Arc<Mutex<SeriesRegistry>>,
    events: broadcast::Sender<MonitorEvent>,
    clock: Clock,
    epoch: AtomicU64,
    ticks: AtomicU64,
    control: Mutex<Control>,
}

/// Drives periodic fetches for one machine.
///
/// `start` issues a bootstrap fetch and waits for it before the step timer
/// begins. Afterwards every tick spawns its own fetch, so a slow response
/// never delays the next tick; overlapping responses land last-write-wins.
///
/// Every `start`, `stop`, `pause` and `resume` bumps a session epoch. A fetch
/// that completes under an older epoch is dropped without touching the cache.
///
/// All control methods must be called from within a Tokio runtime.
pub struct WindowScheduler {
    shared: Arc<Shared>,
}

impl std::fmt::Debug for WindowScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WindowScheduler")
            .field("fetcher", &self.shared.fetcher.description())
            .field("phase", &self.phase())
            .field("epoch", &self.epoch())
            .finish()
    }
}

impl WindowScheduler {
    pub fn new(
        config: SchedulerConfig,
        fetcher: Arc<dyn SnapshotFetcher>,
        cache: Arc<SnapshotCache>,
        registry: Arc<Mutex<SeriesRegistry>>,
        events: broadcast::Sender<MonitorEvent>,
        clock: Clock,
    ) -> Result<Self, EngineError> {
        config.validate()?;
        Ok(Self {
            shared: Arc::new(Shared {
                config,
                fetcher,
                cache,
                registry,
                events,
                clock,
                epoch: AtomicU64::new(0),
                ticks: AtomicU64::new(0),
                control: Mutex::new(Control {
                    phase: SchedulerPhase::Idle,
                    stop_tx: None,
                    bootstrapped: false,
                }),
            }),
        })
    }

    /// Start a fresh session from `Idle`.
    ///
    /// Clears the cache and resets the registry, then bootstraps. Returns
    /// false if the scheduler was not idle.
    pub fn start(&self) -> bool {
        let mut control = self.shared.control.lock();
        if control.phase != SchedulerPhase::Idle {
            debug!(phase = ?control.phase, "start ignored, scheduler not idle");
            return false;
        }
        self.shared.cache.clear();
        self.shared.registry.lock().reset();
        self.shared.ticks.store(0, Ordering::SeqCst);
        control.bootstrapped = false;

        let epoch = self.shared.next_epoch();
        info!(epoch, source = self.shared.fetcher.description(), "monitoring started");
        self.shared.launch(&mut control, epoch, Launch::Bootstrap);
        true
    }

    /// Stop ticking and return to `Idle`.
    ///
    /// In-flight fetches run to completion but their results are discarded.
    /// Returns false if already idle.
    pub fn stop(&self) -> bool {
        let mut control = self.shared.control.lock();
        if control.phase == SchedulerPhase::Idle {
            return false;
        }
        let epoch = self.shared.next_epoch();
        halt(&mut control);
        control.phase = SchedulerPhase::Idle;
        control.bootstrapped = false;
        self.shared.cache.clear();
        self.shared.registry.lock().reset();
        self.shared.ticks.store(0, Ordering::SeqCst);
        info!(epoch, "monitoring stopped");
        true
    }

    /// Cancel the timer but keep the cache and discovered series.
    ///
    /// Returns false unless the scheduler was running.
    pub fn pause(&self) -> bool {
        let mut control = self.shared.control.lock();
        if !control.phase.is_running() {
            return false;
        }
        let epoch = self.shared.next_epoch();
        halt(&mut control);
        control.phase = SchedulerPhase::Paused;
        debug!(epoch, "monitoring paused");
        true
    }

    /// Leave `Paused`.
    ///
    /// Goes straight to `SteadyState` with an immediate tick if this session
    /// already bootstrapped, otherwise bootstraps again. Returns false unless
    /// the scheduler was paused.
    pub fn resume(&self) -> bool {
        let mut control = self.shared.control.lock();
        if control.phase != SchedulerPhase::Paused {
            return false;
        }
        let epoch = self.shared.next_epoch();
        let launch = if control.bootstrapped {
            Launch::Resume
        } else {
            Launch::Bootstrap
        };
        debug!(epoch, ?launch, "monitoring resumed");
        self.shared.launch(&mut control, epoch, launch);
        true
    }

    pub fn phase(&self) -> SchedulerPhase {
        self.shared.control.lock().phase
    }

    /// True while bootstrapping or in steady state.
    pub fn is_running(&self) -> bool {
        self.phase().is_running()
    }

    /// Current session epoch.
    pub fn epoch(&self) -> u64 {
        self.shared.epoch.load(Ordering::SeqCst)
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.shared.config
    }

    pub fn cache(&self) -> &Arc<SnapshotCache> {
        &self.shared.cache
    }

    pub fn registry(&self) -> &Arc<Mutex<SeriesRegistry>> {
        &self.shared.registry
    }
}

impl Drop for WindowScheduler {
    fn drop(&mut self) {
        let mut control = self.shared.control.lock();
        self.shared.next_epoch();
        halt(&mut control);
    }
}

#[derive(Debug, Clone, Copy)]
enum Launch {
    /// Await one fetch, then tick every step.
    Bootstrap,
    /// Tick immediately, then every step.
    Resume,
}

/// Signal the running loop, if any, to exit.
fn halt(control: &mut Control) {
    if let Some(stop_tx) = control.stop_tx.take() {
        let _ = stop_tx.send(true);
    }
}

fn enter_steady_state(control: &mut Control, epoch: u64) {
    if control.phase == SchedulerPhase::Bootstrapping {
        control.phase = SchedulerPhase::SteadyState;
        control.bootstrapped = true;
        debug!(epoch, "bootstrap complete");
    }
}

/// Resolves once a stop is requested or the sender is gone.
async fn stopped(stop_rx: &mut watch::Receiver<bool>) {
    loop {
        if *stop_rx.borrow() {
            return;
        }
        if stop_rx.changed().await.is_err() {
            return;
        }
    }
}

impl Shared {
    fn next_epoch(&self) -> u64 {
        self.epoch.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn is_current(&self, epoch: u64) -> bool {
        self.epoch.load(Ordering::SeqCst) == epoch
    }

    /// Spawn the tick loop for a new epoch. Caller holds the control lock.
    fn launch(self: &Arc<Self>, control: &mut Control, epoch: u64, launch: Launch) {
        halt(control);
        let (stop_tx, mut stop_rx) = watch::channel(false);
        control.stop_tx = Some(stop_tx);

        let (first_tick, phase) = match launch {
            Launch::Bootstrap => (self.config.step, SchedulerPhase::Bootstrapping),
            Launch::Resume => (Duration::ZERO, SchedulerPhase::SteadyState),
        };
        control.phase = phase;

        let shared = Arc::clone(self);
        tokio::spawn(async move {
            if let Launch::Bootstrap = launch {
                // Spawned so a stop during bootstrap leaves the fetch running
                // to be discarded by the epoch check.
                let bootstrap = tokio::spawn(Arc::clone(&shared).run_tick(epoch));
                tokio::select! {
                    _ = bootstrap => {}
                    _ = stopped(&mut stop_rx) => return,
                }
                if !shared.finish_bootstrap(epoch) {
                    return;
                }
            }

            let step = shared.config.step;
            let mut timer = tokio::time::interval_at(Instant::now() + first_tick, step);
            timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = timer.tick() => {
                        tokio::spawn(Arc::clone(&shared).run_tick(epoch));
                    }
                    _ = stopped(&mut stop_rx) => break,
                }
            }
            debug!(epoch, "tick loop exited");
        });
    }

    /// Leave `Bootstrapping` once the first fetch has landed or failed.
    /// Returns false if the session ended meanwhile.
    fn finish_bootstrap(&self, epoch: u64) -> bool {
        let mut control = self.control.lock();
        if !self.is_current(epoch) {
            return false;
        }
        enter_steady_state(&mut control, epoch);
        true
    }

    /// One tick: fetch, then land the result and publish readings.
    async fn run_tick(self: Arc<Self>, epoch: u64) {
        // A tick spawned just before a stop must not fetch or take a number
        // from the next session.
        let (tick, phase) = {
            let control = self.control.lock();
            if !self.is_current(epoch) {
                debug!(epoch, "skipping tick scheduled before its session ended");
                return;
            }
            (self.ticks.fetch_add(1, Ordering::SeqCst) + 1, control.phase)
        };

        let now = (self.clock)();
        let window = match TimeWindow::ending_at(now, self.config.window_points, self.config.step_ms())
        {
            Ok(window) => window,
            Err(e) => {
                warn!(tick, now, error = %e, "cannot build window for tick");
                return;
            }
        };

        let result = self.fetcher.fetch(window).await;

        let mut control = self.control.lock();
        if !self.is_current(epoch) {
            debug!(epoch, tick, "discarding fetch completed after its session ended");
            return;
        }
        enter_steady_state(&mut control, epoch);

        let mut registry = self.registry.lock();
        match result {
            Ok(snapshot) => {
                let added = registry.discover(&snapshot);
                self.cache.set(snapshot);
                if !added.is_empty() {
                    self.publish(MonitorEvent::Discovered(added));
                }
            }
            Err(e) => {
                warn!(
                    tick,
                    window_start = window.start(),
                    source = self.fetcher.description(),
                    error = %e,
                    "fetch failed"
                );
                self.publish(MonitorEvent::FetchFailed {
                    reason: e.reason(),
                });
            }
        }

        let snapshot = self.cache.get();
        let readings = registry.evaluate_all(snapshot.as_deref());
        drop(registry);

        for reading in &readings {
            if let Err(reason) = &reading.values {
                debug!(series_id = %reading.series.id, %reason, "series unavailable");
                self.publish(MonitorEvent::Unavailable {
                    series_id: reading.series.id.clone(),
                    reason: reason.clone(),
                });
            }
        }
        self.publish(MonitorEvent::Tick(TickReport {
            tick,
            window,
            phase,
            readings,
        }));
        drop(control);
    }

    fn publish(&self, event: MonitorEvent) {
        // No subscribers is fine; the host may not have attached yet.
        let _ = self.events.send(event);
    }
}
