//! Registry of derived series with dynamic discovery.

use machwatch_types::{DerivedSeries, IoMethod, NetStream, RawSnapshot};
use tracing::debug;

use crate::derive::{self, Baselines, SeriesUnavailable};
use crate::events::SeriesReading;

/// Number of series every registry starts with (CPU, memory, load).
const STATIC_SERIES: usize = 3;

/// The current set of derived series for one monitored machine.
///
/// CPU, memory and load are always present. Disk and interface series are
/// added the first time a snapshot reports them and are never re-added or
/// reordered: the registry only grows until [`reset`](Self::reset).
///
/// # Example
///
/// ```
/// use machwatch_engine::SeriesRegistry;
/// use machwatch_types::RawSnapshot;
///
/// let mut registry = SeriesRegistry::new();
/// let snapshot = RawSnapshot::builder()
///     .interface("eth0", |i| i.tx(vec![1.0]).rx(vec![2.0]))
///     .build();
///
/// let added = registry.discover(&snapshot);
/// assert_eq!(added.len(), 2);
/// assert!(registry.discover(&snapshot).is_empty());
/// ```
#[derive(Debug, Clone)]
pub struct SeriesRegistry {
    series: Vec<DerivedSeries>,
    disks: Vec<String>,
    interfaces: Vec<String>,
    baselines: Baselines,
}

impl Default for SeriesRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl SeriesRegistry {
    /// Create a registry holding only the static series.
    pub fn new() -> Self {
        Self {
            series: DerivedSeries::static_set().to_vec(),
            disks: Vec::new(),
            interfaces: Vec::new(),
            baselines: Baselines::default(),
        }
    }

    /// The CPU, memory and load series.
    pub fn static_series(&self) -> &[DerivedSeries] {
        &self.series[..STATIC_SERIES]
    }

    /// All registered series in display order.
    pub fn series(&self) -> &[DerivedSeries] {
        &self.series
    }

    /// Look up a series by id.
    pub fn get(&self, id: &str) -> Option<&DerivedSeries> {
        self.series.iter().find(|s| s.id == id)
    }

    /// Number of registered series.
    pub fn len(&self) -> usize {
        self.series.len()
    }

    /// Always false; the static series are never removed.
    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    /// Discovered disk names, in first-seen order.
    pub fn disks(&self) -> &[String] {
        &self.disks
    }

    /// Discovered interface names, in first-seen order.
    pub fn interfaces(&self) -> &[String] {
        &self.interfaces
    }

    /// Baselines learned so far this session.
    pub fn baselines(&self) -> Baselines {
        self.baselines
    }

    /// Register series for disks and interfaces not seen before.
    ///
    /// Disks are discovered from `disk.read`; each new disk gets a read and a
    /// write ops series. Each new interface gets a tx and an rx series. Also
    /// learns the CPU core count and memory total if still unknown.
    ///
    /// Returns only the series added by this call, in the order they were
    /// registered.
    pub fn discover(&mut self, snapshot: &RawSnapshot) -> Vec<DerivedSeries> {
        if self.baselines.observe(snapshot) {
            debug!(
                cores = ?self.baselines.cores,
                memory_total = ?self.baselines.memory_total,
                "learned baselines"
            );
        }

        let mut added = Vec::new();

        for disk in snapshot.disk_names() {
            if self.disks.iter().any(|d| d == disk) {
                continue;
            }
            self.disks.push(disk.to_string());
            for method in IoMethod::ALL {
                added.push(DerivedSeries::disk(disk, method));
            }
        }

        for iface in snapshot.interface_names() {
            if self.interfaces.iter().any(|i| i == iface) {
                continue;
            }
            self.interfaces.push(iface.to_string());
            for stream in NetStream::ALL {
                added.push(DerivedSeries::network(iface, stream));
            }
        }

        if !added.is_empty() {
            debug!(count = added.len(), "discovered series");
        }
        self.series.extend(added.iter().cloned());
        added
    }

    /// Drop discovered series and learned baselines.
    pub fn reset(&mut self) {
        self.series.truncate(STATIC_SERIES);
        self.disks.clear();
        self.interfaces.clear();
        self.baselines = Baselines::default();
    }

    /// Derive one series' values from a snapshot.
    pub fn evaluate(
        &self,
        series: &DerivedSeries,
        snapshot: Option<&RawSnapshot>,
    ) -> Result<Vec<f64>, SeriesUnavailable> {
        derive::evaluate(&series.source, snapshot, &self.baselines)
    }

    /// Derive every registered series from a snapshot, in display order.
    pub fn evaluate_all(&self, snapshot: Option<&RawSnapshot>) -> Vec<SeriesReading> {
        self.series
            .iter()
            .map(|series| SeriesReading {
                series: series.clone(),
                values: self.evaluate(series, snapshot),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(series: &[DerivedSeries]) -> Vec<&str> {
        series.iter().map(|s| s.id.as_str()).collect()
    }

    fn with_interfaces(names: &[&str]) -> RawSnapshot {
        names
            .iter()
            .fold(RawSnapshot::builder(), |b, name| {
                b.interface(*name, |i| i.tx(vec![1.0]).rx(vec![1.0]))
            })
            .build()
    }

    #[test]
    fn starts_with_static_set() {
        let registry = SeriesRegistry::new();
        assert_eq!(ids(registry.series()), vec!["cpu", "memory", "load"]);
        assert_eq!(registry.static_series(), registry.series());
    }

    #[test]
    fn discovery_is_idempotent() {
        let mut registry = SeriesRegistry::new();
        let snapshot = with_interfaces(&["eth0"]);

        let first = registry.discover(&snapshot);
        assert_eq!(ids(&first), vec!["net:eth0:tx", "net:eth0:rx"]);

        for _ in 0..5 {
            assert!(registry.discover(&snapshot).is_empty());
        }

        let eth0: Vec<_> = registry
            .series()
            .iter()
            .filter(|s| s.discovery_key() == Some("eth0"))
            .collect();
        assert_eq!(eth0.len(), 2);
    }

    #[test]
    fn discovery_preserves_first_seen_order() {
        let mut registry = SeriesRegistry::new();
        registry.discover(&with_interfaces(&["eth0"]));
        let added = registry.discover(&with_interfaces(&["eth1", "eth0"]));

        assert_eq!(ids(&added), vec!["net:eth1:tx", "net:eth1:rx"]);
        assert_eq!(registry.interfaces(), &["eth0".to_string(), "eth1".to_string()]);
        assert_eq!(
            ids(registry.series()),
            vec!["cpu", "memory", "load", "net:eth0:tx", "net:eth0:rx", "net:eth1:tx", "net:eth1:rx"]
        );
    }

    #[test]
    fn interfaces_are_not_sorted() {
        let mut registry = SeriesRegistry::new();
        registry.discover(&with_interfaces(&["wlan0", "eth0", "docker0"]));
        assert_eq!(registry.interfaces(), &["wlan0", "eth0", "docker0"]);
    }

    #[test]
    fn disks_get_read_and_write_series() {
        let mut registry = SeriesRegistry::new();
        let snapshot = RawSnapshot::builder()
            .disk(IoMethod::Read, "xvda", vec![1.0])
            .disk(IoMethod::Write, "xvda", vec![2.0])
            .build();

        let added = registry.discover(&snapshot);
        assert_eq!(ids(&added), vec!["disk:xvda:read", "disk:xvda:write"]);
        assert_eq!(registry.disks(), &["xvda"]);
    }

    #[test]
    fn write_only_disks_are_not_discovered() {
        let mut registry = SeriesRegistry::new();
        let snapshot = RawSnapshot::builder().disk(IoMethod::Write, "sdb", vec![2.0]).build();
        assert!(registry.discover(&snapshot).is_empty());
    }

    #[test]
    fn reset_restores_static_set_and_forgets_baselines() {
        let mut registry = SeriesRegistry::new();
        let snapshot = RawSnapshot::builder()
            .cpu(4, vec![1.0])
            .disk(IoMethod::Read, "sda", vec![1.0])
            .interface("eth0", |i| i.tx(vec![1.0]))
            .build();
        registry.discover(&snapshot);
        assert_eq!(registry.len(), 7);
        assert_eq!(registry.baselines().cores, Some(4));

        registry.reset();

        assert_eq!(ids(registry.series()), vec!["cpu", "memory", "load"]);
        assert!(registry.disks().is_empty());
        assert!(registry.interfaces().is_empty());
        assert_eq!(registry.baselines(), Baselines::default());

        // Rediscovery after a reset starts from scratch.
        assert_eq!(registry.discover(&snapshot).len(), 4);
    }

    #[test]
    fn evaluate_all_reports_each_series_independently() {
        let mut registry = SeriesRegistry::new();
        let snapshot = RawSnapshot::builder()
            .cpu(2, vec![1.0])
            .interface("eth0", |i| i.tx(vec![5.0]))
            .build();
        registry.discover(&snapshot);

        let readings = registry.evaluate_all(Some(&snapshot));
        let by_id = |id: &str| readings.iter().find(|r| r.series.id == id).unwrap();

        assert_eq!(by_id("cpu").values, Ok(vec![50.0]));
        assert!(by_id("memory").values.is_err());
        assert!(by_id("load").values.is_err());
        assert_eq!(by_id("net:eth0:tx").values, Ok(vec![5.0]));
        assert_eq!(
            by_id("net:eth0:rx").values,
            Err(SeriesUnavailable::MissingKey("network.eth0.rx".to_string()))
        );
    }

    #[test]
    fn get_finds_registered_series() {
        let mut registry = SeriesRegistry::new();
        registry.discover(&with_interfaces(&["eth0"]));
        assert!(registry.get("net:eth0:rx").is_some());
        assert!(registry.get("net:eth1:rx").is_none());
    }
}
