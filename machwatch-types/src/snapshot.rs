//! RawSnapshot - the payload of one stats fetch.

use crate::NamedMap;

/// The raw stats payload for one time window.
///
/// Every category is optional. A missing category (or a missing key inside
/// one) means the backend has no data for it yet; it is not an error.
///
/// # Example
///
/// ```rust
/// use machwatch_types::{IoMethod, RawSnapshot};
///
/// let snapshot = RawSnapshot::builder()
///     .cpu(2, vec![50.0, 100.0])
///     .memory(2048.0, vec![1024.0])
///     .load(vec![0.5, 0.7])
///     .disk(IoMethod::Read, "sda", vec![12.0])
///     .build();
///
/// assert_eq!(snapshot.cores(), Some(2));
/// assert!(snapshot.network.is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct RawSnapshot {
    /// CPU utilization, summed across cores.
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub cpu: Option<CpuStats>,

    /// Memory usage.
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub memory: Option<MemoryStats>,

    /// System load samples.
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub load: Option<Vec<f64>>,

    /// Disk operations, split by I/O method.
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub disk: Option<DiskStats>,

    /// Per-interface network traffic, in reported order.
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub network: Option<NamedMap<InterfaceStats>>,
}

/// CPU category of a snapshot.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct CpuStats {
    /// Number of cores the utilization is summed over.
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub cores: Option<u32>,

    /// Utilization samples; a fully busy machine reports `cores` per sample.
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub utilization: Option<Vec<f64>>,
}

/// Memory category of a snapshot.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct MemoryStats {
    /// Total memory, in the same unit as `used`.
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub total: Option<f64>,

    /// Used memory samples.
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub used: Option<Vec<f64>>,
}

/// Disk category of a snapshot.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct DiskStats {
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub read: Option<NamedMap<DiskOps>>,

    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub write: Option<NamedMap<DiskOps>>,
}

impl DiskStats {
    /// Disks reported for one I/O method.
    pub fn by_method(&self, method: IoMethod) -> Option<&NamedMap<DiskOps>> {
        match method {
            IoMethod::Read => self.read.as_ref(),
            IoMethod::Write => self.write.as_ref(),
        }
    }

    fn by_method_mut(&mut self, method: IoMethod) -> &mut NamedMap<DiskOps> {
        match method {
            IoMethod::Read => self.read.get_or_insert_with(NamedMap::new),
            IoMethod::Write => self.write.get_or_insert_with(NamedMap::new),
        }
    }
}

/// Operation samples for one disk and one I/O method.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct DiskOps {
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub disk_ops: Option<Vec<f64>>,
}

/// Traffic samples for one network interface.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct InterfaceStats {
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub tx: Option<Vec<f64>>,

    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub rx: Option<Vec<f64>>,
}

impl InterfaceStats {
    /// Samples for one traffic direction.
    pub fn stream(&self, stream: NetStream) -> Option<&Vec<f64>> {
        match stream {
            NetStream::Tx => self.tx.as_ref(),
            NetStream::Rx => self.rx.as_ref(),
        }
    }
}

/// Disk I/O direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum IoMethod {
    Read,
    Write,
}

impl IoMethod {
    /// Both methods, in display order.
    pub const ALL: [IoMethod; 2] = [IoMethod::Read, IoMethod::Write];

    /// Key used in payloads and series ids.
    pub fn as_str(&self) -> &'static str {
        match self {
            IoMethod::Read => "read",
            IoMethod::Write => "write",
        }
    }
}

/// Network traffic direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum NetStream {
    Tx,
    Rx,
}

impl NetStream {
    /// Both directions, in display order.
    pub const ALL: [NetStream; 2] = [NetStream::Tx, NetStream::Rx];

    /// Key used in payloads and series ids.
    pub fn as_str(&self) -> &'static str {
        match self {
            NetStream::Tx => "tx",
            NetStream::Rx => "rx",
        }
    }
}

impl RawSnapshot {
    /// Create a builder for constructing snapshots.
    pub fn builder() -> RawSnapshotBuilder {
        RawSnapshotBuilder::new()
    }

    /// Core count, if this snapshot reports one.
    pub fn cores(&self) -> Option<u32> {
        self.cpu.as_ref()?.cores
    }

    /// Total memory, if this snapshot reports it.
    pub fn memory_total(&self) -> Option<f64> {
        self.memory.as_ref()?.total
    }

    /// Disk names reported under `disk.read`, in payload order.
    pub fn disk_names(&self) -> impl Iterator<Item = &str> {
        self.disk
            .as_ref()
            .and_then(|d| d.read.as_ref())
            .into_iter()
            .flat_map(|disks| disks.names())
    }

    /// Interface names reported under `network`, in payload order.
    pub fn interface_names(&self) -> impl Iterator<Item = &str> {
        self.network.iter().flat_map(|ifaces| ifaces.names())
    }

    /// Operation samples at `disk[method][name].disk_ops`.
    pub fn disk_ops(&self, method: IoMethod, name: &str) -> Option<&Vec<f64>> {
        self.disk
            .as_ref()?
            .by_method(method)?
            .get(name)?
            .disk_ops
            .as_ref()
    }

    /// Traffic samples at `network[iface][stream]`.
    pub fn traffic(&self, iface: &str, stream: NetStream) -> Option<&Vec<f64>> {
        self.network.as_ref()?.get(iface)?.stream(stream)
    }
}

/// Builder for constructing `RawSnapshot` instances.
#[derive(Debug, Default)]
pub struct RawSnapshotBuilder {
    snapshot: RawSnapshot,
}

impl RawSnapshotBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the CPU category with a core count.
    pub fn cpu(mut self, cores: u32, utilization: Vec<f64>) -> Self {
        self.snapshot.cpu = Some(CpuStats {
            cores: Some(cores),
            utilization: Some(utilization),
        });
        self
    }

    /// Set CPU utilization without reporting a core count.
    pub fn cpu_utilization(mut self, utilization: Vec<f64>) -> Self {
        self.snapshot.cpu = Some(CpuStats {
            cores: None,
            utilization: Some(utilization),
        });
        self
    }

    /// Set the memory category.
    pub fn memory(mut self, total: f64, used: Vec<f64>) -> Self {
        self.snapshot.memory = Some(MemoryStats {
            total: Some(total),
            used: Some(used),
        });
        self
    }

    /// Set used memory without reporting a total.
    pub fn memory_used(mut self, used: Vec<f64>) -> Self {
        self.snapshot.memory = Some(MemoryStats {
            total: None,
            used: Some(used),
        });
        self
    }

    /// Set the load samples.
    pub fn load(mut self, load: Vec<f64>) -> Self {
        self.snapshot.load = Some(load);
        self
    }

    /// Add operation samples for one disk and I/O method.
    pub fn disk(mut self, method: IoMethod, name: impl Into<String>, ops: Vec<f64>) -> Self {
        self.snapshot
            .disk
            .get_or_insert_with(DiskStats::default)
            .by_method_mut(method)
            .insert(name, DiskOps {
                disk_ops: Some(ops),
            });
        self
    }

    /// Add an interface with traffic built using a closure.
    pub fn interface<F>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: FnOnce(InterfaceStatsBuilder) -> InterfaceStatsBuilder,
    {
        let stats = f(InterfaceStatsBuilder::default()).build();
        self.snapshot
            .network
            .get_or_insert_with(NamedMap::new)
            .insert(name, stats);
        self
    }

    /// Build the snapshot.
    pub fn build(self) -> RawSnapshot {
        self.snapshot
    }
}

/// Builder for `InterfaceStats`.
#[derive(Debug, Default)]
pub struct InterfaceStatsBuilder {
    stats: InterfaceStats,
}

impl InterfaceStatsBuilder {
    /// Set transmitted traffic samples.
    pub fn tx(mut self, samples: Vec<f64>) -> Self {
        self.stats.tx = Some(samples);
        self
    }

    /// Set received traffic samples.
    pub fn rx(mut self, samples: Vec<f64>) -> Self {
        self.stats.rx = Some(samples);
        self
    }

    /// Build the interface stats.
    pub fn build(self) -> InterfaceStats {
        self.stats
    }
}
