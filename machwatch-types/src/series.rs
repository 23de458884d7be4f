//! Derived series definitions.

use std::fmt;

use crate::{IoMethod, NetStream};

/// Broad category of a derived series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum SeriesKind {
    /// Always present while monitoring is on (CPU, memory, load).
    Static,
    /// Discovered per disk.
    Disk,
    /// Discovered per network interface.
    Network,
}

/// Where in a [`RawSnapshot`](crate::RawSnapshot) a series reads its samples.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "source", rename_all = "lowercase"))]
pub enum SeriesSource {
    /// `cpu.utilization`, normalized by the learned core count.
    Cpu,
    /// `memory.used`, normalized by the learned total.
    Memory,
    /// `load`, passed through.
    Load,
    /// `disk[method][disk].disk_ops`, passed through.
    Disk { disk: String, method: IoMethod },
    /// `network[iface][stream]`, passed through.
    Network { iface: String, stream: NetStream },
}

impl SeriesSource {
    /// The series category this source belongs to.
    pub fn kind(&self) -> SeriesKind {
        match self {
            SeriesSource::Cpu | SeriesSource::Memory | SeriesSource::Load => SeriesKind::Static,
            SeriesSource::Disk { .. } => SeriesKind::Disk,
            SeriesSource::Network { .. } => SeriesKind::Network,
        }
    }
}

/// Identifier of a derived series, unique within a registry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct SeriesId(String);

impl SeriesId {
    /// Wrap a raw id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SeriesId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SeriesId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl PartialEq<str> for SeriesId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for SeriesId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// A named, independently evaluated view over a snapshot.
///
/// Series are immutable once created; the registry hands out clones.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DerivedSeries {
    /// Stable id, e.g. `cpu`, `disk:sda:read`, `net:eth0:tx`.
    pub id: SeriesId,
    /// Human readable label, e.g. `CPU`, `NET (eth0, tx)`.
    pub label: String,
    /// Where the samples come from.
    pub source: SeriesSource,
}

impl DerivedSeries {
    /// The CPU utilization series.
    pub fn cpu() -> Self {
        Self::from_source(SeriesSource::Cpu)
    }

    /// The memory utilization series.
    pub fn memory() -> Self {
        Self::from_source(SeriesSource::Memory)
    }

    /// The load series.
    pub fn load() -> Self {
        Self::from_source(SeriesSource::Load)
    }

    /// The ops series for one disk and I/O method.
    pub fn disk(disk: impl Into<String>, method: IoMethod) -> Self {
        Self::from_source(SeriesSource::Disk {
            disk: disk.into(),
            method,
        })
    }

    /// The traffic series for one interface and direction.
    pub fn network(iface: impl Into<String>, stream: NetStream) -> Self {
        Self::from_source(SeriesSource::Network {
            iface: iface.into(),
            stream,
        })
    }

    /// The three series present for every monitored machine, in display order.
    pub fn static_set() -> [DerivedSeries; 3] {
        [Self::cpu(), Self::memory(), Self::load()]
    }

    /// Build a series with the id and label implied by its source.
    pub fn from_source(source: SeriesSource) -> Self {
        let (id, label) = match &source {
            SeriesSource::Cpu => ("cpu".to_string(), "CPU".to_string()),
            SeriesSource::Memory => ("memory".to_string(), "RAM".to_string()),
            SeriesSource::Load => ("load".to_string(), "LOAD".to_string()),
            SeriesSource::Disk { disk, method } => (
                format!("disk:{}:{}", disk, method.as_str()),
                format!("DISK ({}, {})", disk, method.as_str()),
            ),
            SeriesSource::Network { iface, stream } => (
                format!("net:{}:{}", iface, stream.as_str()),
                format!("NET ({}, {})", iface, stream.as_str()),
            ),
        };
        Self {
            id: SeriesId(id),
            label,
            source,
        }
    }

    /// The series category.
    pub fn kind(&self) -> SeriesKind {
        self.source.kind()
    }

    /// The disk or interface name that caused this series to be discovered.
    pub fn discovery_key(&self) -> Option<&str> {
        match &self.source {
            SeriesSource::Disk { disk, .. } => Some(disk),
            SeriesSource::Network { iface, .. } => Some(iface),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_set_order_and_ids() {
        let ids: Vec<_> = DerivedSeries::static_set()
            .iter()
            .map(|s| s.id.as_str().to_string())
            .collect();
        assert_eq!(ids, vec!["cpu", "memory", "load"]);
        assert!(DerivedSeries::static_set()
            .iter()
            .all(|s| s.kind() == SeriesKind::Static && s.discovery_key().is_none()));
    }

    #[test]
    fn dynamic_ids_and_labels() {
        let disk = DerivedSeries::disk("sda", IoMethod::Write);
        assert_eq!(disk.id, "disk:sda:write");
        assert_eq!(disk.label, "DISK (sda, write)");
        assert_eq!(disk.kind(), SeriesKind::Disk);
        assert_eq!(disk.discovery_key(), Some("sda"));

        let net = DerivedSeries::network("eth0", NetStream::Rx);
        assert_eq!(net.id, "net:eth0:rx");
        assert_eq!(net.label, "NET (eth0, rx)");
        assert_eq!(net.kind(), SeriesKind::Network);
        assert_eq!(net.discovery_key(), Some("eth0"));
    }
}
