//! Value derivation for each series source.

use machwatch_types::{RawSnapshot, SeriesSource};
use thiserror::Error;

/// Why a series has no data point for a tick.
///
/// Never fatal: the series is expected to recover once data arrives.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SeriesUnavailable {
    /// Nothing has been fetched yet this session.
    #[error("no snapshot fetched yet")]
    NoSnapshot,

    /// A key on the series' path is absent from the current snapshot.
    #[error("missing key: {0}")]
    MissingKey(String),

    /// A normalization baseline has never been observed.
    #[error("baseline not learned yet: {0}")]
    BaselineUnknown(&'static str),
}

/// Normalization values learned once per session.
///
/// The first snapshot that reports a positive core count or memory total fixes
/// it; later snapshots are not consulted.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Baselines {
    pub cores: Option<u32>,
    pub memory_total: Option<f64>,
}

impl Baselines {
    /// Learn any baseline that is still unknown. Returns true if one was learned.
    pub fn observe(&mut self, snapshot: &RawSnapshot) -> bool {
        let mut learned = false;
        if self.cores.is_none() {
            if let Some(cores) = snapshot.cores().filter(|c| *c > 0) {
                self.cores = Some(cores);
                learned = true;
            }
        }
        if self.memory_total.is_none() {
            if let Some(total) = snapshot.memory_total().filter(|t| *t > 0.0) {
                self.memory_total = Some(total);
                learned = true;
            }
        }
        learned
    }
}

/// Derive the values of one series from a snapshot.
pub fn evaluate(
    source: &SeriesSource,
    snapshot: Option<&RawSnapshot>,
    baselines: &Baselines,
) -> Result<Vec<f64>, SeriesUnavailable> {
    let snapshot = snapshot.ok_or(SeriesUnavailable::NoSnapshot)?;

    match source {
        SeriesSource::Cpu => {
            let cpu = snapshot.cpu.as_ref().ok_or_else(|| missing("cpu"))?;
            let utilization = cpu.utilization.as_ref().ok_or_else(|| missing("cpu.utilization"))?;
            let cores = baselines.cores.ok_or(SeriesUnavailable::BaselineUnknown("cpu.cores"))?;
            Ok(percent_of(utilization, cores as f64))
        }
        SeriesSource::Memory => {
            let memory = snapshot.memory.as_ref().ok_or_else(|| missing("memory"))?;
            let used = memory.used.as_ref().ok_or_else(|| missing("memory.used"))?;
            let total = baselines
                .memory_total
                .ok_or(SeriesUnavailable::BaselineUnknown("memory.total"))?;
            Ok(percent_of(used, total))
        }
        SeriesSource::Load => snapshot.load.clone().ok_or_else(|| missing("load")),
        SeriesSource::Disk { disk, method } => snapshot
            .disk_ops(*method, disk)
            .cloned()
            .ok_or_else(|| missing(&format!("disk.{}.{}.disk_ops", method.as_str(), disk))),
        SeriesSource::Network { iface, stream } => snapshot
            .traffic(iface, *stream)
            .cloned()
            .ok_or_else(|| missing(&format!("network.{}.{}", iface, stream.as_str()))),
    }
}

fn missing(path: &str) -> SeriesUnavailable {
    SeriesUnavailable::MissingKey(path.to_string())
}

fn percent_of(samples: &[f64], whole: f64) -> Vec<f64> {
    samples.iter().map(|s| (s / whole) * 100.0).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use machwatch_types::{IoMethod, NetStream};

    fn learned(snapshot: &RawSnapshot) -> Baselines {
        let mut baselines = Baselines::default();
        baselines.observe(snapshot);
        baselines
    }

    #[test]
    fn cpu_is_normalized_per_core() {
        let snapshot = RawSnapshot::builder().cpu(4, vec![0.5, 1.0, 2.0, 4.0]).build();
        let values = evaluate(&SeriesSource::Cpu, Some(&snapshot), &learned(&snapshot)).unwrap();
        assert_eq!(values, vec![12.5, 25.0, 50.0, 100.0]);
    }

    #[test]
    fn cpu_formula_applies_to_whole_core_counts() {
        // Samples are in units of one busy core, so 40 on 4 cores reads as 1000%.
        let snapshot = RawSnapshot::builder().cpu(4, vec![40.0, 80.0]).build();
        let values = evaluate(&SeriesSource::Cpu, Some(&snapshot), &learned(&snapshot)).unwrap();
        assert_eq!(values, vec![1000.0, 2000.0]);
    }

    #[test]
    fn cpu_uses_learned_cores_when_later_snapshot_omits_them() {
        let first = RawSnapshot::builder().cpu(2, vec![1.0]).build();
        let mut baselines = learned(&first);

        let later = RawSnapshot::builder().cpu_utilization(vec![1.0, 2.0]).build();
        baselines.observe(&later);

        let values = evaluate(&SeriesSource::Cpu, Some(&later), &baselines).unwrap();
        assert_eq!(values, vec![50.0, 100.0]);
    }

    #[test]
    fn cores_are_never_relearned() {
        let mut baselines = learned(&RawSnapshot::builder().cpu(2, vec![]).build());
        assert!(!baselines.observe(&RawSnapshot::builder().cpu(8, vec![]).build()));
        assert_eq!(baselines.cores, Some(2));
    }

    #[test]
    fn cpu_unavailable_without_cpu_key() {
        let snapshot = RawSnapshot::builder().load(vec![1.0]).build();
        let baselines = Baselines {
            cores: Some(4),
            memory_total: None,
        };
        assert_eq!(
            evaluate(&SeriesSource::Cpu, Some(&snapshot), &baselines),
            Err(SeriesUnavailable::MissingKey("cpu".to_string()))
        );
    }

    #[test]
    fn cpu_unavailable_until_cores_observed() {
        let snapshot = RawSnapshot::builder().cpu_utilization(vec![1.0]).build();
        assert_eq!(
            evaluate(&SeriesSource::Cpu, Some(&snapshot), &learned(&snapshot)),
            Err(SeriesUnavailable::BaselineUnknown("cpu.cores"))
        );
    }

    #[test]
    fn zero_cores_are_not_learned() {
        let snapshot = RawSnapshot::builder().cpu(0, vec![1.0]).build();
        assert_eq!(learned(&snapshot).cores, None);
    }

    #[test]
    fn memory_is_percent_of_first_total() {
        let first = RawSnapshot::builder().memory(200.0, vec![50.0]).build();
        let mut baselines = learned(&first);
        let later = RawSnapshot::builder().memory(400.0, vec![100.0, 200.0]).build();
        baselines.observe(&later);

        let values = evaluate(&SeriesSource::Memory, Some(&later), &baselines).unwrap();
        assert_eq!(values, vec![50.0, 100.0]);
    }

    #[test]
    fn memory_unavailable_until_total_observed() {
        let snapshot = RawSnapshot::builder().memory_used(vec![1.0]).build();
        assert_eq!(
            evaluate(&SeriesSource::Memory, Some(&snapshot), &learned(&snapshot)),
            Err(SeriesUnavailable::BaselineUnknown("memory.total"))
        );
    }

    #[test]
    fn pass_through_series() {
        let snapshot = RawSnapshot::builder()
            .load(vec![0.5])
            .disk(IoMethod::Read, "sda", vec![3.0, 4.0])
            .interface("eth0", |i| i.rx(vec![7.0]))
            .build();
        let baselines = Baselines::default();

        assert_eq!(evaluate(&SeriesSource::Load, Some(&snapshot), &baselines), Ok(vec![0.5]));
        assert_eq!(
            evaluate(
                &SeriesSource::Disk {
                    disk: "sda".to_string(),
                    method: IoMethod::Read
                },
                Some(&snapshot),
                &baselines
            ),
            Ok(vec![3.0, 4.0])
        );
        assert_eq!(
            evaluate(
                &SeriesSource::Network {
                    iface: "eth0".to_string(),
                    stream: NetStream::Rx
                },
                Some(&snapshot),
                &baselines
            ),
            Ok(vec![7.0])
        );
    }

    #[test]
    fn pass_through_reports_missing_path() {
        let snapshot = RawSnapshot::builder().disk(IoMethod::Read, "sda", vec![1.0]).build();
        let source = SeriesSource::Disk {
            disk: "sda".to_string(),
            method: IoMethod::Write,
        };
        assert_eq!(
            evaluate(&source, Some(&snapshot), &Baselines::default()),
            Err(SeriesUnavailable::MissingKey("disk.write.sda.disk_ops".to_string()))
        );

        let source = SeriesSource::Network {
            iface: "eth9".to_string(),
            stream: NetStream::Tx,
        };
        assert!(evaluate(&source, Some(&snapshot), &Baselines::default()).is_err());
    }

    #[test]
    fn no_snapshot_is_unavailable_for_every_source() {
        for source in [SeriesSource::Cpu, SeriesSource::Memory, SeriesSource::Load] {
            assert_eq!(
                evaluate(&source, None, &Baselines::default()),
                Err(SeriesUnavailable::NoSnapshot)
            );
        }
    }
}
