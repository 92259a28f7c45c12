use super::{DiskUsage, NetCounters, Partition, ProbeError, Probes};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::net::Ipv4Addr;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Scripted probes. `None` makes the matching probe fail.
#[derive(Debug, Clone)]
pub struct FakeProbes {
    pub cpu: Option<f64>,
    pub cpu_delay: Duration,
    pub memory: Option<f64>,
    pub disks: BTreeMap<String, DiskUsage>,
    pub temperature: Option<f64>,
    pub fan: Option<u32>,
    pub network: Option<NetCounters>,
    pub uptime: Option<Duration>,
    pub interfaces: Option<BTreeMap<String, Ipv4Addr>>,
    pub partitions: Option<Vec<String>>,
    pub cpu_calls: Arc<AtomicUsize>,
}

impl FakeProbes {
    pub fn healthy() -> Self {
        let mut disks = BTreeMap::new();
        disks.insert(
            "/".to_string(),
            DiskUsage {
                total_bytes: 32 * 1024 * 1024 * 1024,
                used_percent: 41.0,
            },
        );
        disks.insert(
            "/boot".to_string(),
            DiskUsage {
                total_bytes: 512 * 1024 * 1024,
                used_percent: 10.0,
            },
        );
        let mut interfaces = BTreeMap::new();
        interfaces.insert("eth0".to_string(), Ipv4Addr::new(192, 168, 1, 20));
        interfaces.insert("lo".to_string(), Ipv4Addr::LOCALHOST);

        Self {
            cpu: Some(12.5),
            cpu_delay: Duration::ZERO,
            memory: Some(33.0),
            disks,
            temperature: Some(47.2),
            fan: Some(1800),
            network: Some(NetCounters {
                rx_bytes: 1000,
                tx_bytes: 2000,
            }),
            uptime: Some(Duration::from_secs(3723)),
            interfaces: Some(interfaces),
            partitions: Some(vec!["/".to_string(), "/boot".to_string()]),
            cpu_calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn broken() -> Self {
        Self {
            cpu: None,
            cpu_delay: Duration::ZERO,
            memory: None,
            disks: BTreeMap::new(),
            temperature: None,
            fan: None,
            network: None,
            uptime: None,
            interfaces: None,
            partitions: None,
            cpu_calls: Arc::new(AtomicUsize::new(0)),
        }
    }
}

fn unavailable(what: &str) -> ProbeError {
    ProbeError::NotFound(what.to_string())
}

#[async_trait]
impl Probes for FakeProbes {
    async fn cpu_usage(&mut self) -> Result<f64, ProbeError> {
        self.cpu_calls.fetch_add(1, Ordering::SeqCst);
        if !self.cpu_delay.is_zero() {
            tokio::time::sleep(self.cpu_delay).await;
        }
        self.cpu.ok_or_else(|| unavailable("cpu"))
    }

    fn memory_usage(&mut self) -> Result<f64, ProbeError> {
        self.memory.ok_or_else(|| unavailable("memory"))
    }

    fn disk_usage(&mut self, path: &Path) -> Result<DiskUsage, ProbeError> {
        let key = path.display().to_string();
        self.disks.get(&key).copied().ok_or(ProbeError::NotFound(key))
    }

    fn cpu_temperature(&mut self) -> Result<f64, ProbeError> {
        self.temperature.ok_or_else(|| unavailable("thermal zone"))
    }

    fn fan_rpm(&mut self) -> Result<u32, ProbeError> {
        self.fan.ok_or_else(|| unavailable("fan"))
    }

    fn network_counters(&mut self) -> Result<NetCounters, ProbeError> {
        self.network.ok_or_else(|| unavailable("network"))
    }

    fn uptime(&mut self) -> Result<Duration, ProbeError> {
        self.uptime.ok_or_else(|| unavailable("uptime"))
    }

    fn interface_addresses(&mut self) -> Result<BTreeMap<String, Ipv4Addr>, ProbeError> {
        self.interfaces.clone().ok_or_else(|| unavailable("interfaces"))
    }

    fn partitions(&mut self) -> Result<Vec<Partition>, ProbeError> {
        let mounts = self.partitions.clone().ok_or_else(|| unavailable("mounts"))?;
        Ok(mounts
            .into_iter()
            .map(|mountpoint| Partition {
                device: format!("/dev/fake{}", mountpoint.len()),
                mountpoint,
                fstype: "ext4".to_string(),
            })
            .collect())
    }
}
