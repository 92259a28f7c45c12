pub mod os;
pub mod sysfs;
pub mod system;

#[cfg(test)]
pub mod fake;

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::fmt;
use std::net::Ipv4Addr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Why a single metric domain produced no value this cycle.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("unexpected contents in {path}: {value:?}")]
    Parse { path: PathBuf, value: String },
    #[error("{0} not found")]
    NotFound(String),
    #[error("{call} failed: {source}")]
    Os {
        call: &'static str,
        source: std::io::Error,
    },
    #[error("{0} is not supported on this platform")]
    Unsupported(&'static str),
}

/// Metric domains, used as the `probe` label in logs and self-metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Probe {
    Cpu,
    Memory,
    Disk,
    Temperature,
    Network,
    Uptime,
    Fan,
    Interfaces,
    Partitions,
}

impl Probe {
    pub fn as_str(self) -> &'static str {
        match self {
            Probe::Cpu => "cpu",
            Probe::Memory => "memory",
            Probe::Disk => "disk",
            Probe::Temperature => "temperature",
            Probe::Network => "network",
            Probe::Uptime => "uptime",
            Probe::Fan => "fan",
            Probe::Interfaces => "interfaces",
            Probe::Partitions => "partitions",
        }
    }
}

impl fmt::Display for Probe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DiskUsage {
    pub total_bytes: u64,
    pub used_percent: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NetCounters {
    pub rx_bytes: u64,
    pub tx_bytes: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Partition {
    pub device: String,
    pub mountpoint: String,
    pub fstype: String,
}

/// One query per metric domain against the host.
///
/// Implementations keep no state that another probe depends on; each call
/// either answers or fails on its own.
#[async_trait]
pub trait Probes: Send {
    /// Global CPU load, observed over a sampling window.
    async fn cpu_usage(&mut self) -> Result<f64, ProbeError>;
    fn memory_usage(&mut self) -> Result<f64, ProbeError>;
    fn disk_usage(&mut self, path: &Path) -> Result<DiskUsage, ProbeError>;
    fn cpu_temperature(&mut self) -> Result<f64, ProbeError>;
    fn fan_rpm(&mut self) -> Result<u32, ProbeError>;
    fn network_counters(&mut self) -> Result<NetCounters, ProbeError>;
    fn uptime(&mut self) -> Result<Duration, ProbeError>;
    fn interface_addresses(&mut self) -> Result<BTreeMap<String, Ipv4Addr>, ProbeError>;
    fn partitions(&mut self) -> Result<Vec<Partition>, ProbeError>;
}
