use super::{os, sysfs, DiskUsage, NetCounters, Partition, ProbeError, Probes};
use crate::config::SensorsConfig;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::net::Ipv4Addr;
use std::path::Path;
use std::time::Duration;
use sysinfo::{CpuExt, NetworkExt, NetworksExt, System, SystemExt};

/// Host probes backed by sysinfo, sysfs and libc.
pub struct SystemProbes {
    system: System,
    sensors: SensorsConfig,
    cpu_window: Duration,
    all_partitions: bool,
}

impl SystemProbes {
    pub fn new(sensors: SensorsConfig, cpu_window: Duration, all_partitions: bool) -> Self {
        Self {
            system: System::new(),
            sensors,
            cpu_window,
            all_partitions,
        }
    }
}

#[async_trait]
impl Probes for SystemProbes {
    async fn cpu_usage(&mut self) -> Result<f64, ProbeError> {
        self.system.refresh_cpu();
        tokio::time::sleep(self.cpu_window).await;
        self.system.refresh_cpu();
        if self.system.cpus().is_empty() {
            return Err(ProbeError::NotFound("cpu".to_string()));
        }
        Ok(self.system.global_cpu_info().cpu_usage() as f64)
    }

    fn memory_usage(&mut self) -> Result<f64, ProbeError> {
        self.system.refresh_memory();
        let total = self.system.total_memory();
        if total == 0 {
            return Err(ProbeError::NotFound("memory totals".to_string()));
        }
        Ok(self.system.used_memory() as f64 / total as f64 * 100.0)
    }

    fn disk_usage(&mut self, path: &Path) -> Result<DiskUsage, ProbeError> {
        os::disk_usage(path)
    }

    fn cpu_temperature(&mut self) -> Result<f64, ProbeError> {
        sysfs::read_temperature(&self.sensors.thermal_path)
    }

    fn fan_rpm(&mut self) -> Result<u32, ProbeError> {
        sysfs::read_fan_rpm(&self.sensors.hwmon_dir, &self.sensors.fan_input)
    }

    fn network_counters(&mut self) -> Result<NetCounters, ProbeError> {
        self.system.refresh_networks_list();
        self.system.refresh_networks();
        let networks = self.system.networks();
        if networks.iter().next().is_none() {
            return Err(ProbeError::NotFound("network interfaces".to_string()));
        }
        Ok(networks
            .iter()
            .fold(NetCounters::default(), |acc, (_, data)| NetCounters {
                rx_bytes: acc.rx_bytes.saturating_add(data.total_received()),
                tx_bytes: acc.tx_bytes.saturating_add(data.total_transmitted()),
            }))
    }

    fn uptime(&mut self) -> Result<Duration, ProbeError> {
        Ok(Duration::from_secs(self.system.uptime()))
    }

    fn interface_addresses(&mut self) -> Result<BTreeMap<String, Ipv4Addr>, ProbeError> {
        os::interface_addresses()
    }

    fn partitions(&mut self) -> Result<Vec<Partition>, ProbeError> {
        sysfs::read_partitions(&self.sensors.mounts_path, self.all_partitions)
    }
}
