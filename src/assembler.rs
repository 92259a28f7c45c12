use crate::metrics::Metrics;
use crate::probes::{Probe, ProbeError, Probes};
use crate::rate::RateTracker;
use crate::snapshot::{format_uptime, DiskMount, Snapshot, UPTIME_UNAVAILABLE};
use crate::store::SnapshotStore;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;
use tokio::time::Instant;
use tracing::{debug, warn};

const BYTES_PER_GB: f64 = 1024.0 * 1024.0 * 1024.0;

/// Runs every probe once, derives rates and publishes one snapshot per call.
pub struct Assembler<P> {
    probes: P,
    rates: RateTracker,
    store: SnapshotStore,
    metrics: Arc<Metrics>,
    root_path: PathBuf,
}

impl<P: Probes> Assembler<P> {
    pub fn new(
        probes: P,
        rates: RateTracker,
        store: SnapshotStore,
        metrics: Arc<Metrics>,
        root_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            probes,
            rates,
            store,
            metrics,
            root_path: root_path.into(),
        }
    }

    #[cfg(test)]
    pub fn probes_mut(&mut self) -> &mut P {
        &mut self.probes
    }

    /// One collection cycle. Probe failures degrade single fields and never
    /// abort the cycle.
    pub async fn run_cycle(&mut self) -> Arc<Snapshot> {
        let started = Instant::now();
        let wall_clock = SystemTime::now();

        let cpu = self.probes.cpu_usage().await;
        let cpu_usage_percent = self.settle(Probe::Cpu, cpu).unwrap_or(0.0);

        let memory = self.probes.memory_usage();
        let ram_usage_percent = self.settle(Probe::Memory, memory).unwrap_or(0.0);

        let root = self.probes.disk_usage(&self.root_path);
        let disk_usage_percent = self
            .settle(Probe::Disk, root)
            .map(|usage| usage.used_percent)
            .unwrap_or(0.0);

        let temperature = self.probes.cpu_temperature();
        let cpu_temperature_celsius = self.settle(Probe::Temperature, temperature).unwrap_or(0.0);

        let network = self.probes.network_counters();
        let (counters, throughput) = match self.settle(Probe::Network, network) {
            Some(counters) => {
                let rate = self
                    .rates
                    .compute_rate(counters.rx_bytes, counters.tx_bytes, started);
                (counters, rate)
            }
            None => (Default::default(), self.rates.record_failure(started)),
        };

        let uptime = self.probes.uptime();
        let uptime = self
            .settle(Probe::Uptime, uptime)
            .map(format_uptime)
            .unwrap_or_else(|| UPTIME_UNAVAILABLE.to_string());

        let fan = self.probes.fan_rpm();
        let fan_rpm = self.settle(Probe::Fan, fan).unwrap_or(0);

        let interfaces = self.probes.interface_addresses();
        let network_ips = self
            .settle(Probe::Interfaces, interfaces)
            .unwrap_or_default()
            .into_iter()
            .map(|(name, addr)| (name, addr.to_string()))
            .collect();

        let disk_mounts = self.collect_mounts();

        let snapshot = Snapshot {
            cpu_usage_percent,
            ram_usage_percent,
            disk_usage_percent,
            cpu_temperature_celsius,
            net_rx_bytes: counters.rx_bytes,
            net_tx_bytes: counters.tx_bytes,
            net_rx_rate: throughput.rx_mb_per_sec,
            net_tx_rate: throughput.tx_mb_per_sec,
            uptime,
            last_updated: Some(wall_clock),
            fan_rpm,
            network_ips,
            disk_mounts,
        };

        let published = self.store.write(snapshot).await;
        let took = started.elapsed();
        self.metrics.record_cycle(&published, took);
        debug!(took_ms = took.as_millis() as u64, "system stats updated");
        published
    }

    fn collect_mounts(&mut self) -> Vec<DiskMount> {
        let partitions = self.probes.partitions();
        let Some(partitions) = self.settle(Probe::Partitions, partitions) else {
            return Vec::new();
        };

        let mut mounts = Vec::with_capacity(partitions.len());
        for partition in partitions {
            match self.probes.disk_usage(Path::new(&partition.mountpoint)) {
                Ok(usage) => mounts.push(DiskMount {
                    mountpoint: partition.mountpoint,
                    total_capacity_gb: usage.total_bytes as f64 / BYTES_PER_GB,
                    used_percent: usage.used_percent,
                }),
                Err(err) => {
                    debug!(
                        mountpoint = %partition.mountpoint,
                        fstype = %partition.fstype,
                        error = %err,
                        "skipping mount"
                    );
                }
            }
        }
        mounts
    }

    fn settle<T>(&self, probe: Probe, result: Result<T, ProbeError>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(err) => {
                warn!(probe = %probe, error = %err, "probe unavailable, using fallback");
                self.metrics.inc_probe_failure(probe.as_str());
                None
            }
        }
    }
}
