use crate::snapshot::Snapshot;
use prometheus::core::Collector;
use prometheus::{opts, Counter, CounterVec, Encoder, Gauge, Registry, TextEncoder};
use std::sync::Arc;
use std::time::{Duration, UNIX_EPOCH};

#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    pub hoststat_cycles_total: Counter,
    pub hoststat_probe_failures_total: CounterVec,
    pub hoststat_cycle_duration_seconds: Gauge,
    pub hoststat_last_cycle_timestamp_seconds: Gauge,
    pub hoststat_stats_requests_total: Counter,
    pub hoststat_scrape_count_total: Counter,
    pub hoststat_cpu_usage_percent: Gauge,
    pub hoststat_ram_usage_percent: Gauge,
    pub hoststat_disk_usage_percent: Gauge,
    pub hoststat_cpu_temp_celsius: Gauge,
    pub hoststat_fan_rpm: Gauge,
    pub hoststat_net_rx_megabytes_per_sec: Gauge,
    pub hoststat_net_tx_megabytes_per_sec: Gauge,
}

impl Metrics {
    pub fn new() -> Result<Arc<Self>, prometheus::Error> {
        let registry = Registry::new();

        let hoststat_cycles_total = Counter::with_opts(opts!(
            "hoststat_cycles_total",
            "Completed collection cycles"
        ))?;
        let hoststat_probe_failures_total = CounterVec::new(
            opts!(
                "hoststat_probe_failures_total",
                "Probe failures replaced by a fallback value, by probe"
            ),
            &["probe"],
        )?;
        let hoststat_cycle_duration_seconds = Gauge::with_opts(opts!(
            "hoststat_cycle_duration_seconds",
            "Wall time of the last collection cycle"
        ))?;
        let hoststat_last_cycle_timestamp_seconds = Gauge::with_opts(opts!(
            "hoststat_last_cycle_timestamp_seconds",
            "Unix time at which the current snapshot was assembled"
        ))?;
        let hoststat_stats_requests_total = Counter::with_opts(opts!(
            "hoststat_stats_requests_total",
            "Snapshot reads served over HTTP"
        ))?;
        let hoststat_scrape_count_total = Counter::with_opts(opts!(
            "hoststat_scrape_count_total",
            "Scrapes of the /metrics endpoint"
        ))?;
        let hoststat_cpu_usage_percent = Gauge::with_opts(opts!(
            "hoststat_cpu_usage_percent",
            "Global CPU usage in percent (0..100)"
        ))?;
        let hoststat_ram_usage_percent =
            Gauge::with_opts(opts!("hoststat_ram_usage_percent", "RAM usage in percent"))?;
        let hoststat_disk_usage_percent = Gauge::with_opts(opts!(
            "hoststat_disk_usage_percent",
            "Usage of the root filesystem in percent"
        ))?;
        let hoststat_cpu_temp_celsius = Gauge::with_opts(opts!(
            "hoststat_cpu_temp_celsius",
            "CPU thermal zone temperature in Celsius, 0 when unavailable"
        ))?;
        let hoststat_fan_rpm =
            Gauge::with_opts(opts!("hoststat_fan_rpm", "Fan speed, 0 when unavailable"))?;
        let hoststat_net_rx_megabytes_per_sec = Gauge::with_opts(opts!(
            "hoststat_net_rx_megabytes_per_sec",
            "Receive throughput over all interfaces"
        ))?;
        let hoststat_net_tx_megabytes_per_sec = Gauge::with_opts(opts!(
            "hoststat_net_tx_megabytes_per_sec",
            "Transmit throughput over all interfaces"
        ))?;

        register(&registry, &hoststat_cycles_total)?;
        register(&registry, &hoststat_probe_failures_total)?;
        register(&registry, &hoststat_cycle_duration_seconds)?;
        register(&registry, &hoststat_last_cycle_timestamp_seconds)?;
        register(&registry, &hoststat_stats_requests_total)?;
        register(&registry, &hoststat_scrape_count_total)?;
        register(&registry, &hoststat_cpu_usage_percent)?;
        register(&registry, &hoststat_ram_usage_percent)?;
        register(&registry, &hoststat_disk_usage_percent)?;
        register(&registry, &hoststat_cpu_temp_celsius)?;
        register(&registry, &hoststat_fan_rpm)?;
        register(&registry, &hoststat_net_rx_megabytes_per_sec)?;
        register(&registry, &hoststat_net_tx_megabytes_per_sec)?;

        Ok(Arc::new(Self {
            registry,
            hoststat_cycles_total,
            hoststat_probe_failures_total,
            hoststat_cycle_duration_seconds,
            hoststat_last_cycle_timestamp_seconds,
            hoststat_stats_requests_total,
            hoststat_scrape_count_total,
            hoststat_cpu_usage_percent,
            hoststat_ram_usage_percent,
            hoststat_disk_usage_percent,
            hoststat_cpu_temp_celsius,
            hoststat_fan_rpm,
            hoststat_net_rx_megabytes_per_sec,
            hoststat_net_tx_megabytes_per_sec,
        }))
    }

    pub fn record_cycle(&self, snapshot: &Snapshot, took: Duration) {
        self.hoststat_cycles_total.inc();
        self.hoststat_cycle_duration_seconds.set(took.as_secs_f64());
        if let Some(at) = snapshot.last_updated {
            let unix = at
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_secs_f64())
                .unwrap_or(0.0);
            self.hoststat_last_cycle_timestamp_seconds.set(unix);
        }

        self.hoststat_cpu_usage_percent
            .set(snapshot.cpu_usage_percent);
        self.hoststat_ram_usage_percent
            .set(snapshot.ram_usage_percent);
        self.hoststat_disk_usage_percent
            .set(snapshot.disk_usage_percent);
        self.hoststat_cpu_temp_celsius
            .set(snapshot.cpu_temperature_celsius);
        self.hoststat_fan_rpm.set(snapshot.fan_rpm as f64);
        self.hoststat_net_rx_megabytes_per_sec
            .set(snapshot.net_rx_rate);
        self.hoststat_net_tx_megabytes_per_sec
            .set(snapshot.net_tx_rate);
    }

    pub fn inc_probe_failure(&self, probe: &str) {
        self.hoststat_probe_failures_total
            .with_label_values(&[probe])
            .inc();
    }

    pub fn inc_stats_request(&self) {
        self.hoststat_stats_requests_total.inc();
    }

    pub fn inc_scrape_count(&self) {
        self.hoststat_scrape_count_total.inc();
    }

    pub fn encode_metrics(&self) -> Result<Vec<u8>, prometheus::Error> {
        let mut buf = Vec::new();
        let encoder = TextEncoder::new();
        let mf = self.registry.gather();
        encoder.encode(&mf, &mut buf)?;
        Ok(buf)
    }
}

fn register<T: Collector + Clone + 'static>(
    registry: &Registry,
    collector: &T,
) -> Result<(), prometheus::Error> {
    registry.register(Box::new(collector.clone()))
}
