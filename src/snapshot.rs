use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::time::SystemTime;

/// Uptime text published when the uptime probe is unavailable.
pub const UPTIME_UNAVAILABLE: &str = "N/A";

/// One cycle's view of the host.
///
/// Every field has a fallback that the assembler substitutes when the probe
/// behind it fails. The fallbacks are listed on the fields below; a degraded
/// snapshot is still structurally complete.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Snapshot {
    /// Global CPU load over the sampling window. Fallback: 0.
    pub cpu_usage_percent: f64,
    /// Used / total memory. Fallback: 0.
    pub ram_usage_percent: f64,
    /// Usage of the filesystem holding the configured root path. Fallback: 0.
    pub disk_usage_percent: f64,
    /// Thermal zone reading. Fallback: 0, indistinguishable from a real 0.
    #[serde(rename = "cpu_temp_celsius")]
    pub cpu_temperature_celsius: f64,
    /// Cumulative bytes received over all interfaces. Fallback: 0.
    pub net_rx_bytes: u64,
    /// Cumulative bytes sent over all interfaces. Fallback: 0.
    pub net_tx_bytes: u64,
    /// MB/s since the previous sample. 0 on the first sample or a failed probe.
    #[serde(rename = "net_rx_speed")]
    pub net_rx_rate: f64,
    /// MB/s since the previous sample. 0 on the first sample or a failed probe.
    #[serde(rename = "net_tx_speed")]
    pub net_tx_rate: f64,
    /// Human readable uptime. Fallback: [`UPTIME_UNAVAILABLE`].
    pub uptime: String,
    /// When the cycle that produced this snapshot started. `None` only for
    /// the initial value published before the first cycle.
    #[serde(serialize_with = "serialize_rfc3339")]
    pub last_updated: Option<SystemTime>,
    /// First hwmon fan reading. Fallback: 0.
    pub fan_rpm: u32,
    /// Interface name to its first IPv4 address. Fallback: empty.
    pub network_ips: BTreeMap<String, String>,
    /// Mounts whose usage query answered. Fallback: empty.
    pub disk_mounts: Vec<DiskMount>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiskMount {
    pub mountpoint: String,
    #[serde(rename = "total_gb")]
    pub total_capacity_gb: f64,
    pub used_percent: f64,
}

fn serialize_rfc3339<S>(value: &Option<SystemTime>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match value {
        Some(at) => serializer.collect_str(&humantime::format_rfc3339_seconds(*at)),
        None => serializer.serialize_str(""),
    }
}

pub fn format_uptime(uptime: std::time::Duration) -> String {
    humantime::format_duration(std::time::Duration::from_secs(uptime.as_secs())).to_string()
}
