use crate::rate::NetworkFailurePolicy;
use serde::{Deserialize, Serialize};
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default = "default_listen")]
    pub listen: String,
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
    #[serde(default)]
    pub collector: CollectorConfig,
    #[serde(default)]
    pub sensors: SensorsConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CollectorConfig {
    #[serde(default = "default_cpu_sample_ms")]
    pub cpu_sample_ms: u64,
    #[serde(default = "default_root_path")]
    pub root_path: PathBuf,
    #[serde(default = "default_all_partitions")]
    pub all_partitions: bool,
    #[serde(default)]
    pub on_network_failure: NetworkFailurePolicy,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SensorsConfig {
    #[serde(default = "default_thermal_path")]
    pub thermal_path: PathBuf,
    #[serde(default = "default_hwmon_dir")]
    pub hwmon_dir: PathBuf,
    #[serde(default = "default_fan_input")]
    pub fan_input: String,
    #[serde(default = "default_mounts_path")]
    pub mounts_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            interval_secs: default_interval_secs(),
            collector: CollectorConfig::default(),
            sensors: SensorsConfig::default(),
        }
    }
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            cpu_sample_ms: default_cpu_sample_ms(),
            root_path: default_root_path(),
            all_partitions: default_all_partitions(),
            on_network_failure: NetworkFailurePolicy::default(),
        }
    }
}

impl Default for SensorsConfig {
    fn default() -> Self {
        Self {
            thermal_path: default_thermal_path(),
            hwmon_dir: default_hwmon_dir(),
            fan_input: default_fan_input(),
            mounts_path: default_mounts_path(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to parse YAML in {path}: {source}")]
    Parse {
        path: String,
        source: serde_yaml::Error,
    },
    #[error("invalid configuration: {0}")]
    Validation(String),
}

impl Config {
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path_ref = path.as_ref();
        let path_display = path_ref.display().to_string();
        let text = fs::read_to_string(path_ref).map_err(|source| ConfigError::Read {
            path: path_display.clone(),
            source,
        })?;

        let cfg: Config = serde_yaml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path_display,
            source,
        })?;

        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.listen.trim().is_empty() {
            return Err(ConfigError::Validation("listen is required".to_string()));
        }
        if SocketAddr::from_str(&self.listen).is_err() {
            return Err(ConfigError::Validation(
                "listen must be a host:port socket address".to_string(),
            ));
        }
        if self.interval_secs < 1 {
            return Err(ConfigError::Validation(
                "interval_secs must be >= 1".to_string(),
            ));
        }
        if self.collector.cpu_sample_ms == 0 {
            return Err(ConfigError::Validation(
                "collector.cpu_sample_ms must be > 0".to_string(),
            ));
        }
        if self.collector.root_path.as_os_str().is_empty() {
            return Err(ConfigError::Validation(
                "collector.root_path must not be empty".to_string(),
            ));
        }
        if self.sensors.fan_input.trim().is_empty() || self.sensors.fan_input.contains('/') {
            return Err(ConfigError::Validation(
                "sensors.fan_input must be a bare file name".to_string(),
            ));
        }

        Ok(())
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn cpu_sample_window(&self) -> Duration {
        Duration::from_millis(self.collector.cpu_sample_ms)
    }

    pub fn example_yaml() -> &'static str {
        include_str!("../config.yaml.example")
    }
}

fn default_listen() -> String {
    "0.0.0.0:7000".to_string()
}

const fn default_interval_secs() -> u64 {
    1
}

const fn default_cpu_sample_ms() -> u64 {
    1000
}

fn default_root_path() -> PathBuf {
    PathBuf::from("/")
}

const fn default_all_partitions() -> bool {
    true
}

fn default_thermal_path() -> PathBuf {
    PathBuf::from("/sys/class/thermal/thermal_zone0/temp")
}

fn default_hwmon_dir() -> PathBuf {
    PathBuf::from("/sys/class/hwmon")
}

fn default_fan_input() -> String {
    "fan1_input".to_string()
}

fn default_mounts_path() -> PathBuf {
    PathBuf::from("/proc/mounts")
}
