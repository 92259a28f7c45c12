use super::{Partition, ProbeError};
use std::fs;
use std::path::{Path, PathBuf};

fn read_trimmed(path: &Path) -> Result<String, ProbeError> {
    fs::read_to_string(path)
        .map(|s| s.trim().to_string())
        .map_err(|source| ProbeError::Io {
            path: path.to_path_buf(),
            source,
        })
}

/// Thermal zone file holding millidegrees Celsius.
pub fn read_temperature(path: &Path) -> Result<f64, ProbeError> {
    let raw = read_trimmed(path)?;
    let millidegrees: f64 = raw.parse().map_err(|_| ProbeError::Parse {
        path: path.to_path_buf(),
        value: raw.clone(),
    })?;
    Ok(millidegrees / 1000.0)
}

/// First `hwmon*` directory under `hwmon_root`, by name, that exposes `fan_file`.
pub fn discover_fan_input(hwmon_root: &Path, fan_file: &str) -> Result<PathBuf, ProbeError> {
    let entries = fs::read_dir(hwmon_root).map_err(|source| ProbeError::Io {
        path: hwmon_root.to_path_buf(),
        source,
    })?;

    let mut candidates: Vec<PathBuf> = entries
        .flatten()
        .filter(|entry| {
            entry
                .file_name()
                .to_str()
                .is_some_and(|name| name.starts_with("hwmon"))
        })
        .map(|entry| entry.path().join(fan_file))
        .filter(|path| path.exists())
        .collect();
    candidates.sort();

    candidates
        .into_iter()
        .next()
        .ok_or_else(|| ProbeError::NotFound(format!("{}/hwmon*/{fan_file}", hwmon_root.display())))
}

pub fn read_fan_rpm(hwmon_root: &Path, fan_file: &str) -> Result<u32, ProbeError> {
    let path = discover_fan_input(hwmon_root, fan_file)?;
    let raw = read_trimmed(&path)?;
    raw.parse().map_err(|_| ProbeError::Parse { path, value: raw })
}

pub fn read_partitions(mounts: &Path, all: bool) -> Result<Vec<Partition>, ProbeError> {
    let text = fs::read_to_string(mounts).map_err(|source| ProbeError::Io {
        path: mounts.to_path_buf(),
        source,
    })?;
    Ok(parse_mount_table(&text, all))
}

/// Parses `/proc/mounts` style text. Without `all`, entries whose device is
/// not an absolute path (proc, tmpfs, cgroup...) are dropped.
pub fn parse_mount_table(text: &str, all: bool) -> Vec<Partition> {
    text.lines()
        .filter_map(|line| {
            let mut fields = line.split_whitespace();
            let device = unescape_octal(fields.next()?);
            let mountpoint = unescape_octal(fields.next()?);
            let fstype = fields.next()?.to_string();
            Some(Partition {
                device,
                mountpoint,
                fstype,
            })
        })
        .filter(|p| all || p.device.starts_with('/'))
        .collect()
}

// The kernel writes space, tab, newline and backslash as \ooo.
fn unescape_octal(field: &str) -> String {
    let bytes = field.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'\\' && i + 3 < bytes.len() && is_octal_triplet(&bytes[i + 1..i + 4]) {
            let digits = &bytes[i + 1..i + 4];
            out.push((digits[0] - b'0') * 64 + (digits[1] - b'0') * 8 + (digits[2] - b'0'));
            i += 4;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8_lossy(&out).into_owned()
}

fn is_octal_triplet(digits: &[u8]) -> bool {
    digits.len() == 3 && digits[0] <= b'3' && digits.iter().all(|d| (b'0'..=b'7').contains(d))
}
