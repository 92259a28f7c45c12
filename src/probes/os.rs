use super::{DiskUsage, ProbeError};
use std::collections::BTreeMap;
use std::net::Ipv4Addr;
use std::path::Path;

/// Filesystem usage for the filesystem holding `path`.
#[cfg(unix)]
pub fn disk_usage(path: &Path) -> Result<DiskUsage, ProbeError> {
    use std::ffi::CString;
    use std::mem::MaybeUninit;
    use std::os::unix::ffi::OsStrExt;

    let c_path = CString::new(path.as_os_str().as_bytes()).map_err(|_| ProbeError::Parse {
        path: path.to_path_buf(),
        value: path.display().to_string(),
    })?;
    let mut stat = MaybeUninit::<libc::statvfs>::uninit();
    let result = unsafe { libc::statvfs(c_path.as_ptr(), stat.as_mut_ptr()) };
    if result != 0 {
        return Err(ProbeError::Os {
            call: "statvfs",
            source: std::io::Error::last_os_error(),
        });
    }
    let stat = unsafe { stat.assume_init() };

    let block_size = stat.f_frsize as u64;
    let total = stat.f_blocks as u64 * block_size;
    let free = stat.f_bfree as u64 * block_size;
    let available = stat.f_bavail as u64 * block_size;
    let used = total.saturating_sub(free);

    Ok(DiskUsage {
        total_bytes: total,
        used_percent: used_percent(used, available),
    })
}

#[cfg(not(unix))]
pub fn disk_usage(_path: &Path) -> Result<DiskUsage, ProbeError> {
    Err(ProbeError::Unsupported("statvfs"))
}

// Space reserved for root counts as neither used nor available.
fn used_percent(used: u64, available: u64) -> f64 {
    let denominator = used + available;
    if denominator == 0 {
        0.0
    } else {
        used as f64 / denominator as f64 * 100.0
    }
}

/// First IPv4 address of every interface that has one.
#[cfg(unix)]
pub fn interface_addresses() -> Result<BTreeMap<String, Ipv4Addr>, ProbeError> {
    use std::ffi::CStr;

    let mut head: *mut libc::ifaddrs = std::ptr::null_mut();
    if unsafe { libc::getifaddrs(&mut head) } != 0 {
        return Err(ProbeError::Os {
            call: "getifaddrs",
            source: std::io::Error::last_os_error(),
        });
    }

    let mut out = BTreeMap::new();
    let mut cursor = head;
    while !cursor.is_null() {
        let entry = unsafe { &*cursor };
        cursor = entry.ifa_next;

        if entry.ifa_addr.is_null() || entry.ifa_name.is_null() {
            continue;
        }
        let family = unsafe { (*entry.ifa_addr).sa_family } as i32;
        if family != libc::AF_INET {
            continue;
        }
        let sin = unsafe { &*(entry.ifa_addr as *const libc::sockaddr_in) };
        let addr = Ipv4Addr::from(u32::from_be(sin.sin_addr.s_addr));
        let name = unsafe { CStr::from_ptr(entry.ifa_name) }
            .to_string_lossy()
            .into_owned();
        out.entry(name).or_insert(addr);
    }

    unsafe { libc::freeifaddrs(head) };
    Ok(out)
}

#[cfg(not(unix))]
pub fn interface_addresses() -> Result<BTreeMap<String, Ipv4Addr>, ProbeError> {
    Err(ProbeError::Unsupported("getifaddrs"))
}
