//! HIP device enumeration.

use crate::error::Result;
use crate::runtime::Runtime;
use tracing::{info, warn};

/// Information about a discovered AMD GPU.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RocmDeviceInfo {
    pub index: usize,
    pub name: String,
    pub total_memory_mib: usize,
}

/// Enumerate the AMD GPUs visible through `runtime`.
///
/// A runtime that reports zero devices yields an empty list, not an error.
pub fn enumerate_devices(runtime: &Runtime) -> Result<Vec<RocmDeviceInfo>> {
    let count = runtime.device_count()?;
    if count == 0 {
        warn!("HIP runtime present but no AMD GPU devices found");
        return Ok(vec![]);
    }

    let mut devices = Vec::with_capacity(count);
    for index in 0..count {
        let info = RocmDeviceInfo {
            index,
            name: runtime.device_name(index)?,
            total_memory_mib: runtime.device_total_memory(index)? >> 20,
        };
        info!(index, name = %info.name, memory_mib = info.total_memory_mib, "discovered AMD GPU");
        devices.push(info);
    }

    Ok(devices)
}
