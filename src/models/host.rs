// Host identity captured once per suite report

use serde::{Deserialize, Serialize};
use sysinfo::System;

/// Static host identity recorded in the combined suite report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostInfo {
    pub os: String,
    pub os_version: String,
    pub kernel_version: Option<String>,
    pub cpu_model: String,
    pub physical_cores: u32,
    pub logical_cores: u32,
    pub total_memory_bytes: u64,
    pub hostname: String,
}

impl HostInfo {
    pub fn collect() -> Self {
        let mut sys = System::new_all();
        sys.refresh_all();
        Self {
            os: System::name().unwrap_or_default(),
            os_version: System::os_version().unwrap_or_default(),
            kernel_version: System::kernel_version(),
            cpu_model: sys
                .cpus()
                .first()
                .map(|cpu| cpu.brand().to_string())
                .unwrap_or_default(),
            physical_cores: System::physical_core_count().unwrap_or(0) as u32,
            logical_cores: sys.cpus().len() as u32,
            total_memory_bytes: sys.total_memory(),
            hostname: System::host_name().unwrap_or_default(),
        }
    }
}
