// Reduce raw Docker stats API responses to CPU/RAM readings.

use bollard_stubs::models::ContainerStatsResponse;

/// Reduce a raw Docker stats response to `(cpu_percent, memory_bytes)`.
/// Returns None when the cpu/precpu blocks needed for the delta are missing.
/// CPU percent can exceed 100 on multi-core containers; callers must not clamp.
pub(crate) fn cpu_and_memory(s: &ContainerStatsResponse) -> Option<(f64, u64)> {
    let cpu_stats = s.cpu_stats.as_ref()?;
    let precpu_stats = s.precpu_stats.as_ref()?;

    let cpu_usage = cpu_stats.cpu_usage.as_ref()?;
    let precpu_usage = precpu_stats.cpu_usage.as_ref()?;

    let cpu_delta =
        cpu_usage.total_usage.unwrap_or(0) as i64 - precpu_usage.total_usage.unwrap_or(0) as i64;
    let system_delta = cpu_stats.system_cpu_usage.unwrap_or(0) as i64
        - precpu_stats.system_cpu_usage.unwrap_or(0) as i64;
    let online = cpu_stats.online_cpus.unwrap_or(1) as f64;
    let cpu_percent = if system_delta > 0 && online > 0.0 {
        (cpu_delta as f64 / system_delta as f64) * online * 100.0
    } else {
        0.0
    };

    let memory_bytes = s.memory_stats.as_ref().and_then(|m| m.usage).unwrap_or(0);

    Some((cpu_percent, memory_bytes))
}
