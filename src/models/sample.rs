// Resource sample and per-session summary models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One timestamped CPU/RAM reading for a monitored container.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub timestamp: DateTime<Utc>,
    pub cpu_percent: f64,
    pub memory_bytes: u64,
}

/// Aggregate statistics over one monitoring session.
/// All-zero (via Default) when the session collected no samples.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceSummary {
    pub cpu_avg: f64,
    pub cpu_max: f64,
    pub mem_avg_bytes: f64,
    pub mem_max_bytes: u64,
    pub sample_count: u64,
}

impl ResourceSummary {
    /// Aggregate a finite sample sequence. Empty input yields all zeros.
    pub fn from_samples(samples: &[Sample]) -> Self {
        if samples.is_empty() {
            return Self::default();
        }
        let n = samples.len() as f64;
        let cpu_sum: f64 = samples.iter().map(|s| s.cpu_percent).sum();
        let cpu_max = samples
            .iter()
            .map(|s| s.cpu_percent)
            .fold(f64::MIN, f64::max);
        let mem_sum: f64 = samples.iter().map(|s| s.memory_bytes as f64).sum();
        let mem_max = samples.iter().map(|s| s.memory_bytes).max().unwrap_or(0);
        Self {
            cpu_avg: cpu_sum / n,
            cpu_max,
            mem_avg_bytes: mem_sum / n,
            mem_max_bytes: mem_max,
            sample_count: samples.len() as u64,
        }
    }
}
