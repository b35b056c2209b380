use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct BenchConfig {
    pub monitor: MonitorConfig,
    pub report: ReportConfig,
    #[serde(default)]
    pub workload: WorkloadConfig,
    pub databases: Vec<DatabaseConfig>,
    pub datasets: Vec<DatasetConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MonitorConfig {
    #[serde(default = "default_sample_interval_ms")]
    pub sample_interval_ms: u64,
    /// How long `stop()` waits for the sampling task before abandoning it.
    #[serde(default = "default_stop_grace_ms")]
    pub stop_grace_ms: u64,
}

fn default_sample_interval_ms() -> u64 {
    1000
}

fn default_stop_grace_ms() -> u64 {
    2000
}

impl MonitorConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.sample_interval_ms)
    }

    pub fn stop_grace(&self) -> Duration {
        Duration::from_millis(self.stop_grace_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReportConfig {
    pub output_dir: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WorkloadConfig {
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Upper bound on documents flagged by the update step.
    #[serde(default = "default_update_limit")]
    pub update_limit: u64,
}

impl Default for WorkloadConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            update_limit: default_update_limit(),
        }
    }
}

fn default_batch_size() -> usize {
    10_000
}

fn default_update_limit() -> u64 {
    10_000
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub name: String,
    pub kind: BackendKind,
    /// Docker container sampled while this database's operations run.
    pub container: String,
}

/// Backend registry key; selects the implementation at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    Memory,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatasetConfig {
    pub label: String,
    pub file: PathBuf,
    pub collection: String,
}

impl BenchConfig {
    pub fn load() -> anyhow::Result<Self> {
        let path = std::env::var("CONFIG_FILE").unwrap_or_else(|_| "config.toml".into());
        let s = std::fs::read_to_string(&path)?;
        Self::load_from_str(&s)
    }

    /// Parse and validate config from a string (e.g. for tests).
    pub fn load_from_str(s: &str) -> anyhow::Result<Self> {
        let config: BenchConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.monitor.sample_interval_ms > 0,
            "monitor.sample_interval_ms must be > 0, got {}",
            self.monitor.sample_interval_ms
        );
        anyhow::ensure!(
            !self.report.output_dir.as_os_str().is_empty(),
            "report.output_dir must be non-empty"
        );
        anyhow::ensure!(
            self.workload.batch_size > 0,
            "workload.batch_size must be > 0, got {}",
            self.workload.batch_size
        );
        anyhow::ensure!(
            self.workload.update_limit > 0,
            "workload.update_limit must be > 0, got {}",
            self.workload.update_limit
        );
        anyhow::ensure!(
            !self.databases.is_empty(),
            "at least one [[databases]] entry is required"
        );
        anyhow::ensure!(
            !self.datasets.is_empty(),
            "at least one [[datasets]] entry is required"
        );
        for db in &self.databases {
            anyhow::ensure!(!db.name.is_empty(), "databases.name must be non-empty");
            anyhow::ensure!(
                !db.container.is_empty(),
                "databases.container must be non-empty for {}",
                db.name
            );
        }
        for ds in &self.datasets {
            anyhow::ensure!(!ds.label.is_empty(), "datasets.label must be non-empty");
            anyhow::ensure!(
                !ds.collection.is_empty(),
                "datasets.collection must be non-empty for {}",
                ds.label
            );
        }
        Ok(())
    }
}
