// Shared test helpers: scripted stats sources
#![allow(dead_code)] // each test binary uses a different subset

use std::collections::VecDeque;
use std::future::Future;
use std::sync::Mutex;

use docbench::monitor::StatsSource;

/// Returns scripted readings in order; errors once the script is exhausted.
/// The `start()` probe consumes one reading, so scripts usually lead with a
/// throwaway value (see `with_probe`).
pub struct ScriptedSource {
    values: Mutex<VecDeque<(f64, u64)>>,
}

impl ScriptedSource {
    pub fn new(values: impl IntoIterator<Item = (f64, u64)>) -> Self {
        Self {
            values: Mutex::new(values.into_iter().collect()),
        }
    }

    /// Script with a throwaway probe reading prepended.
    pub fn with_probe(values: impl IntoIterator<Item = (f64, u64)>) -> Self {
        let mut all = VecDeque::from([(0.0, 0)]);
        all.extend(values);
        Self {
            values: Mutex::new(all),
        }
    }
}

impl StatsSource for ScriptedSource {
    fn sample(&self, _container: &str) -> impl Future<Output = anyhow::Result<(f64, u64)>> + Send {
        let next = self.values.lock().unwrap().pop_front();
        async move { next.ok_or_else(|| anyhow::anyhow!("script exhausted")) }
    }
}

/// Always returns the same reading.
pub struct ConstSource {
    cpu_percent: f64,
    memory_bytes: u64,
}

impl ConstSource {
    pub fn new(cpu_percent: f64, memory_bytes: u64) -> Self {
        Self {
            cpu_percent,
            memory_bytes,
        }
    }
}

impl StatsSource for ConstSource {
    fn sample(&self, _container: &str) -> impl Future<Output = anyhow::Result<(f64, u64)>> + Send {
        let reading = (self.cpu_percent, self.memory_bytes);
        async move { Ok(reading) }
    }
}

/// Always unreachable.
pub struct FailingSource;

impl StatsSource for FailingSource {
    fn sample(&self, container: &str) -> impl Future<Output = anyhow::Result<(f64, u64)>> + Send {
        let container = container.to_string();
        async move { Err(anyhow::anyhow!("no stats backend for {container}")) }
    }
}
