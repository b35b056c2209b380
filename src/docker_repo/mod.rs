// Docker container stats via bollard

mod stats;

use std::future::Future;

use anyhow::Context;
use bollard::Docker;
use bollard::query_parameters::StatsOptions;
use futures_util::StreamExt;

use crate::monitor::StatsSource;

pub struct DockerRepo {
    docker: Docker,
}

impl DockerRepo {
    pub fn connect() -> anyhow::Result<Self> {
        let docker = Docker::connect_with_unix_defaults()?;
        Ok(Self { docker })
    }

    /// One-shot CPU percent and memory usage for a container, by name or id.
    /// The daemon needs two internal samples to fill the precpu block, so a
    /// single query takes on the order of a second.
    pub async fn container_stats(&self, container: &str) -> anyhow::Result<(f64, u64)> {
        let options = StatsOptions {
            stream: false,
            ..Default::default()
        };
        let mut stream = self.docker.stats(container, Some(options));
        let response = stream
            .next()
            .await
            .with_context(|| format!("no stats returned for container {container}"))?
            .with_context(|| format!("stats query for container {container} failed"))?;
        stats::cpu_and_memory(&response).with_context(|| {
            format!("stats response for container {container} is missing cpu data")
        })
    }
}

impl StatsSource for DockerRepo {
    fn sample(&self, container: &str) -> impl Future<Output = anyhow::Result<(f64, u64)>> + Send {
        self.container_stats(container)
    }
}
