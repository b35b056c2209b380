use anyhow::Result;
use docbench::*;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::FormatTime;

struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(
            w,
            "{}",
            chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z")
        )
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_timer(LocalTimer)
        .with_env_filter(filter)
        .init();

    let config = config::BenchConfig::load()?;
    let docker_repo = Arc::new(docker_repo::DockerRepo::connect()?);
    let sink = report::ReportSink::new(&config.report.output_dir)?;
    let options = measure::MeasureOptions {
        interval: config.monitor.interval(),
        stop_grace: config.monitor.stop_grace(),
    };
    let runner = runner::BenchmarkRunner::new(
        docker_repo,
        options,
        config.workload.clone(),
        sink.clone(),
    );

    let mut all_runs = Vec::new();
    for db in &config.databases {
        let result = match db.kind {
            config::BackendKind::Memory => {
                let mut backend = backends::MemoryBackend::new(
                    &db.name,
                    &db.container,
                    &config.report.output_dir,
                );
                runner.run_database(&mut backend, &config.datasets).await
            }
        };
        match result {
            Ok(mut runs) => all_runs.append(&mut runs),
            Err(e) => {
                tracing::error!(error = %e, database = %db.name, "benchmark failed; continuing with next database");
            }
        }
    }

    if all_runs.is_empty() {
        tracing::warn!("no runs completed; skipping suite reports");
        return Ok(());
    }

    let host = models::HostInfo::collect();
    let paths = sink.save_suite(&all_runs, &host)?;
    tracing::info!(
        comparative = %paths.csv.display(),
        combined = %paths.json.display(),
        "suite reports written"
    );

    for run in &all_runs {
        for r in &run.results {
            tracing::info!(
                database = %run.database_name,
                operation = %r.operation_name,
                duration_seconds = r.duration_seconds,
                cpu_avg = r.resource_summary.cpu_avg,
                mem_avg_bytes = r.resource_summary.mem_avg_bytes,
                "result"
            );
        }
        if let Some(error) = &run.error {
            tracing::warn!(
                database = %run.database_name,
                dataset = %run.dataset_name,
                error = %error,
                "run aborted"
            );
        }
    }

    Ok(())
}
