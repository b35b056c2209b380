// Benchmark lifecycle orchestrator: drives one backend through
// import -> read -> update -> delete -> export per dataset, measuring each
// step and persisting the run even when a step aborts it.

use std::sync::Arc;

use anyhow::Context;

use crate::backends::DatabaseBackend;
use crate::config::{DatasetConfig, WorkloadConfig};
use crate::measure::{MeasureOptions, OperationFailed, measure_operation};
use crate::models::{BenchmarkRun, Extra};
use crate::monitor::StatsSource;
use crate::report::ReportSink;

pub struct BenchmarkRunner<S> {
    source: Arc<S>,
    options: MeasureOptions,
    workload: WorkloadConfig,
    sink: ReportSink,
}

impl<S: StatsSource> BenchmarkRunner<S> {
    pub fn new(
        source: Arc<S>,
        options: MeasureOptions,
        workload: WorkloadConfig,
        sink: ReportSink,
    ) -> Self {
        Self {
            source,
            options,
            workload,
            sink,
        }
    }

    /// Run the full lifecycle for every dataset against one backend.
    /// A failing step aborts only its database/dataset pair: the partial run
    /// is finalized, persisted, and returned, and the next dataset proceeds.
    pub async fn run_database<B: DatabaseBackend>(
        &self,
        backend: &mut B,
        datasets: &[DatasetConfig],
    ) -> anyhow::Result<Vec<BenchmarkRun>> {
        tracing::info!(database = %backend.name(), "starting benchmark");
        backend
            .connect()
            .await
            .with_context(|| format!("connect to {}", backend.name()))?;

        let mut runs = Vec::with_capacity(datasets.len());
        let mut failure = None;
        for dataset in datasets {
            if !dataset.file.exists() {
                tracing::warn!(
                    dataset = %dataset.label,
                    file = %dataset.file.display(),
                    "dataset file not found; skipping"
                );
                continue;
            }
            match self.run_dataset(backend, dataset).await {
                Ok(run) => runs.push(run),
                Err(e) => {
                    failure = Some(e);
                    break;
                }
            }
        }

        // Close on every path.
        if let Err(e) = backend.close().await {
            tracing::warn!(error = %e, database = %backend.name(), "close failed");
        }
        match failure {
            Some(e) => Err(e),
            None => Ok(runs),
        }
    }

    async fn run_dataset<B: DatabaseBackend>(
        &self,
        backend: &mut B,
        dataset: &DatasetConfig,
    ) -> anyhow::Result<BenchmarkRun> {
        tracing::info!(database = %backend.name(), dataset = %dataset.label, "benchmarking dataset");
        let mut run = BenchmarkRun::new(backend.name(), &dataset.label);
        let container = backend.container_name().to_string();
        let collection = dataset.collection.clone();
        let batch_size = self.workload.batch_size;
        let update_limit = self.workload.update_limit;

        let step = measure_operation(
            self.source.clone(),
            self.options,
            &format!("import {}", dataset.label),
            &container,
            async {
                let count = backend.import(&dataset.file, &collection, batch_size).await?;
                Ok(count_extra("documents_imported", count))
            },
        )
        .await;
        match step {
            Ok(result) => run.append(result)?,
            Err(failed) => return self.abort_run(run, failed),
        }

        let step = measure_operation(
            self.source.clone(),
            self.options,
            &format!("read {}", dataset.label),
            &container,
            async {
                backend.read(&collection).await?;
                Ok(Extra::new())
            },
        )
        .await;
        match step {
            Ok(result) => run.append(result)?,
            Err(failed) => return self.abort_run(run, failed),
        }

        let step = measure_operation(
            self.source.clone(),
            self.options,
            &format!("update {}", dataset.label),
            &container,
            async {
                let count = backend.update(&collection, update_limit).await?;
                Ok(count_extra("documents_updated", count))
            },
        )
        .await;
        match step {
            Ok(result) => run.append(result)?,
            Err(failed) => return self.abort_run(run, failed),
        }

        let step = measure_operation(
            self.source.clone(),
            self.options,
            &format!("delete {}", dataset.label),
            &container,
            async {
                let count = backend.delete(&collection).await?;
                Ok(count_extra("documents_deleted", count))
            },
        )
        .await;
        match step {
            Ok(result) => run.append(result)?,
            Err(failed) => return self.abort_run(run, failed),
        }

        let step = measure_operation(
            self.source.clone(),
            self.options,
            &format!("export {}", dataset.label),
            &container,
            async {
                let path = backend.export(&collection).await?;
                Ok(count_extra("export_path", path.display().to_string()))
            },
        )
        .await;
        match step {
            Ok(result) => run.append(result)?,
            Err(failed) => return self.abort_run(run, failed),
        }

        run.finalize()?;
        self.sink.save_run(&run)?;
        Ok(run)
    }

    /// Record the failed step, freeze and persist what was collected, and
    /// hand the aborted run back so the suite report still includes it.
    fn abort_run(
        &self,
        mut run: BenchmarkRun,
        failed: OperationFailed,
    ) -> anyhow::Result<BenchmarkRun> {
        tracing::error!(
            error = %failed.source,
            database = %run.database_name,
            dataset = %run.dataset_name,
            operation = %failed.result.operation_name,
            "operation failed; aborting remaining lifecycle steps"
        );
        run.append(failed.result)?;
        run.record_error(format!("{:#}", failed.source))?;
        run.finalize()?;
        self.sink.save_run(&run)?;
        Ok(run)
    }
}

fn count_extra(key: &str, value: impl Into<serde_json::Value>) -> Extra {
    Extra::from([(key.to_string(), value.into())])
}
