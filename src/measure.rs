// Timed execution wrapper: one unit of work in, one OperationResult out.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::models::{Extra, OperationResult};
use crate::monitor::{ResourceMonitor, StatsSource};

/// Sampling knobs shared by every measured operation in a run.
#[derive(Debug, Clone, Copy)]
pub struct MeasureOptions {
    pub interval: Duration,
    pub stop_grace: Duration,
}

impl Default for MeasureOptions {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
            stop_grace: Duration::from_secs(2),
        }
    }
}

/// A measured unit of work failed. Carries the fully-formed OperationResult
/// (duration up to the failure, whatever samples were collected) alongside
/// the propagated cause, so callers can record the result before bailing.
#[derive(Debug, thiserror::Error)]
#[error("operation {} failed", .result.operation_name)]
pub struct OperationFailed {
    pub result: OperationResult,
    #[source]
    pub source: anyhow::Error,
}

/// Execute `work` exactly once, timing it and sampling `container` while it
/// runs. Monitoring is best-effort: an unreachable stats backend degrades to
/// a warning and a zero summary. The monitor is stopped on every exit path;
/// timing covers the unit of work only, not monitor start/stop. No retry.
pub async fn measure_operation<S, Fut>(
    source: Arc<S>,
    options: MeasureOptions,
    operation_name: &str,
    container: &str,
    work: Fut,
) -> Result<OperationResult, OperationFailed>
where
    S: StatsSource,
    Fut: Future<Output = anyhow::Result<Extra>>,
{
    tracing::info!(operation = %operation_name, container = %container, "starting operation");
    let mut monitor = ResourceMonitor::new(source, options.stop_grace);
    if let Err(e) = monitor.start(container, options.interval).await {
        tracing::warn!(
            error = %e,
            operation = %operation_name,
            "resource monitoring unavailable; continuing without samples"
        );
    }

    let started = Instant::now();
    let outcome = work.await;
    let duration = started.elapsed();

    let mon = monitor.stop().await;
    if mon.timed_out {
        tracing::warn!(
            operation = %operation_name,
            container = %container,
            "sampling task missed the stop grace period; using partial samples"
        );
    }

    let duration_seconds = duration.as_secs_f64();
    match outcome {
        Ok(extra) => {
            tracing::info!(
                operation = %operation_name,
                duration_seconds,
                cpu_avg = mon.summary.cpu_avg,
                mem_avg_bytes = mon.summary.mem_avg_bytes,
                samples = mon.summary.sample_count,
                "operation finished"
            );
            Ok(OperationResult {
                operation_name: operation_name.to_string(),
                duration_seconds,
                resource_summary: mon.summary,
                extra,
            })
        }
        Err(source) => {
            tracing::error!(
                error = %source,
                operation = %operation_name,
                duration_seconds,
                "operation failed"
            );
            Err(OperationFailed {
                result: OperationResult {
                    operation_name: operation_name.to_string(),
                    duration_seconds,
                    resource_summary: mon.summary,
                    extra: Extra::new(),
                },
                source,
            })
        }
    }
}
