// Background container resource sampler.
// One start/stop cycle per session; samples are handed off through a channel
// and drained exactly once at stop, so the reader never races the sampler.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::models::{ResourceSummary, Sample};

/// Bound on the start probe and on each per-tick stats query.
const QUERY_TIMEOUT: Duration = Duration::from_secs(5);

/// Source of point-in-time container stats. Implemented by `DockerRepo`
/// and by scripted sources in tests.
pub trait StatsSource: Send + Sync + 'static {
    /// Current CPU percent and memory usage in bytes for `container`.
    fn sample(&self, container: &str) -> impl Future<Output = anyhow::Result<(f64, u64)>> + Send;
}

#[derive(Debug, thiserror::Error)]
pub enum MonitorError {
    #[error("resource monitor is already running")]
    AlreadyRunning,
    #[error("stats backend unreachable for container {container}")]
    Unavailable {
        container: String,
        #[source]
        source: anyhow::Error,
    },
}

/// What one monitoring session produced.
#[derive(Debug)]
pub struct MonitorOutcome {
    pub summary: ResourceSummary,
    pub samples: Vec<Sample>,
    /// True when the sampling task missed the stop grace period and was
    /// abandoned; `summary` then covers the samples collected up to that point.
    pub timed_out: bool,
}

impl MonitorOutcome {
    fn empty() -> Self {
        Self {
            summary: ResourceSummary::default(),
            samples: Vec::new(),
            timed_out: false,
        }
    }
}

struct Session {
    stop_tx: oneshot::Sender<()>,
    handle: JoinHandle<()>,
    sample_rx: mpsc::UnboundedReceiver<Sample>,
}

/// Samples a named container on a fixed interval from a background task.
pub struct ResourceMonitor<S> {
    source: Arc<S>,
    stop_grace: Duration,
    session: Option<Session>,
}

impl<S: StatsSource> ResourceMonitor<S> {
    pub fn new(source: Arc<S>, stop_grace: Duration) -> Self {
        Self {
            source,
            stop_grace,
            session: None,
        }
    }

    /// Begin sampling `container` every `interval` on a background task.
    /// Probes the backend once first and fails fast (without starting) when it
    /// is unreachable; the probe reading is not recorded, and the first real
    /// sample lands one full interval after start.
    pub async fn start(&mut self, container: &str, interval: Duration) -> Result<(), MonitorError> {
        if self.session.is_some() {
            return Err(MonitorError::AlreadyRunning);
        }
        match tokio::time::timeout(QUERY_TIMEOUT, self.source.sample(container)).await {
            Ok(Ok(_)) => {}
            Ok(Err(source)) => {
                return Err(MonitorError::Unavailable {
                    container: container.to_string(),
                    source,
                });
            }
            Err(_) => {
                return Err(MonitorError::Unavailable {
                    container: container.to_string(),
                    source: anyhow::anyhow!("probe timed out after {QUERY_TIMEOUT:?}"),
                });
            }
        }

        let (stop_tx, stop_rx) = oneshot::channel();
        let (sample_tx, sample_rx) = mpsc::unbounded_channel();
        let handle = tokio::spawn(sample_loop(
            self.source.clone(),
            container.to_string(),
            interval,
            stop_rx,
            sample_tx,
        ));
        self.session = Some(Session {
            stop_tx,
            handle,
            sample_rx,
        });
        tracing::debug!(container = %container, interval_ms = interval.as_millis() as u64, "resource monitor started");
        Ok(())
    }

    /// Signal the sampling task, wait up to the grace period for it to exit,
    /// then summarize whatever was collected. Without a prior `start` this is
    /// a no-op returning the empty summary.
    pub async fn stop(&mut self) -> MonitorOutcome {
        let Some(mut session) = self.session.take() else {
            return MonitorOutcome::empty();
        };
        let _ = session.stop_tx.send(());
        let timed_out = match tokio::time::timeout(self.stop_grace, &mut session.handle).await {
            Ok(_) => false,
            Err(_) => {
                session.handle.abort();
                true
            }
        };
        session.sample_rx.close();
        let mut samples = Vec::new();
        while let Ok(sample) = session.sample_rx.try_recv() {
            samples.push(sample);
        }
        let summary = ResourceSummary::from_samples(&samples);
        MonitorOutcome {
            summary,
            samples,
            timed_out,
        }
    }

    pub fn is_running(&self) -> bool {
        self.session.is_some()
    }
}

async fn sample_loop<S: StatsSource>(
    source: Arc<S>,
    container: String,
    interval: Duration,
    mut stop_rx: oneshot::Receiver<()>,
    sample_tx: mpsc::UnboundedSender<Sample>,
) {
    // tokio panics on a zero interval period
    let period = interval.max(Duration::from_millis(1));
    let mut tick = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
    tick.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = &mut stop_rx => break,
            _ = tick.tick() => {
                let query = source.sample(&container);
                tokio::select! {
                    // Stop promptly even with a query in flight.
                    _ = &mut stop_rx => break,
                    result = tokio::time::timeout(QUERY_TIMEOUT, query) => match result {
                        Ok(Ok((cpu_percent, memory_bytes))) => {
                            let sample = Sample {
                                timestamp: Utc::now(),
                                cpu_percent,
                                memory_bytes,
                            };
                            if sample_tx.send(sample).is_err() {
                                break;
                            }
                        }
                        Ok(Err(e)) => {
                            tracing::debug!(error = %e, container = %container, operation = "sample_tick", "tick query failed; skipping");
                        }
                        Err(_) => {
                            tracing::debug!(container = %container, operation = "sample_tick", "tick query timed out; skipping");
                        }
                    }
                }
            }
        }
    }
    tracing::debug!(container = %container, "sampling task stopped");
}
