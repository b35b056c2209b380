// Monitor integration tests: sample cadence, stop semantics, degraded modes.
// Paused-time tests rely on tokio auto-advancing the clock, which makes the
// tick schedule deterministic.

mod common;

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use common::{ConstSource, FailingSource, ScriptedSource};
use docbench::models::ResourceSummary;
use docbench::monitor::{MonitorError, ResourceMonitor};

const GRACE: Duration = Duration::from_secs(2);

#[tokio::test(start_paused = true)]
async fn collects_one_sample_per_interval() {
    let source = Arc::new(ScriptedSource::with_probe([
        (10.0, 100),
        (20.0, 400),
        (15.0, 200),
        (25.0, 300),
    ]));
    let mut monitor = ResourceMonitor::new(source, GRACE);
    monitor
        .start("db", Duration::from_millis(500))
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(2100)).await;
    let outcome = monitor.stop().await;

    assert!(!outcome.timed_out);
    assert_eq!(outcome.summary.sample_count, 4);
    assert_eq!(outcome.summary.cpu_avg, 17.5);
    assert_eq!(outcome.summary.cpu_max, 25.0);
    assert_eq!(outcome.summary.mem_max_bytes, 400);
    assert_eq!(outcome.summary.mem_avg_bytes, 250.0);
}

#[tokio::test(start_paused = true)]
async fn sub_interval_session_collects_zero_samples() {
    let source = Arc::new(ConstSource::new(50.0, 1000));
    let mut monitor = ResourceMonitor::new(source, GRACE);
    monitor.start("db", Duration::from_secs(1)).await.unwrap();
    tokio::time::sleep(Duration::from_millis(300)).await;
    let outcome = monitor.stop().await;

    assert!(!outcome.timed_out);
    assert_eq!(outcome.summary, ResourceSummary::default());
    assert!(outcome.samples.is_empty());
}

#[tokio::test]
async fn stop_without_start_returns_empty_summary() {
    let mut monitor = ResourceMonitor::new(Arc::new(FailingSource), GRACE);
    let outcome = monitor.stop().await;
    assert_eq!(outcome.summary, ResourceSummary::default());
    assert!(outcome.samples.is_empty());
    assert!(!outcome.timed_out);
}

#[tokio::test]
async fn start_fails_fast_when_backend_unreachable() {
    let mut monitor = ResourceMonitor::new(Arc::new(FailingSource), GRACE);
    let err = monitor
        .start("db", Duration::from_millis(10))
        .await
        .unwrap_err();
    assert!(matches!(err, MonitorError::Unavailable { .. }));
    assert!(!monitor.is_running());
}

#[tokio::test(start_paused = true)]
async fn failing_ticks_are_skipped_without_crashing() {
    // Probe succeeds; every subsequent tick query fails.
    let source = Arc::new(ScriptedSource::new([(0.0, 0)]));
    let mut monitor = ResourceMonitor::new(source, GRACE);
    monitor
        .start("db", Duration::from_millis(100))
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(550)).await;
    let outcome = monitor.stop().await;

    assert!(!outcome.timed_out);
    assert_eq!(outcome.summary, ResourceSummary::default());
}

#[tokio::test(start_paused = true)]
async fn second_start_while_running_fails() {
    let source = Arc::new(ConstSource::new(1.0, 1));
    let mut monitor = ResourceMonitor::new(source, GRACE);
    monitor.start("db", Duration::from_secs(1)).await.unwrap();
    let err = monitor
        .start("db", Duration::from_secs(1))
        .await
        .unwrap_err();
    assert!(matches!(err, MonitorError::AlreadyRunning));
    monitor.stop().await;

    // A fresh start/stop cycle is allowed after stop.
    monitor.start("db", Duration::from_secs(1)).await.unwrap();
    assert!(monitor.is_running());
    monitor.stop().await;
}

#[tokio::test(start_paused = true)]
async fn samples_are_ordered_and_fall_within_the_monitored_window() {
    let before = Utc::now();
    let source = Arc::new(ConstSource::new(30.0, 2048));
    let mut monitor = ResourceMonitor::new(source, GRACE);
    monitor
        .start("db", Duration::from_millis(200))
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(1050)).await;
    let outcome = monitor.stop().await;
    let after = Utc::now();

    assert_eq!(outcome.samples.len(), 5);
    for pair in outcome.samples.windows(2) {
        assert!(pair[0].timestamp <= pair[1].timestamp);
    }
    for sample in &outcome.samples {
        assert!(sample.timestamp >= before && sample.timestamp <= after);
        assert_eq!(sample.cpu_percent, 30.0);
        assert_eq!(sample.memory_bytes, 2048);
    }
}

#[tokio::test(start_paused = true)]
async fn zero_grace_reports_timeout_and_keeps_partial_samples() {
    let source = Arc::new(ConstSource::new(10.0, 512));
    let mut monitor = ResourceMonitor::new(source, Duration::ZERO);
    monitor
        .start("db", Duration::from_millis(100))
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(250)).await;
    let outcome = monitor.stop().await;

    assert!(outcome.timed_out);
    assert_eq!(outcome.summary.sample_count, 2);
    assert_eq!(outcome.summary.cpu_avg, 10.0);
}
