//! tests/local.rs
//! Liveness, tick pacing, cancellation, and builder validation without
//! distributed coordination.

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

use crate::common::{counting_task, setup_tracing};
use tickfence::{ConfigError, IntervalJob, MemoryLock};

#[tokio::test]
async fn runs_about_once_per_interval_until_cancelled() {
  setup_tracing();
  let counter = Arc::new(AtomicUsize::new(0));
  let job = IntervalJob::builder()
    .interval(Duration::from_millis(100))
    .task(counting_task(counter.clone(), Duration::ZERO))
    .build()
    .unwrap();

  let running = job.spawn();
  tokio::time::sleep(Duration::from_secs(2)).await;
  running.shutdown().await.unwrap();

  // 2s of 100ms ticks, with the first tick one interval after start.
  let count = counter.load(Ordering::SeqCst);
  assert!(
    (17..=20).contains(&count),
    "expected roughly 19 runs, got {count}"
  );
}

#[tokio::test]
async fn first_tick_waits_one_full_interval() {
  setup_tracing();
  let counter = Arc::new(AtomicUsize::new(0));
  let job = IntervalJob::builder()
    .interval(Duration::from_millis(200))
    .task(counting_task(counter.clone(), Duration::ZERO))
    .build()
    .unwrap();

  let running = job.spawn();
  tokio::time::sleep(Duration::from_millis(100)).await;
  assert_eq!(
    counter.load(Ordering::SeqCst),
    0,
    "no zero-delay first tick"
  );
  running.shutdown().await.unwrap();
}

#[tokio::test]
async fn cancellation_before_first_tick_returns_cleanly() {
  setup_tracing();
  let counter = Arc::new(AtomicUsize::new(0));
  let job = IntervalJob::builder()
    .interval(Duration::from_secs(60))
    .task(counting_task(counter.clone(), Duration::ZERO))
    .build()
    .unwrap();

  let (shutdown_tx, shutdown_rx) = watch::channel(false);
  let handle = tokio::spawn(job.run(shutdown_rx));

  tokio::time::sleep(Duration::from_millis(50)).await;
  shutdown_tx.send(true).unwrap();

  handle.await.unwrap().unwrap();
  assert_eq!(counter.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn dropping_the_handle_stops_the_loop() {
  setup_tracing();
  let counter = Arc::new(AtomicUsize::new(0));
  let job = IntervalJob::builder()
    .interval(Duration::from_millis(50))
    .task(counting_task(counter.clone(), Duration::ZERO))
    .build()
    .unwrap();

  let running = job.spawn();
  tokio::time::sleep(Duration::from_millis(120)).await;
  drop(running);
  tokio::time::sleep(Duration::from_millis(200)).await;

  let count_after_drop = counter.load(Ordering::SeqCst);
  tokio::time::sleep(Duration::from_millis(200)).await;
  assert_eq!(
    counter.load(Ordering::SeqCst),
    count_after_drop,
    "detached job kept running after its handle was dropped"
  );
}

#[tokio::test]
async fn slow_task_delays_but_keeps_scheduling() {
  setup_tracing();
  let counter = Arc::new(AtomicUsize::new(0));
  // Task outruns the interval; deadlines that elapse mid-run are dropped,
  // but scheduling continues afterwards.
  let job = IntervalJob::builder()
    .interval(Duration::from_millis(100))
    .task(counting_task(counter.clone(), Duration::from_millis(250)))
    .build()
    .unwrap();
  let metrics = job.metrics_handle();

  let running = job.spawn();
  tokio::time::sleep(Duration::from_secs(2)).await;
  running.shutdown().await.unwrap();

  let count = counter.load(Ordering::SeqCst);
  assert!(
    (4..=8).contains(&count),
    "slow task should still run repeatedly, got {count}"
  );
  assert_eq!(metrics.snapshot().ticks_executed, count);
}

// --- Builder validation ---

#[test]
fn zero_interval_is_rejected() {
  let err = IntervalJob::builder()
    .interval(Duration::ZERO)
    .task(|| Box::pin(async {}))
    .build()
    .unwrap_err();
  assert_eq!(err, ConfigError::ZeroInterval);
}

#[test]
fn missing_interval_is_rejected() {
  let err = IntervalJob::builder()
    .task(|| Box::pin(async {}))
    .build()
    .unwrap_err();
  assert_eq!(err, ConfigError::ZeroInterval);
}

#[test]
fn missing_task_is_rejected() {
  let err = IntervalJob::builder()
    .interval(Duration::from_secs(1))
    .build()
    .unwrap_err();
  assert_eq!(err, ConfigError::MissingTask);
}

#[test]
fn distributed_locking_requires_a_name() {
  let err = IntervalJob::builder()
    .interval(Duration::from_secs(1))
    .task(|| Box::pin(async {}))
    .provider(Box::new(MemoryLock::new()))
    .build()
    .unwrap_err();
  assert_eq!(err, ConfigError::MissingName);
}

#[test]
fn empty_name_counts_as_missing() {
  let err = IntervalJob::builder()
    .name("")
    .interval(Duration::from_secs(1))
    .task(|| Box::pin(async {}))
    .provider(Box::new(MemoryLock::new()))
    .build()
    .unwrap_err();
  assert_eq!(err, ConfigError::MissingName);
}
