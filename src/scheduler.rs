use crate::error::{LockError, ShutdownError};
use crate::job::{BoxedTickFn, IntervalJobBuilder};
use crate::lock::{lease_key, LockProvider};
use crate::metrics::{JobMetrics, MetricsSnapshot};

use std::sync::atomic::Ordering as AtomicOrdering;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

/// A periodically executed job, optionally guarded by a distributed lease so
/// that at most one replica of the job runs per interval window.
///
/// Configuration is immutable once [`run`](IntervalJob::run) starts. Each
/// instance owns its resolved lock backend; nothing is shared between
/// unrelated jobs, so independent jobs never interfere.
///
/// Within one instance, ticks are strictly sequential: the acquire for tick
/// N+1 never begins before tick N has been released or skipped. Across
/// replicas there is no ordering beyond mutual exclusion itself: which
/// replica wins a given tick is unspecified and may vary per tick.
pub struct IntervalJob {
  pub(crate) name: Option<String>,
  pub(crate) interval: Duration,
  pub(crate) task: BoxedTickFn,
  pub(crate) provider: Option<Box<dyn LockProvider>>,
  pub(crate) metrics: Arc<JobMetrics>,
}

impl std::fmt::Debug for IntervalJob {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("IntervalJob")
      .field("name", &self.name)
      .field("interval", &self.interval)
      .field("distributed", &self.provider.is_some())
      .finish_non_exhaustive()
  }
}

impl IntervalJob {
  /// Returns a builder to configure and create an `IntervalJob`.
  pub fn builder() -> IntervalJobBuilder {
    IntervalJobBuilder::new()
  }

  /// Shared handle to this job's tick counters. Clone it before handing the
  /// job to [`run`](IntervalJob::run) if you need counters afterwards.
  pub fn metrics_handle(&self) -> Arc<JobMetrics> {
    self.metrics.clone()
  }

  /// Runs the scheduling loop until `shutdown` signals `true` (or every
  /// sender is dropped), or until the lock backend fails fatally.
  ///
  /// The first tick fires one full interval after the call, never
  /// immediately, and each deadline advances by exactly one interval from
  /// the previous deadline, so a slow task delays later ticks without
  /// compounding drift. A deadline that elapses while the task is still
  /// running (or while the process was suspended) is dropped, never
  /// replayed.
  ///
  /// Cancellation is observed between ticks only; an in-flight task or
  /// backend call completes before the loop returns, so no partial lock
  /// state is left dangling.
  ///
  /// # Errors
  ///
  /// - [`LockError::Connection`]: the backend could not be set up.
  /// - [`LockError::Backend`]: an acquire attempt failed with something
  ///   other than a denial. Without a definitive answer the exclusivity
  ///   guarantee no longer holds, so the loop stops instead of risking a
  ///   duplicate run.
  pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) -> Result<(), LockError> {
    let job = self.name.clone().unwrap_or_else(|| "local".to_string());

    if let Some(provider) = self.provider.as_mut() {
      provider.prepare().await?;
    }
    let key = self.name.as_deref().map(lease_key).unwrap_or_default();

    info!(
      job = %job,
      interval_ms = self.interval.as_millis() as u64,
      distributed = self.provider.is_some(),
      "interval job started"
    );

    // First deadline is one interval out; an immediate first tick would
    // double-run the task on every rolling restart.
    let mut ticker = time::interval_at(Instant::now() + self.interval, self.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
      if *shutdown.borrow() {
        info!(job = %job, "interval job terminated");
        return Ok(());
      }

      tokio::select! {
        biased; // Check cancellation ahead of an already-elapsed deadline.

        changed = shutdown.changed() => {
          if changed.is_err() || *shutdown.borrow() {
            info!(job = %job, "interval job terminated");
            return Ok(());
          }
        }

        _ = ticker.tick() => {
          self.metrics.ticks_elapsed.fetch_add(1, AtomicOrdering::Relaxed);
          self.fire(&job, &key).await?;
        }
      }
    }
  }

  /// One tick: acquire the lease, run the task while holding it, release.
  async fn fire(&mut self, job: &str, key: &str) -> Result<(), LockError> {
    let Some(provider) = self.provider.as_mut() else {
      (self.task)().await;
      self.metrics.ticks_executed.fetch_add(1, AtomicOrdering::Relaxed);
      return Ok(());
    };

    match provider.acquire(key, self.interval).await {
      Ok(true) => debug!(job = %job, key = %key, "lease acquired"),
      Ok(false) => {
        // Another replica owns this window. Normal flow, not a fault.
        debug!(job = %job, key = %key, "lease held elsewhere, tick skipped");
        self.metrics.ticks_denied.fetch_add(1, AtomicOrdering::Relaxed);
        return Ok(());
      }
      Err(err) => {
        error!(job = %job, key = %key, error = %err, "lease acquire failed");
        return Err(err);
      }
    }

    (self.task)().await;
    self.metrics.ticks_executed.fetch_add(1, AtomicOrdering::Relaxed);

    if let Err(err) = provider.release(key).await {
      // Best effort: a TTL-backed lease expires on its own, a table-backed
      // one may strand until the next explicit cleanup.
      warn!(job = %job, key = %key, error = %err, "lease release failed");
      self
        .metrics
        .release_failures
        .fetch_add(1, AtomicOrdering::Relaxed);
    }
    Ok(())
  }

  /// Spawns the scheduling loop onto the current Tokio runtime and returns a
  /// handle for cancelling and joining it.
  ///
  /// # Panics
  ///
  /// Panics if called outside a Tokio runtime.
  pub fn spawn(self) -> RunningJob {
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let metrics = self.metrics.clone();
    let handle = tokio::spawn(self.run(shutdown_rx));
    RunningJob {
      shutdown_tx,
      handle,
      metrics,
    }
  }
}

/// Handle to a job spawned with [`IntervalJob::spawn`].
///
/// Dropping the handle cancels the job: the loop treats a closed shutdown
/// channel as a termination signal, so a detached job cannot run forever.
pub struct RunningJob {
  shutdown_tx: watch::Sender<bool>,
  handle: JoinHandle<Result<(), LockError>>,
  metrics: Arc<JobMetrics>,
}

impl RunningJob {
  /// Signals the loop to stop after the current iteration. In-flight work
  /// (a tick being executed, a backend call) completes first.
  pub fn cancel(&self) {
    let _ = self.shutdown_tx.send(true);
  }

  /// Point-in-time copy of the job's tick counters.
  pub fn metrics(&self) -> MetricsSnapshot {
    self.metrics.snapshot()
  }

  /// Waits for the loop to finish.
  ///
  /// # Errors
  ///
  /// - [`ShutdownError::Lock`]: the loop stopped on a fatal backend error.
  /// - [`ShutdownError::TaskPanic`]: the scheduler task panicked.
  pub async fn join(self) -> Result<(), ShutdownError> {
    match self.handle.await {
      Ok(result) => result.map_err(ShutdownError::from),
      Err(err) if err.is_panic() => Err(ShutdownError::TaskPanic),
      Err(_) => Ok(()), // aborted externally; nothing left to report
    }
  }

  /// Cancels the loop and waits for it to finish.
  pub async fn shutdown(self) -> Result<(), ShutdownError> {
    self.cancel();
    self.join().await
  }
}
