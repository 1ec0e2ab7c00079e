use std::sync::atomic::{AtomicUsize, Ordering};

/// Internal counters for one job's scheduling loop.
///
/// Shared between the running loop and any `RunningJob` handle via `Arc`.
/// `Relaxed` ordering is enough: the counters are independent tallies and no
/// decision is taken on their relative values.
#[derive(Debug, Default)]
pub struct JobMetrics {
  /// Ticks whose deadline elapsed, whether or not the task ran.
  pub ticks_elapsed: AtomicUsize,
  /// Ticks on which the task actually executed.
  pub ticks_executed: AtomicUsize,
  /// Ticks skipped because another replica held the lease.
  pub ticks_denied: AtomicUsize,
  /// Lease releases that failed and were swallowed.
  pub release_failures: AtomicUsize,
}

impl JobMetrics {
  /// Creates a new `JobMetrics` instance with all counters at zero.
  pub fn new() -> Self {
    Self::default()
  }

  /// Creates a point-in-time copy of the counters.
  pub fn snapshot(&self) -> MetricsSnapshot {
    let order = Ordering::Relaxed;
    MetricsSnapshot {
      ticks_elapsed: self.ticks_elapsed.load(order),
      ticks_executed: self.ticks_executed.load(order),
      ticks_denied: self.ticks_denied.load(order),
      release_failures: self.release_failures.load(order),
    }
  }
}

/// A snapshot of a job's tick counters at a specific point in time.
///
/// Plain data; can be cloned, compared, or serialized for monitoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MetricsSnapshot {
  pub ticks_elapsed: usize,
  pub ticks_executed: usize,
  pub ticks_denied: usize,
  pub release_failures: usize,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn snapshot_reflects_counters() {
    let metrics = JobMetrics::new();
    metrics.ticks_elapsed.fetch_add(3, Ordering::Relaxed);
    metrics.ticks_denied.fetch_add(1, Ordering::Relaxed);

    let snapshot = metrics.snapshot();
    assert_eq!(snapshot.ticks_elapsed, 3);
    assert_eq!(snapshot.ticks_denied, 1);
    assert_eq!(snapshot.ticks_executed, 0);
  }
}
