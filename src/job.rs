use crate::error::ConfigError;
use crate::lock::{LockProvider, LockVendor};
use crate::metrics::JobMetrics;
use crate::scheduler::IntervalJob;

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

/// The function type a job executes on each tick it wins.
///
/// The function must be asynchronous and `Send + Sync + 'static`. It takes no
/// arguments and yields no value: the scheduler neither retries a tick nor
/// interprets its outcome.
pub type BoxedTickFn =
  Box<dyn Fn() -> Pin<Box<dyn Future<Output = ()> + Send + 'static>> + Send + Sync + 'static>;

/// Builder for configuring and creating an [`IntervalJob`].
///
/// # Example
///
/// ```no_run
/// use std::time::Duration;
/// use tickfence::IntervalJob;
///
/// # fn main() -> Result<(), tickfence::ConfigError> {
/// let job = IntervalJob::builder()
///   .name("cache-refresh")
///   .interval(Duration::from_secs(30))
///   .task(|| {
///     Box::pin(async {
///       // refresh the cache
///     })
///   })
///   .build()?;
/// # Ok(())
/// # }
/// ```
#[derive(Default)]
pub struct IntervalJobBuilder {
  name: Option<String>,
  interval: Option<Duration>,
  task: Option<BoxedTickFn>,
  vendor: LockVendor,
  provider: Option<Box<dyn LockProvider>>,
}

impl IntervalJobBuilder {
  /// Creates a new builder with no lock vendor configured.
  pub fn new() -> Self {
    Self::default()
  }

  /// Unique job name across the whole fleet; the lease key is derived from
  /// it. Required for any distributed vendor, optional otherwise.
  pub fn name(mut self, name: impl Into<String>) -> Self {
    self.name = Some(name.into());
    self
  }

  /// Tick period (required, must be greater than zero). Doubles as the lease
  /// TTL on backends with native expiry.
  pub fn interval(mut self, interval: Duration) -> Self {
    self.interval = Some(interval);
    self
  }

  /// The task to execute on each tick this replica wins (required).
  pub fn task<F>(mut self, task: F) -> Self
  where
    F: Fn() -> Pin<Box<dyn Future<Output = ()> + Send + 'static>> + Send + Sync + 'static,
  {
    self.task = Some(Box::new(task));
    self
  }

  /// Selects the distributed lock backend. Defaults to [`LockVendor::None`],
  /// in which case every tick runs the task.
  pub fn vendor(mut self, vendor: LockVendor) -> Self {
    self.vendor = vendor;
    self
  }

  /// Injects a pre-built lock provider instead of resolving one from the
  /// vendor selection, e.g. a [`MemoryLock`](crate::lock::memory::MemoryLock)
  /// shared between jobs in one process, or a provider wrapping an existing
  /// client connection. Takes precedence over [`vendor`](Self::vendor).
  pub fn provider(mut self, provider: Box<dyn LockProvider>) -> Self {
    self.provider = Some(provider);
    self
  }

  /// Validates the configuration and produces the job.
  ///
  /// The lock backend is resolved here, exactly once; the job never switches
  /// strategies at runtime.
  ///
  /// # Errors
  ///
  /// - [`ConfigError::ZeroInterval`]: interval missing or zero.
  /// - [`ConfigError::MissingTask`]: no task configured.
  /// - [`ConfigError::MissingName`]: a lock backend is configured but the job
  ///   has no non-empty name to derive its lease key from.
  pub fn build(self) -> Result<IntervalJob, ConfigError> {
    let interval = self
      .interval
      .filter(|interval| !interval.is_zero())
      .ok_or(ConfigError::ZeroInterval)?;
    let task = self.task.ok_or(ConfigError::MissingTask)?;
    let provider = match self.provider {
      Some(provider) => Some(provider),
      None => self.vendor.resolve(),
    };
    let name = self.name.filter(|name| !name.is_empty());
    if provider.is_some() && name.is_none() {
      return Err(ConfigError::MissingName);
    }

    Ok(IntervalJob {
      name,
      interval,
      task,
      provider,
      metrics: Arc::new(JobMetrics::new()),
    })
  }
}
