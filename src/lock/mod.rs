//! Pluggable distributed mutual-exclusion backends.
//!
//! A [`LockProvider`] manages a named lease: `acquire` is an atomic
//! test-and-set against the backing store, `release` frees the lease, and
//! `prepare` performs one-time connection and provisioning work. The
//! scheduler depends on the trait alone; the concrete strategy is picked
//! exactly once via [`LockVendor`] when the job is built.

pub mod memory;

#[cfg(feature = "dynamodb-lock")]
pub mod dynamodb;
#[cfg(feature = "postgres-lock")]
pub mod postgres;
#[cfg(feature = "redis-lock")]
pub mod redis;

use crate::error::LockError;

use std::time::Duration;

use async_trait::async_trait;

/// Namespace prefix for every lease key, so job leases cannot collide with
/// unrelated keys in a shared store.
pub const LEASE_PREFIX: &str = "tickfence:lease:";

/// Default table name used by the table-backed strategies.
pub const DEFAULT_LEASE_TABLE: &str = "tickfence_leases";

/// Derives the storage key for a job's lease.
pub fn lease_key(job_name: &str) -> String {
  format!("{LEASE_PREFIX}{job_name}")
}

/// Capability set every lease backend implements.
///
/// The single correctness property the whole crate protects: for a fixed
/// key, at most one concurrent `acquire` across all replicas observes
/// `Ok(true)` before the corresponding `release` (or TTL expiry, where the
/// backend supports expiry).
#[async_trait]
pub trait LockProvider: Send {
  /// Connects to the backend and performs one-time provisioning.
  /// Idempotent: calling it again on a prepared provider is a no-op.
  async fn prepare(&mut self) -> Result<(), LockError>;

  /// Attempts to take the named lease for `ttl`.
  ///
  /// Returns `Ok(true)` when this caller became the holder, `Ok(false)` when
  /// another holder is active (normal contention, not a fault), and `Err`
  /// only when the backend could not answer.
  async fn acquire(&mut self, key: &str, ttl: Duration) -> Result<bool, LockError>;

  /// Frees the named lease. Releasing a lease that is not held is a no-op.
  async fn release(&mut self, key: &str) -> Result<(), LockError>;
}

/// Selects which backing store coordinates replicas of a job.
#[derive(Debug, Default)]
pub enum LockVendor {
  /// No distributed coordination: every tick runs the task.
  #[default]
  None,
  /// TTL key store. Atomic set-if-absent with native expiry; a crashed
  /// holder's lease disappears on its own once the TTL lapses.
  #[cfg(feature = "redis-lock")]
  Redis(redis::RedisLockConfig),
  /// Conditional-write table store. Atomic insert-if-absent, no native
  /// expiry.
  #[cfg(feature = "dynamodb-lock")]
  DynamoDb(dynamodb::DynamoLockConfig),
  /// Relational table with a unique key constraint, no native expiry.
  #[cfg(feature = "postgres-lock")]
  Postgres(postgres::PostgresLockConfig),
}

impl LockVendor {
  /// Resolves the vendor selection into a concrete provider instance.
  /// `None` yields no provider: the job runs unconditionally.
  pub(crate) fn resolve(self) -> Option<Box<dyn LockProvider>> {
    match self {
      LockVendor::None => None,
      #[cfg(feature = "redis-lock")]
      LockVendor::Redis(config) => Some(Box::new(redis::RedisLock::new(config))),
      #[cfg(feature = "dynamodb-lock")]
      LockVendor::DynamoDb(config) => Some(Box::new(dynamodb::DynamoLock::new(config))),
      #[cfg(feature = "postgres-lock")]
      LockVendor::Postgres(config) => Some(Box::new(postgres::PostgresLock::new(config))),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn lease_keys_are_namespaced() {
    assert_eq!(lease_key("billing"), "tickfence:lease:billing");
  }

  #[test]
  fn vendor_none_resolves_to_no_provider() {
    assert!(LockVendor::None.resolve().is_none());
  }
}
