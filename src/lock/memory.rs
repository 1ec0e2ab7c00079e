use crate::error::LockError;
use crate::lock::LockProvider;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use parking_lot::Mutex;

/// Lease backend backed by a shared in-process map.
///
/// Carries the same test-and-set and expiry semantics as the TTL key store,
/// but only coordinates jobs inside one process: clones share the lease
/// table. Useful for single-process deployments and for exercising the full
/// acquire/execute/release protocol without a live store.
#[derive(Debug, Clone, Default)]
pub struct MemoryLock {
  leases: Arc<Mutex<HashMap<String, Instant>>>,
}

impl MemoryLock {
  /// Creates an empty lease table. Clone the instance to hand the same table
  /// to several jobs.
  pub fn new() -> Self {
    Self::default()
  }

  /// Number of live (unexpired) leases, mainly for diagnostics.
  pub fn live_leases(&self) -> usize {
    let now = Instant::now();
    self
      .leases
      .lock()
      .values()
      .filter(|expires_at| **expires_at > now)
      .count()
  }
}

#[async_trait]
impl LockProvider for MemoryLock {
  async fn prepare(&mut self) -> Result<(), LockError> {
    Ok(())
  }

  async fn acquire(&mut self, key: &str, ttl: Duration) -> Result<bool, LockError> {
    let mut leases = self.leases.lock();
    let now = Instant::now();
    match leases.get(key) {
      Some(expires_at) if *expires_at > now => Ok(false),
      _ => {
        leases.insert(key.to_string(), now + ttl);
        Ok(true)
      }
    }
  }

  async fn release(&mut self, key: &str) -> Result<(), LockError> {
    self.leases.lock().remove(key);
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn expired_lease_is_reclaimable() {
    let mut lock = MemoryLock::new();
    assert!(lock.acquire("k", Duration::from_millis(10)).await.unwrap());
    assert!(!lock.acquire("k", Duration::from_millis(10)).await.unwrap());

    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(lock.acquire("k", Duration::from_millis(10)).await.unwrap());
  }

  #[tokio::test]
  async fn clones_share_the_lease_table() {
    let table = MemoryLock::new();
    let mut a = table.clone();
    let mut b = table.clone();

    assert!(a.acquire("k", Duration::from_secs(5)).await.unwrap());
    assert!(!b.acquire("k", Duration::from_secs(5)).await.unwrap());
    assert_eq!(table.live_leases(), 1);

    a.release("k").await.unwrap();
    assert!(b.acquire("k", Duration::from_secs(5)).await.unwrap());
  }
}
