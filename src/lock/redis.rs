use crate::error::LockError;
use crate::lock::LockProvider;

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use redis::aio::MultiplexedConnection;
use tracing::info;
use uuid::Uuid;

/// Connection surface for the Redis-backed lease store.
///
/// The URL carries host, credentials, and database index, e.g.
/// `redis://:password@redis.internal:6379/0`.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RedisLockConfig {
  pub url: String,
}

impl RedisLockConfig {
  pub fn new(url: impl Into<String>) -> Self {
    Self { url: url.into() }
  }
}

impl Default for RedisLockConfig {
  fn default() -> Self {
    Self {
      url: "redis://127.0.0.1:6379".to_string(),
    }
  }
}

/// Lease backend against a Redis-compatible store.
///
/// `acquire` is a single `SET key value NX PX ttl`, the store's atomic
/// set-if-absent-with-expiry, so the command result *is* the acquire outcome
/// and a crashed holder's lease heals itself once the TTL lapses. This is
/// the reference semantics the table-backed strategies approximate.
///
/// The lease value records the holder id and acquisition time, so a live
/// lease can be traced back to the replica that owns it.
pub struct RedisLock {
  config: RedisLockConfig,
  holder: Uuid,
  connection: Option<MultiplexedConnection>,
}

impl RedisLock {
  pub fn new(config: RedisLockConfig) -> Self {
    Self {
      config,
      holder: Uuid::new_v4(),
      connection: None,
    }
  }

  fn connection(&self) -> Result<MultiplexedConnection, LockError> {
    self
      .connection
      .clone()
      .ok_or_else(|| LockError::Connection("redis connection not prepared".to_string()))
  }
}

#[async_trait]
impl LockProvider for RedisLock {
  async fn prepare(&mut self) -> Result<(), LockError> {
    if self.connection.is_some() {
      return Ok(());
    }
    let client = redis::Client::open(self.config.url.as_str()).map_err(LockError::connection)?;
    let connection = client
      .get_multiplexed_async_connection()
      .await
      .map_err(LockError::connection)?;
    self.connection = Some(connection);
    info!(holder = %self.holder, url = %self.config.url, "redis lease store connected");
    Ok(())
  }

  async fn acquire(&mut self, key: &str, ttl: Duration) -> Result<bool, LockError> {
    let mut conn = self.connection()?;
    // PX takes milliseconds; the expiry must stay positive for any ttl.
    let ttl_ms = ttl.as_millis().max(1) as u64;
    let stamp = format!("{} {}", self.holder, Utc::now().to_rfc3339());

    let granted: Option<String> = redis::cmd("SET")
      .arg(key)
      .arg(&stamp)
      .arg("NX")
      .arg("PX")
      .arg(ttl_ms)
      .query_async(&mut conn)
      .await
      .map_err(LockError::backend)?;

    Ok(granted.is_some())
  }

  async fn release(&mut self, key: &str) -> Result<(), LockError> {
    let mut conn = self.connection()?;
    let _removed: i64 = redis::cmd("DEL")
      .arg(key)
      .query_async(&mut conn)
      .await
      .map_err(LockError::backend)?;
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn default_config_points_at_localhost() {
    assert_eq!(RedisLockConfig::default().url, "redis://127.0.0.1:6379");
  }

  #[tokio::test]
  async fn acquire_before_prepare_reports_connection_error() {
    let mut lock = RedisLock::new(RedisLockConfig::default());
    let err = lock.acquire("k", Duration::from_secs(1)).await.unwrap_err();
    assert!(matches!(err, LockError::Connection(_)));
  }
}
