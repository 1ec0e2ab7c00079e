//! demos/redis_replicas.rs
//!
//! Three replicas of the same logical job in one process, coordinated
//! through a Redis lease: every 2 seconds exactly one of them fires.
//! Requires a Redis reachable at REDIS_URL (default localhost:6379).

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tickfence::{IntervalJob, LockVendor, RedisLockConfig};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  let filter = tracing_subscriber::EnvFilter::try_new("info,tickfence=debug")
    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
  tracing_subscriber::fmt().with_env_filter(filter).init();

  let config = match std::env::var("REDIS_URL") {
    Ok(url) => RedisLockConfig::new(url),
    Err(_) => RedisLockConfig::default(),
  };

  let executions = Arc::new(AtomicUsize::new(0));

  let mut replicas = Vec::new();
  for replica in 0..3 {
    let executions = executions.clone();
    let job = IntervalJob::builder()
      .name("redis-demo-job")
      .interval(Duration::from_secs(2))
      .vendor(LockVendor::Redis(config.clone()))
      .task(move || {
        let executions = executions.clone();
        Box::pin(async move {
          let total = executions.fetch_add(1, Ordering::SeqCst) + 1;
          info!(replica, total, "won the lease for this window");
        })
      })
      .build()?;
    replicas.push(job.spawn());
  }

  tokio::time::sleep(Duration::from_secs(20)).await;

  for replica in replicas {
    replica.shutdown().await?;
  }
  info!(
    total = executions.load(Ordering::SeqCst),
    "expected roughly one execution per 2s window across all replicas"
  );

  Ok(())
}
