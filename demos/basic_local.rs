//! demos/basic_local.rs
//!
//! A single-process interval job with no distributed coordination:
//! - Building the job.
//! - Letting it tick a few times.
//! - Graceful shutdown.

use std::time::Duration;

use tickfence::IntervalJob;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // --- Setup Tracing ---
  let filter = tracing_subscriber::EnvFilter::try_new("info,tickfence=debug")
    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
  tracing_subscriber::fmt().with_env_filter(filter).init();

  // --- Build Job ---
  let job = IntervalJob::builder()
    .interval(Duration::from_secs(2))
    .task(|| {
      Box::pin(async {
        info!("tick: refreshing the expensive query result");
      })
    })
    .build()?;

  // --- Run for a while, then stop ---
  let running = job.spawn();
  tokio::time::sleep(Duration::from_secs(10)).await;

  let metrics = running.metrics();
  running.shutdown().await?;
  info!(ticks = metrics.ticks_executed, "job stopped");

  Ok(())
}
