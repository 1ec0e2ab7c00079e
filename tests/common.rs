//! tests/common.rs
//! Shared helper functions for integration tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tickfence::BoxedTickFn;
use tracing_subscriber::fmt::TestWriter;

// Initializes tracing subscriber for test output.
pub fn setup_tracing() {
  // Use try_init to avoid panic if called multiple times
  let _ = tracing_subscriber::fmt()
    .with_max_level(tracing::Level::DEBUG)
    .with_writer(TestWriter::new())
    .with_test_writer()
    .try_init();
}

// Tick task that bumps a counter and optionally simulates work.
pub fn counting_task(counter: Arc<AtomicUsize>, delay: Duration) -> BoxedTickFn {
  Box::new(move || {
    let counter = counter.clone();
    Box::pin(async move {
      let count = counter.fetch_add(1, Ordering::SeqCst) + 1;
      tracing::debug!("tick task executing (count: {})", count);
      if delay > Duration::ZERO {
        tokio::time::sleep(delay).await;
      }
    })
  })
}
