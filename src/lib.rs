//! tickfence: a lease-guarded interval scheduler for Tokio.
//!
//! Runs a caller-supplied async task on a fixed interval while guaranteeing
//! that, across any number of replicas of the same logical job, at most one
//! replica executes the task per interval window. Replicas coordinate only
//! through a named lease in an external store (there is no inter-replica
//! communication), so a job can be deployed redundantly for availability
//! while still behaving as a singleton (no double-billing, no duplicate
//! emails).
//!
//! # Lease backends
//!
//! - Redis ([`lock::redis::RedisLock`], feature `redis-lock`, default):
//!   atomic `SET NX PX` with native expiry; a crashed holder's lease heals
//!   itself. The reference semantics.
//! - DynamoDB ([`lock::dynamodb::DynamoLock`], feature `dynamodb-lock`,
//!   default): conditional `PutItem` insert-if-absent.
//! - Postgres ([`lock::postgres::PostgresLock`], feature `postgres-lock`,
//!   default): insert arbitrated by a unique key constraint.
//! - In-process ([`lock::memory::MemoryLock`]): shared lease map for
//!   single-process use and tests.
//!
//! The table-backed strategies have no native expiry: a replica that crashes
//! while holding a lease strands it until an operator (or future tooling)
//! clears the row.
//!
//! # Tick semantics
//!
//! - The first tick fires one full interval after `run` is called, never
//!   immediately.
//! - Deadlines advance monotonically by one interval each; a slow task
//!   delays later ticks but the period never drifts.
//! - Missed ticks (a denied lease, a task outrunning the interval, a
//!   suspended process) are dropped, never queued or replayed.
//! - Cancellation is cooperative and observed between ticks; in-flight work
//!   completes first.
//! - A lease denial skips the tick silently; a backend that cannot answer
//!   acquire at all stops the loop, because exclusivity can no longer be
//!   guaranteed.
//!
//! # Usage
//!
//! ```no_run
//! use std::time::Duration;
//! use tickfence::{IntervalJob, LockVendor, RedisLockConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!   let job = IntervalJob::builder()
//!     .name("nightly-invoice")
//!     .interval(Duration::from_secs(60))
//!     .vendor(LockVendor::Redis(RedisLockConfig::default()))
//!     .task(|| {
//!       Box::pin(async {
//!         println!("invoice sweep running");
//!       })
//!     })
//!     .build()?;
//!
//!   let running = job.spawn();
//!
//!   tokio::time::sleep(Duration::from_secs(300)).await;
//!   running.shutdown().await?;
//!   Ok(())
//! }
//! ```
//!
//! For full control over cancellation, call [`IntervalJob::run`] with your
//! own `tokio::sync::watch` receiver instead of `spawn`.

// Declare modules within the crate
pub mod error;
pub mod job;
pub mod lock;
pub mod metrics;
pub mod scheduler;

// --- Public Re-exports ---

// Core scheduler components
pub use scheduler::{IntervalJob, RunningJob};

// Job related types
pub use job::{BoxedTickFn, IntervalJobBuilder};

// Lock provider abstraction and backends
pub use lock::memory::MemoryLock;
pub use lock::{lease_key, LockProvider, LockVendor};

#[cfg(feature = "dynamodb-lock")]
pub use lock::dynamodb::DynamoLockConfig;
#[cfg(feature = "postgres-lock")]
pub use lock::postgres::PostgresLockConfig;
#[cfg(feature = "redis-lock")]
pub use lock::redis::RedisLockConfig;

// Error types
pub use error::{ConfigError, LockError, ShutdownError};

// Metrics related types
pub use metrics::{JobMetrics, MetricsSnapshot};
