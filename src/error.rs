use core::fmt;

use thiserror::Error;

/// Errors that reject a job configuration during `IntervalJobBuilder::build`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
  #[error("job interval must be greater than zero")]
  ZeroInterval,
  #[error("job has no task to execute")]
  MissingTask,
  #[error("distributed locking requires a non-empty job name")]
  MissingName,
}

/// Errors surfaced by a lease backend.
///
/// A denied lease is *not* an error: `LockProvider::acquire` reports it as
/// `Ok(false)`. These variants cover the cases where the backend could not
/// answer at all.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LockError {
  /// The backend could not be reached or set up.
  #[error("lease backend connection failed: {0}")]
  Connection(String),
  /// A request failed after the connection was established.
  #[error("lease backend request failed: {0}")]
  Backend(String),
}

impl LockError {
  pub(crate) fn connection(err: impl fmt::Display) -> Self {
    LockError::Connection(err.to_string())
  }

  pub(crate) fn backend(err: impl fmt::Display) -> Self {
    LockError::Backend(err.to_string())
  }
}

/// Errors from winding down a job spawned via `IntervalJob::spawn`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ShutdownError {
  /// The scheduling loop had already stopped with a fatal backend error.
  #[error(transparent)]
  Lock(#[from] LockError),
  /// The scheduler task panicked (a panicking tick task unwinds the loop).
  #[error("scheduler task panicked")]
  TaskPanic,
}
