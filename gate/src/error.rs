//! Error types surfaced by gates and the worker harness.

use crate::core::Strategy;
use std::io;
use thiserror::Error;

/// Boxed error returned by a resource factory.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors returned by [`AccessGate::acquire`](crate::AccessGate::acquire).
#[derive(Debug, Error)]
pub enum GateError {
  /// The resource could not be constructed, either because its factory failed
  /// or because its storage could not be allocated.
  ///
  /// The gate is left empty and its epoch counter untouched; the next
  /// `acquire()` tries again. Retrying is the caller's decision.
  #[error("shared resource unavailable ({strategy} gate, epoch {epoch}): {source}")]
  ResourceUnavailable {
    strategy: Strategy,
    epoch: u64,
    #[source]
    source: BoxError,
  },
}

impl GateError {
  /// The epoch whose construction failed.
  pub fn epoch(&self) -> u64 {
    match self {
      GateError::ResourceUnavailable { epoch, .. } => *epoch,
    }
  }
}

/// Storage for a resource slot could not be allocated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("failed to allocate {size} bytes for a shared resource slot")]
pub struct AllocError {
  pub size: usize,
}

/// Errors returned by [`WorkerHarness::run`](crate::WorkerHarness::run).
#[derive(Debug, Error)]
pub enum HarnessError {
  /// A worker thread could not be spawned. Fatal; never retried.
  #[error("failed to spawn worker {worker}: {source}")]
  Spawn {
    worker: usize,
    #[source]
    source: io::Error,
  },

  #[error("worker {worker} could not acquire the shared resource: {source}")]
  Acquire {
    worker: usize,
    #[source]
    source: GateError,
  },

  #[error("worker {worker} panicked")]
  WorkerPanicked { worker: usize },
}

/// A specialized `Result` type for gate operations.
pub type Result<T, E = GateError> = std::result::Result<T, E>;
