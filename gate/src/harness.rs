//! A fixed pool of concurrent callers used to exercise a gate under contention.

use crate::core::AccessGate;
use crate::error::{GateError, HarnessError};
use crate::handle::Identity;
use crate::observer::{LifecycleEvent, LifecycleObserver};
use parking_lot::RwLock;
use std::thread;

/// What one worker saw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerOutcome {
  pub worker: usize,
  pub identity: Identity,
}

/// Outcomes of one harness run, ordered by worker index.
#[derive(Debug, Clone, Default)]
pub struct HarnessReport {
  outcomes: Vec<WorkerOutcome>,
}

impl HarnessReport {
  pub fn outcomes(&self) -> &[WorkerOutcome] {
    &self.outcomes
  }

  pub fn identities(&self) -> impl Iterator<Item = Identity> + '_ {
    self.outcomes.iter().map(|o| o.identity)
  }

  /// Every distinct identity observed, sorted.
  pub fn distinct_identities(&self) -> Vec<Identity> {
    let mut ids: Vec<Identity> = self.identities().collect();
    ids.sort_unstable();
    ids.dedup();
    ids
  }

  /// `true` when all workers saw the same instance.
  pub fn is_consistent(&self) -> bool {
    self.distinct_identities().len() == 1
  }
}

/// Spawns `workers` scoped threads that each acquire the gate once.
///
/// Each worker reports [`LifecycleEvent::WorkerStarted`] through the observer,
/// acquires, reads the identity and exits. With the start line enabled (the
/// default) no worker calls `acquire()` until every worker has been spawned,
/// so they all race the first construction.
#[derive(Debug, Clone)]
pub struct WorkerHarness {
  workers: usize,
  start_line: bool,
  stack_size: Option<usize>,
}

impl WorkerHarness {
  pub fn new(workers: usize) -> Self {
    Self {
      workers,
      start_line: true,
      stack_size: None,
    }
  }

  pub fn with_start_line(mut self, enabled: bool) -> Self {
    self.start_line = enabled;
    self
  }

  /// Stack size for every worker thread. Defaults to the platform's.
  pub fn with_stack_size(mut self, bytes: usize) -> Self {
    self.stack_size = Some(bytes);
    self
  }

  pub fn workers(&self) -> usize {
    self.workers
  }

  /// Runs the pool against `gate` and waits for every worker.
  ///
  /// Spawn failure is fatal: workers already spawned are told to stand down
  /// without acquiring, and the spawn error is returned. Otherwise the first
  /// worker failure in index order is returned.
  pub fn run<G: AccessGate>(
    &self,
    gate: &G,
    observer: &dyn LifecycleObserver,
  ) -> Result<HarnessReport, HarnessError> {
    // Held for writing while workers are spawned; `true` once all are up.
    let start = RwLock::new(!self.start_line);

    thread::scope(|scope| {
      let line = self.start_line.then(|| start.write());
      let mut handles = Vec::with_capacity(self.workers);

      for worker in 0..self.workers {
        let start = &start;
        let mut builder = thread::Builder::new().name(format!("gate-worker-{}", worker));
        if let Some(bytes) = self.stack_size {
          builder = builder.stack_size(bytes);
        }
        let spawned = builder.spawn_scoped(scope, move || -> Result<Option<Identity>, GateError> {
          observer.on_event(&LifecycleEvent::WorkerStarted { worker });
          if !*start.read() {
            return Ok(None);
          }
          let handle = gate.acquire()?;
          Ok(Some(handle.identity()))
        });

        match spawned {
          Ok(handle) => handles.push((worker, handle)),
          Err(source) => {
            // Dropping the line with `false` still in place sends the
            // spawned workers home without acquiring.
            tracing::error!(worker, error = %source, "failed to spawn worker");
            return Err(HarnessError::Spawn { worker, source });
          }
        }
      }

      if let Some(mut line) = line {
        *line = true;
      }
      tracing::debug!(workers = self.workers, "all workers released");

      let mut outcomes = Vec::with_capacity(self.workers);
      let mut first_error = None;
      for (worker, handle) in handles {
        let error = match handle.join() {
          Ok(Ok(Some(identity))) => {
            outcomes.push(WorkerOutcome { worker, identity });
            continue;
          }
          Ok(Ok(None)) => continue,
          Ok(Err(source)) => HarnessError::Acquire { worker, source },
          Err(_) => HarnessError::WorkerPanicked { worker },
        };
        tracing::error!(%error, "worker failed");
        if first_error.is_none() {
          first_error = Some(error);
        }
      }

      match first_error {
        Some(error) => Err(error),
        None => Ok(HarnessReport { outcomes }),
      }
    })
  }
}
