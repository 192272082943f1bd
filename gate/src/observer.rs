//! The diagnostic side channel.
//!
//! Gates report construction, destruction and construction failure through a
//! [`LifecycleObserver`]; the worker harness reports worker start the same way.
//! Observers serialize their own output and never share a lock with a gate.

use crate::core::Strategy;
use crate::handle::Identity;
use parking_lot::Mutex;
use std::fmt;
use std::io::{self, Write};
use std::sync::Arc;

/// One observable lifecycle event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleEvent {
  Constructed { strategy: Strategy, identity: Identity },
  Destroyed { strategy: Strategy, identity: Identity },
  ConstructionFailed { strategy: Strategy, epoch: u64, reason: String },
  WorkerStarted { worker: usize },
}

impl fmt::Display for LifecycleEvent {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      LifecycleEvent::Constructed { strategy, identity } => {
        write!(f, "[{}] constructed resource ({})", strategy, identity)
      }
      LifecycleEvent::Destroyed { strategy, identity } => {
        write!(f, "[{}] destroyed resource ({})", strategy, identity)
      }
      LifecycleEvent::ConstructionFailed {
        strategy,
        epoch,
        reason,
      } => write!(
        f,
        "[{}] construction failed in epoch {}: {}",
        strategy, epoch, reason
      ),
      LifecycleEvent::WorkerStarted { worker } => write!(f, "worker [{}] started", worker),
    }
  }
}

/// Receives lifecycle events. Called from any thread, possibly while a gate
/// holds its construction lock, so implementations must not call back into
/// the gate.
pub trait LifecycleObserver: Send + Sync {
  fn on_event(&self, event: &LifecycleEvent);
}

/// Forwards events to `tracing`. The default observer for every gate.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl LifecycleObserver for TracingObserver {
  fn on_event(&self, event: &LifecycleEvent) {
    match event {
      LifecycleEvent::ConstructionFailed { .. } => {
        tracing::warn!(target: "fibre_gate::lifecycle", "{}", event)
      }
      _ => tracing::info!(target: "fibre_gate::lifecycle", "{}", event),
    }
  }
}

/// Writes one line per event to `W` under a dedicated output lock.
pub struct ConsoleObserver<W> {
  output: Mutex<W>,
}

impl ConsoleObserver<io::Stdout> {
  pub fn stdout() -> Self {
    Self::new(io::stdout())
  }
}

impl<W: Write + Send> ConsoleObserver<W> {
  pub fn new(writer: W) -> Self {
    Self {
      output: Mutex::new(writer),
    }
  }

  pub fn into_inner(self) -> W {
    self.output.into_inner()
  }
}

impl<W: Write + Send> LifecycleObserver for ConsoleObserver<W> {
  fn on_event(&self, event: &LifecycleEvent) {
    let mut output = self.output.lock();
    if let Err(e) = writeln!(output, "{}", event).and_then(|_| output.flush()) {
      tracing::warn!(error = %e, "failed to write lifecycle event");
    }
  }
}

/// Keeps every event in memory. Used to assert on event counts.
#[derive(Default)]
pub struct RecordingObserver {
  events: Mutex<Vec<LifecycleEvent>>,
}

impl RecordingObserver {
  /// Usable in `static` items.
  pub const fn new() -> Self {
    Self {
      events: parking_lot::const_mutex(Vec::new()),
    }
  }

  pub fn events(&self) -> Vec<LifecycleEvent> {
    self.events.lock().clone()
  }

  pub fn clear(&self) {
    self.events.lock().clear();
  }

  pub fn constructed(&self) -> usize {
    self.count(|e| matches!(e, LifecycleEvent::Constructed { .. }))
  }

  pub fn destroyed(&self) -> usize {
    self.count(|e| matches!(e, LifecycleEvent::Destroyed { .. }))
  }

  pub fn failures(&self) -> usize {
    self.count(|e| matches!(e, LifecycleEvent::ConstructionFailed { .. }))
  }

  pub fn workers_started(&self) -> usize {
    self.count(|e| matches!(e, LifecycleEvent::WorkerStarted { .. }))
  }

  /// Identities of every `Constructed` event, in recording order.
  pub fn constructed_identities(&self) -> Vec<Identity> {
    self
      .events
      .lock()
      .iter()
      .filter_map(|e| match e {
        LifecycleEvent::Constructed { identity, .. } => Some(*identity),
        _ => None,
      })
      .collect()
  }

  pub fn destroyed_identities(&self) -> Vec<Identity> {
    self
      .events
      .lock()
      .iter()
      .filter_map(|e| match e {
        LifecycleEvent::Destroyed { identity, .. } => Some(*identity),
        _ => None,
      })
      .collect()
  }

  fn count(&self, pred: impl Fn(&LifecycleEvent) -> bool) -> usize {
    self.events.lock().iter().filter(|e| pred(e)).count()
  }
}

impl LifecycleObserver for RecordingObserver {
  fn on_event(&self, event: &LifecycleEvent) {
    self.events.lock().push(event.clone());
  }
}

/// Delivers every event to each inner observer in order.
#[derive(Default, Clone)]
pub struct FanoutObserver {
  observers: Vec<Arc<dyn LifecycleObserver>>,
}

impl FanoutObserver {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with(mut self, observer: Arc<dyn LifecycleObserver>) -> Self {
    self.observers.push(observer);
    self
  }
}

impl LifecycleObserver for FanoutObserver {
  fn on_event(&self, event: &LifecycleEvent) {
    for observer in &self.observers {
      observer.on_event(event);
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn constructed(epoch: u64) -> LifecycleEvent {
    LifecycleEvent::Constructed {
      strategy: Strategy::Locked,
      identity: Identity::new(epoch, 0xbeef),
    }
  }

  #[test]
  fn console_observer_writes_one_line_per_event() {
    let console = ConsoleObserver::new(Vec::new());
    console.on_event(&constructed(1));
    console.on_event(&LifecycleEvent::WorkerStarted { worker: 4 });

    let text = String::from_utf8(console.into_inner()).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0], "[locked] constructed resource (epoch 1 @ 0xbeef)");
    assert_eq!(lines[1], "worker [4] started");
  }

  #[test]
  fn recording_observer_counts_by_kind() {
    let recorder = RecordingObserver::new();
    recorder.on_event(&constructed(1));
    recorder.on_event(&LifecycleEvent::Destroyed {
      strategy: Strategy::Locked,
      identity: Identity::new(1, 0xbeef),
    });
    recorder.on_event(&constructed(2));

    assert_eq!(recorder.constructed(), 2);
    assert_eq!(recorder.destroyed(), 1);
    assert_eq!(recorder.failures(), 0);
    assert_eq!(
      recorder.constructed_identities(),
      vec![Identity::new(1, 0xbeef), Identity::new(2, 0xbeef)]
    );

    recorder.clear();
    assert!(recorder.events().is_empty());
  }

  #[test]
  fn fanout_reaches_every_observer() {
    let a = Arc::new(RecordingObserver::new());
    let b = Arc::new(RecordingObserver::new());
    let fanout = FanoutObserver::new().with(a.clone()).with(b.clone());

    fanout.on_event(&LifecycleEvent::WorkerStarted { worker: 0 });

    assert_eq!(a.workers_started(), 1);
    assert_eq!(b.workers_started(), 1);
  }
}
