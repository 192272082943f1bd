//! Explicit teardown for releasable gates.

use crate::core::Releasable;

/// Drives the epochs of one releasable gate.
///
/// The controller holds the gate exclusively. [`gate`](Self::gate) lends it
/// out for shared use; because every handle borrows from that loan,
/// [`release`](Self::release) cannot be called while any handle from the
/// current epoch is alive.
///
/// ```
/// use fibre_gate::{AccessGate, LifecycleController, LockedGate};
///
/// let mut gate = LockedGate::new(|| vec![0u8; 16]);
/// let mut controller = LifecycleController::new(&mut gate);
///
/// let first = controller.gate().acquire().unwrap().identity();
/// assert!(controller.release());
/// assert!(!controller.release());
///
/// let second = controller.gate().acquire().unwrap().identity();
/// assert_ne!(first, second);
/// ```
pub struct LifecycleController<'a, G> {
  gate: &'a mut G,
}

impl<'a, G: Releasable> LifecycleController<'a, G> {
  pub fn new(gate: &'a mut G) -> Self {
    Self { gate }
  }

  pub fn gate(&self) -> &G {
    &*self.gate
  }

  /// Destroys the current resource and resets the gate. A no-op returning
  /// `false` when nothing was constructed.
  pub fn release(&mut self) -> bool {
    let released = self.gate.release();
    if !released {
      tracing::debug!(strategy = %self.gate.strategy(), "release on empty gate");
    }
    released
  }

  /// Runs `f` against the gate, then releases it. Returns `f`'s output and
  /// whether a resource was destroyed.
  pub fn run_epoch<T>(&mut self, f: impl FnOnce(&G) -> T) -> (T, bool) {
    let output = f(&*self.gate);
    (output, self.release())
  }
}

/// Releases `gate` directly.
pub fn release<G: Releasable>(gate: &mut G) -> bool {
  LifecycleController::new(gate).release()
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::core::AccessGate;
  use crate::observer::RecordingObserver;
  use crate::strategy::DoubleCheckedGate;
  use std::sync::Arc;

  #[test]
  fn run_epoch_releases_after_use() {
    let recorder = Arc::new(RecordingObserver::new());
    let mut gate = DoubleCheckedGate::new(|| 11_u64).with_observer(recorder.clone());
    let mut controller = LifecycleController::new(&mut gate);

    let (value, released) = controller.run_epoch(|gate| *gate.acquire().unwrap());
    assert_eq!(value, 11);
    assert!(released);

    let (_, released) = controller.run_epoch(|_| ());
    assert!(!released);

    assert_eq!(recorder.constructed(), 1);
    assert_eq!(recorder.destroyed(), 1);
  }

  #[test]
  fn free_release_is_idempotent() {
    let mut gate = DoubleCheckedGate::new(|| 1_u8);
    assert!(!release(&mut gate));
    gate.acquire().unwrap();
    assert!(release(&mut gate));
    assert!(!release(&mut gate));
  }
}
