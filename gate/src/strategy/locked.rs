//! Mutex-guarded lazy gate.

use crate::core::{AccessGate, Provision, Releasable, Slot, Strategy};
use crate::error::{BoxError, GateError};
use crate::handle::{Handle, Identity};
use crate::observer::{LifecycleObserver, TracingObserver};
use crate::strategy::Factory;
use parking_lot::Mutex;
use std::sync::Arc;

struct LockedState<R> {
  slot: Option<Box<Slot<R>>>,
  epochs: u64,
}

/// Takes one exclusive lock on every `acquire()`, including all calls after
/// the resource exists.
///
/// Always correct, but every caller pays for the lock.
pub struct LockedGate<R> {
  state: Mutex<LockedState<R>>,
  factory: Factory<R>,
  observer: Arc<dyn LifecycleObserver>,
}

impl<R: Send + Sync> LockedGate<R> {
  /// Creates an empty gate whose resource is built by `factory`.
  pub fn new(factory: impl Fn() -> R + Send + Sync + 'static) -> Self {
    Self::new_fallible(move || Ok::<_, BoxError>(factory()))
  }

  /// Creates an empty gate whose factory may fail.
  pub fn new_fallible<E>(factory: impl Fn() -> Result<R, E> + Send + Sync + 'static) -> Self
  where
    E: Into<BoxError>,
  {
    Self {
      state: Mutex::new(LockedState {
        slot: None,
        epochs: 0,
      }),
      factory: Box::new(move || factory().map_err(Into::into)),
      observer: Arc::new(TracingObserver),
    }
  }

  pub fn with_observer(mut self, observer: Arc<dyn LifecycleObserver>) -> Self {
    self.observer = observer;
    self
  }
}

impl<R> LockedGate<R> {
  fn provision(&self) -> Provision<'_> {
    Provision {
      strategy: Strategy::Locked,
      observer: &*self.observer,
    }
  }

  fn teardown(&mut self) -> bool {
    match self.state.get_mut().slot.take() {
      Some(slot) => {
        self.provision().destroy(slot);
        true
      }
      None => false,
    }
  }
}

impl<R: Send + Sync> AccessGate for LockedGate<R> {
  type Resource = R;

  fn acquire(&self) -> Result<Handle<'_, R>, GateError> {
    let mut state = self.state.lock();
    let slot: *const Slot<R> = match state.slot.as_deref() {
      Some(slot) => slot,
      None => {
        let epoch = state.epochs + 1;
        let slot = self.provision().construct_boxed(&*self.factory, epoch)?;
        state.epochs = epoch;
        &**state.slot.insert(slot)
      }
    };
    drop(state);

    // SAFETY: the slot is heap allocated and is only freed by `release` or
    // `drop`, both of which need `&mut self`. The returned handle borrows
    // `self`, so the slot outlives it.
    Ok(Handle::new(unsafe { &*slot }))
  }

  fn strategy(&self) -> Strategy {
    Strategy::Locked
  }

  fn current(&self) -> Option<Identity> {
    self.state.lock().slot.as_ref().map(|slot| slot.identity())
  }
}

impl<R: Send + Sync> Releasable for LockedGate<R> {
  fn release(&mut self) -> bool {
    self.teardown()
  }
}

impl<R> Drop for LockedGate<R> {
  fn drop(&mut self) {
    self.teardown();
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::observer::RecordingObserver;

  #[test]
  fn current_does_not_construct() {
    let recorder = Arc::new(RecordingObserver::new());
    let gate = LockedGate::new(|| 5_u8).with_observer(recorder.clone());

    assert!(gate.current().is_none());
    let handle = gate.acquire().unwrap();
    assert_eq!(gate.current(), Some(handle.identity()));
    assert_eq!(recorder.constructed(), 1);
  }

  #[test]
  fn drop_destroys_live_resource() {
    let recorder = Arc::new(RecordingObserver::new());
    {
      let gate = LockedGate::new(|| String::from("x")).with_observer(recorder.clone());
      gate.acquire().unwrap();
    }
    assert_eq!(recorder.destroyed(), 1);
  }
}
