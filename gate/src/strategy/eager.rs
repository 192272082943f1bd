//! Eager gate: the resource exists before anyone can call `acquire()`.

use crate::core::{AccessGate, Provision, Slot, Strategy};
use crate::error::{BoxError, GateError};
use crate::handle::{Handle, Identity};
use crate::observer::{LifecycleObserver, TracingObserver};
use std::mem::ManuallyDrop;
use std::sync::Arc;

/// Constructs its resource in the constructor. `acquire()` never blocks and
/// never fails; the resource is destroyed when the gate is dropped.
///
/// The resource is built even if nobody ever acquires it.
pub struct EagerGate<R> {
  slot: ManuallyDrop<Box<Slot<R>>>,
  observer: Arc<dyn LifecycleObserver>,
}

impl<R: Send + Sync> EagerGate<R> {
  pub fn new(factory: impl FnOnce() -> R) -> Result<Self, GateError> {
    Self::build(move || Ok::<_, BoxError>(factory()), Arc::new(TracingObserver))
  }

  /// Constructs the resource with a fallible factory, reporting to `observer`.
  pub fn build<E>(
    factory: impl FnOnce() -> Result<R, E>,
    observer: Arc<dyn LifecycleObserver>,
  ) -> Result<Self, GateError>
  where
    E: Into<BoxError>,
  {
    let slot = Provision {
      strategy: Strategy::Eager,
      observer: &*observer,
    }
    .construct_boxed(factory, 1)?;

    Ok(Self {
      slot: ManuallyDrop::new(slot),
      observer,
    })
  }

  /// Infallible shorthand for `acquire()`.
  pub fn get(&self) -> Handle<'_, R> {
    Handle::new(&self.slot)
  }
}

impl<R: Send + Sync> AccessGate for EagerGate<R> {
  type Resource = R;

  #[inline]
  fn acquire(&self) -> Result<Handle<'_, R>, GateError> {
    Ok(self.get())
  }

  fn strategy(&self) -> Strategy {
    Strategy::Eager
  }

  fn current(&self) -> Option<Identity> {
    Some(self.slot.identity())
  }
}

impl<R> Drop for EagerGate<R> {
  fn drop(&mut self) {
    // SAFETY: the slot is taken exactly once, here, and never touched again.
    let slot = unsafe { ManuallyDrop::take(&mut self.slot) };
    Provision {
      strategy: Strategy::Eager,
      observer: &*self.observer,
    }
    .destroy(slot);
  }
}
