//! Double-checked locking, done with an atomic publish.
//!
//! The published pointer doubles as the "completed" flag. It is written with
//! `Release` only after the slot is fully built (and its `Constructed` event
//! recorded), and read with `Acquire` on the fast path, so any thread that
//! sees a non-null pointer also sees everything the constructor wrote.

use crate::core::{AccessGate, Provision, Releasable, Slot, Strategy};
use crate::error::{BoxError, GateError};
use crate::handle::{Handle, Identity};
use crate::observer::{LifecycleObserver, TracingObserver};
use crate::strategy::Factory;
use parking_lot::Mutex;
use std::marker::PhantomData;
use std::ptr;
use std::sync::atomic::{AtomicPtr, Ordering};
use std::sync::Arc;

/// Lock-free once the resource exists; takes a lock only on calls that race
/// the first construction of an epoch.
pub struct DoubleCheckedGate<R> {
  published: AtomicPtr<Slot<R>>,
  // Guards construction; holds the number of epochs started so far.
  epochs: Mutex<u64>,
  factory: Factory<R>,
  observer: Arc<dyn LifecycleObserver>,
  _owns: PhantomData<Box<Slot<R>>>,
}

impl<R: Send + Sync> DoubleCheckedGate<R> {
  pub fn new(factory: impl Fn() -> R + Send + Sync + 'static) -> Self {
    Self::new_fallible(move || Ok::<_, BoxError>(factory()))
  }

  pub fn new_fallible<E>(factory: impl Fn() -> Result<R, E> + Send + Sync + 'static) -> Self
  where
    E: Into<BoxError>,
  {
    Self {
      published: AtomicPtr::new(ptr::null_mut()),
      epochs: Mutex::new(0),
      factory: Box::new(move || factory().map_err(Into::into)),
      observer: Arc::new(TracingObserver),
      _owns: PhantomData,
    }
  }

  pub fn with_observer(mut self, observer: Arc<dyn LifecycleObserver>) -> Self {
    self.observer = observer;
    self
  }

  #[cold]
  fn acquire_slow(&self) -> Result<Handle<'_, R>, GateError> {
    let mut epochs = self.epochs.lock();

    // Someone may have finished constructing while we waited for the lock.
    let current = self.published.load(Ordering::Acquire);
    // SAFETY: see `acquire`.
    if let Some(slot) = unsafe { current.as_ref() } {
      tracing::trace!("double-checked gate: resource published while waiting for lock");
      return Ok(Handle::new(slot));
    }

    let epoch = *epochs + 1;
    let slot = self.provision().construct_boxed(&*self.factory, epoch)?;
    *epochs = epoch;

    let raw = Box::into_raw(slot);
    self.published.store(raw, Ordering::Release);
    drop(epochs);

    // SAFETY: `raw` came from `Box::into_raw` above and stays allocated until
    // `release`/`drop`, which need `&mut self`.
    Ok(Handle::new(unsafe { &*raw }))
  }
}

impl<R> DoubleCheckedGate<R> {
  fn provision(&self) -> Provision<'_> {
    Provision {
      strategy: Strategy::DoubleChecked,
      observer: &*self.observer,
    }
  }

  fn teardown(&mut self) -> bool {
    let raw = std::mem::replace(self.published.get_mut(), ptr::null_mut());
    if raw.is_null() {
      return false;
    }
    // SAFETY: a non-null published pointer always comes from `Box::into_raw`,
    // and `&mut self` rules out any live handle.
    let slot = unsafe { Box::from_raw(raw) };
    self.provision().destroy(slot);
    true
  }
}

impl<R: Send + Sync> AccessGate for DoubleCheckedGate<R> {
  type Resource = R;

  #[inline]
  fn acquire(&self) -> Result<Handle<'_, R>, GateError> {
    let current = self.published.load(Ordering::Acquire);
    // SAFETY: non-null pointers are only stored after the slot is fully
    // initialized, with `Release` ordering paired with this `Acquire` load.
    // The slot is freed only through `&mut self`.
    match unsafe { current.as_ref() } {
      Some(slot) => Ok(Handle::new(slot)),
      None => self.acquire_slow(),
    }
  }

  fn strategy(&self) -> Strategy {
    Strategy::DoubleChecked
  }

  fn current(&self) -> Option<Identity> {
    let current = self.published.load(Ordering::Acquire);
    // SAFETY: as in `acquire`.
    unsafe { current.as_ref() }.map(|slot| slot.identity())
  }
}

impl<R: Send + Sync> Releasable for DoubleCheckedGate<R> {
  fn release(&mut self) -> bool {
    self.teardown()
  }
}

impl<R> Drop for DoubleCheckedGate<R> {
  fn drop(&mut self) {
    self.teardown();
  }
}
