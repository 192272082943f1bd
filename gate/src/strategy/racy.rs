//! The unsynchronized lazy gate.
//!
//! Nothing stops two threads from both seeing an empty gate and both
//! constructing. The loser's instance is overwritten ("orphaned"), callers
//! end up holding different identities, and an epoch sees more than one
//! `Constructed` event. The publish itself is still atomic with
//! `Release`/`Acquire`, so the gate is memory-safe; what it lacks is mutual
//! exclusion over check-then-construct.
//!
//! Compiled only with the `racy` feature. Do not use it for anything but
//! demonstrating that failure.

use crate::core::{AccessGate, Provision, Releasable, Slot, Strategy};
use crate::error::{BoxError, GateError};
use crate::handle::{Handle, Identity};
use crate::observer::{LifecycleObserver, TracingObserver};
use crate::strategy::Factory;
use parking_lot::Mutex;
use std::marker::PhantomData;
use std::ptr::{self, NonNull};
use std::sync::atomic::{AtomicPtr, AtomicU64, Ordering};
use std::sync::Arc;

/// An overwritten slot. Other threads may still hold handles into it, so it
/// is kept alive until the next `release`.
struct Orphan<R>(NonNull<Slot<R>>);

// SAFETY: an orphan is an owned `Box<Slot<R>>` in raw form.
unsafe impl<R: Send> Send for Orphan<R> {}

pub struct RacyGate<R> {
  published: AtomicPtr<Slot<R>>,
  epochs: AtomicU64,
  orphans: Mutex<Vec<Orphan<R>>>,
  factory: Factory<R>,
  observer: Arc<dyn LifecycleObserver>,
  _owns: PhantomData<Box<Slot<R>>>,
}

impl<R: Send + Sync> RacyGate<R> {
  pub fn new(factory: impl Fn() -> R + Send + Sync + 'static) -> Self {
    Self::new_fallible(move || Ok::<_, BoxError>(factory()))
  }

  pub fn new_fallible<E>(factory: impl Fn() -> Result<R, E> + Send + Sync + 'static) -> Self
  where
    E: Into<BoxError>,
  {
    Self {
      published: AtomicPtr::new(ptr::null_mut()),
      epochs: AtomicU64::new(0),
      orphans: Mutex::new(Vec::new()),
      factory: Box::new(move || factory().map_err(Into::into)),
      observer: Arc::new(TracingObserver),
      _owns: PhantomData,
    }
  }

  pub fn with_observer(mut self, observer: Arc<dyn LifecycleObserver>) -> Self {
    self.observer = observer;
    self
  }

  /// Number of instances overwritten by a racing construction so far.
  pub fn orphans(&self) -> usize {
    self.orphans.lock().len()
  }
}

impl<R> RacyGate<R> {
  fn provision(&self) -> Provision<'_> {
    Provision {
      strategy: Strategy::Racy,
      observer: &*self.observer,
    }
  }

  fn teardown(&mut self) -> bool {
    let provision = Provision {
      strategy: Strategy::Racy,
      observer: &*self.observer,
    };
    let mut destroyed = false;

    let raw = std::mem::replace(self.published.get_mut(), ptr::null_mut());
    if !raw.is_null() {
      // SAFETY: published pointers come from `Box::into_raw`; `&mut self`
      // rules out live handles.
      provision.destroy(unsafe { Box::from_raw(raw) });
      destroyed = true;
    }
    for Orphan(orphan) in self.orphans.get_mut().drain(..) {
      // SAFETY: as above; each orphan was displaced from `published` once.
      provision.destroy(unsafe { Box::from_raw(orphan.as_ptr()) });
      destroyed = true;
    }
    destroyed
  }
}

impl<R: Send + Sync> AccessGate for RacyGate<R> {
  type Resource = R;

  fn acquire(&self) -> Result<Handle<'_, R>, GateError> {
    let current = self.published.load(Ordering::Acquire);
    // SAFETY: published and orphaned slots are freed only through `&mut self`.
    if let Some(slot) = unsafe { current.as_ref() } {
      return Ok(Handle::new(slot));
    }

    // Any number of threads can be here at once.
    let epoch = self.epochs.load(Ordering::Relaxed) + 1;
    let slot = self.provision().construct_boxed(&*self.factory, epoch)?;
    self.epochs.store(epoch, Ordering::Relaxed);

    let raw = Box::into_raw(slot);
    let displaced = self.published.swap(raw, Ordering::AcqRel);
    if let Some(displaced) = NonNull::new(displaced) {
      tracing::warn!(epoch, "racy gate: constructed instance overwrote a concurrent one");
      self.orphans.lock().push(Orphan(displaced));
    }

    // SAFETY: `raw` stays allocated (published or orphaned) until `&mut self`.
    Ok(Handle::new(unsafe { &*raw }))
  }

  fn strategy(&self) -> Strategy {
    Strategy::Racy
  }

  fn current(&self) -> Option<Identity> {
    let current = self.published.load(Ordering::Acquire);
    // SAFETY: as in `acquire`.
    unsafe { current.as_ref() }.map(|slot| slot.identity())
  }
}

impl<R: Send + Sync> Releasable for RacyGate<R> {
  fn release(&mut self) -> bool {
    self.teardown()
  }
}

impl<R> Drop for RacyGate<R> {
  fn drop(&mut self) {
    self.teardown();
  }
}
