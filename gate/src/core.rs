//! The gate contract plus the non-public slot machinery shared by every strategy.

use crate::error::{AllocError, BoxError, GateError};
use crate::handle::{Handle, Identity};
use crate::observer::{LifecycleEvent, LifecycleObserver};
use std::alloc::{self, Layout};
use std::fmt;
use std::ptr;

/// The synchronization strategy a gate uses to guard first-time construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Strategy {
  /// Check-then-construct with no mutual exclusion. Only available with the
  /// `racy` feature.
  Racy,
  /// One mutex taken on every `acquire()`.
  Locked,
  /// Lock-free fast path, mutex plus re-check on the slow path.
  DoubleChecked,
  /// A block-scoped `static` slot initialized exactly once by `OnceCell`.
  StaticSlot,
  /// Constructed when the gate is created.
  Eager,
}

impl Strategy {
  /// Whether gates of this strategy support [`Releasable::release`].
  pub fn is_releasable(self) -> bool {
    matches!(
      self,
      Strategy::Racy | Strategy::Locked | Strategy::DoubleChecked
    )
  }

  pub fn as_str(self) -> &'static str {
    match self {
      Strategy::Racy => "racy",
      Strategy::Locked => "locked",
      Strategy::DoubleChecked => "double_checked",
      Strategy::StaticSlot => "static",
      Strategy::Eager => "eager",
    }
  }
}

impl fmt::Display for Strategy {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Hands out handles to a shared resource, constructing it on first use.
///
/// Any number of threads may call [`acquire`](AccessGate::acquire)
/// concurrently. Within one epoch every successful call returns a handle to
/// the same instance, and no caller receives a handle before that instance is
/// fully constructed.
pub trait AccessGate: Sync {
  type Resource: Send + Sync;

  /// Returns a handle to the current epoch's resource, constructing it if the
  /// gate is empty.
  fn acquire(&self) -> Result<Handle<'_, Self::Resource>, GateError>;

  fn strategy(&self) -> Strategy;

  /// The identity of the current resource, if one exists. Never constructs.
  fn current(&self) -> Option<Identity>;
}

/// A gate whose resource can be torn down and later rebuilt.
///
/// `release` takes `&mut self`: every [`Handle`] borrows its gate, so the
/// borrow checker guarantees no handle of the current epoch is still alive.
pub trait Releasable: AccessGate {
  /// Destroys the current resource, if any, and resets the gate so the next
  /// `acquire()` starts a new epoch. Returns `true` if a resource was destroyed.
  fn release(&mut self) -> bool;
}

/// Heap cell holding one epoch's resource.
pub(crate) struct Slot<R> {
  pub(crate) epoch: u64,
  pub(crate) resource: R,
}

impl<R> Slot<R> {
  pub(crate) fn identity(&self) -> Identity {
    Identity::new(self.epoch, ptr::addr_of!(self.resource) as usize)
  }
}

/// Moves `slot` to the heap, reporting allocation failure instead of aborting.
pub(crate) fn try_box<R>(slot: Slot<R>) -> Result<Box<Slot<R>>, AllocError> {
  // `Slot` always carries a `u64`, so the layout is never zero-sized.
  let layout = Layout::new::<Slot<R>>();
  // SAFETY: the layout has a non-zero size.
  let raw = unsafe { alloc::alloc(layout) } as *mut Slot<R>;
  if raw.is_null() {
    return Err(AllocError {
      size: layout.size(),
    });
  }
  // SAFETY: `raw` is a fresh allocation with the layout of `Slot<R>`; writing
  // initializes it and `Box::from_raw` takes ownership with the global allocator.
  unsafe {
    raw.write(slot);
    Ok(Box::from_raw(raw))
  }
}

/// Construction and destruction bookkeeping for one gate.
pub(crate) struct Provision<'a> {
  pub(crate) strategy: Strategy,
  pub(crate) observer: &'a dyn LifecycleObserver,
}

impl Provision<'_> {
  /// Runs the factory for `epoch`, boxes the result and announces it.
  ///
  /// The `Constructed` event is recorded before this returns, so it always
  /// precedes the gate publishing the slot to other threads.
  pub(crate) fn construct_boxed<R, E, F>(
    &self,
    factory: F,
    epoch: u64,
  ) -> Result<Box<Slot<R>>, GateError>
  where
    F: FnOnce() -> Result<R, E>,
    E: Into<BoxError>,
  {
    tracing::debug!(strategy = %self.strategy, epoch, "constructing shared resource");

    let resource = factory().map_err(|e| self.failed(epoch, e.into()))?;
    let slot = try_box(Slot { epoch, resource }).map_err(|e| self.failed(epoch, Box::new(e)))?;

    let identity = slot.identity();
    tracing::info!(strategy = %self.strategy, %identity, "shared resource constructed");
    self.observer.on_event(&LifecycleEvent::Constructed {
      strategy: self.strategy,
      identity,
    });
    Ok(slot)
  }

  /// Drops `slot` and announces the destruction.
  pub(crate) fn destroy<R>(&self, slot: Box<Slot<R>>) {
    let identity = slot.identity();
    drop(slot);
    tracing::info!(strategy = %self.strategy, %identity, "shared resource destroyed");
    self.observer.on_event(&LifecycleEvent::Destroyed {
      strategy: self.strategy,
      identity,
    });
  }

  fn failed(&self, epoch: u64, source: BoxError) -> GateError {
    tracing::warn!(
      strategy = %self.strategy,
      epoch,
      error = %source,
      "shared resource construction failed"
    );
    self.observer.on_event(&LifecycleEvent::ConstructionFailed {
      strategy: self.strategy,
      epoch,
      reason: source.to_string(),
    });
    GateError::ResourceUnavailable {
      strategy: self.strategy,
      epoch,
      source,
    }
  }
}
