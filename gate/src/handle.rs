//! Borrowed handles to a gate's resource and the identity they expose.

use crate::core::Slot;
use std::fmt;
use std::ops::Deref;

/// Observable identity of one constructed resource.
///
/// `address` is where the resource lives; `epoch` is the gate's 1-based
/// construction count. Two identities from different epochs never compare
/// equal, even when the allocator hands back the same address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Identity {
  epoch: u64,
  address: usize,
}

impl Identity {
  pub(crate) fn new(epoch: u64, address: usize) -> Self {
    Self { epoch, address }
  }

  pub fn epoch(&self) -> u64 {
    self.epoch
  }

  pub fn address(&self) -> usize {
    self.address
  }
}

impl fmt::Display for Identity {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "epoch {} @ {:#x}", self.epoch, self.address)
  }
}

/// A non-owning reference to the current epoch's resource.
///
/// The handle borrows the gate it came from, so it cannot outlive the epoch:
/// releasing the gate requires exclusive access.
pub struct Handle<'g, R> {
  slot: &'g Slot<R>,
}

impl<'g, R> Handle<'g, R> {
  pub(crate) fn new(slot: &'g Slot<R>) -> Self {
    Self { slot }
  }

  pub fn identity(&self) -> Identity {
    self.slot.identity()
  }

  pub fn epoch(&self) -> u64 {
    self.slot.epoch
  }

  /// Returns the underlying reference with the full gate lifetime.
  pub fn get(&self) -> &'g R {
    &self.slot.resource
  }
}

impl<R> Clone for Handle<'_, R> {
  fn clone(&self) -> Self {
    *self
  }
}

impl<R> Copy for Handle<'_, R> {}

impl<R> Deref for Handle<'_, R> {
  type Target = R;

  fn deref(&self) -> &R {
    &self.slot.resource
  }
}

impl<R: fmt::Debug> fmt::Debug for Handle<'_, R> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Handle")
      .field("identity", &self.identity())
      .field("resource", &self.slot.resource)
      .finish()
  }
}
