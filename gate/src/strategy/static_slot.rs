//! Function-local static gate.
//!
//! Meant to live in a `static`, typically one declared inside an accessor
//! function (see [`static_gate!`](crate::static_gate)). Exactly-once,
//! thread-safe initialization is delegated to `once_cell`; there is no lock
//! code here.
//!
//! Rust never drops `static` items, so a static gate's resource is never
//! destroyed and no `Destroyed` event is ever recorded for it. Construction
//! order across independent static gates follows first use and nothing else.

use crate::core::{AccessGate, Provision, Slot, Strategy};
use crate::error::{BoxError, GateError};
use crate::handle::{Handle, Identity};
use crate::observer::{LifecycleObserver, TracingObserver};
use once_cell::sync::OnceCell;

pub struct StaticSlotGate<R> {
  cell: OnceCell<Box<Slot<R>>>,
  factory: fn() -> Result<R, BoxError>,
  observer: &'static dyn LifecycleObserver,
}

impl<R> StaticSlotGate<R> {
  pub const fn new(factory: fn() -> Result<R, BoxError>) -> Self {
    Self::with_observer(factory, &TracingObserver)
  }

  pub const fn with_observer(
    factory: fn() -> Result<R, BoxError>,
    observer: &'static dyn LifecycleObserver,
  ) -> Self {
    Self {
      cell: OnceCell::new(),
      factory,
      observer,
    }
  }
}

impl<R: Send + Sync> AccessGate for StaticSlotGate<R> {
  type Resource = R;

  fn acquire(&self) -> Result<Handle<'_, R>, GateError> {
    let slot = self.cell.get_or_try_init(|| {
      Provision {
        strategy: Strategy::StaticSlot,
        observer: self.observer,
      }
      .construct_boxed(self.factory, 1)
    })?;
    Ok(Handle::new(slot))
  }

  fn strategy(&self) -> Strategy {
    Strategy::StaticSlot
  }

  fn current(&self) -> Option<Identity> {
    self.cell.get().map(|slot| slot.identity())
  }
}

/// Declares an accessor function backed by a block-scoped [`StaticSlotGate`].
///
/// The generated function returns `Result<Handle<'static, T>, GateError>`.
/// The factory must coerce to `fn() -> Result<T, BoxError>`.
///
/// # Examples
///
/// ```
/// use fibre_gate::{static_gate, BoxError};
///
/// struct Settings {
///   retries: u32,
/// }
///
/// fn load_settings() -> Result<Settings, BoxError> {
///   Ok(Settings { retries: 3 })
/// }
///
/// static_gate!(fn settings() -> Settings = load_settings);
///
/// let a = settings().unwrap();
/// let b = settings().unwrap();
/// assert_eq!(a.retries, 3);
/// assert_eq!(a.identity(), b.identity());
/// ```
#[macro_export]
macro_rules! static_gate {
  ($(#[$meta:meta])* $vis:vis fn $name:ident() -> $ty:ty = $factory:expr) => {
    $(#[$meta])*
    $vis fn $name() -> ::core::result::Result<$crate::Handle<'static, $ty>, $crate::GateError> {
      static GATE: $crate::StaticSlotGate<$ty> = $crate::StaticSlotGate::new($factory);
      $crate::AccessGate::acquire(&GATE)
    }
  };

  (
    $(#[$meta:meta])* $vis:vis fn $name:ident() -> $ty:ty = $factory:expr,
    observer = $observer:expr
  ) => {
    $(#[$meta])*
    $vis fn $name() -> ::core::result::Result<$crate::Handle<'static, $ty>, $crate::GateError> {
      static GATE: $crate::StaticSlotGate<$ty> =
        $crate::StaticSlotGate::with_observer($factory, $observer);
      $crate::AccessGate::acquire(&GATE)
    }
  };
}
