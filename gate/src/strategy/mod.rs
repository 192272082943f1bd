//! The interchangeable gate strategies.

use crate::error::BoxError;

mod double_checked;
mod eager;
mod locked;
#[cfg(feature = "racy")]
mod racy;
mod static_slot;

pub use double_checked::DoubleCheckedGate;
pub use eager::EagerGate;
pub use locked::LockedGate;
#[cfg(feature = "racy")]
pub use racy::RacyGate;
pub use static_slot::StaticSlotGate;

pub(crate) type Factory<R> = Box<dyn Fn() -> Result<R, BoxError> + Send + Sync>;
