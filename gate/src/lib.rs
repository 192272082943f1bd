//! # Fibre Gate
//!
//! Lazy, thread-safe, once-initialized shared resources with deterministic
//! teardown.
//!
//! A gate owns one shared resource. Any number of threads call
//! [`AccessGate::acquire`] and receive a [`Handle`] to the same instance; the
//! first call constructs it, and nobody sees it before construction finishes.
//! Releasable gates can tear the resource down and build a fresh one later;
//! each such span is an *epoch*.
//!
//! ## Strategies
//!
//! - [`LockedGate`]: one mutex, taken on every call.
//! - [`DoubleCheckedGate`]: lock-free fast path with `Acquire`/`Release`
//!   publication, lock only while racing the first construction.
//! - [`StaticSlotGate`] and [`static_gate!`]: a block-scoped `static`
//!   initialized exactly once. Never destroyed.
//! - [`EagerGate`]: constructed with the gate, `acquire()` is free.
//! - `RacyGate` (feature `racy`): check-then-construct with no exclusion.
//!   Exists to show what goes wrong.
//!
//! ## Quick Start
//!
//! ```
//! use fibre_gate::{AccessGate, DoubleCheckedGate, LifecycleController, WorkerHarness};
//! use fibre_gate::RecordingObserver;
//! use std::sync::Arc;
//!
//! struct Pool {
//!   size: usize,
//! }
//!
//! let recorder = Arc::new(RecordingObserver::new());
//! let mut gate = DoubleCheckedGate::new(|| Pool { size: 8 }).with_observer(recorder.clone());
//!
//! let mut controller = LifecycleController::new(&mut gate);
//! let report = WorkerHarness::new(5).run(controller.gate(), &*recorder).unwrap();
//! assert!(report.is_consistent());
//! assert_eq!(controller.gate().acquire().unwrap().size, 8);
//!
//! controller.release();
//! assert_eq!(recorder.constructed(), 1);
//! assert_eq!(recorder.destroyed(), 1);
//! ```

mod core;
pub mod error;
mod handle;
mod harness;
mod lifecycle;
pub mod observer;
mod strategy;

pub use crate::core::{AccessGate, Releasable, Strategy};
pub use error::{AllocError, BoxError, GateError, HarnessError, Result};
pub use handle::{Handle, Identity};
pub use harness::{HarnessReport, WorkerHarness, WorkerOutcome};
pub use lifecycle::{release, LifecycleController};
pub use observer::{
  ConsoleObserver, FanoutObserver, LifecycleEvent, LifecycleObserver, RecordingObserver,
  TracingObserver,
};
#[cfg(feature = "racy")]
pub use strategy::RacyGate;
pub use strategy::{DoubleCheckedGate, EagerGate, LockedGate, StaticSlotGate};
