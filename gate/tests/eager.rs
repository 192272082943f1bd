use fibre_gate::{
  AccessGate, EagerGate, GateError, LifecycleEvent, RecordingObserver, Strategy, WorkerHarness,
};
use std::sync::Arc;

#[derive(Debug, PartialEq)]
struct Clock {
  tick_ms: u32,
}

#[test]
fn constructed_before_first_acquire() {
  let recorder = Arc::new(RecordingObserver::new());
  let gate = EagerGate::build(|| Ok::<_, GateError>(Clock { tick_ms: 10 }), recorder.clone())
    .unwrap();

  // Nothing has acquired yet, but the resource already exists.
  assert_eq!(recorder.constructed(), 1);
  let existing = gate.current().unwrap();

  let report = WorkerHarness::new(5).run(&gate, &*recorder).unwrap();
  assert_eq!(report.distinct_identities(), vec![existing]);
  assert_eq!(recorder.constructed(), 1);
  assert_eq!(gate.get().tick_ms, 10);
}

#[test]
fn identity_is_stable_when_gate_moves() {
  let gate = EagerGate::new(|| Clock { tick_ms: 1 }).unwrap();
  let before = gate.get().identity();

  let moved = Box::new(gate);
  assert_eq!(moved.acquire().unwrap().identity(), before);
}

#[test]
fn construction_failure_surfaces_from_new() {
  let recorder = Arc::new(RecordingObserver::new());
  let result = EagerGate::<Clock>::build(|| Err("no hardware clock"), recorder.clone());

  let err = match result {
    Ok(_) => panic!("eager construction should have failed"),
    Err(err) => err,
  };
  assert!(matches!(
    err,
    GateError::ResourceUnavailable {
      strategy: Strategy::Eager,
      epoch: 1,
      ..
    }
  ));
  assert_eq!(recorder.failures(), 1);
  assert_eq!(recorder.constructed(), 0);
  assert_eq!(recorder.destroyed(), 0);
}

#[test]
fn dropping_the_gate_destroys_once() {
  let recorder = Arc::new(RecordingObserver::new());
  let gate = EagerGate::build(|| Ok::<_, GateError>(Clock { tick_ms: 5 }), recorder.clone())
    .unwrap();
  let identity = gate.get().identity();
  drop(gate);

  let events = recorder.events();
  assert_eq!(events.len(), 2);
  assert_eq!(
    events[1],
    LifecycleEvent::Destroyed {
      strategy: Strategy::Eager,
      identity,
    }
  );
}
