//! The unsynchronized gate must be shown to break under contention.

use fibre_gate::{AccessGate, RacyGate, RecordingObserver, Releasable, WorkerHarness};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

struct Expensive {
  _buffer: Vec<u8>,
}

fn slow_expensive() -> Expensive {
  thread::sleep(Duration::from_millis(10));
  Expensive {
    _buffer: vec![0; 1024],
  }
}

#[test]
fn racing_first_acquire_constructs_more_than_once() {
  let mut broke = false;

  for round in 0..50 {
    let recorder = Arc::new(RecordingObserver::new());
    let mut gate = RacyGate::new(slow_expensive).with_observer(recorder.clone());

    let report = WorkerHarness::new(8).run(&gate, &*recorder).unwrap();
    let constructed = recorder.constructed();

    if constructed > 1 || !report.is_consistent() {
      assert!(gate.orphans() >= 1);
      // Every instance, orphaned or not, is destroyed exactly once.
      assert!(gate.release());
      assert_eq!(recorder.destroyed(), constructed);
      broke = true;
      println!(
        "round {}: {} constructions, {} distinct identities",
        round,
        constructed,
        report.distinct_identities().len()
      );
      break;
    }
  }

  assert!(broke, "the racy gate never produced a duplicate construction");
}

#[test]
fn single_caller_behaves() {
  let recorder = Arc::new(RecordingObserver::new());
  let mut gate = RacyGate::new(|| 3_u16).with_observer(recorder.clone());

  let a = gate.acquire().unwrap().identity();
  let b = gate.acquire().unwrap().identity();
  assert_eq!(a, b);
  assert_eq!(gate.orphans(), 0);

  assert!(gate.release());
  assert!(!gate.release());
  assert_eq!(recorder.constructed(), 1);
  assert_eq!(recorder.destroyed(), 1);
}
