use fibre_gate::{
  AccessGate, GateError, LifecycleController, LifecycleEvent, LockedGate, RecordingObserver,
  Releasable, Strategy, WorkerHarness,
};
use serial_test::serial;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

// --- Test Fixtures ---

// Counts real drops of the payload, independent of observer events.
static PAYLOAD_DROPS: AtomicUsize = AtomicUsize::new(0);

struct Payload {
  label: &'static str,
}

impl Drop for Payload {
  fn drop(&mut self) {
    PAYLOAD_DROPS.fetch_add(1, Ordering::SeqCst);
  }
}

fn observed<R: Send + Sync>(gate: LockedGate<R>) -> (LockedGate<R>, Arc<RecordingObserver>) {
  let recorder = Arc::new(RecordingObserver::new());
  (gate.with_observer(recorder.clone()), recorder)
}

// --- Tests ---

#[test]
#[serial]
fn five_concurrent_callers_share_one_instance() {
  PAYLOAD_DROPS.store(0, Ordering::SeqCst);
  let (mut gate, recorder) = observed(LockedGate::new(|| {
    thread::sleep(Duration::from_millis(20));
    Payload { label: "shared" }
  }));

  let report = WorkerHarness::new(5).run(&gate, &*recorder).unwrap();

  assert_eq!(report.outcomes().len(), 5);
  assert!(report.is_consistent());
  assert_eq!(recorder.constructed(), 1);
  assert_eq!(recorder.workers_started(), 5);
  assert_eq!(
    recorder.constructed_identities(),
    report.distinct_identities()
  );

  assert!(gate.release());
  assert_eq!(recorder.destroyed(), 1);
  assert_eq!(PAYLOAD_DROPS.load(Ordering::SeqCst), 1);
}

#[test]
fn release_on_fresh_gate_is_a_no_op() {
  let (mut gate, recorder) = observed(LockedGate::new(|| 1_u32));

  assert!(!gate.release());
  assert!(!gate.release());
  assert_eq!(recorder.destroyed(), 0);
  assert!(recorder.events().is_empty());
}

#[test]
#[serial]
fn release_destroys_after_construction_and_rebuilds_fresh() {
  PAYLOAD_DROPS.store(0, Ordering::SeqCst);
  let (mut gate, recorder) = observed(LockedGate::new(|| Payload { label: "epoch" }));
  let mut controller = LifecycleController::new(&mut gate);

  let first = controller.gate().acquire().unwrap().identity();
  assert!(controller.release());
  let second = {
    let handle = controller.gate().acquire().unwrap();
    assert_eq!(handle.label, "epoch");
    handle.identity()
  };

  assert_ne!(first, second);
  assert_eq!(first.epoch(), 1);
  assert_eq!(second.epoch(), 2);

  assert_eq!(
    recorder.events(),
    vec![
      LifecycleEvent::Constructed {
        strategy: Strategy::Locked,
        identity: first,
      },
      LifecycleEvent::Destroyed {
        strategy: Strategy::Locked,
        identity: first,
      },
      LifecycleEvent::Constructed {
        strategy: Strategy::Locked,
        identity: second,
      },
    ]
  );
  assert_eq!(PAYLOAD_DROPS.load(Ordering::SeqCst), 1);

  drop(controller);
  drop(gate);
  assert_eq!(recorder.destroyed_identities(), vec![first, second]);
  assert_eq!(PAYLOAD_DROPS.load(Ordering::SeqCst), 2);
}

#[test]
fn construction_failure_is_surfaced_and_not_retried() {
  let attempts = Arc::new(AtomicUsize::new(0));
  let counter = attempts.clone();
  let (gate, recorder) = observed(LockedGate::new_fallible(move || {
    if counter.fetch_add(1, Ordering::SeqCst) == 0 {
      Err("backing store offline")
    } else {
      Ok(String::from("online"))
    }
  }));

  let err = gate.acquire().unwrap_err();
  assert!(matches!(err, GateError::ResourceUnavailable { epoch: 1, .. }));
  assert_eq!(attempts.load(Ordering::SeqCst), 1);
  assert!(gate.current().is_none());
  assert_eq!(recorder.failures(), 1);

  // The caller decides to retry; the epoch number was not consumed.
  let handle = gate.acquire().unwrap();
  assert_eq!(*handle, "online");
  assert_eq!(handle.epoch(), 1);
  assert_eq!(attempts.load(Ordering::SeqCst), 2);
  assert_eq!(recorder.constructed(), 1);
}

#[test]
fn many_threads_many_calls_single_construction() {
  let (gate, recorder) = observed(LockedGate::new(|| vec![7_u8; 64]));

  thread::scope(|s| {
    for _ in 0..16 {
      s.spawn(|| {
        for _ in 0..100 {
          let handle = gate.acquire().unwrap();
          assert_eq!(handle.len(), 64);
        }
      });
    }
  });

  assert_eq!(recorder.constructed(), 1);
}
