use fibre_gate::{
  AccessGate, ConsoleObserver, DoubleCheckedGate, EagerGate, HarnessError, LockedGate,
  RecordingObserver, WorkerHarness,
};
use std::sync::Arc;

#[test]
fn harness_reports_every_worker_in_order() {
  let gate = LockedGate::new(|| 0_u8);
  let recorder = RecordingObserver::new();

  let report = WorkerHarness::new(6).run(&gate, &recorder).unwrap();

  let workers: Vec<usize> = report.outcomes().iter().map(|o| o.worker).collect();
  assert_eq!(workers, vec![0, 1, 2, 3, 4, 5]);
  assert_eq!(recorder.workers_started(), 6);
}

#[test]
fn harness_without_start_line_still_consistent() {
  let gate = DoubleCheckedGate::new(|| String::from("x"));
  let report = WorkerHarness::new(4)
    .with_start_line(false)
    .run(&gate, &RecordingObserver::new())
    .unwrap();
  assert!(report.is_consistent());
}

#[test]
fn acquire_failure_is_reported_with_worker() {
  let gate = LockedGate::<u32>::new_fallible(|| Err("exhausted"));

  let err = WorkerHarness::new(3)
    .run(&gate, &RecordingObserver::new())
    .unwrap_err();

  match err {
    HarnessError::Acquire { worker, source } => {
      assert_eq!(worker, 0);
      assert!(source.to_string().contains("exhausted"));
    }
    other => panic!("unexpected error: {other}"),
  }
}

#[test]
fn worker_panic_is_reported() {
  let gate = DoubleCheckedGate::<u32>::new(|| panic!("constructor blew up"));

  let err = WorkerHarness::new(2)
    .run(&gate, &RecordingObserver::new())
    .unwrap_err();

  assert!(matches!(err, HarnessError::WorkerPanicked { worker: 0 }));
  assert!(gate.current().is_none());
}

#[test]
fn diagnostics_use_their_own_lock() {
  // Console output is serialized by the observer while the gate constructs
  // under its own lock; every worker line must come out whole.
  let console = Arc::new(ConsoleObserver::new(Vec::new()));
  let gate = EagerGate::new(|| [0_u64; 4]).unwrap();

  WorkerHarness::new(8).run(&gate, &*console).unwrap();

  let console = match Arc::try_unwrap(console) {
    Ok(console) => console,
    Err(_) => panic!("console still shared"),
  };
  let text = String::from_utf8(console.into_inner()).unwrap();
  let mut lines: Vec<&str> = text.lines().collect();
  lines.sort_unstable();
  let expected: Vec<String> = (0..8).map(|i| format!("worker [{}] started", i)).collect();
  assert_eq!(lines, expected);
}

#[test]
fn spawn_failure_is_fatal_and_nothing_is_constructed() {
  let recorder = Arc::new(RecordingObserver::new());
  let gate = LockedGate::new(|| 7_u32).with_observer(recorder.clone());

  // No platform can map a stack this large.
  let err = WorkerHarness::new(5)
    .with_stack_size(usize::MAX / 2)
    .run(&gate, &*recorder)
    .unwrap_err();

  match err {
    HarnessError::Spawn { worker, .. } => assert_eq!(worker, 0),
    other => panic!("unexpected error: {other}"),
  }
  assert_eq!(recorder.workers_started(), 0);
  assert_eq!(recorder.constructed(), 0);
  assert!(gate.current().is_none());
}
