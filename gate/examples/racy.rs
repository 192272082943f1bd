//! Run with `cargo run --example racy --features racy`.

use fibre_gate::{RacyGate, RecordingObserver, Releasable, WorkerHarness};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

fn main() {
  let recorder = Arc::new(RecordingObserver::new());
  let mut gate = RacyGate::new(|| {
    thread::sleep(Duration::from_millis(10));
    String::from("unguarded")
  })
  .with_observer(recorder.clone());

  let report = match WorkerHarness::new(8).run(&gate, &*recorder) {
    Ok(report) => report,
    Err(e) => {
      eprintln!("{}", e);
      std::process::exit(1);
    }
  };

  println!(
    "{} constructions, {} distinct identities, {} orphans",
    recorder.constructed(),
    report.distinct_identities().len(),
    gate.orphans()
  );
  for identity in report.distinct_identities() {
    println!("  {}", identity);
  }

  gate.release();
  println!("{} destructions", recorder.destroyed());
}
