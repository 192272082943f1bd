use fibre_gate::{
  AccessGate, ConsoleObserver, LifecycleController, LifecycleObserver, LockedGate, WorkerHarness,
};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

// A stand-in for something expensive to build, like a connection pool.
struct Pool {
  connections: usize,
}

const NUM_WORKERS: usize = 5;

fn main() {
  let console: Arc<dyn LifecycleObserver> = Arc::new(ConsoleObserver::stdout());

  let mut gate = LockedGate::new(|| {
    thread::sleep(Duration::from_millis(25));
    Pool { connections: 4 }
  })
  .with_observer(console.clone());

  println!("main(): starting {} workers", NUM_WORKERS);
  let mut controller = LifecycleController::new(&mut gate);

  let report = match WorkerHarness::new(NUM_WORKERS).run(controller.gate(), &*console) {
    Ok(report) => report,
    Err(e) => {
      eprintln!("main(): {}", e);
      std::process::exit(1);
    }
  };

  for outcome in report.outcomes() {
    println!("worker [{}] saw {}", outcome.worker, outcome.identity);
  }
  assert!(report.is_consistent(), "every worker must see the same pool");

  if let Ok(pool) = controller.gate().acquire() {
    println!("pool has {} connections", pool.connections);
  }

  controller.release();
  println!("main(): done");
}
