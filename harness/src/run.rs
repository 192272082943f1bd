//! Drives one gate through the worker harness as configured.

use crate::config::{DiagnosticsMode, HarnessConfig, StrategyKind};
use crate::error::{Error, Result};

use fibre_gate::{
  AccessGate, BoxError, ConsoleObserver, DoubleCheckedGate, EagerGate, FanoutObserver,
  HarnessReport, Identity, LifecycleController, LifecycleEvent, LifecycleObserver, LockedGate,
  RecordingObserver, Releasable, StaticSlotGate, TracingObserver, WorkerHarness,
};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// The resource every strategy hands out. Only its identity matters.
#[derive(Debug)]
pub struct DemoResource {
  pub built_at: Instant,
}

impl DemoResource {
  fn build(delay: Duration) -> Self {
    if !delay.is_zero() {
      thread::sleep(delay);
    }
    DemoResource {
      built_at: Instant::now(),
    }
  }
}

/// What one epoch looked like.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EpochSummary {
  pub epoch: u64,
  pub identity: Identity,
  pub workers: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
  pub strategy: StrategyKind,
  pub epochs: Vec<EpochSummary>,
}

/// Runs the configured strategy with the configured diagnostics output.
pub fn run(config: &HarnessConfig) -> Result<RunSummary> {
  let output: Arc<dyn LifecycleObserver> = match config.diagnostics {
    DiagnosticsMode::Console => Arc::new(ConsoleObserver::stdout()),
    DiagnosticsMode::Tracing => Arc::new(TracingObserver),
  };
  run_with_observer(config, output)
}

/// Runs the configured strategy, sending lifecycle events to `output`.
///
/// Every epoch is checked: all workers must report one identity, and exactly
/// one construction (and, for releasable strategies, one destruction) must be
/// recorded.
pub fn run_with_observer(
  config: &HarnessConfig,
  output: Arc<dyn LifecycleObserver>,
) -> Result<RunSummary> {
  let recorder = Arc::new(RecordingObserver::new());
  let observer: Arc<dyn LifecycleObserver> =
    Arc::new(FanoutObserver::new().with(output).with(recorder.clone()));
  let harness = WorkerHarness::new(config.workers);
  let delay = config.construction_delay;

  tracing::info!(
    strategy = ?config.strategy,
    workers = config.workers,
    epochs = config.epochs,
    ?delay,
    "starting harness run"
  );

  let epochs = match config.strategy {
    StrategyKind::Locked => {
      let mut gate =
        LockedGate::new(move || DemoResource::build(delay)).with_observer(observer.clone());
      drive_releasable(&mut gate, config.epochs, &harness, &*observer, &recorder)?
    }
    StrategyKind::DoubleChecked => {
      let mut gate =
        DoubleCheckedGate::new(move || DemoResource::build(delay)).with_observer(observer.clone());
      drive_releasable(&mut gate, config.epochs, &harness, &*observer, &recorder)?
    }
    StrategyKind::Racy => run_racy(config, &harness, &observer, &recorder)?,
    StrategyKind::Static => {
      STATIC_DELAY_MS.store(delay.as_millis() as u64, Ordering::SeqCst);
      install_static_observer(observer.clone());
      let gate = static_demo_gate();
      let expected = if gate.current().is_some() { 0 } else { 1 };
      let report = harness.run(gate, &*observer)?;
      vec![check_epoch(&report, &recorder, expected)?]
    }
    StrategyKind::Eager => {
      let gate = EagerGate::build(
        move || Ok::<_, BoxError>(DemoResource::build(delay)),
        observer.clone(),
      )?;
      let report = harness.run(&gate, &*observer)?;
      let summary = check_epoch(&report, &recorder, 1)?;
      drop(gate);
      check_destroyed(summary.epoch, &recorder)?;
      vec![summary]
    }
  };

  Ok(RunSummary {
    strategy: config.strategy,
    epochs,
  })
}

#[cfg(feature = "racy")]
fn run_racy(
  config: &HarnessConfig,
  harness: &WorkerHarness,
  observer: &Arc<dyn LifecycleObserver>,
  recorder: &RecordingObserver,
) -> Result<Vec<EpochSummary>> {
  let delay = config.construction_delay;
  let mut gate =
    fibre_gate::RacyGate::new(move || DemoResource::build(delay)).with_observer(observer.clone());
  drive_releasable(&mut gate, config.epochs, harness, &**observer, recorder)
}

#[cfg(not(feature = "racy"))]
fn run_racy(
  _config: &HarnessConfig,
  _harness: &WorkerHarness,
  _observer: &Arc<dyn LifecycleObserver>,
  _recorder: &RecordingObserver,
) -> Result<Vec<EpochSummary>> {
  Err(Error::InvalidConfigValue {
    field: "strategy".to_string(),
    message: "'racy' requires building with the `racy` feature".to_string(),
  })
}

fn drive_releasable<G: Releasable>(
  gate: &mut G,
  epochs: u64,
  harness: &WorkerHarness,
  observer: &dyn LifecycleObserver,
  recorder: &RecordingObserver,
) -> Result<Vec<EpochSummary>> {
  let mut controller = LifecycleController::new(gate);
  let mut summaries = Vec::new();

  for _ in 0..epochs {
    recorder.clear();
    let (report, _) = controller.run_epoch(|gate| harness.run(gate, observer));
    let summary = check_epoch(&report?, recorder, 1)?;
    check_destroyed(summary.epoch, recorder)?;
    tracing::info!(epoch = summary.epoch, identity = %summary.identity, "epoch complete");
    summaries.push(summary);
  }
  Ok(summaries)
}

fn check_epoch(
  report: &HarnessReport,
  recorder: &RecordingObserver,
  expected_constructed: usize,
) -> Result<EpochSummary> {
  let distinct = report.distinct_identities();
  let identity = match distinct.as_slice() {
    [only] => *only,
    _ => {
      return Err(Error::Inconsistent {
        epoch: distinct.first().map(|id| id.epoch()).unwrap_or_default(),
        distinct: distinct.len(),
      })
    }
  };

  let constructed = recorder.constructed();
  if constructed != expected_constructed {
    return Err(Error::EventCount {
      epoch: identity.epoch(),
      event: "constructed",
      count: constructed,
    });
  }

  Ok(EpochSummary {
    epoch: identity.epoch(),
    identity,
    workers: report.outcomes().len(),
  })
}

fn check_destroyed(epoch: u64, recorder: &RecordingObserver) -> Result<()> {
  match recorder.destroyed() {
    1 => Ok(()),
    count => Err(Error::EventCount {
      epoch,
      event: "destroyed",
      count,
    }),
  }
}

// --- Function-local static strategy ---

static STATIC_DELAY_MS: AtomicU64 = AtomicU64::new(0);

/// Forwards events from the static gate to whichever observer the current
/// run installed. The static gate itself needs a `'static` observer.
struct InstalledObserver {
  target: RwLock<Option<Arc<dyn LifecycleObserver>>>,
}

impl LifecycleObserver for InstalledObserver {
  fn on_event(&self, event: &LifecycleEvent) {
    if let Some(observer) = self.target.read().as_ref() {
      observer.on_event(event);
    }
  }
}

static STATIC_OBSERVER: InstalledObserver = InstalledObserver {
  target: RwLock::new(None),
};

fn install_static_observer(observer: Arc<dyn LifecycleObserver>) {
  *STATIC_OBSERVER.target.write() = Some(observer);
}

fn build_static_demo() -> Result<DemoResource, BoxError> {
  let delay = Duration::from_millis(STATIC_DELAY_MS.load(Ordering::SeqCst));
  Ok(DemoResource::build(delay))
}

fn static_demo_gate() -> &'static StaticSlotGate<DemoResource> {
  static GATE: StaticSlotGate<DemoResource> =
    StaticSlotGate::with_observer(build_static_demo, &STATIC_OBSERVER);
  &GATE
}
