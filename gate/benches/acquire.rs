use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use fibre_gate::{
  AccessGate, BoxError, DoubleCheckedGate, EagerGate, LockedGate, StaticSlotGate,
};
use std::sync::Barrier;
use std::thread;
use std::time::{Duration, Instant};

const CONTENDED_THREADS: usize = 4;

// --- Helpers ---

fn payload() -> [u64; 8] {
  [7; 8]
}

fn static_payload() -> Result<[u64; 8], BoxError> {
  Ok(payload())
}

static STATIC_GATE: StaticSlotGate<[u64; 8]> = StaticSlotGate::new(static_payload);

/// Runs `iters` acquisitions on each of `CONTENDED_THREADS` threads and
/// returns the wall time of the slowest thread.
fn contended<G: AccessGate>(gate: &G, iters: u64) -> Duration {
  let barrier = Barrier::new(CONTENDED_THREADS);
  thread::scope(|s| {
    let workers: Vec<_> = (0..CONTENDED_THREADS)
      .map(|_| {
        s.spawn(|| {
          barrier.wait();
          let start = Instant::now();
          for _ in 0..iters {
            black_box(gate.acquire().unwrap().identity());
          }
          start.elapsed()
        })
      })
      .collect();
    workers
      .into_iter()
      .map(|w| w.join().unwrap())
      .max()
      .unwrap_or_default()
  })
}

// --- Benchmark Functions ---

fn hot_path(c: &mut Criterion) {
  let locked = LockedGate::new(payload);
  let double_checked = DoubleCheckedGate::new(payload);
  let eager = EagerGate::new(payload).unwrap();
  STATIC_GATE.acquire().unwrap();
  locked.acquire().unwrap();
  double_checked.acquire().unwrap();

  let mut group = c.benchmark_group("acquire/hot");
  group.throughput(Throughput::Elements(1));
  group.bench_function("locked", |b| b.iter(|| black_box(locked.acquire().unwrap()[0])));
  group.bench_function("double_checked", |b| {
    b.iter(|| black_box(double_checked.acquire().unwrap()[0]))
  });
  group.bench_function("static", |b| {
    b.iter(|| black_box(STATIC_GATE.acquire().unwrap()[0]))
  });
  group.bench_function("eager", |b| b.iter(|| black_box(eager.acquire().unwrap()[0])));
  group.finish();
}

fn contended_path(c: &mut Criterion) {
  let locked = LockedGate::new(payload);
  let double_checked = DoubleCheckedGate::new(payload);

  let mut group = c.benchmark_group("acquire/contended");
  group.throughput(Throughput::Elements(CONTENDED_THREADS as u64));
  group.bench_function("locked", |b| b.iter_custom(|iters| contended(&locked, iters)));
  group.bench_function("double_checked", |b| {
    b.iter_custom(|iters| contended(&double_checked, iters))
  });
  group.finish();
}

criterion_group!(benches, hot_path, contended_path);
criterion_main!(benches);
