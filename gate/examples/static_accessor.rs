use fibre_gate::{static_gate, BoxError};
use std::thread;

struct Settings {
  name: &'static str,
  retries: u32,
}

fn load_settings() -> Result<Settings, BoxError> {
  println!("Loading settings (this happens once)...");
  Ok(Settings {
    name: "fibre",
    retries: 3,
  })
}

static_gate!(
  /// Settings shared by the whole process. Never torn down.
  fn settings() -> Settings = load_settings
);

fn main() -> Result<(), BoxError> {
  thread::scope(|s| {
    for i in 0..4 {
      s.spawn(move || match settings() {
        Ok(handle) => println!("thread {} sees {} at {}", i, handle.name, handle.identity()),
        Err(e) => eprintln!("thread {}: {}", i, e),
      });
    }
  });

  let settings = settings()?;
  println!("{} retries = {}", settings.name, settings.retries);
  Ok(())
}
