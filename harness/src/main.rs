use fibre_gate_harness::{init_logging, resolve_config, run};
use std::path::PathBuf;
use std::process::ExitCode;

fn main() -> ExitCode {
  let explicit = std::env::args_os().nth(1).map(PathBuf::from);

  let config = match resolve_config(explicit.as_deref()) {
    Ok(config) => config,
    Err(e) => {
      eprintln!("[fibre_gate_harness:ERROR] {}", e);
      return ExitCode::FAILURE;
    }
  };

  if let Err(e) = init_logging(&config) {
    eprintln!("[fibre_gate_harness:ERROR] {}", e);
    return ExitCode::FAILURE;
  }

  println!("main(): starting {} workers ...", config.workers);
  match run(&config) {
    Ok(summary) => {
      for epoch in &summary.epochs {
        println!(
          "main(): epoch {} served {} workers from {}",
          epoch.epoch, epoch.workers, epoch.identity
        );
      }
      println!("main(): done!");
      ExitCode::SUCCESS
    }
    Err(e) => {
      tracing::error!(error = %e, "harness run failed");
      eprintln!("[fibre_gate_harness:ERROR] {}", e);
      ExitCode::FAILURE
    }
  }
}
