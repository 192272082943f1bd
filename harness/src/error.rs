use thiserror::Error;

/// The main error type for the harness binary.
#[derive(Debug, Error)]
pub enum Error {
  #[error("Configuration file not found: {0}")]
  ConfigNotFound(String),

  #[error("Failed to read configuration file: {0}")]
  ConfigRead(#[from] std::io::Error),

  #[error("Failed to parse configuration: {0}")]
  ConfigParse(#[from] serde_yaml::Error),

  #[error("Invalid configuration value for '{field}': {message}")]
  InvalidConfigValue { field: String, message: String },

  #[error("Failed to set global tracing subscriber: {0}")]
  GlobalSubscriberSet(String),

  #[error("Shared resource unavailable: {0}")]
  Gate(#[from] fibre_gate::GateError),

  #[error("Worker harness failed: {0}")]
  Harness(#[from] fibre_gate::HarnessError),

  #[error("Epoch {epoch}: workers observed {distinct} distinct instances")]
  Inconsistent { epoch: u64, distinct: usize },

  #[error("Epoch {epoch}: expected exactly one {event} event, recorded {count}")]
  EventCount {
    epoch: u64,
    event: &'static str,
    count: usize,
  },
}

/// A specialized `Result` type for harness operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;
