//! `fibre_gate_harness` - runs a `fibre_gate` strategy under contention, driven
//! by a YAML configuration file.
//!
//! The binary spawns a fixed pool of workers that race the first `acquire()`,
//! checks that every worker saw one instance and that exactly one
//! construction and destruction were recorded per epoch, and exits non-zero
//! otherwise.

pub mod config;
pub mod error;
pub mod init;
pub mod run;

pub use config::{DiagnosticsMode, HarnessConfig, StrategyKind};
pub use error::{Error, Result};
pub use init::{find_config_file, find_config_file_in, init_logging, load_config, resolve_config};
pub use run::{run, run_with_observer, EpochSummary, RunSummary};
