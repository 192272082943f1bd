// This module handles configuration parsing and validation.

pub mod processed; // Validated configuration the harness runs from
pub mod raw; // Structs directly mapping to the YAML structure

pub use processed::{process_raw_config, DiagnosticsMode, HarnessConfig, StrategyKind};
pub use raw::HarnessConfigRaw;
