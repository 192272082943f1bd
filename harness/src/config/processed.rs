// src/config/processed.rs
use crate::config::raw::{DiagnosticsRaw, HarnessConfigRaw, StrategyRaw};
use crate::error::{Error, Result};
use std::time::Duration;

/// Which gate strategy the harness drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyKind {
  Racy,
  Locked,
  DoubleChecked,
  Static,
  Eager,
}

impl StrategyKind {
  pub fn supports_release(self) -> bool {
    matches!(
      self,
      StrategyKind::Racy | StrategyKind::Locked | StrategyKind::DoubleChecked
    )
  }
}

/// Where lifecycle events are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticsMode {
  /// One line per event on stdout, behind the console observer's output lock.
  Console,
  /// Forwarded to `tracing`.
  Tracing,
}

// --- Processed Top Level Config ---
#[derive(Debug, Clone, PartialEq)]
pub struct HarnessConfig {
  pub workers: usize,
  pub strategy: StrategyKind,
  pub epochs: u64,
  pub construction_delay: Duration,
  pub diagnostics: DiagnosticsMode,
  pub log_level: String,
}

impl Default for HarnessConfig {
  fn default() -> Self {
    Self {
      workers: 5,
      strategy: StrategyKind::Locked,
      epochs: 1,
      construction_delay: Duration::ZERO,
      diagnostics: DiagnosticsMode::Console,
      log_level: "info".to_string(),
    }
  }
}

pub fn process_raw_config(raw: HarnessConfigRaw) -> Result<HarnessConfig> {
  if raw.workers < 1 {
    return Err(Error::InvalidConfigValue {
      field: "workers".to_string(),
      message: format!("must be at least 1, got {}", raw.workers),
    });
  }
  if raw.epochs < 1 {
    return Err(Error::InvalidConfigValue {
      field: "epochs".to_string(),
      message: format!("must be at least 1, got {}", raw.epochs),
    });
  }
  if raw.log_level.trim().is_empty() {
    return Err(Error::InvalidConfigValue {
      field: "log_level".to_string(),
      message: "must not be empty".to_string(),
    });
  }

  let strategy = match raw.strategy {
    StrategyRaw::Racy => {
      if !cfg!(feature = "racy") {
        return Err(Error::InvalidConfigValue {
          field: "strategy".to_string(),
          message: "'racy' requires building with the `racy` feature".to_string(),
        });
      }
      StrategyKind::Racy
    }
    StrategyRaw::Locked => StrategyKind::Locked,
    StrategyRaw::DoubleChecked => StrategyKind::DoubleChecked,
    StrategyRaw::Static => StrategyKind::Static,
    StrategyRaw::Eager => StrategyKind::Eager,
  };

  // Only releasable gates can start a second epoch.
  let mut epochs = raw.epochs as u64;
  if !strategy.supports_release() && epochs > 1 {
    tracing::warn!(
      ?strategy,
      requested = epochs,
      "strategy cannot be released; running a single epoch"
    );
    epochs = 1;
  }

  Ok(HarnessConfig {
    workers: raw.workers as usize,
    strategy,
    epochs,
    construction_delay: Duration::from_millis(raw.construction_delay_ms),
    diagnostics: match raw.diagnostics {
      DiagnosticsRaw::Console => DiagnosticsMode::Console,
      DiagnosticsRaw::Tracing => DiagnosticsMode::Tracing,
    },
    log_level: raw.log_level.trim().to_string(),
  })
}
