use serde::Deserialize;

#[derive(Debug, Deserialize, PartialEq, Default, Clone, Copy)]
#[serde(rename_all = "snake_case")]
pub enum StrategyRaw {
  Racy,
  #[default]
  Locked,
  DoubleChecked,
  Static,
  Eager,
}

#[derive(Debug, Deserialize, PartialEq, Default, Clone, Copy)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticsRaw {
  #[default]
  Console,
  Tracing,
}

// --- Top Level Config ---
#[derive(Debug, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct HarnessConfigRaw {
  #[serde(default = "default_workers")]
  pub workers: i64,
  #[serde(default)]
  pub strategy: StrategyRaw,
  #[serde(default = "default_epochs")]
  pub epochs: i64,
  #[serde(default)]
  pub construction_delay_ms: u64,
  #[serde(default)]
  pub diagnostics: DiagnosticsRaw,
  #[serde(default = "default_log_level")]
  pub log_level: String,
}

impl Default for HarnessConfigRaw {
  fn default() -> Self {
    Self {
      workers: default_workers(),
      strategy: StrategyRaw::default(),
      epochs: default_epochs(),
      construction_delay_ms: 0,
      diagnostics: DiagnosticsRaw::default(),
      log_level: default_log_level(),
    }
  }
}

fn default_workers() -> i64 {
  5
}

fn default_epochs() -> i64 {
  1
}

fn default_log_level() -> String {
  "info".to_string()
}
