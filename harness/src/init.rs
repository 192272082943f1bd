// Configuration discovery, loading and logging setup for the harness.

use crate::config::{process_raw_config, HarnessConfig, HarnessConfigRaw};
use crate::error::{Error, Result};

use std::{
  env,
  fs::File,
  io,
  path::{Path, PathBuf},
};

use tracing_subscriber::EnvFilter;

const DEFAULT_CONFIG_BASE_NAME: &str = "fibre_gate";
const DEFAULT_CONFIG_EXTENSION: &str = "yaml";

/// Finds the configuration file in `dir` based on common patterns and an
/// optional environment suffix.
pub fn find_config_file_in(dir: &Path, environment_suffix: Option<&str>) -> Result<PathBuf> {
  let base_name = DEFAULT_CONFIG_BASE_NAME;
  let extension = DEFAULT_CONFIG_EXTENSION;

  let env_from_var = environment_suffix
    .map(|s| s.to_string())
    .or_else(|| env::var("FIBRE_ENV").ok())
    .or_else(|| env::var("APP_ENV").ok());

  let mut files_to_check: Vec<String> = Vec::new();

  if let Some(env_str) = &env_from_var {
    if !env_str.is_empty() {
      files_to_check.push(format!("{}.{}.{}", base_name, env_str, extension));
    }
  }
  files_to_check.push(format!("{}.{}", base_name, extension));

  for file_name in &files_to_check {
    let path = dir.join(file_name);
    if path.is_file() {
      return Ok(path);
    }
  }

  Err(Error::ConfigNotFound(format!(
    "Searched for: {:?} in {:?}. Provide a config file or check FIBRE_ENV/APP_ENV.",
    files_to_check, dir
  )))
}

/// Finds the configuration file in the working directory.
pub fn find_config_file(environment_suffix: Option<&str>) -> Result<PathBuf> {
  find_config_file_in(Path::new("."), environment_suffix)
}

/// Loads and validates a configuration file.
pub fn load_config(config_path: &Path) -> Result<HarnessConfig> {
  let file = File::open(config_path)?;
  let reader = io::BufReader::new(file);
  let raw: HarnessConfigRaw = serde_yaml::from_reader(reader)?;
  process_raw_config(raw)
}

/// Resolves the configuration the binary should run with: an explicit path
/// must exist; otherwise a discovered file is used, or the defaults.
pub fn resolve_config(explicit: Option<&Path>) -> Result<HarnessConfig> {
  match explicit {
    Some(path) => load_config(path),
    None => match find_config_file(None) {
      Ok(path) => load_config(&path),
      Err(Error::ConfigNotFound(_)) => Ok(HarnessConfig::default()),
      Err(e) => Err(e),
    },
  }
}

/// Installs the global `fmt` subscriber. `RUST_LOG` wins over `log_level`.
pub fn init_logging(config: &HarnessConfig) -> Result<()> {
  let filter = EnvFilter::try_from_default_env()
    .or_else(|_| EnvFilter::try_new(&config.log_level))
    .map_err(|e| Error::InvalidConfigValue {
      field: "log_level".to_string(),
      message: e.to_string(),
    })?;

  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_thread_names(true)
    .with_writer(io::stderr)
    .try_init()
    .map_err(|e| Error::GlobalSubscriberSet(e.to_string()))
}
