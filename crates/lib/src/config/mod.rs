//! Agent configuration.
//!
//! Loaded from a TOML file; every section and key is optional and falls back
//! to its default, so an empty file is a valid configuration.
//!
//! ```toml
//! [general]
//! reset_provider_on_startup = false
//!
//! [diff]
//! ignore_instance_diff = true
//!
//! [store]
//! state_file = "/var/lib/corral/state.json"
//! poll_interval_ms = 500
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::state::diff::DiffOptions;

const DEFAULT_POLL_INTERVAL_MS: u64 = 500;

/// Errors from loading the configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("failed to read config file: {0}")]
  Read(#[source] io::Error),

  #[error("failed to parse config file: {0}")]
  Parse(#[from] toml::de::Error),
}

/// General agent behavior.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct General {
  /// Reset the external container system when the agent launches, by
  /// applying an empty state specification first.
  #[serde(default)]
  pub reset_provider_on_startup: bool,
}

/// Diff engine behavior.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Diff {
  /// Ignore instance count differences, for providers that cannot express
  /// multiple instances of an application.
  #[serde(default)]
  pub ignore_instance_diff: bool,
}

/// Durable state store configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Store {
  /// Location of the state file.
  #[serde(default = "default_state_file")]
  pub state_file: PathBuf,

  /// Interval at which the state file is checked for changes.
  #[serde(default = "default_poll_interval_ms")]
  pub poll_interval_ms: u64,
}

impl Default for Store {
  fn default() -> Self {
    Self {
      state_file: default_state_file(),
      poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
    }
  }
}

/// The complete agent configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
  #[serde(default)]
  pub general: General,

  #[serde(default)]
  pub diff: Diff,

  #[serde(default)]
  pub store: Store,
}

impl Config {
  /// Load the configuration from a TOML file.
  pub fn load(path: &Path) -> Result<Self, ConfigError> {
    let content = fs::read_to_string(path).map_err(ConfigError::Read)?;
    Ok(toml::from_str(&content)?)
  }

  /// Diff options derived from this configuration.
  pub fn diff_options(&self) -> DiffOptions {
    DiffOptions {
      ignore_instance_diff: self.diff.ignore_instance_diff,
    }
  }

  /// Poll interval for the state file watcher.
  pub fn poll_interval(&self) -> Duration {
    Duration::from_millis(self.store.poll_interval_ms)
  }
}

fn default_state_file() -> PathBuf {
  dirs::data_dir()
    .unwrap_or_else(|| PathBuf::from("/tmp"))
    .join("corral")
    .join("state.json")
}

fn default_poll_interval_ms() -> u64 {
  DEFAULT_POLL_INTERVAL_MS
}
