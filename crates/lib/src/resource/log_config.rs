use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Log driver used when forwarding container logs to a fluentd-compatible
/// collector.
pub const FLUENTD_LOG_DRIVER: &str = "fluentd";

/// Logging configuration for an application.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogConfig {
  pub disabled: bool,
  pub driver: String,
  #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
  pub config: BTreeMap<String, String>,
}
