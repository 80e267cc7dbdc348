use std::collections::BTreeMap;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use crate::resource::{FLUENTD_LOG_DRIVER, LogConfig};
use crate::util::hash::{Hashable, ObjectHash};

/// Configuration for the fluent-bit log forwarding sidecar.
///
/// When enabled, applications without an explicit logging configuration are
/// evaluated to ship their logs to the sidecar's forward input (see
/// [`FluentBit::default_log_config`]).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FluentBit {
  #[serde(skip)]
  config_hash: OnceLock<ObjectHash>,

  /// Log level of the fluent-bit service itself.
  #[serde(default)]
  pub log_level: String,

  /// Comma separated key-value list of default labels for the output.
  #[serde(default)]
  pub labels: String,

  /// Version of fluent-bit to run.
  #[serde(default)]
  pub version: String,

  /// Output plugin configuration, emitted verbatim into the rendered config.
  #[serde(default)]
  pub output: BTreeMap<String, String>,
}

impl Hashable for FluentBit {}

impl FluentBit {
  pub fn with_log_level(mut self, log_level: impl Into<String>) -> Self {
    self.log_level = log_level.into();
    self
  }

  pub fn with_labels(mut self, labels: impl Into<String>) -> Self {
    self.labels = labels.into();
    self
  }

  pub fn with_output(mut self, output: BTreeMap<String, String>) -> Self {
    self.output = output;
    self
  }

  /// Hash over the configuration fields, memoized on first use.
  pub fn config_hash(&self) -> ObjectHash {
    self
      .config_hash
      .get_or_init(|| self.compute_hash().unwrap_or_default())
      .clone()
  }

  /// Default logging configuration injected into applications that do not
  /// specify one while this feature is enabled.
  pub fn default_log_config(&self) -> LogConfig {
    LogConfig {
      driver: FLUENTD_LOG_DRIVER.to_string(),
      disabled: false,
      config: BTreeMap::from([("address".to_string(), "127.0.0.1:24224".to_string())]),
    }
  }

  /// Render the fluent-bit classic-mode configuration text.
  ///
  /// See configuration syntax at: https://docs.fluentbit.io/manual
  pub fn render_config(&self) -> String {
    let mut out = String::new();

    // [SERVICE] section
    write_section_header(&mut out, "SERVICE");
    write_prop_with_default(&mut out, "log_level", &self.log_level, "info");
    end_section(&mut out);

    // [INPUT] section
    write_section_header(&mut out, "INPUT");
    write_prop(&mut out, "name", "forward");
    write_prop(&mut out, "listen", "0.0.0.0");
    write_prop(&mut out, "port", "24224");
    end_section(&mut out);

    // [OUTPUT] section
    if !self.output.is_empty() {
      write_section_header(&mut out, "OUTPUT");
      for (key, value) in &self.output {
        write_prop(&mut out, key, value);
      }
      write_prop_with_default(&mut out, "labels", &self.labels, "agent=fluent-bit");
      end_section(&mut out);
    }

    format!("{}\n", out.trim_matches('\n'))
  }
}

// The memoized hash must not affect value equality.
impl PartialEq for FluentBit {
  fn eq(&self, other: &Self) -> bool {
    self.log_level == other.log_level
      && self.labels == other.labels
      && self.version == other.version
      && self.output == other.output
  }
}

impl Eq for FluentBit {}

fn write_section_header(out: &mut String, key: &str) {
  out.push('[');
  out.push_str(&key.to_uppercase());
  out.push_str("]\n");
}

fn write_prop(out: &mut String, key: &str, value: &str) {
  out.push('\t');
  out.push_str(&key.to_lowercase());
  out.push(' ');
  out.push_str(value);
  out.push('\n');
}

fn write_prop_with_default(out: &mut String, key: &str, value: &str, default_value: &str) {
  let final_value = if value.is_empty() { default_value } else { value };
  write_prop(out, key, final_value);
}

fn end_section(out: &mut String) {
  out.push('\n');
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn render_config_minimal() {
    let fluent_bit = FluentBit {
      log_level: "debug".to_string(),
      ..FluentBit::default()
    };

    let expected = "[SERVICE]\n\
                    \tlog_level debug\n\
                    \n\
                    [INPUT]\n\
                    \tname forward\n\
                    \tlisten 0.0.0.0\n\
                    \tport 24224\n";

    assert_eq!(fluent_bit.render_config(), expected);
  }

  #[test]
  fn render_config_with_output() {
    let fluent_bit = FluentBit {
      log_level: "debug".to_string(),
      labels: "agent=fluent-bit".to_string(),
      output: BTreeMap::from([
        ("name".to_string(), "loki".to_string()),
        ("host".to_string(), "host.docker.internal".to_string()),
        ("match".to_string(), "*".to_string()),
      ]),
      ..FluentBit::default()
    };

    let expected = "[SERVICE]\n\
                    \tlog_level debug\n\
                    \n\
                    [INPUT]\n\
                    \tname forward\n\
                    \tlisten 0.0.0.0\n\
                    \tport 24224\n\
                    \n\
                    [OUTPUT]\n\
                    \thost host.docker.internal\n\
                    \tmatch *\n\
                    \tname loki\n\
                    \tlabels agent=fluent-bit\n";

    assert_eq!(fluent_bit.render_config(), expected);
  }

  #[test]
  fn render_config_defaults_log_level_to_info() {
    let fluent_bit = FluentBit::default();
    assert!(fluent_bit.render_config().contains("\tlog_level info\n"));
  }

  #[test]
  fn config_hash_differs_between_configs() {
    let a = FluentBit {
      log_level: "debug".to_string(),
      ..FluentBit::default()
    };
    let b = FluentBit {
      log_level: "info".to_string(),
      ..FluentBit::default()
    };

    assert_ne!(a.config_hash(), b.config_hash());
  }

  #[test]
  fn config_hash_is_memoized() {
    let fluent_bit = FluentBit {
      log_level: "info".to_string(),
      ..FluentBit::default()
    };

    assert_eq!(fluent_bit.config_hash(), fluent_bit.config_hash());
  }

  #[test]
  fn default_log_config_targets_local_forward_input() {
    let log_config = FluentBit::default().default_log_config();

    assert_eq!(log_config.driver, FLUENTD_LOG_DRIVER);
    assert!(!log_config.disabled);
    assert_eq!(log_config.config.get("address").map(String::as_str), Some("127.0.0.1:24224"));
  }
}
