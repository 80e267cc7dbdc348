use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use crate::util::hash::{Hashable, ObjectHash};

use super::{Image, LogConfig, Port};

/// An application managed by the agent.
///
/// Describes everything needed to translate the workload to a container
/// management system. The name is the unique key within a state
/// specification.
///
/// # Fingerprint
///
/// [`Application::fingerprint`] is a content hash over the identity-relevant
/// fields (`name`, image name and tag, ports). It is computed once and
/// memoized: reading the fingerprint and mutating a field afterwards yields
/// a stale value, so treat an application as immutable once its fingerprint
/// has been observed, or build a fresh value for each meaningful change.
/// `instances` and `log_config` never contribute to the fingerprint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Application {
  #[serde(skip)]
  fingerprint: OnceLock<ObjectHash>,

  pub name: String,
  pub image: Image,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub ports: Vec<Port>,

  pub instances: u32,

  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub log_config: Option<LogConfig>,
}

/// Identity-relevant fields feeding the fingerprint.
#[derive(Serialize)]
struct FingerprintFields<'a> {
  name: &'a str,
  image_name: &'a str,
  image_tag: &'a str,
  #[serde(skip_serializing_if = "Option::is_none")]
  ports: Option<&'a [Port]>,
}

impl Hashable for FingerprintFields<'_> {}

impl Application {
  pub fn new(name: impl Into<String>, image: Image) -> Self {
    Self {
      name: name.into(),
      image,
      instances: 1,
      ..Self::default()
    }
  }

  /// Content hash over the identity-relevant fields, memoized on first use.
  pub fn fingerprint(&self) -> ObjectHash {
    self
      .fingerprint
      .get_or_init(|| {
        FingerprintFields {
          name: &self.name,
          image_name: &self.image.name,
          image_tag: &self.image.tag,
          ports: if self.ports.is_empty() { None } else { Some(&self.ports) },
        }
        .compute_hash()
        .unwrap_or_default()
      })
      .clone()
  }
}

// The memoized fingerprint is an implementation detail and must not affect
// value equality.
impl PartialEq for Application {
  fn eq(&self, other: &Self) -> bool {
    self.name == other.name
      && self.image == other.image
      && self.ports == other.ports
      && self.instances == other.instances
      && self.log_config == other.log_config
  }
}

impl Eq for Application {}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::resource::Protocol;

  fn sample_app(name: &str) -> Application {
    Application {
      name: name.to_string(),
      image: Image::new("nginx", "latest"),
      ports: vec![Port {
        container_port: 80,
        host_port: 8080,
        protocol: Protocol::Tcp,
      }],
      instances: 1,
      ..Application::default()
    }
  }

  #[test]
  fn fingerprint_is_deterministic_and_memoized() {
    let app = sample_app("app-1");
    let first = app.fingerprint();
    let second = app.fingerprint();

    assert_eq!(first, second);
    assert!(!first.0.is_empty());
  }

  #[test]
  fn fingerprint_changes_with_image_tag() {
    let app = sample_app("app-1");
    let mut other = sample_app("app-1");
    other.image.tag = "v1.0.0".to_string();

    assert_ne!(app.fingerprint(), other.fingerprint());
  }

  #[test]
  fn fingerprint_ignores_instances_and_log_config() {
    let app = sample_app("app-1");
    let mut other = sample_app("app-1");
    other.instances = 5;
    other.log_config = Some(LogConfig {
      disabled: false,
      driver: "custom".to_string(),
      config: Default::default(),
    });

    assert_eq!(app.fingerprint(), other.fingerprint());
  }

  #[test]
  fn fingerprint_survives_serde_roundtrip() {
    let app = sample_app("app-1");
    let json = serde_json::to_string(&app).unwrap();
    let decoded: Application = serde_json::from_str(&json).unwrap();

    assert_eq!(app, decoded);
    assert_eq!(app.fingerprint(), decoded.fingerprint());
  }

  #[test]
  fn fingerprint_not_recomputed_after_mutation() {
    let mut app = sample_app("app-1");
    let before = app.fingerprint();

    // Mutating after the fingerprint has been read leaves it stale.
    app.image.tag = "v2".to_string();
    assert_eq!(app.fingerprint(), before);
  }

  #[test]
  fn equality_ignores_memoized_fingerprint() {
    let computed = sample_app("app-1");
    let _ = computed.fingerprint();
    let fresh = sample_app("app-1");

    assert_eq!(computed, fresh);
  }
}
