//! Spec evaluation: feature-derived defaults.
//!
//! Before two specifications are compared, each is evaluated so that
//! defaults implied by enabled features are materialized on both sides and
//! never register as spurious differences.

use super::Spec;

impl Spec {
  /// Update the applications based on the enabled features.
  ///
  /// Deterministic and idempotent: evaluating an already evaluated spec is a
  /// no-op. Currently the fluent-bit feature injects its default logging
  /// configuration into every application that does not specify one.
  pub fn evaluate(&mut self) {
    let Some(fluent_bit) = &self.feature.fluent_bit else {
      return;
    };
    let default_log_config = fluent_bit.default_log_config();

    for app in &mut self.applications {
      if app.log_config.is_none() {
        app.log_config = Some(default_log_config.clone());
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use crate::feature::FluentBit;
  use crate::resource::{Application, Image, LogConfig};
  use crate::state::{FeatureSet, Spec};

  fn spec_with_fluent_bit(app: Application) -> Spec {
    Spec {
      applications: vec![app],
      feature: FeatureSet {
        fluent_bit: Some(FluentBit::default().with_log_level("info")),
      },
    }
  }

  #[test]
  fn appends_fluent_bit_log_config() {
    let mut spec = spec_with_fluent_bit(Application::new("app-1", Image::new("nginx", "latest")));

    spec.evaluate();

    let app = spec.get_application("app-1").unwrap();
    let log_config = app.log_config.as_ref().unwrap();
    assert_eq!(log_config.driver, "fluentd");
    assert!(!log_config.disabled);
    assert_eq!(log_config.config.get("address").map(String::as_str), Some("127.0.0.1:24224"));
  }

  #[test]
  fn does_not_overwrite_existing_log_config() {
    let mut app = Application::new("app-1", Image::new("nginx", "latest"));
    app.log_config = Some(LogConfig {
      driver: "custom".to_string(),
      disabled: false,
      config: Default::default(),
    });
    let mut spec = spec_with_fluent_bit(app);

    spec.evaluate();

    let app = spec.get_application("app-1").unwrap();
    assert_eq!(app.log_config.as_ref().unwrap().driver, "custom");
  }

  #[test]
  fn evaluation_is_idempotent() {
    let mut spec = spec_with_fluent_bit(Application::new("app-1", Image::new("nginx", "latest")));

    spec.evaluate();
    let once = spec.clone();
    spec.evaluate();

    assert_eq!(spec, once);
  }

  #[test]
  fn no_features_leaves_spec_untouched() {
    let mut spec = Spec {
      applications: vec![Application::new("app-1", Image::new("nginx", "latest"))],
      ..Spec::default()
    };

    spec.evaluate();

    assert!(spec.get_application("app-1").unwrap().log_config.is_none());
  }
}
