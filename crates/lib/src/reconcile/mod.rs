//! Reconciliation of the desired state against the actual system.
//!
//! The [`Reconciler`] compares its stored desired and actual specifications
//! and issues one provider call per classified change, in a fixed order:
//!
//! 1. Create added features.
//! 2. Update changed features.
//! 3. Remove removed applications.
//! 4. Update changed applications.
//! 5. Create added applications.
//! 6. Remove removed features.
//!
//! Features are created and updated before any application mutation because
//! they are supporting infrastructure applications may rely on; removal runs
//! before creation so a rename never collides on the external system.
//!
//! Every failing call is recorded and the pass continues; the aggregated
//! error list is returned to the caller. After an apply-triggered pass that
//! produced at least one successful mutation, the cached actual state is
//! refreshed from the provider.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, error};

use crate::provider::{Provider, ProviderError};
use crate::state::Spec;
use crate::state::diff::{DiffOptions, compare};

/// The provider operation a [`ReconcileError`] originates from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
  Create,
  Update,
  Remove,
}

impl std::fmt::Display for Op {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    let verb = match self {
      Op::Create => "create",
      Op::Update => "update",
      Op::Remove => "remove",
    };
    write!(f, "{verb}")
  }
}

/// A failure collected during a reconciliation pass.
#[derive(Debug, Error)]
pub enum ReconcileError {
  #[error("failed to {op} application '{name}': {source}")]
  Application {
    op: Op,
    name: String,
    #[source]
    source: ProviderError,
  },

  #[error("failed to {op} feature '{name}': {source}")]
  Feature {
    op: Op,
    name: String,
    #[source]
    source: ProviderError,
  },

  #[error("failed to refresh actual state: {0}")]
  Refresh(#[source] ProviderError),
}

/// Keeps the external system as close as possible to the desired state.
pub struct Reconciler {
  /// Interface to the external containerized system.
  provider: Arc<dyn Provider>,
  /// The state the system should be in at any given time.
  desired: Spec,
  /// The state the system currently is in, as last observed.
  actual: Spec,
  options: DiffOptions,
}

impl Reconciler {
  pub fn new(provider: Arc<dyn Provider>) -> Self {
    Self {
      provider,
      desired: Spec::default(),
      actual: Spec::default(),
      options: DiffOptions::default(),
    }
  }

  /// Seed the cached actual state without triggering an update.
  pub fn with_initial_actual_state(mut self, actual: Spec) -> Self {
    self.actual = actual;
    self
  }

  pub fn with_options(mut self, options: DiffOptions) -> Self {
    self.options = options;
    self
  }

  /// Store a new desired state and run a reconciliation pass, refreshing the
  /// cached actual state afterwards when anything was modified.
  pub fn apply(&mut self, desired: Spec) -> Vec<ReconcileError> {
    self.desired = desired;
    self.update(true)
  }

  /// Store a freshly observed actual state and run a reconciliation pass.
  ///
  /// No refresh afterwards: the caller already supplied the authoritative
  /// actual state, and a re-fetch would only feed the loop its own output.
  pub fn observe(&mut self, actual: Spec) -> Vec<ReconcileError> {
    self.actual = actual;
    self.update(false)
  }

  fn update(&mut self, trigger_refresh: bool) -> Vec<ReconcileError> {
    let mut errors = Vec::new();
    let mut modified = false;
    let result = compare(Some(&self.desired), Some(&self.actual), &self.options);

    // adding features (before applications), supporting infrastructure some
    // applications might rely on
    for feature in &result.features.added {
      match self.provider.create_feature(feature) {
        Ok(()) => {
          debug!(feature = feature.name(), hash = %feature.config_hash(), "created feature");
          modified = true;
        }
        Err(source) => {
          error!(feature = feature.name(), error = %source, "error while creating feature");
          errors.push(ReconcileError::Feature {
            op: Op::Create,
            name: feature.name().to_string(),
            source,
          });
        }
      }
    }

    // updating features (before applications)
    for feature in &result.features.changed {
      match self.provider.update_feature(feature) {
        Ok(()) => {
          debug!(feature = feature.name(), hash = %feature.config_hash(), "updated feature");
          modified = true;
        }
        Err(source) => {
          error!(feature = feature.name(), error = %source, "error while updating feature");
          errors.push(ReconcileError::Feature {
            op: Op::Update,
            name: feature.name().to_string(),
            source,
          });
        }
      }
    }

    // remove applications -> first
    for app in &result.apps.removed {
      match self.provider.remove_application(app) {
        Ok(()) => {
          debug!(app = %app.name, "removed application");
          modified = true;
        }
        Err(source) => {
          error!(app = %app.name, error = %source, "error while removing application");
          errors.push(ReconcileError::Application {
            op: Op::Remove,
            name: app.name.clone(),
            source,
          });
        }
      }
    }

    // update applications -> second
    for app in &result.apps.changed {
      match self.provider.update_application(app) {
        Ok(()) => {
          debug!(app = %app.name, hash = %app.fingerprint(), "updated application");
          modified = true;
        }
        Err(source) => {
          error!(app = %app.name, error = %source, "error while updating application");
          errors.push(ReconcileError::Application {
            op: Op::Update,
            name: app.name.clone(),
            source,
          });
        }
      }
    }

    // create new applications -> last
    for app in &result.apps.added {
      match self.provider.create_application(app) {
        Ok(()) => {
          debug!(app = %app.name, hash = %app.fingerprint(), "created application");
          modified = true;
        }
        Err(source) => {
          error!(app = %app.name, error = %source, "error while creating application");
          errors.push(ReconcileError::Application {
            op: Op::Create,
            name: app.name.clone(),
            source,
          });
        }
      }
    }

    // remove features (after applications)
    for feature in &result.features.removed {
      match self.provider.remove_feature(feature) {
        Ok(()) => {
          debug!(feature = feature.name(), "removed feature");
          modified = true;
        }
        Err(source) => {
          error!(feature = feature.name(), error = %source, "error while removing feature");
          errors.push(ReconcileError::Feature {
            op: Op::Remove,
            name: feature.name().to_string(),
            source,
          });
        }
      }
    }

    if modified && trigger_refresh {
      debug!("changes were applied to the external system, pulling latest actual state");
      match self.provider.actual_state() {
        Ok(actual) => self.actual = actual,
        Err(source) => {
          error!(error = %source, "unable to get actual state from external system");
          errors.push(ReconcileError::Refresh(source));
        }
      }
    }

    errors
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::feature::FluentBit;
  use crate::resource::{Application, Image};
  use crate::state::FeatureSet;
  use crate::util::testutil::{ProviderCall, RecordingProvider};

  fn sample_app(name: &str) -> Application {
    Application::new(name, Image::new("nginx", "latest"))
  }

  fn spec_with_apps(apps: Vec<Application>) -> Spec {
    Spec {
      applications: apps,
      ..Spec::default()
    }
  }

  fn spec_with_fluent_bit(log_level: &str) -> Spec {
    Spec {
      feature: FeatureSet {
        fluent_bit: Some(FluentBit::default().with_log_level(log_level)),
      },
      ..Spec::default()
    }
  }

  #[test]
  fn new_reconciler_starts_from_empty_specs() {
    let provider = Arc::new(RecordingProvider::new());
    let reconciler = Reconciler::new(provider);

    assert_eq!(reconciler.desired, Spec::default());
    assert_eq!(reconciler.actual, Spec::default());
  }

  #[test]
  fn apply_creates_application_and_refreshes_actual_state() {
    let provider = Arc::new(RecordingProvider::new());
    let mut reconciler = Reconciler::new(provider.clone());

    let desired = spec_with_apps(vec![sample_app("app-1")]);
    provider.set_actual_state(desired.clone());

    let errors = reconciler.apply(desired.clone());

    assert!(errors.is_empty());
    assert_eq!(
      provider.calls(),
      vec![ProviderCall::CreateApplication("app-1".to_string()), ProviderCall::ActualState]
    );

    // Converged now: a second apply issues no calls and skips the refresh.
    provider.reset();
    let errors = reconciler.apply(desired);
    assert!(errors.is_empty());
    assert!(provider.calls().is_empty());
  }

  #[test]
  fn apply_removes_application_no_longer_desired() {
    let provider = Arc::new(RecordingProvider::new());
    let actual = spec_with_apps(vec![sample_app("app-1")]);
    let mut reconciler = Reconciler::new(provider.clone()).with_initial_actual_state(actual);

    let errors = reconciler.apply(Spec::default());

    assert!(errors.is_empty());
    assert_eq!(
      provider.calls(),
      vec![ProviderCall::RemoveApplication("app-1".to_string()), ProviderCall::ActualState]
    );
  }

  #[test]
  fn apply_updates_changed_application() {
    let actual_app = sample_app("app-1");
    let mut desired_app = sample_app("app-1");
    desired_app.image.tag = "v1.0.0".to_string();

    let provider = Arc::new(RecordingProvider::new());
    let mut reconciler =
      Reconciler::new(provider.clone()).with_initial_actual_state(spec_with_apps(vec![actual_app]));

    let errors = reconciler.apply(spec_with_apps(vec![desired_app]));

    assert!(errors.is_empty());
    assert_eq!(
      provider.calls(),
      vec![ProviderCall::UpdateApplication("app-1".to_string()), ProviderCall::ActualState]
    );
  }

  #[test]
  fn failed_create_is_collected_and_skips_refresh() {
    let provider = Arc::new(RecordingProvider::new());
    provider.fail_create_application(ProviderError::Backend("test error".to_string()));
    let mut reconciler = Reconciler::new(provider.clone());

    let errors = reconciler.apply(spec_with_apps(vec![sample_app("app-1")]));

    assert_eq!(errors.len(), 1);
    assert!(matches!(
      &errors[0],
      ReconcileError::Application { op: Op::Create, name, .. } if name == "app-1"
    ));
    assert_eq!(provider.actual_state_calls(), 0);
  }

  #[test]
  fn failed_removal_is_collected_and_skips_refresh() {
    let provider = Arc::new(RecordingProvider::new());
    provider.fail_remove_application(ProviderError::AppNotFound);
    let mut reconciler =
      Reconciler::new(provider.clone()).with_initial_actual_state(spec_with_apps(vec![sample_app("app-1")]));

    let errors = reconciler.apply(Spec::default());

    assert_eq!(errors.len(), 1);
    assert_eq!(provider.actual_state_calls(), 0);
  }

  #[test]
  fn partial_failure_still_attempts_remaining_steps() {
    // The failing update must not stop the removal and creation steps.
    let mut changed = sample_app("changed");
    changed.image.tag = "v2".to_string();

    let provider = Arc::new(RecordingProvider::new());
    provider.fail_update_application(ProviderError::Backend("test error".to_string()));
    let mut reconciler = Reconciler::new(provider.clone())
      .with_initial_actual_state(spec_with_apps(vec![sample_app("changed"), sample_app("removed")]));

    let errors = reconciler.apply(spec_with_apps(vec![changed, sample_app("added")]));

    assert_eq!(errors.len(), 1);
    let calls = provider.calls();
    assert!(calls.contains(&ProviderCall::RemoveApplication("removed".to_string())));
    assert!(calls.contains(&ProviderCall::CreateApplication("added".to_string())));
    // The successful remove and create still count as modifications.
    assert_eq!(provider.actual_state_calls(), 1);
  }

  #[test]
  fn refresh_failure_keeps_previous_actual_state() {
    let actual = spec_with_apps(vec![sample_app("app-1")]);

    let provider = Arc::new(RecordingProvider::new());
    provider.fail_actual_state(ProviderError::Backend("test error".to_string()));
    let mut reconciler = Reconciler::new(provider.clone()).with_initial_actual_state(actual.clone());

    let errors = reconciler.apply(Spec::default());

    assert_eq!(errors.len(), 1);
    assert!(matches!(&errors[0], ReconcileError::Refresh(_)));
    assert_eq!(provider.actual_state_calls(), 1);
    // The cache stays on the last known state when the fetch fails.
    assert_eq!(reconciler.actual, actual);
  }

  #[test]
  fn observe_never_refreshes_actual_state() {
    let provider = Arc::new(RecordingProvider::new());
    let mut reconciler = Reconciler::new(provider.clone());
    reconciler.desired = spec_with_apps(vec![sample_app("app-1"), sample_app("app-2")]);

    let errors = reconciler.observe(spec_with_apps(vec![sample_app("app-1")]));

    assert!(errors.is_empty());
    assert_eq!(provider.calls(), vec![ProviderCall::CreateApplication("app-2".to_string())]);
  }

  #[test]
  fn apply_creates_feature_before_application_changes() {
    let mut changed = sample_app("changed");
    changed.image.tag = "v2".to_string();

    let mut desired = spec_with_fluent_bit("debug");
    desired.applications = vec![changed, sample_app("added")];

    let provider = Arc::new(RecordingProvider::new());
    let mut reconciler = Reconciler::new(provider.clone())
      .with_initial_actual_state(spec_with_apps(vec![sample_app("changed"), sample_app("removed")]));

    let errors = reconciler.apply(desired);

    assert!(errors.is_empty());
    assert_eq!(
      provider.calls(),
      vec![
        ProviderCall::CreateFeature("fluent-bit".to_string()),
        ProviderCall::RemoveApplication("removed".to_string()),
        ProviderCall::UpdateApplication("changed".to_string()),
        ProviderCall::CreateApplication("added".to_string()),
        ProviderCall::ActualState,
      ]
    );
  }

  #[test]
  fn apply_removes_feature_after_application_changes() {
    let provider = Arc::new(RecordingProvider::new());
    let mut actual = spec_with_fluent_bit("info");
    actual.applications = vec![sample_app("old")];
    let mut reconciler = Reconciler::new(provider.clone()).with_initial_actual_state(actual);

    let errors = reconciler.apply(spec_with_apps(vec![sample_app("new")]));

    assert!(errors.is_empty());
    assert_eq!(
      provider.calls(),
      vec![
        ProviderCall::RemoveApplication("old".to_string()),
        ProviderCall::CreateApplication("new".to_string()),
        ProviderCall::RemoveFeature("fluent-bit".to_string()),
        ProviderCall::ActualState,
      ]
    );
  }

  #[test]
  fn apply_updates_changed_feature() {
    let provider = Arc::new(RecordingProvider::new());
    let mut reconciler =
      Reconciler::new(provider.clone()).with_initial_actual_state(spec_with_fluent_bit("info"));

    let errors = reconciler.apply(spec_with_fluent_bit("debug"));

    assert!(errors.is_empty());
    assert_eq!(
      provider.calls(),
      vec![ProviderCall::UpdateFeature("fluent-bit".to_string()), ProviderCall::ActualState]
    );
  }

  #[test]
  fn failed_feature_creation_is_collected_and_skips_refresh() {
    let provider = Arc::new(RecordingProvider::new());
    provider.fail_create_feature(ProviderError::FeatureNotSupported);
    let mut reconciler = Reconciler::new(provider.clone());

    let errors = reconciler.apply(spec_with_fluent_bit("debug"));

    assert_eq!(errors.len(), 1);
    assert!(matches!(
      &errors[0],
      ReconcileError::Feature { op: Op::Create, name, source: ProviderError::FeatureNotSupported } if name == "fluent-bit"
    ));
    assert_eq!(provider.actual_state_calls(), 0);
  }

  #[test]
  fn failed_feature_removal_is_collected_and_skips_refresh() {
    let provider = Arc::new(RecordingProvider::new());
    provider.fail_remove_feature(ProviderError::FeatureNotFound);
    let mut reconciler =
      Reconciler::new(provider.clone()).with_initial_actual_state(spec_with_fluent_bit("info"));

    let errors = reconciler.apply(Spec::default());

    assert_eq!(errors.len(), 1);
    assert_eq!(provider.actual_state_calls(), 0);
  }
}
