//! Diff computation between state specifications.
//!
//! [`compare`] classifies the differences between a desired and an actual
//! specification into added/changed/unchanged/removed partitions, for both
//! applications and features. The comparison is total: an absent spec is
//! treated as an empty one, and the function never fails.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::debug;

use crate::feature::Feature;
use crate::resource::Application;

use super::Spec;

/// Options influencing the comparison.
///
/// Passed explicitly so the diff stays a pure function of its inputs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiffOptions {
  /// Normalize the desired instance count to 1 before comparing, for
  /// runtimes that cannot express multiple instances of an application.
  pub ignore_instance_diff: bool,
}

/// One classified partition set.
///
/// Every desired entity lands in exactly one of `added`, `changed` or
/// `unchanged`; every actual entity unmatched by name lands in `removed`.
#[derive(Debug, Clone, Serialize)]
pub struct ChangeGroup<T> {
  pub added: Vec<T>,
  pub changed: Vec<T>,
  pub unchanged: Vec<T>,
  pub removed: Vec<T>,
}

impl<T> Default for ChangeGroup<T> {
  fn default() -> Self {
    Self {
      added: Vec::new(),
      changed: Vec::new(),
      unchanged: Vec::new(),
      removed: Vec::new(),
    }
  }
}

impl<T> ChangeGroup<T> {
  /// True when nothing needs to be created, updated or removed.
  pub fn is_empty(&self) -> bool {
    self.added.is_empty() && self.changed.is_empty() && self.removed.is_empty()
  }
}

/// The classified comparison result of two state specifications.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Changeset {
  pub apps: ChangeGroup<Application>,
  pub features: ChangeGroup<Feature>,
}

impl Changeset {
  /// True when desired and actual state already converge.
  pub fn is_empty(&self) -> bool {
    self.apps.is_empty() && self.features.is_empty()
  }
}

/// Calculate the state changes between the desired and actual system.
///
/// Both specifications are evaluated (feature defaults materialized) before
/// comparing. Matching is by name only; an application counts as changed
/// when its fingerprint or its (possibly normalized) instance count differs,
/// a feature when its config hash differs.
pub fn compare(desired: Option<&Spec>, actual: Option<&Spec>, options: &DiffOptions) -> Changeset {
  let mut desired = desired.cloned().unwrap_or_default();
  let mut actual = actual.cloned().unwrap_or_default();

  debug!("evaluating state specifications before comparing");
  desired.evaluate();
  actual.evaluate();

  let mut output = Changeset::default();

  // Applications: classify every desired entry, consuming its actual
  // counterpart; whatever remains unconsumed has been removed.
  let mut actual_apps: BTreeMap<String, Application> = actual
    .applications
    .into_iter()
    .map(|app| (app.name.clone(), app))
    .collect();

  for mut app in desired.applications {
    let Some(counterpart) = actual_apps.remove(&app.name) else {
      output.apps.added.push(app);
      continue;
    };

    if options.ignore_instance_diff {
      app.instances = 1;
    }

    let fingerprint_mismatch = app.fingerprint() != counterpart.fingerprint();
    let instance_mismatch = app.instances != counterpart.instances;
    debug!(
      app = %app.name,
      fingerprint_mismatch,
      instance_mismatch,
      "difference calculation for application"
    );

    if fingerprint_mismatch || instance_mismatch {
      output.apps.changed.push(app);
    } else {
      output.apps.unchanged.push(app);
    }
  }

  output.apps.removed.extend(actual_apps.into_values());

  // Features: same scheme keyed by name, compared by config hash. Features
  // have no instance dimension.
  let mut actual_features: BTreeMap<&'static str, Feature> = actual
    .feature
    .features()
    .into_iter()
    .map(|feature| (feature.name(), feature))
    .collect();

  for feature in desired.feature.features() {
    let Some(counterpart) = actual_features.remove(feature.name()) else {
      output.features.added.push(feature);
      continue;
    };

    let hash_mismatch = feature.config_hash() != counterpart.config_hash();
    debug!(feature = feature.name(), hash_mismatch, "difference calculation for feature");

    if hash_mismatch {
      output.features.changed.push(feature);
    } else {
      output.features.unchanged.push(feature);
    }
  }

  output.features.removed.extend(actual_features.into_values());

  output
}
