use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::feature::{Feature, FluentBit, NAME_FLUENT_BIT};
use crate::resource::Application;

/// Errors from spec-level CRUD operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SpecError {
  #[error("application '{0}' already exists")]
  AlreadyExists(String),

  #[error("no application found with name '{0}'")]
  NotFound(String),
}

/// The enabled features of a specification, one optional slot per variant.
///
/// Each variant is a logical singleton: at most one instance per spec.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureSet {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub fluent_bit: Option<FluentBit>,
}

impl FeatureSet {
  pub fn is_empty(&self) -> bool {
    self.fluent_bit.is_none()
  }

  /// Enabled variants as [`Feature`] values, for diffing and dispatch.
  pub fn features(&self) -> Vec<Feature> {
    let mut features = Vec::new();
    if let Some(fluent_bit) = &self.fluent_bit {
      features.push(Feature::FluentBit(fluent_bit.clone()));
    }
    features
  }
}

/// A state specification: applications plus enabled features.
///
/// Application names are unique within a spec; the CRUD operations enforce
/// this by failing, never by silently duplicating or dropping entries.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Spec {
  #[serde(default)]
  pub applications: Vec<Application>,

  #[serde(default, skip_serializing_if = "FeatureSet::is_empty")]
  pub feature: FeatureSet,
}

impl Spec {
  /// Find the application matching the given name.
  pub fn get_application(&self, name: &str) -> Option<&Application> {
    self.applications.iter().find(|app| app.name == name)
  }

  /// Append a new application if no other application exists with the same
  /// name.
  pub fn add_application(&mut self, app: Application) -> Result<(), SpecError> {
    if self.get_application(&app.name).is_some() {
      return Err(SpecError::AlreadyExists(app.name));
    }

    self.applications.push(app);
    Ok(())
  }

  /// Replace the application matching the update's name.
  pub fn update_application(&mut self, update: Application) -> Result<(), SpecError> {
    match self.applications.iter_mut().find(|app| app.name == update.name) {
      Some(existing) => {
        *existing = update;
        Ok(())
      }
      None => Err(SpecError::NotFound(update.name)),
    }
  }

  /// Remove the application matching the given name.
  pub fn remove_application(&mut self, name: &str) -> Result<(), SpecError> {
    match self.applications.iter().position(|app| app.name == name) {
      Some(index) => {
        self.applications.remove(index);
        Ok(())
      }
      None => Err(SpecError::NotFound(name.to_string())),
    }
  }

  /// Whether the named feature is enabled in this specification.
  pub fn is_feature_enabled(&self, name: &str) -> bool {
    match name {
      NAME_FLUENT_BIT => self.feature.fluent_bit.is_some(),
      _ => false,
    }
  }
}
