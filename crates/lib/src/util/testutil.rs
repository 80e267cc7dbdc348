//! Test utilities for corral-lib.
//!
//! Provides a recording [`Provider`] implementation that captures every call
//! in order and returns scripted failures, for exercising the reconciler and
//! the control loop without a container runtime.

use std::sync::Mutex;

use crate::feature::Feature;
use crate::provider::{Provider, ProviderError};
use crate::resource::Application;
use crate::state::Spec;

/// A single recorded provider invocation, in call order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderCall {
  CreateApplication(String),
  UpdateApplication(String),
  RemoveApplication(String),
  CreateFeature(String),
  UpdateFeature(String),
  RemoveFeature(String),
  ActualState,
}

#[derive(Debug, Default)]
struct ScriptedErrors {
  create_application: Option<ProviderError>,
  update_application: Option<ProviderError>,
  remove_application: Option<ProviderError>,
  create_feature: Option<ProviderError>,
  update_feature: Option<ProviderError>,
  remove_feature: Option<ProviderError>,
  actual_state: Option<ProviderError>,
}

/// Provider double recording calls and returning scripted results.
#[derive(Debug, Default)]
pub struct RecordingProvider {
  calls: Mutex<Vec<ProviderCall>>,
  errors: Mutex<ScriptedErrors>,
  actual: Mutex<Spec>,
}

impl RecordingProvider {
  pub fn new() -> Self {
    Self::default()
  }

  /// All calls made so far, in order.
  pub fn calls(&self) -> Vec<ProviderCall> {
    self.calls.lock().unwrap().clone()
  }

  /// Number of `actual_state` invocations.
  pub fn actual_state_calls(&self) -> usize {
    self
      .calls()
      .iter()
      .filter(|call| **call == ProviderCall::ActualState)
      .count()
  }

  /// Clear recorded calls and scripted errors.
  pub fn reset(&self) {
    self.calls.lock().unwrap().clear();
    *self.errors.lock().unwrap() = ScriptedErrors::default();
  }

  /// Spec returned by subsequent `actual_state` calls.
  pub fn set_actual_state(&self, spec: Spec) {
    *self.actual.lock().unwrap() = spec;
  }

  pub fn fail_create_application(&self, error: ProviderError) {
    self.errors.lock().unwrap().create_application = Some(error);
  }

  pub fn fail_update_application(&self, error: ProviderError) {
    self.errors.lock().unwrap().update_application = Some(error);
  }

  pub fn fail_remove_application(&self, error: ProviderError) {
    self.errors.lock().unwrap().remove_application = Some(error);
  }

  pub fn fail_create_feature(&self, error: ProviderError) {
    self.errors.lock().unwrap().create_feature = Some(error);
  }

  pub fn fail_update_feature(&self, error: ProviderError) {
    self.errors.lock().unwrap().update_feature = Some(error);
  }

  pub fn fail_remove_feature(&self, error: ProviderError) {
    self.errors.lock().unwrap().remove_feature = Some(error);
  }

  pub fn fail_actual_state(&self, error: ProviderError) {
    self.errors.lock().unwrap().actual_state = Some(error);
  }

  fn record(&self, call: ProviderCall) {
    self.calls.lock().unwrap().push(call);
  }

  fn scripted(&self, pick: impl Fn(&ScriptedErrors) -> Option<ProviderError>) -> Result<(), ProviderError> {
    match pick(&self.errors.lock().unwrap()) {
      Some(error) => Err(error),
      None => Ok(()),
    }
  }
}

impl Provider for RecordingProvider {
  fn create_application(&self, app: &Application) -> Result<(), ProviderError> {
    self.record(ProviderCall::CreateApplication(app.name.clone()));
    self.scripted(|errors| errors.create_application.clone())
  }

  fn update_application(&self, app: &Application) -> Result<(), ProviderError> {
    self.record(ProviderCall::UpdateApplication(app.name.clone()));
    self.scripted(|errors| errors.update_application.clone())
  }

  fn remove_application(&self, app: &Application) -> Result<(), ProviderError> {
    self.record(ProviderCall::RemoveApplication(app.name.clone()));
    self.scripted(|errors| errors.remove_application.clone())
  }

  fn create_feature(&self, feature: &Feature) -> Result<(), ProviderError> {
    self.record(ProviderCall::CreateFeature(feature.name().to_string()));
    self.scripted(|errors| errors.create_feature.clone())
  }

  fn update_feature(&self, feature: &Feature) -> Result<(), ProviderError> {
    self.record(ProviderCall::UpdateFeature(feature.name().to_string()));
    self.scripted(|errors| errors.update_feature.clone())
  }

  fn remove_feature(&self, feature: &Feature) -> Result<(), ProviderError> {
    self.record(ProviderCall::RemoveFeature(feature.name().to_string()));
    self.scripted(|errors| errors.remove_feature.clone())
  }

  fn actual_state(&self) -> Result<Spec, ProviderError> {
    self.record(ProviderCall::ActualState);
    if let Some(error) = self.errors.lock().unwrap().actual_state.clone() {
      return Err(error);
    }
    Ok(self.actual.lock().unwrap().clone())
  }
}
