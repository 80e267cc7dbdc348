//! The external container system boundary.
//!
//! A [`Provider`] translates application and feature intents into concrete
//! container-runtime operations. The reconciler only ever talks to this
//! trait; concrete runtime clients live outside the core.

use thiserror::Error;

use crate::feature::Feature;
use crate::resource::Application;
use crate::state::Spec;

/// Errors surfaced by provider operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProviderError {
  /// Removal referenced an application with no matching external resource.
  #[error("application not found")]
  AppNotFound,

  /// Removal referenced a feature with no matching external resource.
  #[error("feature not found")]
  FeatureNotFound,

  /// A feature variant with no corresponding creation path on this provider.
  #[error("feature is not supported by provider")]
  FeatureNotSupported,

  /// Opaque failure from the external system, surfaced verbatim.
  #[error("{0}")]
  Backend(String),
}

/// The external container system used to apply changes derived from the
/// desired and actual state of the system.
pub trait Provider: Send + Sync {
  /// Create a new application.
  fn create_application(&self, app: &Application) -> Result<(), ProviderError>;

  /// Update an existing application.
  fn update_application(&self, app: &Application) -> Result<(), ProviderError>;

  /// Remove an existing application.
  fn remove_application(&self, app: &Application) -> Result<(), ProviderError>;

  /// Create a new feature.
  fn create_feature(&self, feature: &Feature) -> Result<(), ProviderError>;

  /// Update an existing feature.
  fn update_feature(&self, feature: &Feature) -> Result<(), ProviderError>;

  /// Remove an existing feature.
  fn remove_feature(&self, feature: &Feature) -> Result<(), ProviderError>;

  /// Analyze the current external state and return it as a specification.
  fn actual_state(&self) -> Result<Spec, ProviderError>;
}
