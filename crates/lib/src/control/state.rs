//! Ownership of the desired state.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};

use crate::persist::{PersistError, StateStore};
use crate::resource::Application;
use crate::state::{Spec, SpecError};

use super::{Control, ControlError};

/// Errors from state controller operations.
#[derive(Debug, Error)]
pub enum ControllerError {
  #[error(transparent)]
  Spec(#[from] SpecError),

  #[error("unable to persist state: {0}")]
  Persist(#[from] PersistError),

  #[error(transparent)]
  Control(#[from] ControlError),
}

/// Manages the internal desired state of the agent.
///
/// CRUD operations mutate the in-memory spec and persist it through the
/// state store; they never invoke the control loop themselves. The store's
/// change-notification stream (fired for the controller's own persist calls
/// and for out-of-band edits alike) is the sole steady-state trigger into
/// the loop's apply path.
pub struct StateController {
  /// The desired state as it is known in memory.
  desired: Spec,
  /// Persistent storage keeping the configuration across restarts.
  store: Arc<dyn StateStore>,
}

impl StateController {
  /// Initialize the controller: load the persisted state, converge once,
  /// and subscribe to store changes.
  ///
  /// With `reset_on_startup`, an empty specification is applied before the
  /// loaded one to clear the external system first. The loaded spec is
  /// applied directly, bypassing the notification path, so the system
  /// converges immediately instead of waiting for a store event.
  ///
  /// The control loop must already be running (see [`Control::start`]).
  pub async fn init(
    ctrl: Arc<Control>,
    store: Arc<dyn StateStore>,
    reset_on_startup: bool,
  ) -> Result<Self, ControllerError> {
    let desired = store.read()?.unwrap_or_default();
    info!(applications = desired.applications.len(), "loaded initial desired state");

    if reset_on_startup {
      warn!("applying empty state specification to reset provider");
      log_pass_errors(ctrl.apply(Spec::default()).await?);
    }

    log_pass_errors(ctrl.apply(desired.clone()).await?);

    let mut changes = store.subscribe();
    tokio::spawn(async move {
      loop {
        match changes.recv().await {
          Ok(spec) => {
            debug!("received state change notification");
            match ctrl.apply(spec).await {
              Ok(errors) => log_pass_errors(errors),
              Err(error) => {
                warn!(%error, "control loop rejected state change, stopping subscription");
                return;
              }
            }
          }
          Err(RecvError::Lagged(missed)) => {
            warn!(missed, "state change notifications lagged");
          }
          Err(RecvError::Closed) => {
            debug!("state change stream has been closed");
            return;
          }
        }
      }
    });

    Ok(Self { desired, store })
  }

  /// Add a new application to the desired state and persist it.
  pub fn create_application(&mut self, app: Application) -> Result<Spec, ControllerError> {
    self.desired.add_application(app)?;
    self.store.persist(&self.desired)?;
    Ok(self.desired.clone())
  }

  /// Update an existing application in the desired state and persist it.
  pub fn update_application(&mut self, app: Application) -> Result<Spec, ControllerError> {
    self.desired.update_application(app)?;
    self.store.persist(&self.desired)?;
    Ok(self.desired.clone())
  }

  /// Remove an application from the desired state and persist it.
  pub fn delete_application(&mut self, name: &str) -> Result<Spec, ControllerError> {
    self.desired.remove_application(name)?;
    self.store.persist(&self.desired)?;
    Ok(self.desired.clone())
  }

  /// The desired state as currently known in memory.
  pub fn current_state(&self) -> &Spec {
    &self.desired
  }
}

fn log_pass_errors(errors: Vec<crate::reconcile::ReconcileError>) {
  for error in errors {
    warn!(%error, "reconciliation pass reported an error");
  }
}
