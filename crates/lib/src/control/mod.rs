//! The control plane: serialization of reconciliation passes and ownership
//! of the desired state.
//!
//! [`Control`] is the single serialization point: all state-changing
//! operations funnel through one worker executing reconciliation passes
//! strictly one at a time. [`StateController`] owns the in-memory desired
//! state, persists every mutation, and relies on the store's
//! change-notification stream as the sole steady-state trigger into the
//! loop.

mod handlers;
mod state;

use std::sync::{Arc, Mutex};

use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::provider::{Provider, ProviderError};
use crate::reconcile::{ReconcileError, Reconciler};
use crate::state::Spec;
use crate::state::diff::DiffOptions;

pub use handlers::{HandlerId, HandlerRegistry, StateUpdateHandler};
pub use state::{ControllerError, StateController};

/// Errors from control loop operations.
#[derive(Debug, Error)]
pub enum ControlError {
  /// The initial actual state could not be retrieved. Fatal at startup: the
  /// loop never starts without a baseline.
  #[error("unable to retrieve initial actual state from provider: {0}")]
  InitialState(#[source] ProviderError),

  /// The worker has stopped; the request was rejected instead of blocking
  /// forever.
  #[error("control loop is not running")]
  Stopped,
}

/// A pending pass request: the submitted spec plus the reply slot the caller
/// blocks on.
struct Request {
  spec: Spec,
  reply: oneshot::Sender<Vec<ReconcileError>>,
}

/// Keeps the system in the desired state by serializing the changes coming
/// from the user and from the external system.
///
/// `apply` and `observe` are synchronous from the caller's perspective: the
/// future resolves once the worker has fully processed the request and
/// returns the aggregated error list of that pass. Each request kind has a
/// capacity-one queue, so at most one of each is pending and further
/// producers wait for a slot.
pub struct Control {
  apply_tx: mpsc::Sender<Request>,
  observe_tx: mpsc::Sender<Request>,
  exit_tx: mpsc::Sender<()>,
  handlers: Arc<HandlerRegistry>,
  worker: Mutex<Option<Worker>>,
}

/// Single-consumer side of the loop, owning the reconciler and with it the
/// cached desired and actual state.
struct Worker {
  reconciler: Reconciler,
  apply_rx: mpsc::Receiver<Request>,
  observe_rx: mpsc::Receiver<Request>,
  exit_rx: mpsc::Receiver<()>,
  handlers: Arc<HandlerRegistry>,
}

impl Control {
  /// Initialize the control loop against the given provider.
  ///
  /// Fetches the initial actual state to seed the reconciler; failure here
  /// is an unrecoverable startup precondition.
  pub fn init(provider: Arc<dyn Provider>, options: DiffOptions) -> Result<Self, ControlError> {
    let actual = provider.actual_state().map_err(|error| {
      warn!("unable to retrieve initial actual state from external provider");
      ControlError::InitialState(error)
    })?;

    info!(applications = actual.applications.len(), "retrieved current application state");
    let reconciler = Reconciler::new(provider)
      .with_options(options)
      .with_initial_actual_state(actual);

    let (apply_tx, apply_rx) = mpsc::channel(1);
    let (observe_tx, observe_rx) = mpsc::channel(1);
    let (exit_tx, exit_rx) = mpsc::channel(1);
    let handlers = Arc::new(HandlerRegistry::new());

    Ok(Self {
      apply_tx,
      observe_tx,
      exit_tx,
      handlers: Arc::clone(&handlers),
      worker: Mutex::new(Some(Worker {
        reconciler,
        apply_rx,
        observe_rx,
        exit_rx,
        handlers,
      })),
    })
  }

  /// Run the control loop until [`Control::stop`] is called.
  ///
  /// Must be running before `apply`/`observe` resolve; spawn it onto the
  /// runtime. Calling `start` a second time is a no-op.
  pub async fn start(&self) {
    let worker = self.take_worker();
    let Some(mut worker) = worker else {
      warn!("control loop has already been started");
      return;
    };

    info!("resource control loop has been started");
    worker.run().await;
  }

  /// Submit a desired state and wait for the reconciliation pass to finish.
  pub async fn apply(&self, spec: Spec) -> Result<Vec<ReconcileError>, ControlError> {
    let (reply, response) = oneshot::channel();
    self
      .apply_tx
      .send(Request { spec, reply })
      .await
      .map_err(|_| ControlError::Stopped)?;
    response.await.map_err(|_| ControlError::Stopped)
  }

  /// Submit an observed actual state and wait for the reconciliation pass to
  /// finish.
  pub async fn observe(&self, spec: Spec) -> Result<Vec<ReconcileError>, ControlError> {
    let (reply, response) = oneshot::channel();
    self
      .observe_tx
      .send(Request { spec, reply })
      .await
      .map_err(|_| ControlError::Stopped)?;
    response.await.map_err(|_| ControlError::Stopped)
  }

  /// Halt the control loop after the in-flight pass, if any, completes.
  ///
  /// Requests submitted after the worker exits fail with
  /// [`ControlError::Stopped`] rather than blocking forever.
  pub async fn stop(&self) {
    debug!("sending signal on 'exit' channel");
    let _ = self.exit_tx.send(()).await;
  }

  /// Register a state update handler; returns the id for removal.
  pub fn register_handler(&self, handler: StateUpdateHandler) -> HandlerId {
    self.handlers.register(handler)
  }

  /// Remove a handler by the id received from [`Control::register_handler`].
  pub fn remove_handler(&self, id: &str) {
    self.handlers.remove(id);
  }

  fn take_worker(&self) -> Option<Worker> {
    match self.worker.lock() {
      Ok(mut guard) => guard.take(),
      Err(poisoned) => poisoned.into_inner().take(),
    }
  }
}

impl Worker {
  /// Process requests one at a time until the exit signal arrives.
  ///
  /// Poll order is fixed: exit, then apply, then observe. There is no
  /// FIFO fairness across request kinds.
  async fn run(&mut self) {
    loop {
      tokio::select! {
        biased;

        _ = self.exit_rx.recv() => {
          debug!("received signal on 'exit' channel");
          return;
        }
        Some(request) = self.apply_rx.recv() => {
          info!(applications = request.spec.applications.len(), "received desired state on 'apply' channel");
          let errors = self.reconciler.apply(request.spec);
          let _ = request.reply.send(errors);
        }
        Some(request) = self.observe_rx.recv() => {
          info!(applications = request.spec.applications.len(), "received actual state on 'observe' channel");
          let observed = request.spec.clone();
          let errors = self.reconciler.observe(request.spec);
          self.handlers.notify(&observed);
          let _ = request.reply.send(errors);
        }
        else => return,
      }
    }
  }
}
