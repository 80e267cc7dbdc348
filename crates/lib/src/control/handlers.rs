//! Concurrent-safe registry of state update handlers.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use uuid::Uuid;

use crate::state::Spec;

/// Identifier returned on registration, used for removal.
pub type HandlerId = String;

/// Called when a state update has been received from the external container
/// system.
pub type StateUpdateHandler = Arc<dyn Fn(Spec) + Send + Sync>;

/// Registry of state update handlers.
///
/// Guarded independently of the reconciliation worker so registration and
/// removal never interfere with an in-flight pass and stay safe under
/// arbitrary concurrent call volume.
#[derive(Default)]
pub struct HandlerRegistry {
  handlers: Mutex<HashMap<HandlerId, StateUpdateHandler>>,
}

impl HandlerRegistry {
  pub fn new() -> Self {
    Self::default()
  }

  /// Register a handler and return its id for later removal.
  pub fn register(&self, handler: StateUpdateHandler) -> HandlerId {
    let id = Uuid::new_v4().to_string();
    self.lock().insert(id.clone(), handler);
    id
  }

  /// Remove the handler registered under the given id.
  pub fn remove(&self, id: &str) {
    self.lock().remove(id);
  }

  pub fn len(&self) -> usize {
    self.lock().len()
  }

  pub fn is_empty(&self) -> bool {
    self.lock().is_empty()
  }

  /// Invoke every registered handler with the given spec.
  ///
  /// Handlers run outside the lock so a slow handler never blocks
  /// registration or removal.
  pub fn notify(&self, spec: &Spec) {
    let snapshot: Vec<StateUpdateHandler> = self.lock().values().cloned().collect();
    for handler in snapshot {
      handler(spec.clone());
    }
  }

  fn lock(&self) -> MutexGuard<'_, HashMap<HandlerId, StateUpdateHandler>> {
    match self.handlers.lock() {
      Ok(guard) => guard,
      Err(poisoned) => poisoned.into_inner(),
    }
  }
}
