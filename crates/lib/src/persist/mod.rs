//! Durable storage of the desired state.
//!
//! A [`StateStore`] persists and reads the desired [`Spec`] and exposes a
//! change-notification stream fired on every detected durable-store change,
//! whether caused by the agent's own persist call or by an out-of-band edit.
//! Both trigger sources funnel into the same reconciliation path.

mod local;

use std::io;

use thiserror::Error;
use tokio::sync::broadcast;

use crate::state::Spec;

pub use local::LocalStore;

/// Errors from durable-store operations.
#[derive(Debug, Error)]
pub enum PersistError {
  #[error("failed to create state directory: {0}")]
  CreateDir(#[source] io::Error),

  #[error("failed to read state file: {0}")]
  Read(#[source] io::Error),

  #[error("failed to write state file: {0}")]
  Write(#[source] io::Error),

  #[error("failed to parse state file: {0}")]
  Parse(#[source] serde_json::Error),

  #[error("failed to serialize state: {0}")]
  Serialize(#[source] serde_json::Error),
}

/// Persistent storage of the desired state, regardless of the storage device
/// behind it.
pub trait StateStore: Send + Sync {
  /// Write the given state specification to the storage device.
  fn persist(&self, spec: &Spec) -> Result<(), PersistError>;

  /// Read the currently persisted state, `None` when nothing has been
  /// persisted yet.
  fn read(&self) -> Result<Option<Spec>, PersistError>;

  /// Receiver for change notifications of the persisted state.
  fn subscribe(&self) -> broadcast::Receiver<Spec>;
}
