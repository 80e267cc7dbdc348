//! Local JSON file state store.
//!
//! # Storage layout
//!
//! The full desired state lives in a single pretty-printed JSON document.
//! Writes go through a sibling temp file plus rename so readers never see a
//! torn document.
//!
//! # Change detection
//!
//! [`LocalStore::watch`] spawns a polling task hashing the file contents; a
//! changed digest broadcasts the freshly parsed spec to all subscribers.
//! The agent's own persist calls change the digest too, so API-driven
//! mutations and external file edits arrive through the same stream.

use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::state::Spec;
use crate::util::hash::hash_bytes;

use super::{PersistError, StateStore};

/// Capacity of the change broadcast channel; a slow subscriber lags rather
/// than blocking the watcher.
const CHANGE_CHANNEL_CAPACITY: usize = 16;

/// State store backed by a single local JSON file.
pub struct LocalStore {
  path: PathBuf,
  changes: broadcast::Sender<Spec>,
  last_digest: Mutex<Option<String>>,
}

impl LocalStore {
  pub fn new(path: impl Into<PathBuf>) -> Arc<Self> {
    let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
    Arc::new(Self {
      path: path.into(),
      changes,
      last_digest: Mutex::new(None),
    })
  }

  pub fn path(&self) -> &std::path::Path {
    &self.path
  }

  /// Start watching the state file for changes.
  ///
  /// The current file contents become the baseline: only changes observed
  /// after this call are broadcast. The task holds no strong reference and
  /// stops once the store is dropped.
  pub fn watch(self: Arc<Self>, interval: Duration) -> JoinHandle<()> {
    *self.lock_digest() = self.digest().ok().flatten();

    let store = Arc::downgrade(&self);
    tokio::spawn(async move {
      let mut ticker = tokio::time::interval(interval);
      ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

      loop {
        ticker.tick().await;
        let Some(store) = store.upgrade() else {
          return;
        };
        store.poll();
      }
    })
  }

  fn poll(&self) {
    let digest = match self.digest() {
      Ok(digest) => digest,
      Err(error) => {
        warn!(%error, path = %self.path.display(), "unable to check state file for changes");
        return;
      }
    };

    let mut last_digest = self.lock_digest();
    if *last_digest == digest {
      return;
    }
    *last_digest = digest;
    drop(last_digest);

    debug!(path = %self.path.display(), "state file modification detected");
    match self.read() {
      Ok(Some(spec)) => {
        let _ = self.changes.send(spec);
      }
      Ok(None) => {}
      Err(error) => {
        // Likely a half-written external edit; the next poll picks it up.
        warn!(%error, "state file changed but could not be read");
      }
    }
  }

  /// Content digest of the state file, `None` when the file is missing.
  fn digest(&self) -> Result<Option<String>, io::Error> {
    match fs::read(&self.path) {
      Ok(bytes) => Ok(Some(hash_bytes(&bytes))),
      Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(None),
      Err(error) => Err(error),
    }
  }

  fn lock_digest(&self) -> std::sync::MutexGuard<'_, Option<String>> {
    match self.last_digest.lock() {
      Ok(guard) => guard,
      Err(poisoned) => poisoned.into_inner(),
    }
  }
}

impl StateStore for LocalStore {
  /// Write the spec atomically (temp file plus rename).
  fn persist(&self, spec: &Spec) -> Result<(), PersistError> {
    if let Some(parent) = self.path.parent() {
      fs::create_dir_all(parent).map_err(PersistError::CreateDir)?;
    }

    let content = serde_json::to_string_pretty(spec).map_err(PersistError::Serialize)?;
    let temp_path = self.path.with_extension("json.tmp");
    fs::write(&temp_path, &content).map_err(PersistError::Write)?;
    fs::rename(&temp_path, &self.path).map_err(PersistError::Write)?;

    debug!(path = %self.path.display(), bytes = content.len(), "persisted state");
    Ok(())
  }

  fn read(&self) -> Result<Option<Spec>, PersistError> {
    let content = match fs::read_to_string(&self.path) {
      Ok(content) => content,
      Err(error) if error.kind() == io::ErrorKind::NotFound => return Ok(None),
      Err(error) => return Err(PersistError::Read(error)),
    };

    if content.trim().is_empty() {
      return Ok(None);
    }

    let spec = serde_json::from_str(&content).map_err(PersistError::Parse)?;
    Ok(Some(spec))
  }

  fn subscribe(&self) -> broadcast::Receiver<Spec> {
    self.changes.subscribe()
  }
}
