//! Init command implementation.
//!
//! Writes an empty state file so a running agent (or the other commands)
//! have a durable store to work against.

use std::path::Path;

use anyhow::{Result, bail};

use corral_lib::persist::{LocalStore, StateStore};
use corral_lib::state::Spec;

use crate::output::print_success;

pub fn cmd_init(state_file: &Path, force: bool) -> Result<()> {
  if state_file.exists() && !force {
    bail!(
      "State file already exists: {} (use --force to overwrite)",
      state_file.display()
    );
  }

  let store = LocalStore::new(state_file);
  store.persist(&Spec::default())?;

  print_success(&format!("Initialized empty state at {}", state_file.display()));
  Ok(())
}
