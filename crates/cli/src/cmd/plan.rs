//! Plan command implementation.
//!
//! Compares a candidate specification file against the currently persisted
//! state and displays the classified changes without applying anything.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use owo_colors::{OwoColorize, Stream};

use corral_lib::persist::{LocalStore, StateStore};
use corral_lib::state::Spec;
use corral_lib::state::diff::{Changeset, DiffOptions, compare};

use crate::output::{print_json, symbols};

pub fn cmd_plan(state_file: &Path, candidate: &Path, ignore_instance_diff: bool, json: bool) -> Result<()> {
  let content = fs::read_to_string(candidate)
    .with_context(|| format!("Failed to read candidate spec: {}", candidate.display()))?;
  let candidate_spec: Spec = serde_json::from_str(&content)
    .with_context(|| format!("Failed to parse candidate spec: {}", candidate.display()))?;

  let store = LocalStore::new(state_file);
  let current = store.read()?;

  let options = DiffOptions { ignore_instance_diff };
  let changes = compare(Some(&candidate_spec), current.as_ref(), &options);

  if json {
    print_json(&changes)?;
    return Ok(());
  }

  if changes.is_empty() {
    println!("No changes.");
    return Ok(());
  }

  print_changes(&changes);
  Ok(())
}

fn print_changes(changes: &Changeset) {
  if !changes.apps.is_empty() {
    println!("Applications:");
    for app in &changes.apps.added {
      print_line(symbols::PLUS, &app.name, "added");
    }
    for app in &changes.apps.changed {
      print_line(symbols::TILDE, &app.name, "changed");
    }
    for app in &changes.apps.removed {
      print_line(symbols::MINUS, &app.name, "removed");
    }
    if !changes.apps.unchanged.is_empty() {
      println!("  = {} unchanged", changes.apps.unchanged.len());
    }
    println!();
  }

  if !changes.features.is_empty() {
    println!("Features:");
    for feature in &changes.features.added {
      print_line(symbols::PLUS, feature.name(), "added");
    }
    for feature in &changes.features.changed {
      print_line(symbols::TILDE, feature.name(), "changed");
    }
    for feature in &changes.features.removed {
      print_line(symbols::MINUS, feature.name(), "removed");
    }
    if !changes.features.unchanged.is_empty() {
      println!("  = {} unchanged", changes.features.unchanged.len());
    }
  }
}

fn print_line(symbol: &str, name: &str, description: &str) {
  let colored = match symbol {
    symbols::PLUS => symbol.if_supports_color(Stream::Stdout, |s| s.green()).to_string(),
    symbols::MINUS => symbol.if_supports_color(Stream::Stdout, |s| s.red()).to_string(),
    _ => symbol.if_supports_color(Stream::Stdout, |s| s.yellow()).to_string(),
  };
  println!("  {} {} ({})", colored, name, description);
}
