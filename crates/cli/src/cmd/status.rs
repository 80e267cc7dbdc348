//! Status command implementation.
//!
//! Displays the currently persisted desired state: applications with their
//! image references and fingerprints, plus the enabled features.

use std::path::Path;

use anyhow::Result;

use corral_lib::persist::{LocalStore, StateStore};
use corral_lib::state::Spec;

use crate::output::{print_error, print_info, print_json, print_stat, print_success, symbols, truncate_hash};

pub fn cmd_status(state_file: &Path, verbose: bool, json: bool) -> Result<()> {
  let store = LocalStore::new(state_file);

  let spec = match store.read() {
    Ok(Some(spec)) => spec,
    Ok(None) => {
      print_info("No state found. Run 'corral init' to create one.");
      return Ok(());
    }
    Err(e) => {
      print_error(&format!("Error loading state: {}", e));
      return Err(e.into());
    }
  };

  if json {
    print_json(&spec)?;
    return Ok(());
  }

  print_summary(&spec, verbose);
  Ok(())
}

fn print_summary(spec: &Spec, verbose: bool) {
  print_success(&format!(
    "Desired state: {} application(s), {} feature(s)",
    spec.applications.len(),
    spec.feature.features().len()
  ));
  println!();

  for app in &spec.applications {
    println!(
      "  {} {} ({})",
      symbols::INFO,
      app.name,
      truncate_hash(&app.fingerprint().0)
    );
    if verbose {
      print_stat("image", &app.image.reference());
      print_stat("instances", &app.instances.to_string());
      for port in &app.ports {
        print_stat(
          "port",
          &format!("{}:{}/{}", port.host_port, port.container_port, port.protocol.as_str()),
        );
      }
    }
  }

  let features = spec.feature.features();
  if !features.is_empty() {
    println!();
    println!("Features:");
    for feature in features {
      println!(
        "  {} {} ({})",
        symbols::INFO,
        feature.name(),
        truncate_hash(&feature.config_hash().0)
      );
    }
  }
}
