mod cmd;
mod output;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use corral_lib::config::Config;

use crate::cmd::{cmd_init, cmd_plan, cmd_status};

/// corral - desired-state agent for containerized applications
#[derive(Parser)]
#[command(name = "corral")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Path to the state file (defaults to the configured location)
  #[arg(long, global = true)]
  state: Option<PathBuf>,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Show the currently persisted desired state
  Status {
    /// Show image, instance and port details per application
    #[arg(short, long)]
    verbose: bool,

    /// Print the state as JSON
    #[arg(long)]
    json: bool,
  },

  /// Compare a candidate specification against the persisted state
  Plan {
    /// Path to the candidate specification (JSON)
    candidate: PathBuf,

    /// Ignore instance count differences
    #[arg(long)]
    ignore_instance_diff: bool,

    /// Print the changeset as JSON
    #[arg(long)]
    json: bool,
  },

  /// Create an empty state file
  Init {
    /// Overwrite an existing state file
    #[arg(short, long)]
    force: bool,
  },
}

fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::from_default_env())
    .without_time()
    .init();

  let cli = Cli::parse();
  let state_file = cli.state.unwrap_or_else(|| Config::default().store.state_file);

  match cli.command {
    Commands::Status { verbose, json } => cmd_status(&state_file, verbose, json),
    Commands::Plan {
      candidate,
      ignore_instance_diff,
      json,
    } => cmd_plan(&state_file, &candidate, ignore_instance_diff, json),
    Commands::Init { force } => cmd_init(&state_file, force),
  }
}
