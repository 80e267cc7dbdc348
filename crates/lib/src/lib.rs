//! corral-lib: reconciliation core for the corral host agent
//!
//! This crate keeps a set of containerized applications (and optional
//! sidecar features) converged on a user-declared desired state:
//! - `resource`: value types describing applications and their parts
//! - `feature`: optional infrastructure capabilities (log forwarding)
//! - `state`: state specifications, evaluation and the diff engine
//! - `reconcile`: ordered application of changesets to a provider
//! - `control`: the serializing control loop and the desired-state owner
//! - `provider` / `persist`: the external collaborator boundaries
//! - `config`: agent configuration

pub mod config;
pub mod control;
pub mod feature;
pub mod persist;
pub mod provider;
pub mod reconcile;
pub mod resource;
pub mod state;
pub mod util;
