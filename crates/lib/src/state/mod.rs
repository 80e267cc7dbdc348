//! State specifications and the diff engine.
//!
//! A [`Spec`] describes the system in an "as is" or "should be" state: the
//! set of applications plus the enabled features. [`diff::compare`] computes
//! the classified changeset between two specifications.

pub mod diff;
mod evaluate;
mod spec;

pub use spec::{FeatureSet, Spec, SpecError};
