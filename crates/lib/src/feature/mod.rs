//! Optional infrastructure capabilities ("features").
//!
//! A feature is a named singleton capability with its own lifecycle on the
//! external system, distinct from user applications. The set of variants is
//! closed: adding one extends the [`Feature`] enum and every `match` over it
//! is checked exhaustively, including the dispatch at the provider boundary.

mod codec;
mod fluent_bit;

use serde::{Deserialize, Serialize};

use crate::util::hash::ObjectHash;

pub use codec::{decode_feature, encode_feature};
pub use fluent_bit::FluentBit;

/// Stable name of the fluent-bit log forwarding feature.
pub const NAME_FLUENT_BIT: &str = "fluent-bit";

/// An enabled feature variant.
///
/// Every variant exposes a stable name (the logical singleton key) and a
/// deterministic hash over its configuration fields, used by the diff engine
/// in place of a fingerprint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Feature {
  FluentBit(FluentBit),
}

impl Feature {
  /// Stable name of the variant.
  pub fn name(&self) -> &'static str {
    match self {
      Feature::FluentBit(_) => NAME_FLUENT_BIT,
    }
  }

  /// Deterministic hash over the variant's configuration.
  pub fn config_hash(&self) -> ObjectHash {
    match self {
      Feature::FluentBit(fluent_bit) => fluent_bit.config_hash(),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn name_is_stable() {
    let feature = Feature::FluentBit(FluentBit::default());
    assert_eq!(feature.name(), NAME_FLUENT_BIT);
  }

  #[test]
  fn config_hash_dispatches_to_variant() {
    let fluent_bit = FluentBit::default().with_log_level("debug");
    let feature = Feature::FluentBit(fluent_bit.clone());

    assert_eq!(feature.config_hash(), fluent_bit.config_hash());
  }
}
