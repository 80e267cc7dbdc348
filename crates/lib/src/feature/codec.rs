//! Round-trippable encoding of feature configurations.
//!
//! The external resource created for a feature is tagged with an encoded
//! copy of its configuration, which is decoded back during actual-state
//! extraction. The encoding is the hex representation of the JSON-serialized
//! [`Feature`] value.

use tracing::warn;

use super::Feature;

/// Encode a feature's configuration as a hex string.
///
/// Returns an empty string if the feature cannot be serialized.
pub fn encode_feature(feature: &Feature) -> String {
  match serde_json::to_vec(feature) {
    Ok(bytes) => hex::encode(bytes),
    Err(error) => {
      warn!(%error, feature = feature.name(), "unable to encode feature configuration");
      String::new()
    }
  }
}

/// Decode a feature configuration from its hex representation.
///
/// Invalid hex or JSON input leaves the fallback value untouched, so a
/// damaged tag on an external resource degrades to default configuration
/// rather than failing the extraction.
pub fn decode_feature(input: &str, fallback: Feature) -> Feature {
  let Ok(bytes) = hex::decode(input) else {
    return fallback;
  };

  serde_json::from_slice(&bytes).unwrap_or(fallback)
}
