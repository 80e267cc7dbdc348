//! Hashing utilities for state fingerprints and change detection.
//!
//! This module provides:
//! - `ObjectHash`: a truncated 20-character hash identifying a state object
//! - `Hashable`: computes an `ObjectHash` from any serializable value
//! - `hash_bytes()`: full-length content hashing for change detection

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Length of the truncated object hash.
pub const OBJ_HASH_PREFIX_LEN: usize = 20;

pub type HashError = serde_json::Error;

/// A content hash identifying a state object.
///
/// The hash is a 20-character truncated SHA-256 of the JSON-serialized value.
/// This provides sufficient collision resistance for equality checks while
/// keeping log output readable.
///
/// # Format
///
/// The hash is a lowercase hexadecimal string, e.g., `"a1b2c3d4e5f6789012ab"`.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ObjectHash(pub String);

impl std::fmt::Display for ObjectHash {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.0)
  }
}

pub trait Hashable: Serialize {
  fn compute_hash(&self) -> Result<ObjectHash, HashError> {
    let serialized = serde_json::to_string(self)?;
    let mut hasher = Sha256::new();
    hasher.update(serialized.as_bytes());
    let full = format!("{:x}", hasher.finalize());
    Ok(ObjectHash(full[..OBJ_HASH_PREFIX_LEN].to_string()))
  }
}

/// Hash arbitrary bytes.
///
/// Returns the full 64-character SHA-256 hash as lowercase hex.
pub fn hash_bytes(data: &[u8]) -> String {
  let mut hasher = Sha256::new();
  hasher.update(data);
  format!("{:x}", hasher.finalize())
}
