//! Content fingerprints for character snapshots.
//!
//! Two snapshots with the same selections share a fingerprint even when
//! their ids differ, since derived stats never depend on the id.

use sha2::{Digest, Sha256};
use sheetforge_domain::Character;

/// Hex-encoded SHA-256 of the character's JSON without its id.
pub fn character_fingerprint(character: &Character) -> Result<String, serde_json::Error> {
    let mut value = serde_json::to_value(character)?;
    if let Some(fields) = value.as_object_mut() {
        fields.remove("id");
    }
    let bytes = serde_json::to_vec(&value)?;

    let mut hasher = Sha256::new();
    hasher.update(b"character:");
    hasher.update(&bytes);
    Ok(hex::encode(hasher.finalize()))
}
