//! Content-addressed card identity.
//!
//! The fingerprint is stored in the `SourceHash` field of every note we
//! create, so the algorithm and length must never change: SHA-256 over the
//! UTF-8 front text, lowercase hex, first 16 characters.

use sha2::{Digest, Sha256};

/// Length of a card fingerprint in hex characters.
pub const HASH_LEN: usize = 16;

/// Fingerprint a card by its front text alone.
pub fn compute_hash(front_raw: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(front_raw.as_bytes());
    let mut hex = format!("{:x}", hasher.finalize());
    hex.truncate(HASH_LEN);
    hex
}
