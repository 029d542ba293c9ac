//! SHA-256 helpers for token addresses and snapshot checksums

use sha2::{Digest, Sha256};

/// Computes SHA-256 hash of the input data
pub fn sha256(data: &[u8]) -> Vec<u8> {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().to_vec()
}

/// Computes SHA-256 hash and returns it as a lowercase hex string
pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(sha256(data))
}

/// Checks `data` against a hex-encoded SHA-256 digest (case-insensitive)
pub fn verify_sha256_hex(data: &[u8], expected: &str) -> bool {
    match hex::decode(expected) {
        Ok(digest) => digest == sha256(data),
        Err(_) => false,
    }
}
