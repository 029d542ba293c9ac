//! Cryptographic utilities
//!
//! SHA-256 hashing used to derive token addresses and to checksum persisted
//! ledger snapshots.

pub mod hash;

pub use hash::{sha256, sha256_hex, verify_sha256_hex};
