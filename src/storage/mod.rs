//! Storage module for ledger persistence

pub mod persistence;

pub use persistence::{
    load_from_file, save_to_file, Snapshot, Storage, StorageConfig, StorageError, StorageStats,
    SNAPSHOT_VERSION,
};
