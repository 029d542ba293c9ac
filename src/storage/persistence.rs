//! Ledger persistence layer
//!
//! Saves and restores the durable state of a token: balances, cohort locks,
//! unlock schedule, total supply, minting flag, allowances and recent
//! history. Each file carries a SHA-256 checksum of the serialized state.

use crate::crypto::{sha256_hex, verify_sha256_hex};
use crate::token::RestrictedToken;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{self, BufReader, BufWriter};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Current on-disk format version
pub const SNAPSHOT_VERSION: u32 = 1;

/// Storage errors
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
    #[error("Checksum mismatch: expected {expected}, computed {computed}")]
    ChecksumMismatch { expected: String, computed: String },
    #[error("Invalid data: {0}")]
    InvalidData(String),
    #[error("Unsupported snapshot version: {0}")]
    UnsupportedVersion(u32),
    #[error("Not found: {0}")]
    NotFound(String),
}

/// Serialized token state with integrity information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub version: u32,
    /// Hex SHA-256 of the compact JSON encoding of `state`
    pub checksum: String,
    pub state: RestrictedToken,
}

impl Snapshot {
    pub fn new(state: RestrictedToken) -> Result<Self, StorageError> {
        let checksum = sha256_hex(&serde_json::to_vec(&state)?);
        Ok(Self {
            version: SNAPSHOT_VERSION,
            checksum,
            state,
        })
    }

    /// Check version, checksum and ledger invariants, returning the state
    /// on success
    pub fn verify(self) -> Result<RestrictedToken, StorageError> {
        if self.version != SNAPSHOT_VERSION {
            return Err(StorageError::UnsupportedVersion(self.version));
        }

        let encoded = serde_json::to_vec(&self.state)?;
        if !verify_sha256_hex(&encoded, &self.checksum) {
            return Err(StorageError::ChecksumMismatch {
                expected: self.checksum,
                computed: sha256_hex(&encoded),
            });
        }

        self.state
            .validate()
            .map_err(|e| StorageError::InvalidData(e.to_string()))?;

        Ok(self.state)
    }
}

/// Storage configuration
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
    pub state_file: String,
    pub backup_enabled: bool,
    pub max_backups: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(".ledger_data"),
            state_file: "ledger.json".to_string(),
            backup_enabled: true,
            max_backups: 5,
        }
    }
}

/// Ledger storage manager
pub struct Storage {
    config: StorageConfig,
}

impl Storage {
    /// Create a new storage manager
    pub fn new(config: StorageConfig) -> Result<Self, StorageError> {
        fs::create_dir_all(&config.data_dir)?;
        Ok(Self { config })
    }

    /// Create with default configuration
    pub fn with_defaults() -> Result<Self, StorageError> {
        Self::new(StorageConfig::default())
    }

    fn state_path(&self) -> PathBuf {
        self.config.data_dir.join(&self.config.state_file)
    }

    fn backup_path(&self, index: usize) -> PathBuf {
        self.config
            .data_dir
            .join(format!("{}.backup.{}", self.config.state_file, index))
    }

    /// Save the token state to disk
    pub fn save(&self, token: &RestrictedToken) -> Result<(), StorageError> {
        let path = self.state_path();

        if self.config.backup_enabled && self.config.max_backups > 0 && path.exists() {
            self.rotate_backups()?;
            fs::copy(&path, self.backup_path(0))?;
        }

        // Write to temporary file first
        let temp_path = self
            .config
            .data_dir
            .join(format!("{}.tmp", self.config.state_file));
        save_to_file(token, &temp_path)?;

        // Atomic rename
        fs::rename(&temp_path, &path)?;

        log::debug!("Saved ledger state to {:?}", path);
        Ok(())
    }

    /// Load the token state from disk
    pub fn load(&self) -> Result<RestrictedToken, StorageError> {
        let path = self.state_path();

        if !path.exists() {
            return Err(StorageError::NotFound(format!(
                "Ledger file {:?}",
                path
            )));
        }

        load_from_file(&path)
    }

    /// Check if a saved ledger exists
    pub fn exists(&self) -> bool {
        self.state_path().exists()
    }

    /// Delete the saved ledger
    pub fn delete(&self) -> Result<(), StorageError> {
        let path = self.state_path();
        if path.exists() {
            fs::remove_file(path)?;
        }
        Ok(())
    }

    fn rotate_backups(&self) -> Result<(), StorageError> {
        // Delete oldest backup
        let oldest = self.backup_path(self.config.max_backups - 1);
        if oldest.exists() {
            fs::remove_file(&oldest)?;
        }

        // Shift existing backups
        for i in (0..self.config.max_backups - 1).rev() {
            let current = self.backup_path(i);
            if current.exists() {
                fs::rename(&current, self.backup_path(i + 1))?;
            }
        }

        Ok(())
    }

    /// Restore from a backup (0 is the most recent)
    pub fn restore_backup(&self, backup_index: usize) -> Result<RestrictedToken, StorageError> {
        let backup_path = self.backup_path(backup_index);

        if !backup_path.exists() {
            return Err(StorageError::NotFound(format!(
                "Backup {}",
                backup_index
            )));
        }

        load_from_file(&backup_path)
    }

    /// List available backups
    pub fn list_backups(&self) -> Vec<usize> {
        (0..self.config.max_backups)
            .filter(|&i| self.backup_path(i).exists())
            .collect()
    }

    /// Get storage statistics
    pub fn stats(&self) -> Result<StorageStats, StorageError> {
        let path = self.state_path();

        let file_size = if path.exists() {
            fs::metadata(&path)?.len()
        } else {
            0
        };

        Ok(StorageStats {
            file_size,
            backup_count: self.list_backups().len(),
            data_dir: self.config.data_dir.clone(),
        })
    }
}

/// Storage statistics
#[derive(Debug)]
pub struct StorageStats {
    pub file_size: u64,
    pub backup_count: usize,
    pub data_dir: PathBuf,
}

/// Save token state to a specific file path
pub fn save_to_file(token: &RestrictedToken, path: &Path) -> Result<(), StorageError> {
    let snapshot = Snapshot::new(token.clone())?;
    let file = fs::File::create(path)?;
    let writer = BufWriter::new(file);
    serde_json::to_writer_pretty(writer, &snapshot)?;
    Ok(())
}

/// Load and verify token state from a specific file path
pub fn load_from_file(path: &Path) -> Result<RestrictedToken, StorageError> {
    let file = fs::File::open(path)?;
    let reader = BufReader::new(file);
    let snapshot: Snapshot = serde_json::from_reader(reader)?;
    snapshot.verify()
}
