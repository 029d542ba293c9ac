//! Restricted Ledger: a token-issuance ledger with time-locked sale cohorts
//!
//! This crate provides:
//! - A fungible token ledger with supply cap and one-way minting close
//! - Private-sale and presale cohort locks with independent unlock times
//! - A transfer guard that never lets an account spend locked tokens
//! - Explicit caller preconditions (authorization, pause) instead of modifiers
//! - Event notifications with a bounded history
//! - A lock-protected shared handle for concurrent callers
//! - Checksummed JSON persistence with backups
//!
//! # Example
//!
//! ```rust
//! use restricted_ledger::token::{
//!     AccountId, CallContext, LedgerConfig, RestrictedToken, TokenError, TokenMetadata,
//!     UnlockSchedule,
//! };
//!
//! let metadata = TokenMetadata::new("Sale Token", "SALE", 18, AccountId::from("owner")).unwrap();
//! let schedule = UnlockSchedule::new(500, 1_000).unwrap();
//! let mut token = RestrictedToken::new(metadata, schedule, LedgerConfig::default());
//!
//! let x = AccountId::from("x");
//! let y = AccountId::from("y");
//! token.mint_presale(&CallContext::admin(0), &x, 1_000).unwrap();
//!
//! let result = token.transfer(&CallContext::at(999), &x, &y, 1);
//! assert!(matches!(result, Err(TokenError::TransferExceedsUnlocked { .. })));
//!
//! token.transfer(&CallContext::at(1_001), &x, &y, 600).unwrap();
//! assert_eq!(token.balance_of(&x), 400);
//! assert_eq!(token.restriction_of(&x).unwrap().presale_locked, 400);
//! ```

pub mod cli;
pub mod crypto;
pub mod storage;
pub mod token;

// Re-export commonly used types
pub use storage::{Storage, StorageConfig, StorageError};
pub use token::{
    AccountId, CallContext, Cohort, CohortLock, DebitPolicy, LedgerConfig, LedgerEvent,
    RestrictedToken, SharedToken, Timestamp, TokenError, TokenMetadata, UnlockSchedule,
};
