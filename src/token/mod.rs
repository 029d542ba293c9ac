//! Restricted fungible token
//!
//! Provides a fungible token whose sale allocations are time-locked:
//! - Ledger of balances and total supply with cap and one-way mint close
//! - Private-sale and presale cohort locks with independent unlock times
//! - A transfer guard that never lets an account spend locked tokens
//! - Delegated transfers, event notifications and a bounded history
//!
//! # Example
//!
//! ```rust
//! use restricted_ledger::token::{
//!     AccountId, CallContext, LedgerConfig, RestrictedToken, TokenMetadata, UnlockSchedule,
//! };
//!
//! let metadata = TokenMetadata::new("Sale Token", "SALE", 18, AccountId::from("owner")).unwrap();
//! let schedule = UnlockSchedule::new(500, 1_000).unwrap();
//! let mut token = RestrictedToken::new(metadata, schedule, LedgerConfig::default());
//!
//! let buyer = AccountId::from("buyer");
//! token.mint_presale(&CallContext::admin(0), &buyer, 1_000).unwrap();
//!
//! // Locked until the presale unlock time has passed
//! assert!(token.transfer(&CallContext::at(999), &buyer, &"friend".into(), 1).is_err());
//! token.transfer(&CallContext::at(1_001), &buyer, &"friend".into(), 600).unwrap();
//! ```

pub mod account;
pub mod events;
pub mod guard;
pub mod ledger;
pub mod restriction;
pub mod shared;
#[allow(clippy::module_inception)]
pub mod token;

pub use account::{AccountId, Timestamp};
pub use events::{EventLog, EventSink, LedgerEvent, LogSink, NullSink, DEFAULT_HISTORY_LIMIT};
pub use guard::{guarded_burn, guarded_transfer, unlocked_balance, CallContext, Requirement};
pub use ledger::{Ledger, TokenError};
pub use restriction::{Cohort, CohortLock, DebitPolicy, RestrictionTracker, UnlockSchedule};
pub use shared::SharedToken;
pub use token::{LedgerConfig, RestrictedToken, TokenMetadata};
