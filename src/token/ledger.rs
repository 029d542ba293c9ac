//! Balance ledger
//!
//! Tracks the total balance of every account together with the global
//! supply counter. The ledger knows nothing about cohort locks; transfers and
//! burns from restricted accounts must go through the transfer guard.

use crate::token::account::{AccountId, Timestamp};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Token-related errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("Insufficient balance: have {have}, need {need}")]
    InsufficientBalance { have: u128, need: u128 },
    #[error("Transfer exceeds unlocked balance: unlocked {unlocked}, requested {requested}")]
    TransferExceedsUnlocked { unlocked: u128, requested: u128 },
    #[error("Insufficient allowance: have {have}, need {need}")]
    InsufficientAllowance { have: u128, need: u128 },
    #[error("Invalid recipient: the null account cannot receive tokens")]
    InvalidRecipient,
    #[error("Invalid address: cannot transfer to self")]
    SelfTransfer,
    #[error("Cap exceeded: supply would reach {requested}, cap is {cap}")]
    CapExceeded { cap: u128, requested: u128 },
    #[error("Minting is closed")]
    MintingClosed,
    #[error("Minting already closed")]
    AlreadyClosed,
    #[error("Caller is not authorized")]
    Unauthorized,
    #[error("Token is paused")]
    Paused,
    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(Timestamp),
    #[error("Arithmetic overflow")]
    ArithmeticOverflow,
    #[error("Invalid name: must be 1-50 characters")]
    InvalidName,
    #[error("Invalid symbol: must be 1-10 characters")]
    InvalidSymbol,
    #[error("Invalid decimals: must be 0-18")]
    InvalidDecimals,
    #[error("Conservation violated: total supply {supply}, sum of balances {sum}")]
    ConservationViolated { supply: u128, sum: u128 },
    #[error("Locked amount {locked} exceeds balance {balance} of {account}")]
    LockExceedsBalance {
        account: AccountId,
        locked: u128,
        balance: u128,
    },
}

/// Account balances and supply.
///
/// Balances live in a `BTreeMap` so serialized snapshots are byte-stable.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ledger {
    balances: BTreeMap<AccountId, u128>,
    total_supply: u128,
    max_supply: Option<u128>,
    minting_closed: bool,
}

impl Ledger {
    /// Create an empty ledger, optionally capped at `max_supply`
    pub fn new(max_supply: Option<u128>) -> Self {
        Self {
            balances: BTreeMap::new(),
            total_supply: 0,
            max_supply,
            minting_closed: false,
        }
    }

    pub fn balance_of(&self, account: &AccountId) -> u128 {
        self.balances.get(account).copied().unwrap_or(0)
    }

    pub fn total_supply(&self) -> u128 {
        self.total_supply
    }

    pub fn max_supply(&self) -> Option<u128> {
        self.max_supply
    }

    pub fn is_minting_closed(&self) -> bool {
        self.minting_closed
    }

    /// Whether the account has ever been touched by a balance operation
    pub fn contains(&self, account: &AccountId) -> bool {
        self.balances.contains_key(account)
    }

    /// All known accounts, including ones whose balance dropped to zero
    pub fn accounts(&self) -> impl Iterator<Item = (&AccountId, u128)> {
        self.balances.iter().map(|(id, &balance)| (id, balance))
    }

    /// Accounts holding a non-zero balance
    pub fn holders(&self) -> Vec<(&AccountId, u128)> {
        self.accounts().filter(|(_, b)| *b > 0).collect()
    }

    pub fn holder_count(&self) -> usize {
        self.balances.values().filter(|&&b| b > 0).count()
    }

    /// Sum of every balance, `None` on overflow
    pub fn sum_of_balances(&self) -> Option<u128> {
        self.balances
            .values()
            .try_fold(0u128, |acc, &b| acc.checked_add(b))
    }

    /// Validate a mint of `amount` and return the resulting supply
    pub fn check_mint(&self, amount: u128) -> Result<u128, TokenError> {
        if self.minting_closed {
            return Err(TokenError::MintingClosed);
        }

        let new_supply = self
            .total_supply
            .checked_add(amount)
            .ok_or(TokenError::ArithmeticOverflow)?;

        if let Some(cap) = self.max_supply {
            if new_supply > cap {
                return Err(TokenError::CapExceeded {
                    cap,
                    requested: new_supply,
                });
            }
        }

        Ok(new_supply)
    }

    /// Create `amount` new tokens in `to`
    pub fn mint(&mut self, to: &AccountId, amount: u128) -> Result<(), TokenError> {
        let new_supply = self.check_mint(amount)?;

        let new_balance = self
            .balance_of(to)
            .checked_add(amount)
            .ok_or(TokenError::ArithmeticOverflow)?;

        self.total_supply = new_supply;
        self.balances.insert(to.clone(), new_balance);

        Ok(())
    }

    /// Destroy `amount` tokens held by `from`
    pub fn burn(&mut self, from: &AccountId, amount: u128) -> Result<(), TokenError> {
        let balance = self.balance_of(from);
        if balance < amount {
            return Err(TokenError::InsufficientBalance {
                have: balance,
                need: amount,
            });
        }

        self.balances.insert(from.clone(), balance - amount);
        self.total_supply -= amount;

        Ok(())
    }

    /// Move `amount` from one account to another without looking at locks
    pub(crate) fn raw_transfer(
        &mut self,
        from: &AccountId,
        to: &AccountId,
        amount: u128,
    ) -> Result<(), TokenError> {
        let from_balance = self.balance_of(from);
        if from_balance < amount {
            return Err(TokenError::InsufficientBalance {
                have: from_balance,
                need: amount,
            });
        }

        if from == to {
            return Ok(());
        }

        let to_balance = self
            .balance_of(to)
            .checked_add(amount)
            .ok_or(TokenError::ArithmeticOverflow)?;

        self.balances.insert(from.clone(), from_balance - amount);
        self.balances.insert(to.clone(), to_balance);

        Ok(())
    }

    /// Permanently disable minting
    pub fn close_minting(&mut self) -> Result<(), TokenError> {
        if self.minting_closed {
            return Err(TokenError::AlreadyClosed);
        }
        self.minting_closed = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> AccountId {
        AccountId::from(s)
    }

    #[test]
    fn test_mint_increases_balance_and_supply() {
        let mut ledger = Ledger::new(None);
        ledger.mint(&id("alice"), 500).unwrap();
        ledger.mint(&id("alice"), 250).unwrap();

        assert_eq!(ledger.balance_of(&id("alice")), 750);
        assert_eq!(ledger.total_supply(), 750);
        assert_eq!(ledger.holder_count(), 1);
    }

    #[test]
    fn test_mint_respects_cap() {
        let mut ledger = Ledger::new(Some(1000));
        ledger.mint(&id("alice"), 1000).unwrap();

        let result = ledger.mint(&id("bob"), 1);
        assert_eq!(
            result,
            Err(TokenError::CapExceeded {
                cap: 1000,
                requested: 1001
            })
        );
        assert_eq!(ledger.total_supply(), 1000);
        assert!(!ledger.contains(&id("bob")));
    }

    #[test]
    fn test_mint_overflow() {
        let mut ledger = Ledger::new(None);
        ledger.mint(&id("alice"), u128::MAX).unwrap();
        assert_eq!(
            ledger.mint(&id("bob"), 1),
            Err(TokenError::ArithmeticOverflow)
        );
    }

    #[test]
    fn test_close_minting() {
        let mut ledger = Ledger::new(None);
        ledger.mint(&id("alice"), 10).unwrap();
        ledger.close_minting().unwrap();

        assert!(ledger.is_minting_closed());
        assert_eq!(ledger.mint(&id("alice"), 1), Err(TokenError::MintingClosed));
        assert_eq!(ledger.close_minting(), Err(TokenError::AlreadyClosed));
        assert_eq!(ledger.total_supply(), 10);
    }

    #[test]
    fn test_burn() {
        let mut ledger = Ledger::new(None);
        ledger.mint(&id("alice"), 100).unwrap();
        ledger.burn(&id("alice"), 40).unwrap();

        assert_eq!(ledger.balance_of(&id("alice")), 60);
        assert_eq!(ledger.total_supply(), 60);

        assert_eq!(
            ledger.burn(&id("alice"), 61),
            Err(TokenError::InsufficientBalance { have: 60, need: 61 })
        );
        assert_eq!(ledger.total_supply(), 60);
    }

    #[test]
    fn test_raw_transfer() {
        let mut ledger = Ledger::new(None);
        ledger.mint(&id("alice"), 100).unwrap();
        ledger.raw_transfer(&id("alice"), &id("bob"), 30).unwrap();

        assert_eq!(ledger.balance_of(&id("alice")), 70);
        assert_eq!(ledger.balance_of(&id("bob")), 30);
        assert_eq!(ledger.sum_of_balances(), Some(ledger.total_supply()));

        let result = ledger.raw_transfer(&id("bob"), &id("alice"), 31);
        assert!(matches!(result, Err(TokenError::InsufficientBalance { .. })));
        assert_eq!(ledger.balance_of(&id("bob")), 30);
    }

    #[test]
    fn test_raw_transfer_to_self_keeps_balance() {
        let mut ledger = Ledger::new(None);
        ledger.mint(&id("alice"), 100).unwrap();
        ledger.raw_transfer(&id("alice"), &id("alice"), 60).unwrap();

        assert_eq!(ledger.balance_of(&id("alice")), 100);
        assert_eq!(ledger.total_supply(), 100);
        assert!(matches!(
            ledger.raw_transfer(&id("alice"), &id("alice"), 101),
            Err(TokenError::InsufficientBalance { .. })
        ));
    }

    #[test]
    fn test_mint_overflowing_balance_changes_nothing() {
        // Supply and balances disagree, as in a corrupted snapshot
        let mut ledger = Ledger {
            balances: BTreeMap::from([(id("alice"), u128::MAX)]),
            total_supply: 0,
            max_supply: None,
            minting_closed: false,
        };

        assert_eq!(
            ledger.mint(&id("alice"), 1),
            Err(TokenError::ArithmeticOverflow)
        );
        assert_eq!(ledger.balance_of(&id("alice")), u128::MAX);
        assert_eq!(ledger.total_supply(), 0);
    }

    #[test]
    fn test_zero_balance_accounts_are_kept() {
        let mut ledger = Ledger::new(None);
        ledger.mint(&id("alice"), 5).unwrap();
        ledger.burn(&id("alice"), 5).unwrap();

        assert!(ledger.contains(&id("alice")));
        assert!(ledger.holders().is_empty());
        assert_eq!(ledger.accounts().count(), 1);
    }
}
