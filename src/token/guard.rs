//! Transfer guard
//!
//! Every movement of tokens out of an account passes through here. The guard
//! checks the account's unlocked headroom, performs the ledger mutation and
//! then shrinks the account's locked pools by the amount spent.
//!
//! Caller-layer policy (authorization, pausing) is expressed as an ordered
//! list of [`Requirement`]s evaluated against a [`CallContext`] before any
//! state is touched.

use crate::token::account::{AccountId, Timestamp};
use crate::token::ledger::{Ledger, TokenError};
use crate::token::restriction::RestrictionTracker;

/// Preconditions supplied by the caller layer
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CallContext {
    /// Caller holds the administrative role
    pub authorized: bool,
    /// Token operations are globally paused
    pub paused: bool,
    /// Current time for every lock decision made during the call
    pub now: Timestamp,
}

impl CallContext {
    /// Unprivileged, unpaused call at `now`
    pub fn at(now: Timestamp) -> Self {
        Self {
            authorized: false,
            paused: false,
            now,
        }
    }

    /// Privileged, unpaused call at `now`
    pub fn admin(now: Timestamp) -> Self {
        Self {
            authorized: true,
            paused: false,
            now,
        }
    }

    pub fn with_paused(mut self, paused: bool) -> Self {
        self.paused = paused;
        self
    }

    /// Evaluate requirements in order, stopping at the first failure
    pub fn require(&self, requirements: &[Requirement]) -> Result<(), TokenError> {
        requirements.iter().try_for_each(|r| r.check(self))
    }
}

/// A single precondition on the caller layer
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Requirement {
    Authorized,
    NotPaused,
}

impl Requirement {
    pub fn check(self, ctx: &CallContext) -> Result<(), TokenError> {
        match self {
            Requirement::Authorized if !ctx.authorized => Err(TokenError::Unauthorized),
            Requirement::NotPaused if ctx.paused => Err(TokenError::Paused),
            _ => Ok(()),
        }
    }
}

/// Balance the account may spend at `now`
pub fn unlocked_balance(
    ledger: &Ledger,
    tracker: &RestrictionTracker,
    account: &AccountId,
    now: Timestamp,
) -> u128 {
    ledger
        .balance_of(account)
        .saturating_sub(tracker.locked_amount(account, now))
}

/// Fails unless `amount` fits inside the account's unlocked headroom
pub fn check_spendable(
    ledger: &Ledger,
    tracker: &RestrictionTracker,
    from: &AccountId,
    amount: u128,
    now: Timestamp,
) -> Result<(), TokenError> {
    let balance = ledger.balance_of(from);
    if amount > balance {
        return Err(TokenError::InsufficientBalance {
            have: balance,
            need: amount,
        });
    }

    let unlocked = unlocked_balance(ledger, tracker, from, now);
    if unlocked < amount {
        log::warn!(
            "Rejected spend of {} from {}: only {} of {} unlocked",
            amount,
            from,
            unlocked,
            balance
        );
        return Err(TokenError::TransferExceedsUnlocked {
            unlocked,
            requested: amount,
        });
    }

    Ok(())
}

/// Move `amount` from `from` to `to`, honouring cohort locks.
///
/// Returns the transferred amount. On error nothing has changed.
pub fn guarded_transfer(
    ledger: &mut Ledger,
    tracker: &mut RestrictionTracker,
    from: &AccountId,
    to: &AccountId,
    amount: u128,
    now: Timestamp,
) -> Result<u128, TokenError> {
    if to.is_null() {
        return Err(TokenError::InvalidRecipient);
    }
    if from == to {
        return Err(TokenError::SelfTransfer);
    }

    check_spendable(ledger, tracker, from, amount, now)?;
    ledger.raw_transfer(from, to, amount)?;
    tracker.debit_spent(from, amount, now);

    log::debug!("Transferred {} from {} to {}", amount, from, to);
    Ok(amount)
}

/// Destroy `amount` of `from`'s tokens, honouring cohort locks
pub fn guarded_burn(
    ledger: &mut Ledger,
    tracker: &mut RestrictionTracker,
    from: &AccountId,
    amount: u128,
    now: Timestamp,
) -> Result<u128, TokenError> {
    check_spendable(ledger, tracker, from, amount, now)?;
    ledger.burn(from, amount)?;
    tracker.debit_spent(from, amount, now);

    Ok(amount)
}
