//! Cohort restriction tracking
//!
//! Accounts that bought during the private sale or the presale receive
//! tokens that stay locked until their cohort's unlock time. The tracker keeps
//! the locked sub-balances per account and shrinks them as tokens leave the
//! account.

use crate::token::account::{AccountId, Timestamp};
use crate::token::ledger::TokenError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Purchaser cohorts with their own hold period
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Cohort {
    Private,
    Presale,
}

impl fmt::Display for Cohort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cohort::Private => f.write_str("private"),
            Cohort::Presale => f.write_str("presale"),
        }
    }
}

/// When spent balance is charged against a cohort's locked pool
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DebitPolicy {
    /// Every spend shrinks the pools, whether or not they are still locked.
    /// Spending unrestricted tokens during the hold also releases the same
    /// amount of locked tokens.
    Unconditional,
    /// A pool is only charged once its unlock time has passed
    #[default]
    AfterUnlock,
}

/// Locked sub-balances of one account
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CohortLock {
    /// Set by the first restricted mint, never cleared
    pub participated: bool,
    pub private_locked: u128,
    pub presale_locked: u128,
}

impl CohortLock {
    /// Outstanding pool for a cohort, ignoring the schedule
    pub fn pool(&self, cohort: Cohort) -> u128 {
        match cohort {
            Cohort::Private => self.private_locked,
            Cohort::Presale => self.presale_locked,
        }
    }

    fn pool_mut(&mut self, cohort: Cohort) -> &mut u128 {
        match cohort {
            Cohort::Private => &mut self.private_locked,
            Cohort::Presale => &mut self.presale_locked,
        }
    }

    /// Amount that cannot be spent at `now`
    pub fn locked_at(&self, schedule: &UnlockSchedule, now: Timestamp) -> u128 {
        if !self.participated {
            return 0;
        }

        [Cohort::Presale, Cohort::Private]
            .into_iter()
            .filter(|&cohort| schedule.is_locked(cohort, now))
            .map(|cohort| self.pool(cohort))
            .fold(0u128, u128::saturating_add)
    }
}

/// Unlock times of both cohorts
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnlockSchedule {
    pub private_unlock_time: Timestamp,
    pub presale_unlock_time: Timestamp,
}

impl UnlockSchedule {
    /// Both unlock times must be non-zero
    pub fn new(
        private_unlock_time: Timestamp,
        presale_unlock_time: Timestamp,
    ) -> Result<Self, TokenError> {
        validate_unlock_time(private_unlock_time)?;
        validate_unlock_time(presale_unlock_time)?;
        Ok(Self {
            private_unlock_time,
            presale_unlock_time,
        })
    }

    pub fn unlock_time(&self, cohort: Cohort) -> Timestamp {
        match cohort {
            Cohort::Private => self.private_unlock_time,
            Cohort::Presale => self.presale_unlock_time,
        }
    }

    /// A cohort is still locked up to and including its unlock time
    pub fn is_locked(&self, cohort: Cohort, now: Timestamp) -> bool {
        now <= self.unlock_time(cohort)
    }
}

fn validate_unlock_time(time: Timestamp) -> Result<(), TokenError> {
    if time == 0 {
        return Err(TokenError::InvalidTimestamp(time));
    }
    Ok(())
}

/// Per-account cohort locks plus the global schedule
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestrictionTracker {
    schedule: UnlockSchedule,
    #[serde(default)]
    policy: DebitPolicy,
    locks: BTreeMap<AccountId, CohortLock>,
}

impl RestrictionTracker {
    pub fn new(schedule: UnlockSchedule, policy: DebitPolicy) -> Self {
        Self {
            schedule,
            policy,
            locks: BTreeMap::new(),
        }
    }

    pub fn schedule(&self) -> &UnlockSchedule {
        &self.schedule
    }

    pub fn policy(&self) -> DebitPolicy {
        self.policy
    }

    /// Lock record, present only for accounts that received restricted mints
    pub fn lock_of(&self, account: &AccountId) -> Option<&CohortLock> {
        self.locks.get(account)
    }

    pub fn locks(&self) -> impl Iterator<Item = (&AccountId, &CohortLock)> {
        self.locks.iter()
    }

    /// Fails if adding `amount` to the cohort pool would overflow
    pub fn check_restricted_mint(
        &self,
        account: &AccountId,
        amount: u128,
        cohort: Cohort,
    ) -> Result<(), TokenError> {
        let current = self.lock_of(account).map_or(0, |lock| lock.pool(cohort));
        current
            .checked_add(amount)
            .map(|_| ())
            .ok_or(TokenError::ArithmeticOverflow)
    }

    /// Add `amount` to the account's locked pool for `cohort`
    pub fn record_restricted_mint(
        &mut self,
        account: &AccountId,
        amount: u128,
        cohort: Cohort,
    ) -> Result<(), TokenError> {
        self.check_restricted_mint(account, amount, cohort)?;

        let lock = self.locks.entry(account.clone()).or_default();
        lock.participated = true;
        *lock.pool_mut(cohort) += amount;

        log::debug!("Locked {} {} tokens for {}", amount, cohort, account);
        Ok(())
    }

    /// Portion of the account's balance that may not be spent at `now`
    pub fn locked_amount(&self, account: &AccountId, now: Timestamp) -> u128 {
        self.lock_of(account)
            .map_or(0, |lock| lock.locked_at(&self.schedule, now))
    }

    /// Charge `amount` of spent balance against the locked pools.
    ///
    /// Presale is charged first, then private. Each pool is clamped at zero
    /// and the remainder carries into the next one; spend beyond both pools
    /// was unrestricted and has no effect. Returns the amount removed from
    /// the pools.
    pub fn debit_spent(&mut self, account: &AccountId, amount: u128, now: Timestamp) -> u128 {
        let schedule = self.schedule;
        let policy = self.policy;
        let Some(lock) = self.locks.get_mut(account) else {
            return 0;
        };

        let mut remaining = amount;
        for cohort in [Cohort::Presale, Cohort::Private] {
            if remaining == 0 {
                break;
            }
            if policy == DebitPolicy::AfterUnlock && schedule.is_locked(cohort, now) {
                continue;
            }
            let pool = lock.pool_mut(cohort);
            let taken = remaining.min(*pool);
            *pool -= taken;
            remaining -= taken;
        }

        let debited = amount - remaining;
        if debited > 0 {
            log::debug!(
                "Debited {} from locked pools of {} (presale {}, private {})",
                debited,
                account,
                lock.presale_locked,
                lock.private_locked
            );
        }
        debited
    }

    pub fn set_private_unlock_time(&mut self, time: Timestamp) -> Result<(), TokenError> {
        validate_unlock_time(time)?;
        self.schedule.private_unlock_time = time;
        Ok(())
    }

    pub fn set_presale_unlock_time(&mut self, time: Timestamp) -> Result<(), TokenError> {
        validate_unlock_time(time)?;
        self.schedule.presale_unlock_time = time;
        Ok(())
    }

    /// Set the unlock time of either cohort
    pub fn set_unlock_time(&mut self, cohort: Cohort, time: Timestamp) -> Result<(), TokenError> {
        match cohort {
            Cohort::Private => self.set_private_unlock_time(time),
            Cohort::Presale => self.set_presale_unlock_time(time),
        }
    }
}
