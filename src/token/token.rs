//! Restricted token
//!
//! Composes the ledger, the restriction tracker and the transfer guard into
//! the public operation surface. Every operation first evaluates its ordered
//! preconditions, then runs all remaining checks, and only then mutates
//! state, so a failed call leaves the token exactly as it was.

use crate::crypto::sha256_hex;
use crate::token::account::{AccountId, Timestamp};
use crate::token::events::{EventLog, EventSink, LedgerEvent, LogSink, DEFAULT_HISTORY_LIMIT};
use crate::token::guard::{self, CallContext, Requirement};
use crate::token::ledger::{Ledger, TokenError};
use crate::token::restriction::{Cohort, CohortLock, DebitPolicy, RestrictionTracker, UnlockSchedule};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

const ADMIN: &[Requirement] = &[Requirement::Authorized, Requirement::NotPaused];
const ADMIN_UNPAUSABLE: &[Requirement] = &[Requirement::Authorized];
const HOLDER: &[Requirement] = &[Requirement::NotPaused];

/// Token metadata (immutable after creation)
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct TokenMetadata {
    /// Token name (e.g., "My Token")
    pub name: String,
    /// Token symbol (e.g., "MTK")
    pub symbol: String,
    /// Decimal places (usually 18)
    pub decimals: u8,
    /// Account that deployed the token
    pub creator: AccountId,
    /// Wall-clock creation time
    pub created_at: DateTime<Utc>,
}

impl TokenMetadata {
    /// Create new token metadata with validation
    pub fn new(
        name: impl Into<String>,
        symbol: impl Into<String>,
        decimals: u8,
        creator: AccountId,
    ) -> Result<Self, TokenError> {
        let name = name.into();
        let symbol = symbol.into();

        if name.is_empty() || name.len() > 50 {
            return Err(TokenError::InvalidName);
        }
        if symbol.is_empty() || symbol.len() > 10 {
            return Err(TokenError::InvalidSymbol);
        }
        if decimals > 18 {
            return Err(TokenError::InvalidDecimals);
        }

        Ok(Self {
            name,
            symbol,
            decimals,
            creator,
            created_at: Utc::now(),
        })
    }
}

/// Tunables fixed at construction
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// Hard cap on total supply, `None` for uncapped
    pub max_supply: Option<u128>,
    pub debit_policy: DebitPolicy,
    /// Number of events retained in memory
    pub history_limit: usize,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            max_supply: None,
            debit_policy: DebitPolicy::default(),
            history_limit: DEFAULT_HISTORY_LIMIT,
        }
    }
}

fn default_sink() -> Arc<dyn EventSink> {
    Arc::new(LogSink)
}

/// A fungible token whose private-sale and presale allocations are
/// time-locked
#[derive(Clone, Serialize, Deserialize)]
pub struct RestrictedToken {
    /// Unique token address
    pub address: String,
    pub metadata: TokenMetadata,
    ledger: Ledger,
    restrictions: RestrictionTracker,
    /// owner -> (spender -> amount)
    allowances: BTreeMap<AccountId, BTreeMap<AccountId, u128>>,
    history: EventLog,
    #[serde(skip, default = "default_sink")]
    sink: Arc<dyn EventSink>,
}

impl fmt::Debug for RestrictedToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RestrictedToken")
            .field("address", &self.address)
            .field("metadata", &self.metadata)
            .field("ledger", &self.ledger)
            .field("restrictions", &self.restrictions)
            .field("allowances", &self.allowances)
            .finish_non_exhaustive()
    }
}

impl RestrictedToken {
    /// Create a token with no supply
    pub fn new(metadata: TokenMetadata, schedule: UnlockSchedule, config: LedgerConfig) -> Self {
        let address = derive_address(&metadata);
        log::info!(
            "Token created: {} ({}) at {}",
            metadata.name,
            metadata.symbol,
            address
        );

        Self {
            address,
            metadata,
            ledger: Ledger::new(config.max_supply),
            restrictions: RestrictionTracker::new(schedule, config.debit_policy),
            allowances: BTreeMap::new(),
            history: EventLog::new(config.history_limit),
            sink: default_sink(),
        }
    }

    /// Replace the notification sink
    pub fn with_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn set_sink(&mut self, sink: Arc<dyn EventSink>) {
        self.sink = sink;
    }

    // =========================================================================
    // View Functions
    // =========================================================================

    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    pub fn symbol(&self) -> &str {
        &self.metadata.symbol
    }

    pub fn decimals(&self) -> u8 {
        self.metadata.decimals
    }

    pub fn config(&self) -> LedgerConfig {
        LedgerConfig {
            max_supply: self.ledger.max_supply(),
            debit_policy: self.restrictions.policy(),
            history_limit: self.history.limit(),
        }
    }

    pub fn total_supply(&self) -> u128 {
        self.ledger.total_supply()
    }

    pub fn max_supply(&self) -> Option<u128> {
        self.ledger.max_supply()
    }

    pub fn is_minting_closed(&self) -> bool {
        self.ledger.is_minting_closed()
    }

    pub fn balance_of(&self, account: &AccountId) -> u128 {
        self.ledger.balance_of(account)
    }

    /// Portion of the balance that cannot be spent at `now`
    pub fn locked_amount(&self, account: &AccountId, now: Timestamp) -> u128 {
        self.restrictions.locked_amount(account, now)
    }

    /// Portion of the balance that can be spent at `now`
    pub fn unlocked_balance(&self, account: &AccountId, now: Timestamp) -> u128 {
        guard::unlocked_balance(&self.ledger, &self.restrictions, account, now)
    }

    pub fn restriction_of(&self, account: &AccountId) -> Option<&CohortLock> {
        self.restrictions.lock_of(account)
    }

    pub fn schedule(&self) -> &UnlockSchedule {
        self.restrictions.schedule()
    }

    pub fn allowance(&self, owner: &AccountId, spender: &AccountId) -> u128 {
        self.allowances
            .get(owner)
            .and_then(|spenders| spenders.get(spender))
            .copied()
            .unwrap_or(0)
    }

    pub fn holders(&self) -> Vec<(&AccountId, u128)> {
        self.ledger.holders()
    }

    pub fn holder_count(&self) -> usize {
        self.ledger.holder_count()
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn restrictions(&self) -> &RestrictionTracker {
        &self.restrictions
    }

    pub fn history(&self) -> &EventLog {
        &self.history
    }

    /// Verify that the balances add up to the total supply
    pub fn check_conservation(&self) -> Result<(), TokenError> {
        let supply = self.ledger.total_supply();
        let sum = self
            .ledger
            .sum_of_balances()
            .ok_or(TokenError::ArithmeticOverflow)?;
        if sum != supply {
            return Err(TokenError::ConservationViolated { supply, sum });
        }
        Ok(())
    }

    /// Check every state invariant: conservation, the supply cap, and that
    /// no account has more locked than it holds
    pub fn validate(&self) -> Result<(), TokenError> {
        self.check_conservation()?;

        let supply = self.ledger.total_supply();
        if let Some(cap) = self.ledger.max_supply() {
            if supply > cap {
                return Err(TokenError::CapExceeded {
                    cap,
                    requested: supply,
                });
            }
        }

        for (account, lock) in self.restrictions.locks() {
            let locked = lock
                .private_locked
                .checked_add(lock.presale_locked)
                .ok_or(TokenError::ArithmeticOverflow)?;
            let balance = self.ledger.balance_of(account);
            if locked > balance {
                return Err(TokenError::LockExceedsBalance {
                    account: account.clone(),
                    locked,
                    balance,
                });
            }
        }

        Ok(())
    }

    // =========================================================================
    // Minting
    // =========================================================================

    /// Mint unrestricted tokens
    pub fn mint(
        &mut self,
        ctx: &CallContext,
        to: &AccountId,
        amount: u128,
    ) -> Result<LedgerEvent, TokenError> {
        self.mint_inner(ctx, to, amount, None)
    }

    /// Mint tokens locked until the private-sale unlock time
    pub fn mint_private(
        &mut self,
        ctx: &CallContext,
        to: &AccountId,
        amount: u128,
    ) -> Result<LedgerEvent, TokenError> {
        self.mint_inner(ctx, to, amount, Some(Cohort::Private))
    }

    /// Mint tokens locked until the presale unlock time
    pub fn mint_presale(
        &mut self,
        ctx: &CallContext,
        to: &AccountId,
        amount: u128,
    ) -> Result<LedgerEvent, TokenError> {
        self.mint_inner(ctx, to, amount, Some(Cohort::Presale))
    }

    /// Mint tokens locked under `cohort`
    pub fn mint_restricted(
        &mut self,
        ctx: &CallContext,
        to: &AccountId,
        amount: u128,
        cohort: Cohort,
    ) -> Result<LedgerEvent, TokenError> {
        self.mint_inner(ctx, to, amount, Some(cohort))
    }

    fn mint_inner(
        &mut self,
        ctx: &CallContext,
        to: &AccountId,
        amount: u128,
        cohort: Option<Cohort>,
    ) -> Result<LedgerEvent, TokenError> {
        ctx.require(ADMIN)?;
        if to.is_null() {
            return Err(TokenError::InvalidRecipient);
        }

        self.ledger.check_mint(amount)?;
        if let Some(cohort) = cohort {
            self.restrictions
                .check_restricted_mint(to, amount, cohort)?;
        }

        self.ledger.mint(to, amount)?;
        if let Some(cohort) = cohort {
            self.restrictions.record_restricted_mint(to, amount, cohort)?;
        }

        Ok(self.emit(LedgerEvent::Mint {
            to: to.clone(),
            amount,
            cohort,
            at: ctx.now,
        }))
    }

    /// Permanently close minting
    pub fn close_minting(&mut self, ctx: &CallContext) -> Result<LedgerEvent, TokenError> {
        ctx.require(ADMIN_UNPAUSABLE)?;
        self.ledger.close_minting()?;
        Ok(self.emit(LedgerEvent::MintingClosed { at: ctx.now }))
    }

    // =========================================================================
    // Spending
    // =========================================================================

    /// Transfer tokens, honouring cohort locks
    pub fn transfer(
        &mut self,
        ctx: &CallContext,
        from: &AccountId,
        to: &AccountId,
        amount: u128,
    ) -> Result<LedgerEvent, TokenError> {
        ctx.require(HOLDER)?;
        guard::guarded_transfer(
            &mut self.ledger,
            &mut self.restrictions,
            from,
            to,
            amount,
            ctx.now,
        )?;

        Ok(self.emit(LedgerEvent::Transfer {
            from: from.clone(),
            to: to.clone(),
            amount,
            at: ctx.now,
        }))
    }

    /// Burn tokens, honouring cohort locks
    pub fn burn(
        &mut self,
        ctx: &CallContext,
        from: &AccountId,
        amount: u128,
    ) -> Result<LedgerEvent, TokenError> {
        ctx.require(HOLDER)?;
        guard::guarded_burn(
            &mut self.ledger,
            &mut self.restrictions,
            from,
            amount,
            ctx.now,
        )?;

        Ok(self.emit(LedgerEvent::Burn {
            from: from.clone(),
            amount,
            at: ctx.now,
        }))
    }

    /// Allow `spender` to move up to `amount` of `owner`'s tokens
    pub fn approve(
        &mut self,
        ctx: &CallContext,
        owner: &AccountId,
        spender: &AccountId,
        amount: u128,
    ) -> Result<LedgerEvent, TokenError> {
        ctx.require(HOLDER)?;
        if spender.is_null() {
            return Err(TokenError::InvalidRecipient);
        }

        // Set allowance (can be 0 to revoke)
        self.allowances
            .entry(owner.clone())
            .or_default()
            .insert(spender.clone(), amount);

        Ok(self.emit(LedgerEvent::Approval {
            owner: owner.clone(),
            spender: spender.clone(),
            amount,
            at: ctx.now,
        }))
    }

    /// Transfer on behalf of `from` using a prior approval.
    ///
    /// Locks apply to `from` exactly as for a direct transfer.
    pub fn transfer_from(
        &mut self,
        ctx: &CallContext,
        spender: &AccountId,
        from: &AccountId,
        to: &AccountId,
        amount: u128,
    ) -> Result<LedgerEvent, TokenError> {
        ctx.require(HOLDER)?;

        let current_allowance = self.allowance(from, spender);
        if current_allowance < amount {
            return Err(TokenError::InsufficientAllowance {
                have: current_allowance,
                need: amount,
            });
        }

        guard::guarded_transfer(
            &mut self.ledger,
            &mut self.restrictions,
            from,
            to,
            amount,
            ctx.now,
        )?;

        if let Some(allowance) = self
            .allowances
            .get_mut(from)
            .and_then(|spenders| spenders.get_mut(spender))
        {
            *allowance -= amount;
        }

        Ok(self.emit(LedgerEvent::Transfer {
            from: from.clone(),
            to: to.clone(),
            amount,
            at: ctx.now,
        }))
    }

    // =========================================================================
    // Schedule administration
    // =========================================================================

    pub fn set_private_unlock_time(
        &mut self,
        ctx: &CallContext,
        unlock_time: Timestamp,
    ) -> Result<LedgerEvent, TokenError> {
        self.set_unlock_time(ctx, Cohort::Private, unlock_time)
    }

    pub fn set_presale_unlock_time(
        &mut self,
        ctx: &CallContext,
        unlock_time: Timestamp,
    ) -> Result<LedgerEvent, TokenError> {
        self.set_unlock_time(ctx, Cohort::Presale, unlock_time)
    }

    /// Move a cohort's unlock time. No ordering between cohorts is enforced.
    pub fn set_unlock_time(
        &mut self,
        ctx: &CallContext,
        cohort: Cohort,
        unlock_time: Timestamp,
    ) -> Result<LedgerEvent, TokenError> {
        ctx.require(ADMIN_UNPAUSABLE)?;
        self.restrictions.set_unlock_time(cohort, unlock_time)?;

        Ok(self.emit(LedgerEvent::ScheduleChanged {
            cohort,
            unlock_time,
            at: ctx.now,
        }))
    }

    fn emit(&mut self, event: LedgerEvent) -> LedgerEvent {
        self.sink.notify(&event);
        self.history.push(event.clone());
        event
    }
}

/// Token address from creator, symbol and creation time
fn derive_address(metadata: &TokenMetadata) -> String {
    let input = format!(
        "{}:{}:{}",
        metadata.creator,
        metadata.symbol,
        metadata.created_at.timestamp_nanos_opt().unwrap_or_default()
    );
    let hex = sha256_hex(input.as_bytes());
    format!("0x{}", &hex[..40])
}
