//! Ledger notifications
//!
//! Events are emitted after a mutation has succeeded. Sinks are
//! fire-and-forget: nothing they do can influence the ledger.

use crate::token::account::{AccountId, Timestamp};
use crate::token::restriction::Cohort;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;

/// Default number of events kept in memory
pub const DEFAULT_HISTORY_LIMIT: usize = 100;

/// Something that happened to the ledger
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LedgerEvent {
    Mint {
        to: AccountId,
        amount: u128,
        cohort: Option<Cohort>,
        at: Timestamp,
    },
    Burn {
        from: AccountId,
        amount: u128,
        at: Timestamp,
    },
    Transfer {
        from: AccountId,
        to: AccountId,
        amount: u128,
        at: Timestamp,
    },
    Approval {
        owner: AccountId,
        spender: AccountId,
        amount: u128,
        at: Timestamp,
    },
    MintingClosed {
        at: Timestamp,
    },
    ScheduleChanged {
        cohort: Cohort,
        unlock_time: Timestamp,
        at: Timestamp,
    },
}

impl LedgerEvent {
    /// Ledger time at which the event happened
    pub fn at(&self) -> Timestamp {
        match self {
            LedgerEvent::Mint { at, .. }
            | LedgerEvent::Burn { at, .. }
            | LedgerEvent::Transfer { at, .. }
            | LedgerEvent::Approval { at, .. }
            | LedgerEvent::MintingClosed { at }
            | LedgerEvent::ScheduleChanged { at, .. } => *at,
        }
    }
}

impl fmt::Display for LedgerEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LedgerEvent::Mint {
                to,
                amount,
                cohort: Some(cohort),
                ..
            } => write!(f, "mint {} to {} ({})", amount, to, cohort),
            LedgerEvent::Mint { to, amount, .. } => write!(f, "mint {} to {}", amount, to),
            LedgerEvent::Burn { from, amount, .. } => write!(f, "burn {} from {}", amount, from),
            LedgerEvent::Transfer {
                from, to, amount, ..
            } => write!(f, "transfer {} from {} to {}", amount, from, to),
            LedgerEvent::Approval {
                owner,
                spender,
                amount,
                ..
            } => write!(f, "approve {} to spend {} of {}", spender, amount, owner),
            LedgerEvent::MintingClosed { .. } => f.write_str("minting closed"),
            LedgerEvent::ScheduleChanged {
                cohort,
                unlock_time,
                ..
            } => write!(f, "{} unlock time set to {}", cohort, unlock_time),
        }
    }
}

/// Receiver of ledger notifications
pub trait EventSink: Send + Sync {
    fn notify(&self, event: &LedgerEvent);
}

/// Forwards events to the `log` facade
#[derive(Clone, Copy, Debug, Default)]
pub struct LogSink;

impl EventSink for LogSink {
    fn notify(&self, event: &LedgerEvent) {
        match event {
            LedgerEvent::Transfer { .. } | LedgerEvent::Approval { .. } => {
                log::debug!("{}", event)
            }
            _ => log::info!("{}", event),
        }
    }
}

/// Drops every event
#[derive(Clone, Copy, Debug, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn notify(&self, _event: &LedgerEvent) {}
}

/// Bounded in-memory event history, oldest first
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventLog {
    limit: usize,
    events: VecDeque<LedgerEvent>,
}

impl EventLog {
    pub fn new(limit: usize) -> Self {
        Self {
            limit,
            events: VecDeque::with_capacity(limit.min(DEFAULT_HISTORY_LIMIT)),
        }
    }

    pub fn push(&mut self, event: LedgerEvent) {
        if self.limit == 0 {
            return;
        }
        while self.events.len() >= self.limit {
            self.events.pop_front();
        }
        self.events.push_back(event);
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn iter(&self) -> impl Iterator<Item = &LedgerEvent> {
        self.events.iter()
    }

    /// The `n` most recent events, oldest first
    pub fn recent(&self, n: usize) -> Vec<&LedgerEvent> {
        let skip = self.events.len().saturating_sub(n);
        self.events.iter().skip(skip).collect()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl Default for EventLog {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_LIMIT)
    }
}
