//! Shared token handle for concurrent callers
//!
//! Each mutating call holds the write lock for its whole duration, so the
//! intermediate steps of a guarded transfer are never observable and two
//! callers can never interleave inside one operation.

use crate::token::account::{AccountId, Timestamp};
use crate::token::events::LedgerEvent;
use crate::token::guard::CallContext;
use crate::token::ledger::TokenError;
use crate::token::restriction::{CohortLock, UnlockSchedule};
use crate::token::token::RestrictedToken;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Cloneable, lock-protected handle to a [`RestrictedToken`]
#[derive(Clone, Debug)]
pub struct SharedToken {
    inner: Arc<RwLock<RestrictedToken>>,
}

impl SharedToken {
    pub fn new(token: RestrictedToken) -> Self {
        Self {
            inner: Arc::new(RwLock::new(token)),
        }
    }

    /// Run `f` with exclusive access. The whole closure is one atomic step.
    pub async fn write<R>(&self, f: impl FnOnce(&mut RestrictedToken) -> R) -> R {
        let mut token = self.inner.write().await;
        f(&mut token)
    }

    /// Run `f` with shared access
    pub async fn read<R>(&self, f: impl FnOnce(&RestrictedToken) -> R) -> R {
        let token = self.inner.read().await;
        f(&token)
    }

    /// Copy of the current state, e.g. for persisting
    pub async fn snapshot(&self) -> RestrictedToken {
        self.inner.read().await.clone()
    }

    pub async fn mint(
        &self,
        ctx: CallContext,
        to: AccountId,
        amount: u128,
    ) -> Result<LedgerEvent, TokenError> {
        self.write(|t| t.mint(&ctx, &to, amount)).await
    }

    pub async fn mint_private(
        &self,
        ctx: CallContext,
        to: AccountId,
        amount: u128,
    ) -> Result<LedgerEvent, TokenError> {
        self.write(|t| t.mint_private(&ctx, &to, amount)).await
    }

    pub async fn mint_presale(
        &self,
        ctx: CallContext,
        to: AccountId,
        amount: u128,
    ) -> Result<LedgerEvent, TokenError> {
        self.write(|t| t.mint_presale(&ctx, &to, amount)).await
    }

    pub async fn transfer(
        &self,
        ctx: CallContext,
        from: AccountId,
        to: AccountId,
        amount: u128,
    ) -> Result<LedgerEvent, TokenError> {
        self.write(|t| t.transfer(&ctx, &from, &to, amount)).await
    }

    pub async fn transfer_from(
        &self,
        ctx: CallContext,
        spender: AccountId,
        from: AccountId,
        to: AccountId,
        amount: u128,
    ) -> Result<LedgerEvent, TokenError> {
        self.write(|t| t.transfer_from(&ctx, &spender, &from, &to, amount))
            .await
    }

    pub async fn approve(
        &self,
        ctx: CallContext,
        owner: AccountId,
        spender: AccountId,
        amount: u128,
    ) -> Result<LedgerEvent, TokenError> {
        self.write(|t| t.approve(&ctx, &owner, &spender, amount)).await
    }

    pub async fn burn(
        &self,
        ctx: CallContext,
        from: AccountId,
        amount: u128,
    ) -> Result<LedgerEvent, TokenError> {
        self.write(|t| t.burn(&ctx, &from, amount)).await
    }

    pub async fn close_minting(&self, ctx: CallContext) -> Result<LedgerEvent, TokenError> {
        self.write(|t| t.close_minting(&ctx)).await
    }

    pub async fn set_private_unlock_time(
        &self,
        ctx: CallContext,
        unlock_time: Timestamp,
    ) -> Result<LedgerEvent, TokenError> {
        self.write(|t| t.set_private_unlock_time(&ctx, unlock_time))
            .await
    }

    pub async fn set_presale_unlock_time(
        &self,
        ctx: CallContext,
        unlock_time: Timestamp,
    ) -> Result<LedgerEvent, TokenError> {
        self.write(|t| t.set_presale_unlock_time(&ctx, unlock_time))
            .await
    }

    pub async fn balance_of(&self, account: &AccountId) -> u128 {
        self.read(|t| t.balance_of(account)).await
    }

    pub async fn locked_amount(&self, account: &AccountId, now: Timestamp) -> u128 {
        self.read(|t| t.locked_amount(account, now)).await
    }

    pub async fn restriction_of(&self, account: &AccountId) -> Option<CohortLock> {
        self.read(|t| t.restriction_of(account).cloned()).await
    }

    pub async fn schedule(&self) -> UnlockSchedule {
        self.read(|t| *t.schedule()).await
    }

    pub async fn total_supply(&self) -> u128 {
        self.read(|t| t.total_supply()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::token::{LedgerConfig, TokenMetadata};

    fn create_shared_token() -> SharedToken {
        let metadata =
            TokenMetadata::new("Shared", "SHR", 18, AccountId::from("creator")).unwrap();
        let schedule = UnlockSchedule::new(500, 1000).unwrap();
        SharedToken::new(RestrictedToken::new(
            metadata,
            schedule,
            LedgerConfig::default(),
        ))
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_transfers_never_overspend() {
        let token = create_shared_token();
        let x = AccountId::from("x");
        token
            .mint_presale(CallContext::admin(0), x.clone(), 1000)
            .await
            .unwrap();
        token.mint(CallContext::admin(0), x.clone(), 100).await.unwrap();

        let mut handles = Vec::new();
        for i in 0..20 {
            let token = token.clone();
            let from = x.clone();
            handles.push(tokio::spawn(async move {
                token
                    .transfer(
                        CallContext::at(10),
                        from,
                        AccountId::from(format!("r{}", i).as_str()),
                        10,
                    )
                    .await
            }));
        }

        let mut succeeded = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                succeeded += 1;
            }
        }

        // Only the 100 unrestricted tokens can leave before the unlock
        assert_eq!(succeeded, 10);
        assert_eq!(token.balance_of(&x).await, 1000);
        assert_eq!(token.total_supply().await, 1100);
        assert!(token.read(|t| t.check_conservation()).await.is_ok());
    }

    #[tokio::test]
    async fn test_snapshot_is_detached() {
        let token = create_shared_token();
        let alice = AccountId::from("alice");
        token
            .mint(CallContext::admin(0), alice.clone(), 5)
            .await
            .unwrap();

        let snapshot = token.snapshot().await;
        token
            .burn(CallContext::at(0), alice.clone(), 5)
            .await
            .unwrap();

        assert_eq!(snapshot.balance_of(&alice), 5);
        assert_eq!(token.balance_of(&alice).await, 0);
    }
}
