//! Property tests over random operation sequences

use proptest::prelude::*;
use restricted_ledger::token::{
    AccountId, CallContext, CohortLock, DebitPolicy, LedgerConfig, RestrictedToken, TokenError,
    TokenMetadata, UnlockSchedule,
};

const ACCOUNTS: [&str; 4] = ["a", "b", "c", "d"];
const CAP: u128 = 50_000;

#[derive(Debug, Clone)]
enum Op {
    Mint(usize, u128),
    MintPrivate(usize, u128),
    MintPresale(usize, u128),
    Transfer(usize, usize, u128),
    Burn(usize, u128),
    Advance(u64),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    let account = 0..ACCOUNTS.len();
    let amount = 0u128..3_000;
    prop_oneof![
        (account.clone(), amount.clone()).prop_map(|(a, n)| Op::Mint(a, n)),
        (account.clone(), amount.clone()).prop_map(|(a, n)| Op::MintPrivate(a, n)),
        (account.clone(), amount.clone()).prop_map(|(a, n)| Op::MintPresale(a, n)),
        (account.clone(), account.clone(), amount.clone())
            .prop_map(|(a, b, n)| Op::Transfer(a, b, n)),
        (account, amount).prop_map(|(a, n)| Op::Burn(a, n)),
        (0u64..200).prop_map(Op::Advance),
    ]
}

fn policy_strategy() -> impl Strategy<Value = DebitPolicy> {
    prop_oneof![
        Just(DebitPolicy::AfterUnlock),
        Just(DebitPolicy::Unconditional)
    ]
}

fn id(index: usize) -> AccountId {
    AccountId::from(ACCOUNTS[index])
}

fn new_token(policy: DebitPolicy, private_unlock: u64, presale_unlock: u64) -> RestrictedToken {
    let metadata = TokenMetadata::new("Prop", "PRP", 18, AccountId::from("owner")).unwrap();
    let schedule = UnlockSchedule::new(private_unlock, presale_unlock).unwrap();
    RestrictedToken::new(
        metadata,
        schedule,
        LedgerConfig {
            max_supply: Some(CAP),
            debit_policy: policy,
            history_limit: 16,
        },
    )
}

fn lock_of(token: &RestrictedToken, index: usize) -> CohortLock {
    token.restriction_of(&id(index)).cloned().unwrap_or_default()
}

fn apply(token: &mut RestrictedToken, op: &Op, now: &mut u64) -> Result<(), TokenError> {
    let admin = CallContext::admin(*now);
    let user = CallContext::at(*now);
    match *op {
        Op::Mint(a, n) => token.mint(&admin, &id(a), n).map(|_| ()),
        Op::MintPrivate(a, n) => token.mint_private(&admin, &id(a), n).map(|_| ()),
        Op::MintPresale(a, n) => token.mint_presale(&admin, &id(a), n).map(|_| ()),
        Op::Transfer(a, b, n) => token.transfer(&user, &id(a), &id(b), n).map(|_| ()),
        Op::Burn(a, n) => token.burn(&user, &id(a), n).map(|_| ()),
        Op::Advance(dt) => {
            *now += dt;
            Ok(())
        }
    }
}

proptest! {
    /// Balances always add up to the total supply and never drop below the
    /// locked amount; failed operations change nothing.
    #[test]
    fn ledger_invariants_hold(
        policy in policy_strategy(),
        private_unlock in 1u64..1_500,
        presale_unlock in 1u64..1_500,
        ops in prop::collection::vec(op_strategy(), 1..60),
    ) {
        let mut token = new_token(policy, private_unlock, presale_unlock);
        let mut now = 0u64;

        for op in &ops {
            let ledger_before = token.ledger().clone();
            let restrictions_before = token.restrictions().clone();
            let history_before = token.history().len();
            let locks_before: Vec<CohortLock> =
                (0..ACCOUNTS.len()).map(|i| lock_of(&token, i)).collect();

            let result = apply(&mut token, op, &mut now);

            prop_assert!(token.check_conservation().is_ok());
            prop_assert!(token.total_supply() <= CAP);

            for i in 0..ACCOUNTS.len() {
                prop_assert!(token.balance_of(&id(i)) >= token.locked_amount(&id(i), now));
            }

            match result {
                Err(_) => {
                    prop_assert_eq!(token.ledger(), &ledger_before);
                    prop_assert_eq!(token.restrictions(), &restrictions_before);
                    prop_assert_eq!(token.history().len(), history_before);
                }
                Ok(()) => {
                    // Pools only grow through the matching restricted mint
                    for (i, before) in locks_before.iter().enumerate() {
                        let after = lock_of(&token, i);
                        let minted_private = matches!(*op, Op::MintPrivate(a, _) if a == i);
                        let minted_presale = matches!(*op, Op::MintPresale(a, _) if a == i);
                        if !minted_private {
                            prop_assert!(after.private_locked <= before.private_locked);
                        }
                        if !minted_presale {
                            prop_assert!(after.presale_locked <= before.presale_locked);
                        }
                    }
                }
            }
        }
    }

    /// Without new restricted mints the locked amount never grows over time.
    #[test]
    fn locked_amount_is_monotone_in_time(
        private_locked in 0u128..1_000_000,
        presale_locked in 0u128..1_000_000,
        private_unlock in 1u64..10_000,
        presale_unlock in 1u64..10_000,
        t1 in 0u64..12_000,
        dt in 0u64..12_000,
    ) {
        let mut token = new_token(DebitPolicy::AfterUnlock, private_unlock, presale_unlock);
        let admin = CallContext::admin(0);
        let x = AccountId::from("x");
        token.mint_private(&admin, &x, private_locked.min(CAP / 2)).unwrap();
        token.mint_presale(&admin, &x, presale_locked.min(CAP / 2)).unwrap();

        prop_assert!(token.locked_amount(&x, t1 + dt) <= token.locked_amount(&x, t1));
    }

    /// Spending more than the locked pools leaves them at zero, never below.
    #[test]
    fn debit_never_overshoots(
        private_amount in 0u128..10_000,
        presale_amount in 0u128..10_000,
        free_amount in 0u128..10_000,
        spend_fraction in 0u32..=100,
        policy in policy_strategy(),
    ) {
        let mut token = new_token(policy, 10, 20);
        let admin = CallContext::admin(0);
        let x = AccountId::from("x");
        token.mint_private(&admin, &x, private_amount).unwrap();
        token.mint_presale(&admin, &x, presale_amount).unwrap();
        token.mint(&admin, &x, free_amount).unwrap();

        let balance = token.balance_of(&x);
        let spend = balance * u128::from(spend_fraction) / 100;
        token.burn(&CallContext::at(21), &x, spend).unwrap();

        let lock = token.restriction_of(&x).cloned().unwrap_or_default();
        let pools_before = private_amount + presale_amount;
        let pools_after = lock.private_locked + lock.presale_locked;
        prop_assert_eq!(pools_after, pools_before.saturating_sub(spend));
        prop_assert_eq!(lock.presale_locked, presale_amount.saturating_sub(spend));
    }
}
