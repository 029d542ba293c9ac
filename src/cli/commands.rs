//! CLI commands for the ledger
//!
//! Implements all command handlers for the CLI interface. The CLI acts as
//! the caller layer: administrative commands run as the authorized role and
//! nothing is ever paused.

use crate::storage::{Storage, StorageConfig};
use crate::token::{
    AccountId, CallContext, Cohort, DebitPolicy, LedgerConfig, RestrictedToken, Timestamp,
    TokenMetadata, UnlockSchedule,
};
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};

/// Result type for CLI operations
pub type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

/// Parameters for `init`
#[derive(Debug, Clone)]
pub struct InitParams {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    pub creator: String,
    pub cap: Option<u128>,
    pub private_unlock: Timestamp,
    pub presale_unlock: Timestamp,
    pub debit_policy: DebitPolicy,
    pub history_limit: usize,
}

/// Application state
pub struct AppState {
    pub token: RestrictedToken,
    pub storage: Storage,
    pub data_dir: PathBuf,
    /// Ledger time used for every command in this run
    pub now: Timestamp,
}

impl AppState {
    /// Load an initialized ledger
    pub fn new(data_dir: PathBuf, now: Option<Timestamp>) -> CliResult<Self> {
        let storage = Storage::new(storage_config(&data_dir))?;

        if !storage.exists() {
            return Err(format!(
                "no ledger found at {:?}; run `ledger init` first",
                data_dir
            )
            .into());
        }

        let token = storage.load()?;
        log::debug!("Loaded ledger {} from {:?}", token.address, data_dir);

        Ok(Self {
            token,
            storage,
            data_dir,
            now: now.unwrap_or_else(current_time),
        })
    }

    /// Save the current state
    pub fn save(&self) -> CliResult<()> {
        self.storage.save(&self.token)?;
        Ok(())
    }

    fn admin(&self) -> CallContext {
        CallContext::admin(self.now)
    }

    fn holder(&self) -> CallContext {
        CallContext::at(self.now)
    }
}

fn storage_config(data_dir: &Path) -> StorageConfig {
    StorageConfig {
        data_dir: data_dir.to_path_buf(),
        ..Default::default()
    }
}

/// Current wall-clock time in Unix seconds
pub fn current_time() -> Timestamp {
    Utc::now().timestamp().max(0) as Timestamp
}

/// Render a ledger timestamp for humans
pub fn format_time(time: Timestamp) -> String {
    i64::try_from(time)
        .ok()
        .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))
        .map(|dt| dt.to_rfc3339())
        .unwrap_or_else(|| time.to_string())
}

/// Initialize a new ledger
pub fn cmd_init(data_dir: &Path, params: InitParams) -> CliResult<()> {
    let storage = Storage::new(storage_config(data_dir))?;

    if storage.exists() {
        println!("⚠️  Ledger already exists at {:?}", data_dir);
        return Ok(());
    }

    let metadata = TokenMetadata::new(
        params.name,
        params.symbol,
        params.decimals,
        AccountId::from(params.creator),
    )?;
    let schedule = UnlockSchedule::new(params.private_unlock, params.presale_unlock)?;
    let config = LedgerConfig {
        max_supply: params.cap,
        debit_policy: params.debit_policy,
        history_limit: params.history_limit,
    };

    let token = RestrictedToken::new(metadata, schedule, config);
    storage.save(&token)?;

    println!("✅ Ledger initialized!");
    println!("   📁 Data directory: {:?}", data_dir);
    println!("   🪙 Token: {} ({})", token.name(), token.symbol());
    println!("   📍 Address: {}", token.address);
    print_schedule(&token);

    Ok(())
}

/// Mint tokens, optionally locked under a cohort
pub fn cmd_mint(
    state: &mut AppState,
    to: &str,
    amount: u128,
    cohort: Option<Cohort>,
) -> CliResult<()> {
    let ctx = state.admin();
    let to = AccountId::from(to);

    match cohort {
        Some(cohort) => state.token.mint_restricted(&ctx, &to, amount, cohort)?,
        None => state.token.mint(&ctx, &to, amount)?,
    };
    state.save()?;

    match cohort {
        Some(cohort) => println!("✅ Minted {} {} tokens to {}", amount, cohort, to),
        None => println!("✅ Minted {} tokens to {}", amount, to),
    }
    println!("   Total supply: {}", state.token.total_supply());

    Ok(())
}

/// Burn tokens
pub fn cmd_burn(state: &mut AppState, from: &str, amount: u128) -> CliResult<()> {
    let ctx = state.holder();
    let from = AccountId::from(from);

    state.token.burn(&ctx, &from, amount)?;
    state.save()?;

    println!("🔥 Burned {} tokens from {}", amount, from);
    println!("   Total supply: {}", state.token.total_supply());

    Ok(())
}

/// Transfer tokens
pub fn cmd_transfer(state: &mut AppState, from: &str, to: &str, amount: u128) -> CliResult<()> {
    let ctx = state.holder();
    let (from, to) = (AccountId::from(from), AccountId::from(to));

    state.token.transfer(&ctx, &from, &to, amount)?;
    state.save()?;

    println!("📤 Transferred {} tokens", amount);
    println!("   From: {}", from);
    println!("   To: {}", to);

    Ok(())
}

/// Approve a spender
pub fn cmd_approve(state: &mut AppState, owner: &str, spender: &str, amount: u128) -> CliResult<()> {
    let ctx = state.holder();
    let (owner, spender) = (AccountId::from(owner), AccountId::from(spender));

    state.token.approve(&ctx, &owner, &spender, amount)?;
    state.save()?;

    println!("✅ {} may spend {} tokens of {}", spender, amount, owner);

    Ok(())
}

/// Delegated transfer
pub fn cmd_transfer_from(
    state: &mut AppState,
    spender: &str,
    from: &str,
    to: &str,
    amount: u128,
) -> CliResult<()> {
    let ctx = state.holder();
    let (spender, from, to) = (
        AccountId::from(spender),
        AccountId::from(from),
        AccountId::from(to),
    );

    state
        .token
        .transfer_from(&ctx, &spender, &from, &to, amount)?;
    state.save()?;

    println!("📤 {} transferred {} tokens from {} to {}", spender, amount, from, to);
    println!(
        "   Remaining allowance: {}",
        state.token.allowance(&from, &spender)
    );

    Ok(())
}

/// Close minting for good
pub fn cmd_close_minting(state: &mut AppState) -> CliResult<()> {
    let ctx = state.admin();
    state.token.close_minting(&ctx)?;
    state.save()?;

    println!("🔒 Minting closed at supply {}", state.token.total_supply());

    Ok(())
}

/// Move a cohort's unlock time
pub fn cmd_set_unlock(state: &mut AppState, cohort: Cohort, time: Timestamp) -> CliResult<()> {
    let ctx = state.admin();
    state.token.set_unlock_time(&ctx, cohort, time)?;
    state.save()?;

    println!("🗓️  {} unlock time set to {}", cohort, format_time(time));

    Ok(())
}

/// Show the unlock schedule
pub fn cmd_schedule(state: &AppState) -> CliResult<()> {
    print_schedule(&state.token);
    Ok(())
}

fn print_schedule(token: &RestrictedToken) {
    let schedule = token.schedule();
    println!(
        "   ├─ Private unlock: {}",
        format_time(schedule.private_unlock_time)
    );
    println!(
        "   └─ Presale unlock: {}",
        format_time(schedule.presale_unlock_time)
    );
}

/// Show an account's balance and locks
pub fn cmd_balance(state: &AppState, address: &str) -> CliResult<()> {
    let account = AccountId::from(address);
    let token = &state.token;

    println!("💰 Balance for {}", account);
    println!("   ├─ Total: {}", token.balance_of(&account));
    println!(
        "   ├─ Locked now: {}",
        token.locked_amount(&account, state.now)
    );
    println!(
        "   └─ Spendable now: {}",
        token.unlocked_balance(&account, state.now)
    );

    if let Some(lock) = token.restriction_of(&account) {
        println!("\n   Cohort pools:");
        println!("   ├─ Private: {}", lock.private_locked);
        println!("   └─ Presale: {}", lock.presale_locked);
    }

    Ok(())
}

/// Display token info
pub fn cmd_info(state: &AppState) -> CliResult<()> {
    let token = &state.token;
    let config = token.config();

    println!("🪙 {} ({})", token.name(), token.symbol());
    println!("   ├─ Address: {}", token.address);
    println!("   ├─ Decimals: {}", token.decimals());
    println!("   ├─ Total supply: {}", token.total_supply());
    match token.max_supply() {
        Some(cap) => println!("   ├─ Cap: {}", cap),
        None => println!("   ├─ Cap: none"),
    }
    println!("   ├─ Minting closed: {}", token.is_minting_closed());
    println!("   ├─ Holders: {}", token.holder_count());
    println!("   ├─ Debit policy: {:?}", config.debit_policy);
    print_schedule(token);

    let stats = state.storage.stats()?;
    println!("\n   💾 {} bytes, {} backups", stats.file_size, stats.backup_count);

    if let Err(e) = token.check_conservation() {
        println!("\n❌ {}", e);
    }

    Ok(())
}

/// List recent events
pub fn cmd_history(state: &AppState, count: usize) -> CliResult<()> {
    let events = state.token.history().recent(count);

    if events.is_empty() {
        println!("📭 No events recorded.");
        return Ok(());
    }

    println!("📜 Recent events:");
    for event in events {
        println!("   {} | {}", format_time(event.at()), event);
    }

    Ok(())
}

/// Export ledger to file
pub fn cmd_export(state: &AppState, path: &Path) -> CliResult<()> {
    crate::storage::save_to_file(&state.token, path)?;
    println!("📦 Ledger exported to {:?}", path);
    Ok(())
}

/// Import ledger from file
pub fn cmd_import(state: &mut AppState, path: &Path) -> CliResult<()> {
    let token = crate::storage::load_from_file(path)?;

    state.token = token;
    state.save()?;

    println!("📥 Ledger imported from {:?}", path);
    println!("   Total supply: {}", state.token.total_supply());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn init_params() -> InitParams {
        InitParams {
            name: "Cli Token".to_string(),
            symbol: "CLI".to_string(),
            decimals: 18,
            creator: "owner".to_string(),
            cap: Some(10_000),
            private_unlock: 500,
            presale_unlock: 1000,
            debit_policy: DebitPolicy::AfterUnlock,
            history_limit: 10,
        }
    }

    #[test]
    fn test_commands_persist_state() {
        let temp_dir = tempfile::tempdir().unwrap();
        let dir = temp_dir.path().to_path_buf();

        assert!(AppState::new(dir.clone(), Some(0)).is_err());
        cmd_init(&dir, init_params()).unwrap();

        let mut state = AppState::new(dir.clone(), Some(0)).unwrap();
        cmd_mint(&mut state, "x", 1000, Some(Cohort::Presale)).unwrap();
        cmd_mint(&mut state, "x", 100, None).unwrap();
        cmd_transfer(&mut state, "x", "y", 100).unwrap();
        assert!(cmd_transfer(&mut state, "x", "y", 1).is_err());

        let reloaded = AppState::new(dir.clone(), Some(1001)).unwrap();
        assert_eq!(reloaded.token.balance_of(&AccountId::from("x")), 1000);
        assert_eq!(reloaded.token.balance_of(&AccountId::from("y")), 100);
        assert_eq!(reloaded.token.unlocked_balance(&AccountId::from("x"), 1001), 1000);
        assert_eq!(reloaded.token.history().len(), 3);
    }

    #[test]
    fn test_export_import() {
        let temp_dir = tempfile::tempdir().unwrap();
        let dir = temp_dir.path().join("a");
        let other = temp_dir.path().join("b");
        let export = temp_dir.path().join("export.json");

        cmd_init(&dir, init_params()).unwrap();
        let mut state = AppState::new(dir, Some(0)).unwrap();
        cmd_mint(&mut state, "x", 42, None).unwrap();
        cmd_export(&state, &export).unwrap();

        cmd_init(&other, init_params()).unwrap();
        let mut target = AppState::new(other, Some(0)).unwrap();
        cmd_import(&mut target, &export).unwrap();
        assert_eq!(target.token.balance_of(&AccountId::from("x")), 42);
        assert_eq!(target.token.address, state.token.address);
    }

    #[test]
    fn test_import_rejects_invalid_ledger() {
        let temp_dir = tempfile::tempdir().unwrap();
        let dir = temp_dir.path().join("a");
        let export = temp_dir.path().join("broken.json");

        cmd_init(&dir, init_params()).unwrap();
        let mut state = AppState::new(dir.clone(), Some(0)).unwrap();
        cmd_mint(&mut state, "x", 42, None).unwrap();

        let mut value = serde_json::to_value(&state.token).unwrap();
        value["ledger"]["total_supply"] = serde_json::json!(999);
        let broken: RestrictedToken = serde_json::from_value(value).unwrap();
        crate::storage::save_to_file(&broken, &export).unwrap();

        assert!(cmd_import(&mut state, &export).is_err());
        let reloaded = AppState::new(dir, Some(0)).unwrap();
        assert_eq!(reloaded.token.total_supply(), 42);
    }

    #[test]
    fn test_format_time() {
        assert_eq!(format_time(0), "1970-01-01T00:00:00+00:00");
        assert_eq!(format_time(u64::MAX), u64::MAX.to_string());
    }
}
