//! Restricted Ledger CLI Application
//!
//! A command-line interface for operating a cohort-restricted token ledger.

use clap::{Parser, Subcommand, ValueEnum};
use restricted_ledger::cli::{self, AppState, InitParams};
use restricted_ledger::token::{Cohort, DebitPolicy, DEFAULT_HISTORY_LIMIT};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "ledger")]
#[command(author = "Darshan")]
#[command(version = "0.1.0")]
#[command(about = "A token ledger with time-locked sale cohorts", long_about = None)]
struct Cli {
    /// Data directory for ledger storage
    #[arg(short, long, default_value = ".ledger_data")]
    data_dir: PathBuf,

    /// Ledger time in Unix seconds (defaults to the current time)
    #[arg(long, global = true)]
    now: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum PolicyArg {
    /// Charge a cohort's pool only after it has unlocked
    AfterUnlock,
    /// Charge the pools on every spend
    Unconditional,
}

impl From<PolicyArg> for DebitPolicy {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::AfterUnlock => DebitPolicy::AfterUnlock,
            PolicyArg::Unconditional => DebitPolicy::Unconditional,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a new ledger
    Init {
        /// Token name
        #[arg(long)]
        name: String,

        /// Token symbol
        #[arg(long)]
        symbol: String,

        /// Decimal places
        #[arg(long, default_value = "18")]
        decimals: u8,

        /// Creator account
        #[arg(long, default_value = "owner")]
        creator: String,

        /// Maximum total supply
        #[arg(long)]
        cap: Option<u128>,

        /// Private-sale unlock time (Unix seconds)
        #[arg(long)]
        private_unlock: u64,

        /// Presale unlock time (Unix seconds)
        #[arg(long)]
        presale_unlock: u64,

        /// When spent tokens are charged against locked pools
        #[arg(long, value_enum, default_value = "after-unlock")]
        debit_policy: PolicyArg,

        /// Number of events kept in the history
        #[arg(long, default_value_t = DEFAULT_HISTORY_LIMIT)]
        history_limit: usize,
    },

    /// Mint unrestricted tokens
    Mint {
        #[arg(short, long)]
        to: String,
        #[arg(short, long)]
        amount: u128,
    },

    /// Mint tokens locked until the private-sale unlock
    MintPrivate {
        #[arg(short, long)]
        to: String,
        #[arg(short, long)]
        amount: u128,
    },

    /// Mint tokens locked until the presale unlock
    MintPresale {
        #[arg(short, long)]
        to: String,
        #[arg(short, long)]
        amount: u128,
    },

    /// Burn tokens
    Burn {
        #[arg(short, long)]
        from: String,
        #[arg(short, long)]
        amount: u128,
    },

    /// Transfer tokens
    Transfer {
        #[arg(short, long)]
        from: String,
        #[arg(short, long)]
        to: String,
        #[arg(short, long)]
        amount: u128,
    },

    /// Allow a spender to transfer on the owner's behalf
    Approve {
        #[arg(short, long)]
        owner: String,
        #[arg(short, long)]
        spender: String,
        #[arg(short, long)]
        amount: u128,
    },

    /// Transfer using an allowance
    TransferFrom {
        #[arg(short, long)]
        spender: String,
        #[arg(short, long)]
        from: String,
        #[arg(short, long)]
        to: String,
        #[arg(short, long)]
        amount: u128,
    },

    /// Permanently close minting
    CloseMinting,

    /// Unlock schedule operations
    Schedule {
        #[command(subcommand)]
        action: Option<ScheduleCommands>,
    },

    /// Show an account's balance and locks
    Balance {
        #[arg(short, long)]
        address: String,
    },

    /// Display token information
    Info,

    /// Show recent events
    History {
        /// Number of events to show
        #[arg(short, long, default_value = "20")]
        count: usize,
    },

    /// Export ledger to file
    Export {
        /// Output file path
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Import ledger from file
    Import {
        /// Input file path
        #[arg(short, long)]
        input: PathBuf,
    },
}

#[derive(Subcommand)]
enum ScheduleCommands {
    /// Show the unlock schedule
    Show,

    /// Set the private-sale unlock time
    SetPrivate {
        /// Unix seconds
        #[arg(short, long)]
        time: u64,
    },

    /// Set the presale unlock time
    SetPresale {
        /// Unix seconds
        #[arg(short, long)]
        time: u64,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    // Handle init command separately (doesn't need loaded state)
    if let Commands::Init {
        name,
        symbol,
        decimals,
        creator,
        cap,
        private_unlock,
        presale_unlock,
        debit_policy,
        history_limit,
    } = cli.command
    {
        let params = InitParams {
            name,
            symbol,
            decimals,
            creator,
            cap,
            private_unlock,
            presale_unlock,
            debit_policy: debit_policy.into(),
            history_limit,
        };
        return cli::cmd_init(&cli.data_dir, params);
    }

    let mut state = AppState::new(cli.data_dir.clone(), cli.now)?;

    match cli.command {
        Commands::Init { .. } => unreachable!(),

        Commands::Mint { to, amount } => {
            cli::cmd_mint(&mut state, &to, amount, None)?;
        }

        Commands::MintPrivate { to, amount } => {
            cli::cmd_mint(&mut state, &to, amount, Some(Cohort::Private))?;
        }

        Commands::MintPresale { to, amount } => {
            cli::cmd_mint(&mut state, &to, amount, Some(Cohort::Presale))?;
        }

        Commands::Burn { from, amount } => {
            cli::cmd_burn(&mut state, &from, amount)?;
        }

        Commands::Transfer { from, to, amount } => {
            cli::cmd_transfer(&mut state, &from, &to, amount)?;
        }

        Commands::Approve {
            owner,
            spender,
            amount,
        } => {
            cli::cmd_approve(&mut state, &owner, &spender, amount)?;
        }

        Commands::TransferFrom {
            spender,
            from,
            to,
            amount,
        } => {
            cli::cmd_transfer_from(&mut state, &spender, &from, &to, amount)?;
        }

        Commands::CloseMinting => {
            cli::cmd_close_minting(&mut state)?;
        }

        Commands::Schedule { action } => match action {
            None | Some(ScheduleCommands::Show) => {
                cli::cmd_schedule(&state)?;
            }
            Some(ScheduleCommands::SetPrivate { time }) => {
                cli::cmd_set_unlock(&mut state, Cohort::Private, time)?;
            }
            Some(ScheduleCommands::SetPresale { time }) => {
                cli::cmd_set_unlock(&mut state, Cohort::Presale, time)?;
            }
        },

        Commands::Balance { address } => {
            cli::cmd_balance(&state, &address)?;
        }

        Commands::Info => {
            cli::cmd_info(&state)?;
        }

        Commands::History { count } => {
            cli::cmd_history(&state, count)?;
        }

        Commands::Export { output } => {
            cli::cmd_export(&state, &output)?;
        }

        Commands::Import { input } => {
            cli::cmd_import(&mut state, &input)?;
        }
    }

    Ok(())
}
