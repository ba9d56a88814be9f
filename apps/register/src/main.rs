//! # PosGo Register Entry Point
//!
//! The `posgo` command-line register.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        posgo                                            │
//! │                                                                         │
//! │  argv ──► clap ──► Command                                              │
//! │                      │                                                  │
//! │          ┌───────────┴───────────────┐                                  │
//! │          ▼                           ▼                                  │
//! │  login / logout / whoami     open / close / cash-in / cash-out /        │
//! │  (LocalStore only)           sell / status / history / report / audit   │
//! │                              (Register::start → CashState)              │
//! │                                      │                                  │
//! │                                      ▼                                  │
//! │                         stdout: JSON response                           │
//! │                         stderr: logs, JSON error                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Startup Sequence
//! 1. Initialize tracing (logging)
//! 2. Load configuration (defaults → posgo.toml → POSGO_* env)
//! 3. Determine data directory (session file, database)
//! 4. Run the command, print its JSON

use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;

use posgo_register::commands::{cash, sale, session};
use posgo_register::error::ApiError;
use posgo_register::state::RegisterConfig;
use posgo_register::{data_dir, init_tracing, local_store, Register};

#[derive(Parser, Debug)]
#[command(name = "posgo", version, about = "PosGo cash register")]
struct Cli {
    /// Config file (default: platform config dir, or POSGO_CONFIG)
    #[arg(short = 'c', long = "config", global = true)]
    config: Option<PathBuf>,

    /// Use a throwaway in-memory database
    #[arg(long = "memory", global = true)]
    memory: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start a session
    Login {
        #[arg(long, default_value = "")]
        email: String,
        /// Store to work against
        #[arg(long)]
        store: Option<String>,
        #[arg(long, default_value = "cashier")]
        role: String,
        /// Log in as the demo user (template store)
        #[arg(long)]
        demo: bool,
    },
    /// End the session and forget the active shift
    Logout,
    /// Show the current session
    Whoami,
    /// Open the drawer with a starting float
    Open { amount: String },
    /// Close the drawer with the counted amount (blank records 0)
    Close {
        #[arg(default_value = "")]
        amount: String,
    },
    /// Put cash into the drawer
    CashIn {
        amount: String,
        #[arg(default_value = "")]
        description: String,
    },
    /// Take cash out of the drawer
    CashOut {
        amount: String,
        #[arg(default_value = "")]
        description: String,
    },
    /// Ring up a sale on the open shift
    Sell {
        /// Cart line, `name=price[xqty]` (repeatable)
        #[arg(short = 'i', long = "item", required = true)]
        items: Vec<String>,
        /// Payment method for single-method sales
        #[arg(short = 'm', long = "method", default_value = "cash")]
        method: String,
        /// Split payment line, `method=amount` (repeatable)
        #[arg(short = 'p', long = "pay")]
        payments: Vec<String>,
    },
    /// Active shift, expected drawer and recent movements
    Status,
    /// Summaries of every shift
    History,
    /// Summary of one shift
    Report { shift_id: String },
    /// Shifts whose movements do not match their status
    Audit,
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    match run(cli).await {
        Ok(output) => {
            println!("{}", output);
            ExitCode::SUCCESS
        }
        Err(e) => {
            let body = serde_json::to_string(&e).unwrap_or_else(|_| e.to_string());
            eprintln!("{}", body);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<String, ApiError> {
    let config = RegisterConfig::load(cli.config)?;
    let dir = data_dir()?;
    let local = local_store(&dir);

    match cli.command {
        Command::Login {
            email,
            store,
            role,
            demo,
        } => json(&session::login(&local, &email, store.as_deref(), &role, demo)?),
        Command::Logout => json(&session::logout(&local)?),
        Command::Whoami => json(&session::current_session(&local)),
        command => {
            let register = Register::start(config, local, &dir, cli.memory).await?;
            let output = run_cash(&register, command).await;
            register.shutdown().await;
            output
        }
    }
}

async fn run_cash(register: &Register, command: Command) -> Result<String, ApiError> {
    let state = &register.cash;

    match command {
        Command::Open { amount } => json(&cash::open_shift(state, &amount).await?),
        Command::Close { amount } => json(&cash::close_shift(state, &amount).await?),
        Command::CashIn {
            amount,
            description,
        } => json(&cash::cash_in(state, &amount, &description).await?),
        Command::CashOut {
            amount,
            description,
        } => json(&cash::cash_out(state, &amount, &description).await?),
        Command::Sell {
            items,
            method,
            payments,
        } => json(&sale::record_sale(state, &items, &method, &payments).await?),
        Command::Status => json(&cash::get_status(state, &register.config).await?),
        Command::History => json(&cash::get_history(state).await),
        Command::Report { shift_id } => json(&cash::get_shift_report(state, &shift_id).await?),
        Command::Audit => json(&cash::audit_ledger(state).await?),
        Command::Login { .. } | Command::Logout | Command::Whoami => {
            Err(ApiError::internal("session command routed to the register"))
        }
    }
}

fn json<T: Serialize>(value: &T) -> Result<String, ApiError> {
    serde_json::to_string_pretty(value)
        .map_err(|e| ApiError::internal(format!("Could not encode response: {}", e)))
}
