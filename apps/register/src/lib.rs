//! # PosGo Register Library
//!
//! Core library for the PosGo register: the cash state coordinator, the
//! local session store, configuration and the commands the `posgo` binary
//! exposes.
//!
//! ## Module Organization
//! ```text
//! posgo_register/
//! ├── lib.rs          ◄─── You are here (startup & tracing)
//! ├── state/
//! │   ├── mod.rs      ◄─── State type exports
//! │   ├── cash.rs     ◄─── CashState coordinator (working copy + gateway)
//! │   ├── session.rs  ◄─── LocalStore: session + active shift slot
//! │   └── config.rs   ◄─── RegisterConfig (toml + POSGO_* env)
//! ├── commands/
//! │   ├── mod.rs      ◄─── Command exports
//! │   ├── cash.rs     ◄─── Drawer actions and reports
//! │   ├── sale.rs     ◄─── Sales
//! │   └── session.rs  ◄─── Login / logout
//! └── error.rs        ◄─── API error type for commands
//! ```

pub mod commands;
pub mod error;
pub mod state;

use directories::ProjectDirs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use error::ApiError;
use posgo_db::{CashGateway, Database, DbConfig};
use state::{CashState, LocalStore, RegisterConfig};

/// Name of the session file inside the data directory.
pub const SESSION_FILE: &str = "session.json";

/// Name of the database file inside the data directory.
pub const DATABASE_FILE: &str = "posgo.db";

/// Everything a database-backed command needs.
pub struct Register {
    pub config: RegisterConfig,
    pub local: LocalStore,
    pub cash: CashState,
    db: Database,
}

impl Register {
    /// Connects to the database and loads the session's store.
    ///
    /// ## Startup Sequence
    /// ```text
    /// ┌─────────────────────────────────────────────────────────────────────────┐
    /// │  1. Determine Database Path                                             │
    /// │     • [database] path / POSGO_DB_PATH, else <data dir>/posgo.db         │
    /// │     • `in_memory` ignores both (demo runs)                              │
    /// │                                                                         │
    /// │  2. Connect to Database                                                 │
    /// │     • SQLite with WAL mode, foreign keys on                             │
    /// │     • Run pending migrations                                            │
    /// │                                                                         │
    /// │  3. Resolve Store Scope                                                 │
    /// │     • From the session file; demo or no session → template store        │
    /// │                                                                         │
    /// │  4. Load CashState                                                      │
    /// │     • Reads shifts, movements and transactions for the store            │
    /// └─────────────────────────────────────────────────────────────────────────┘
    /// ```
    pub async fn start(
        config: RegisterConfig,
        local: LocalStore,
        data_dir: &Path,
        in_memory: bool,
    ) -> Result<Self, ApiError> {
        let db_config = if in_memory {
            DbConfig::in_memory()
        } else {
            let path = config
                .database
                .path
                .clone()
                .unwrap_or_else(|| data_dir.join(DATABASE_FILE));
            info!(?path, "Database path determined");
            DbConfig::new(path)
        };

        let db = Database::new(db_config).await?;
        info!("Database connected and migrations applied");

        let store_id = local.store_scope();
        let gateway: Arc<dyn CashGateway> = Arc::new(db.cash_gateway(store_id.as_str()));
        let cash = CashState::load(gateway, local.clone(), config.cash.clone()).await?;
        info!(store_id = %store_id, "Register ready");

        Ok(Register {
            config,
            local,
            cash,
            db,
        })
    }

    pub async fn shutdown(self) {
        self.db.close().await;
    }
}

/// Initializes the tracing subscriber for structured logging.
///
/// Logs go to stderr so stdout stays pure JSON.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=posgo=trace` - Show trace for posgo crates only
/// - Default: `info,posgo=debug,sqlx=warn`
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,posgo=debug,sqlx=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Determines the data directory based on the platform.
///
/// ## Platform-Specific Paths
/// - **macOS**: `~/Library/Application Support/com.posgo.register/`
/// - **Windows**: `%APPDATA%\posgo\register\data\`
/// - **Linux**: `~/.local/share/register/`
///
/// ## Development Override
/// Set `POSGO_DATA_DIR` to use a custom directory.
pub fn data_dir() -> Result<PathBuf, ApiError> {
    let dir = match std::env::var_os("POSGO_DATA_DIR") {
        Some(dir) => PathBuf::from(dir),
        None => ProjectDirs::from("com", "posgo", "register")
            .ok_or_else(|| ApiError::internal("Could not determine app data directory"))?
            .data_dir()
            .to_path_buf(),
    };

    std::fs::create_dir_all(&dir).map_err(|e| {
        ApiError::internal(format!("Could not create {}: {}", dir.display(), e))
    })?;

    Ok(dir)
}

/// The session store inside `data_dir`.
pub fn local_store(data_dir: &Path) -> LocalStore {
    LocalStore::new(data_dir.join(SESSION_FILE))
}
