//! # State Module
//!
//! Manages the register's state.
//!
//! Instead of one `AppState` struct, the register keeps separate state
//! types; each command takes only what it needs.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    State Architecture                                   │
//! │                                                                         │
//! │  ┌──────────────────┐  ┌──────────────────┐  ┌──────────────────────┐  │
//! │  │   CashState      │  │   LocalStore     │  │   RegisterConfig     │  │
//! │  │                  │  │                  │  │                      │  │
//! │  │  Mutex<Working   │  │  session.json    │  │  store, currency,    │  │
//! │  │    Copy>         │  │  • session       │  │  cash, database      │  │
//! │  │  Arc<dyn Cash    │  │  • active shift  │  │                      │  │
//! │  │    Gateway>      │  │    slot          │  │                      │  │
//! │  └──────────────────┘  └──────────────────┘  └──────────────────────┘  │
//! │                                                                         │
//! │  THREAD SAFETY:                                                        │
//! │  • CashState: tokio Mutex, held across the whole cash action           │
//! │  • LocalStore: synchronous file reads and atomic rewrites              │
//! │  • RegisterConfig: read-only after loading                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

mod cash;
mod config;
mod session;

pub use cash::{CashState, RegisterStatus, ShiftAudit, WorkingCopy};
pub use config::{
    CashSettings, ConfigError, ConsistencyMode, CurrencySettings, DatabaseSettings,
    RegisterConfig, StoreSettings,
};
pub use session::{
    store_scope, LocalStore, Session, SessionError, DEMO_EMAIL_DOMAIN, DEMO_USER_ID,
};
