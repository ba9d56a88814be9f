//! # posgo-db: Persistence Gateway for PosGo
//!
//! This crate stores shifts, movements and transactions. It uses SQLite for
//! local storage with sqlx for async operations, and also ships an in-memory
//! gateway with the same rules for tests.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        PosGo Data Flow                                  │
//! │                                                                         │
//! │  CashState::perform(Close { amount })                                   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     posgo-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │  CashGateway  │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │ (gateway.rs)  │    │               │    │  (embedded)  │  │   │
//! │  │   │               │    │ ShiftRepo     │    │              │  │   │
//! │  │   │ SqliteGateway │───►│ MovementRepo  │    │ 001_cash_    │  │   │
//! │  │   │ MemoryGateway │    │ Transaction   │    │   ledger.sql │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database                             │   │
//! │  │   <data dir>/posgo.db                                           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Table access (shift, movement, transaction)
//! - [`gateway`] - The store-scoped `CashGateway`
//!
//! ## Usage
//!
//! ```rust,ignore
//! use posgo_db::{CashGateway, Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("path/to/posgo.db")).await?;
//! let gateway = db.cash_gateway("store-1");
//! let shifts = gateway.get_shifts().await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod gateway;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use gateway::{CashGateway, MemoryGateway, SqliteGateway};
pub use pool::{Database, DbConfig, DbLocation};

pub use repository::movement::MovementRepository;
pub use repository::shift::ShiftRepository;
pub use repository::transaction::TransactionRepository;
