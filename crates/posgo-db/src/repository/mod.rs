//! # Repository Module
//!
//! SQL access for the three cash-ledger tables.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  SqliteGateway (CashGateway for one store)                             │
//! │       │                                                                 │
//! │       │  db.shifts().list(store_id)                                     │
//! │       ▼                                                                 │
//! │  ShiftRepository        list, get_by_id, find_open, upsert             │
//! │  MovementRepository     list, list_for_shift, insert, count            │
//! │  TransactionRepository  list, list_for_shift, insert, count            │
//! │       │                                                                 │
//! │       │  SQL Query (store_id scoped)                                    │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod movement;
pub mod shift;
pub mod transaction;
