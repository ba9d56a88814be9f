//! # Commands Module
//!
//! Everything the `posgo` binary can ask the register to do.
//!
//! ## Command Organization
//! ```text
//! commands/
//! ├── mod.rs      ◄─── You are here (exports)
//! ├── cash.rs     ◄─── Open/close, cash in/out, status, history, audit
//! ├── sale.rs     ◄─── Ring up a sale on the open shift
//! └── session.rs  ◄─── Login, logout, store scope
//! ```
//!
//! ## How Commands Work
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Command Flow                                         │
//! │                                                                         │
//! │  $ posgo cash-out 20 "compra de hielo"                                  │
//! │         │                                                               │
//! │         │ (clap parses argv)                                            │
//! │         ▼                                                               │
//! │  commands::cash::cash_out(                                              │
//! │      &cash_state,             ◄── Built once in main                   │
//! │      "20",                    ◄── Raw amount text                      │
//! │      "compra de hielo",                                                 │
//! │  ) -> Result<CashActionResponse, ApiError>                              │
//! │         │                                                               │
//! │         │ (JSON serialization)                                          │
//! │         ▼                                                               │
//! │  stdout: {"shiftId": "...", "type": "OUT", "amount": 20.0, ...}         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each command takes only the state it needs: session commands work on the
//! `LocalStore` alone and never touch the database.

pub mod cash;
pub mod sale;
pub mod session;
