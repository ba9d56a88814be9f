//! # posgo-core: Pure Cash-Ledger Logic for PosGo
//!
//! This crate is the **heart** of the PosGo register. It holds the cash-shift
//! rules as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        PosGo Register Architecture                      │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    posgo CLI (clap)                             │   │
//! │  │    open ──► cash-in / cash-out ──► sell ──► close ──► report   │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    CashState coordinator                        │   │
//! │  │    optimistic update, dual write, refresh                       │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ posgo-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │  totals   │  │   shift   │  │  ledger   │  │   │
//! │  │   │ CashShift │  │  cash /   │  │ OPEN/IN/  │  │ append-   │  │   │
//! │  │   │ Movement  │  │  digital  │  │ OUT/CLOSE │  │  only     │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO CLOCK READS IN RULES               │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    posgo-db (Persistence Gateway)               │   │
//! │  │              SQLite tables, migrations, CashGateway             │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Shift, movement and transaction records
//! - [`money`] - Money type with integer cents
//! - [`totals`] - Cash / digital totals of a shift
//! - [`shift`] - Shift lifecycle transitions
//! - [`ledger`] - Append-only movement ledger
//! - [`validation`] - Cashier input checks
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use posgo_core::shift::{apply, CashAction, ShiftState, TransitionContext};
//! use posgo_core::totals::compute_totals;
//!
//! let opened = apply(
//!     ShiftState::None,
//!     &CashAction::Open { amount: Some(100.0) },
//!     TransitionContext::generate(),
//! )
//! .unwrap();
//!
//! let shift = opened.shift.unwrap();
//! let totals = compute_totals(Some(&shift), &[opened.movement], &[]);
//! assert_eq!(totals.cash.cents(), 10_000);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod ledger;
pub mod money;
pub mod shift;
pub mod totals;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Store id used by demo sessions.
///
/// Demo users never see a real store's data; everything they do is scoped to
/// this template store.
pub const DEMO_TEMPLATE_ID: &str = "00000000-0000-0000-0000-000000000000";

/// Description stamped on the movement written by OPEN.
pub const OPEN_MOVEMENT_DESCRIPTION: &str = "Apertura de caja";

/// Description stamped on the movement written by CLOSE.
pub const CLOSE_MOVEMENT_DESCRIPTION: &str = "Cierre de caja";

/// Maximum length of a movement description, in characters.
pub const MAX_DESCRIPTION_LEN: usize = 200;
