//! # Error Types
//!
//! Domain-specific error types for posgo-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  posgo-core errors (this file)                                          │
//! │  ├── CoreError        - Shift lifecycle and ledger rule violations      │
//! │  └── ValidationError  - Amount / description input failures             │
//! │                                                                         │
//! │  posgo-db errors (separate crate)                                       │
//! │  └── DbError          - Persistence gateway failures                    │
//! │                                                                         │
//! │  Register errors (in app)                                               │
//! │  └── ApiError         - What the cashier sees (serialized)              │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → ApiError → User                    │
//! │        DbError ──────────────────────► ApiError → User                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every error in this file is raised BEFORE any I/O happens: a failed
//! transition never produces records, so there is nothing to undo.

use thiserror::Error;

use crate::money::Money;
use crate::types::MovementType;

// =============================================================================
// Core Error
// =============================================================================

/// Cash-ledger business rule violations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// An OPEN was requested while the store already has an open shift.
    ///
    /// ## User Workflow
    /// ```text
    /// Cashier A opens the drawer ──► shift 7f3a… OPEN
    /// Cashier B presses "Apertura"
    ///      │
    ///      ▼
    /// ShiftAlreadyOpen { shift_id: "7f3a…" }
    ///      │
    ///      ▼
    /// UI: "Ya hay una caja abierta"
    /// ```
    #[error("A shift is already open: {shift_id}")]
    ShiftAlreadyOpen { shift_id: String },

    /// CLOSE / IN / OUT requested with no open shift.
    #[error("No active shift: cannot record {action}")]
    NoActiveShift { action: MovementType },

    /// A closed shift was handed to an operation that would change it.
    #[error("Shift {shift_id} is closed and cannot be modified")]
    ShiftClosed { shift_id: String },

    /// A movement with the same id is already in the ledger.
    #[error("Movement {movement_id} is already recorded")]
    DuplicateMovement { movement_id: String },

    /// A cash-out would leave the drawer below zero and the store forbids it.
    #[error("Cash out of {requested} exceeds the {available} in the drawer")]
    NegativeDrawer { available: Money, requested: Money },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when cashier input doesn't meet requirements.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    Negative { field: String },

    /// NaN, infinity, or a value too large to hold as money.
    #[error("{field} must be a finite amount")]
    NotFinite { field: String },

    /// Invalid format (e.g., "12,5abc" typed in an amount box).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::NoActiveShift {
            action: MovementType::Out,
        };
        assert_eq!(err.to_string(), "No active shift: cannot record OUT");

        let err = CoreError::NegativeDrawer {
            available: Money::from_cents(1000),
            requested: Money::from_cents(2500),
        };
        assert_eq!(
            err.to_string(),
            "Cash out of 25.00 exceeds the 10.00 in the drawer"
        );
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "amount".to_string(),
        };
        assert_eq!(err.to_string(), "amount is required");

        let err = ValidationError::Negative {
            field: "amount".to_string(),
        };
        assert_eq!(err.to_string(), "amount must not be negative");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::NotFinite {
            field: "amount".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
