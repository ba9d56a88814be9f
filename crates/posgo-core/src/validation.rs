//! # Validation Module
//!
//! Input validation for the cash form.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Command input                                                 │
//! │  └── parse_amount_input: "" / "12.50" / "abc"                          │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Shift lifecycle (THIS MODULE + shift.rs)                      │
//! │  ├── validate_amount: finite, non-negative, fits in Money              │
//! │  └── validate_description: trimmed, bounded                            │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── one OPEN shift per store (partial unique index)                   │
//! │  └── append-only movements (triggers)                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use posgo_core::validation::{parse_amount_input, validate_amount};
//!
//! let typed = parse_amount_input("12.50", "amount").unwrap();
//! assert_eq!(typed, Some(12.5));
//!
//! let money = validate_amount(12.5, "amount").unwrap();
//! assert_eq!(money.cents(), 1250);
//! ```

use crate::error::ValidationError;
use crate::money::Money;
use crate::MAX_DESCRIPTION_LEN;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Amount Validators
// =============================================================================

/// Parses what the cashier typed in an amount box.
///
/// ## Rules
/// - Blank (after trimming) → `Ok(None)`; the caller decides whether a blank
///   amount is acceptable for its action
/// - A decimal comma is accepted ("12,50")
/// - Anything else that is not a number → `InvalidFormat`
///
/// ## Example
/// ```rust
/// use posgo_core::validation::parse_amount_input;
///
/// assert_eq!(parse_amount_input("", "amount").unwrap(), None);
/// assert_eq!(parse_amount_input("0", "amount").unwrap(), Some(0.0));
/// assert!(parse_amount_input("doce", "amount").is_err());
/// ```
pub fn parse_amount_input(raw: &str, field: &str) -> ValidationResult<Option<f64>> {
    let raw = raw.trim();

    if raw.is_empty() {
        return Ok(None);
    }

    let normalized = raw.replace(',', ".");
    normalized
        .parse::<f64>()
        .map(Some)
        .map_err(|_| ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: format!("'{}' is not a number", raw),
        })
}

/// Validates a cash amount and converts it to Money.
///
/// ## Rules
/// - Must be finite (no NaN / infinity)
/// - Must be non-negative; OUT movements are subtracted by the calculator,
///   never stored as negative amounts
/// - Must fit in Money
///
/// ## Example
/// ```rust
/// use posgo_core::validation::validate_amount;
///
/// assert!(validate_amount(0.0, "amount").is_ok());
/// assert!(validate_amount(-1.0, "amount").is_err());
/// assert!(validate_amount(f64::NAN, "amount").is_err());
/// ```
pub fn validate_amount(value: f64, field: &str) -> ValidationResult<Money> {
    if !value.is_finite() {
        return Err(ValidationError::NotFinite {
            field: field.to_string(),
        });
    }

    if value < 0.0 {
        return Err(ValidationError::Negative {
            field: field.to_string(),
        });
    }

    Money::from_decimal(value).ok_or_else(|| ValidationError::NotFinite {
        field: field.to_string(),
    })
}

/// Validates a required amount: blank input is an error.
pub fn require_amount(value: Option<f64>, field: &str) -> ValidationResult<Money> {
    match value {
        Some(v) => validate_amount(v, field),
        None => Err(ValidationError::Required {
            field: field.to_string(),
        }),
    }
}

// =============================================================================
// String Validators
// =============================================================================

/// Validates a movement description.
///
/// ## Rules
/// - Trimmed
/// - May be empty (recommended, not enforced, for IN/OUT)
/// - At most `MAX_DESCRIPTION_LEN` characters
///
/// ## Returns
/// The trimmed description.
pub fn validate_description(description: &str) -> ValidationResult<String> {
    let description = description.trim();

    if description.chars().count() > MAX_DESCRIPTION_LEN {
        return Err(ValidationError::TooLong {
            field: "description".to_string(),
            max: MAX_DESCRIPTION_LEN,
        });
    }

    Ok(description.to_string())
}

// =============================================================================
// UUID Validators
// =============================================================================

/// Validates a UUID string format.
///
/// ## Example
/// ```rust
/// use posgo_core::validation::validate_uuid;
///
/// assert!(validate_uuid("550e8400-e29b-41d4-a716-446655440000").is_ok());
/// assert!(validate_uuid("not-a-uuid").is_err());
/// ```
pub fn validate_uuid(id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "id".to_string(),
        });
    }

    uuid::Uuid::parse_str(id).map_err(|_| ValidationError::InvalidFormat {
        field: "id".to_string(),
        reason: "must be a valid UUID".to_string(),
    })?;

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_amount_input() {
        assert_eq!(parse_amount_input("  ", "amount").unwrap(), None);
        assert_eq!(parse_amount_input("100", "amount").unwrap(), Some(100.0));
        assert_eq!(parse_amount_input("12,50", "amount").unwrap(), Some(12.5));
        assert_eq!(parse_amount_input(" 7.25 ", "amount").unwrap(), Some(7.25));

        let err = parse_amount_input("12abc", "amount").unwrap_err();
        assert!(matches!(err, ValidationError::InvalidFormat { .. }));
    }

    #[test]
    fn test_parse_amount_input_passes_non_finite_through() {
        // "inf" parses; rejecting it is validate_amount's job
        let parsed = parse_amount_input("inf", "amount").unwrap().unwrap();
        assert!(validate_amount(parsed, "amount").is_err());
    }

    #[test]
    fn test_validate_amount() {
        assert_eq!(validate_amount(0.0, "amount").unwrap(), Money::zero());
        assert_eq!(validate_amount(20.0, "amount").unwrap().cents(), 2000);

        assert_eq!(
            validate_amount(-0.01, "amount").unwrap_err(),
            ValidationError::Negative {
                field: "amount".to_string()
            }
        );
        assert!(matches!(
            validate_amount(f64::INFINITY, "amount"),
            Err(ValidationError::NotFinite { .. })
        ));
        assert!(validate_amount(1e300, "amount").is_err());
    }

    #[test]
    fn test_require_amount() {
        assert!(require_amount(None, "amount").is_err());
        assert_eq!(require_amount(Some(5.0), "amount").unwrap().cents(), 500);
    }

    #[test]
    fn test_validate_description() {
        assert_eq!(
            validate_description("  compra de hielo ").unwrap(),
            "compra de hielo"
        );
        assert_eq!(validate_description("").unwrap(), "");
        assert!(validate_description(&"x".repeat(MAX_DESCRIPTION_LEN + 1)).is_err());
    }

    #[test]
    fn test_validate_uuid() {
        assert!(validate_uuid("550e8400-e29b-41d4-a716-446655440000").is_ok());
        assert!(validate_uuid("").is_err());
        assert!(validate_uuid("123").is_err());
    }
}
