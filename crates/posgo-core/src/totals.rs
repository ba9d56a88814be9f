//! # Totals Calculator
//!
//! Derives the running cash and digital figures of a shift from its records.
//!
//! ## Algorithm
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  compute_totals(shift, movements, transactions)                         │
//! │                                                                         │
//! │  start   = shift.startAmount                                            │
//! │  cash    = start                                                        │
//! │  digital = 0                                                            │
//! │                                                                         │
//! │  for t in transactions where t.shiftId == shift.id                      │
//! │      split  → each line to cash or digital by its method                │
//! │      single → t.total to cash or digital by t.paymentMethod             │
//! │                                                                         │
//! │  for m in movements where m.shiftId == shift.id                         │
//! │      IN  → cash += amount                                               │
//! │      OUT → cash -= amount                                               │
//! │      OPEN / CLOSE → audit only, no delta                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Pure summation: iteration order never changes the result, and the same
//! inputs always give the same output. Overflow degrades to the zero result
//! instead of panicking.

use serde::Serialize;

use crate::money::Money;
use crate::types::{CashMovement, CashShift, MovementType, Tender, Transaction};

/// Running figures of one shift.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ShiftTotals {
    /// Expected cash in the drawer.
    pub cash: Money,
    /// Sales settled by any non-cash method.
    pub digital: Money,
    /// Opening float.
    pub start: Money,
}

impl ShiftTotals {
    /// The all-zero result (no shift, or a computation that could not finish).
    #[inline]
    pub const fn zero() -> Self {
        ShiftTotals {
            cash: Money::zero(),
            digital: Money::zero(),
            start: Money::zero(),
        }
    }
}

/// Computes a shift's totals, degrading to zero on any arithmetic failure.
///
/// `movements` and `transactions` are the full, unfiltered store lists; only
/// records whose `shiftId` matches are counted.
///
/// ## Example
/// ```rust
/// use posgo_core::totals::{compute_totals, ShiftTotals};
///
/// assert_eq!(compute_totals(None, &[], &[]), ShiftTotals::zero());
/// ```
pub fn compute_totals(
    shift: Option<&CashShift>,
    movements: &[CashMovement],
    transactions: &[Transaction],
) -> ShiftTotals {
    try_compute_totals(shift, movements, transactions).unwrap_or_else(ShiftTotals::zero)
}

/// Same as [`compute_totals`] but reports overflow as `None`, so callers that
/// log can tell "really zero" from "could not compute".
pub fn try_compute_totals(
    shift: Option<&CashShift>,
    movements: &[CashMovement],
    transactions: &[Transaction],
) -> Option<ShiftTotals> {
    let Some(shift) = shift else {
        return Some(ShiftTotals::zero());
    };

    let start = shift.start_amount;
    let mut cash = start;
    let mut digital = Money::zero();

    for transaction in transactions.iter().filter(|t| t.belongs_to(&shift.id)) {
        match transaction.tender() {
            Tender::Split(lines) => {
                for line in lines {
                    if line.method.is_cash() {
                        cash = cash.checked_add(line.amount)?;
                    } else {
                        digital = digital.checked_add(line.amount)?;
                    }
                }
            }
            Tender::Single { method, amount } => {
                if method.is_some_and(|m| m.is_cash()) {
                    cash = cash.checked_add(amount)?;
                } else {
                    digital = digital.checked_add(amount)?;
                }
            }
        }
    }

    for movement in movements.iter().filter(|m| m.shift_id == shift.id) {
        match movement.movement_type {
            MovementType::In => cash = cash.checked_add(movement.amount)?,
            MovementType::Out => cash = cash.checked_sub(movement.amount)?,
            MovementType::Open | MovementType::Close => {}
        }
    }

    Some(ShiftTotals {
        cash,
        digital,
        start,
    })
}

// =============================================================================
// Shift Summary
// =============================================================================

/// Totals plus the figures shown when reviewing a shift.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShiftSummary {
    pub shift_id: String,
    pub totals: ShiftTotals,
    /// Number of sales rung up in the shift.
    pub sales_count: usize,
    /// Sum of IN movements.
    pub cash_in: Money,
    /// Sum of OUT movements.
    pub cash_out: Money,
    /// Counted amount at close, if closed.
    pub counted: Option<Money>,
    /// `counted - totals.cash`; positive means the drawer is over.
    pub variance: Option<Money>,
}

/// Summarizes a shift for history and closing reports.
///
/// Sums that overflow fall back to zero, like [`compute_totals`].
pub fn summarize_shift(
    shift: &CashShift,
    movements: &[CashMovement],
    transactions: &[Transaction],
) -> ShiftSummary {
    let totals = compute_totals(Some(shift), movements, transactions);

    let movement_sum = |kind: MovementType| -> Money {
        movements
            .iter()
            .filter(|m| m.shift_id == shift.id && m.movement_type == kind)
            .try_fold(Money::zero(), |acc, m| acc.checked_add(m.amount))
            .unwrap_or_default()
    };

    let variance = shift
        .end_amount
        .and_then(|counted| counted.checked_sub(totals.cash));

    ShiftSummary {
        shift_id: shift.id.clone(),
        totals,
        sales_count: transactions
            .iter()
            .filter(|t| t.belongs_to(&shift.id))
            .count(),
        cash_in: movement_sum(MovementType::In),
        cash_out: movement_sum(MovementType::Out),
        counted: shift.end_amount,
        variance,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
