//! # Movement Ledger
//!
//! Append-only log of cash movements. There is no remove or update: a wrong
//! movement is corrected by appending a compensating one.
//!
//! ## Display Order
//! ```text
//! appended:  m1 09:00   m2 09:05   m3 09:05   m4 09:10
//!
//! recent_for_shift(s, 3)
//!   ──► m4 09:10
//!       m2 09:05   ┐ same timestamp: insertion order kept
//!       m3 09:05   ┘ (stable sort)
//! ```

use std::collections::HashSet;

use serde::Serialize;

use crate::error::{CoreError, CoreResult};
use crate::types::{CashMovement, CashShift, MovementType, ShiftStatus};

/// Append-only movement log for one store.
#[derive(Debug, Clone, Default)]
pub struct MovementLedger {
    entries: Vec<CashMovement>,
    ids: HashSet<String>,
}

impl MovementLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a ledger from records in insertion order.
    pub fn from_records<I>(records: I) -> CoreResult<Self>
    where
        I: IntoIterator<Item = CashMovement>,
    {
        let mut ledger = Self::new();
        for movement in records {
            ledger.append(movement)?;
        }
        Ok(ledger)
    }

    /// Appends a movement.
    ///
    /// ## Errors
    /// `DuplicateMovement` if a movement with the same id is already present.
    pub fn append(&mut self, movement: CashMovement) -> CoreResult<()> {
        if !self.ids.insert(movement.id.clone()) {
            return Err(CoreError::DuplicateMovement {
                movement_id: movement.id,
            });
        }
        self.entries.push(movement);
        Ok(())
    }

    /// Movements of one shift, in insertion order.
    pub fn for_shift<'a>(&'a self, shift_id: &'a str) -> impl Iterator<Item = &'a CashMovement> {
        self.entries.iter().filter(move |m| m.shift_id == shift_id)
    }

    /// The newest `limit` movements of a shift, newest first.
    pub fn recent_for_shift(&self, shift_id: &str, limit: usize) -> Vec<&CashMovement> {
        let mut movements: Vec<&CashMovement> = self
            .entries
            .iter()
            .filter(|m| m.shift_id == shift_id)
            .collect();
        // sort_by is stable
        movements.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        movements.truncate(limit);
        movements
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CashMovement> {
        self.entries.iter()
    }

    pub fn as_slice(&self) -> &[CashMovement] {
        &self.entries
    }

    pub fn contains(&self, movement_id: &str) -> bool {
        self.ids.contains(movement_id)
    }

    /// Checks a shift against its movements for the leftovers of a
    /// half-finished dual write.
    pub fn audit_shift(&self, shift: &CashShift) -> Vec<LedgerIssue> {
        let count = |kind: MovementType| {
            self.for_shift(&shift.id)
                .filter(|m| m.movement_type == kind)
                .count()
        };
        let opens = count(MovementType::Open);
        let closes = count(MovementType::Close);

        let mut issues = Vec::new();

        match opens {
            0 => issues.push(LedgerIssue::MissingOpen),
            1 => {}
            n => issues.push(LedgerIssue::DuplicateOpen { count: n }),
        }

        match (shift.status, closes) {
            (ShiftStatus::Closed, 0) => issues.push(LedgerIssue::MissingClose),
            (ShiftStatus::Closed, 1) => {}
            (ShiftStatus::Closed, n) => issues.push(LedgerIssue::DuplicateClose { count: n }),
            (ShiftStatus::Open, 0) => {}
            (ShiftStatus::Open, n) => issues.push(LedgerIssue::CloseOnOpenShift { count: n }),
        }

        issues
    }
}

/// An inconsistency between a shift and its movements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "issue", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LedgerIssue {
    /// The shift has no OPEN movement.
    MissingOpen,
    DuplicateOpen { count: usize },
    /// The shift is CLOSED but no CLOSE movement was written.
    MissingClose,
    DuplicateClose { count: usize },
    /// A CLOSE movement exists but the shift is still OPEN.
    CloseOnOpenShift { count: usize },
}

impl std::fmt::Display for LedgerIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LedgerIssue::MissingOpen => write!(f, "shift has no OPEN movement"),
            LedgerIssue::DuplicateOpen { count } => {
                write!(f, "shift has {} OPEN movements", count)
            }
            LedgerIssue::MissingClose => write!(f, "closed shift has no CLOSE movement"),
            LedgerIssue::DuplicateClose { count } => {
                write!(f, "shift has {} CLOSE movements", count)
            }
            LedgerIssue::CloseOnOpenShift { count } => {
                write!(f, "open shift already has {} CLOSE movement(s)", count)
            }
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
