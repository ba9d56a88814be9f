//! # Shift Lifecycle Manager
//!
//! Validates cash actions against the current shift state and builds the
//! records the coordinator persists. Nothing here performs I/O or reads the
//! clock; ids and "now" arrive in a [`TransitionContext`].
//!
//! ## State Machine
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │          OPEN(amount)                      CLOSE(amount)                │
//! │   NONE ───────────────────► OPEN ───────────────────────► CLOSED       │
//! │    │                         │ ▲                          (terminal)    │
//! │    │ IN / OUT / CLOSE        │ │ IN / OUT                               │
//! │    ▼                         └─┘                                        │
//! │  NoActiveShift                                                          │
//! │                             OPEN while OPEN ──► ShiftAlreadyOpen        │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Records Produced
//! ```text
//! ┌──────────┬──────────────────────────────────┬──────────────────────────┐
//! │ Action   │ Shift record                     │ Movement record          │
//! ├──────────┼──────────────────────────────────┼──────────────────────────┤
//! │ OPEN     │ new, status OPEN                 │ OPEN  "Apertura de caja" │
//! │ CLOSE    │ status CLOSED, endTime, endAmt   │ CLOSE "Cierre de caja"   │
//! │ IN       │ (none)                           │ IN    + description      │
//! │ OUT      │ (none)                           │ OUT   + description      │
//! └──────────┴──────────────────────────────────┴──────────────────────────┘
//! ```
//!
//! A transition is all-or-nothing: either every record is returned or an
//! error is, and a rejected action leaves the caller's state untouched.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{CashMovement, CashShift, MovementType, ShiftStatus};
use crate::validation::{require_amount, validate_amount, validate_description};
use crate::{CLOSE_MOVEMENT_DESCRIPTION, OPEN_MOVEMENT_DESCRIPTION};

// =============================================================================
// Shift State
// =============================================================================

/// Whether the store currently has a drawer open.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ShiftState<'a> {
    /// No open shift.
    None,
    /// The active shift.
    Open(&'a CashShift),
}

impl<'a> ShiftState<'a> {
    /// Resolves the state from the session's active-shift slot and the
    /// store's shift list.
    ///
    /// ## Resolution Order
    /// 1. The slot names a shift that is still OPEN → that shift
    /// 2. Otherwise any OPEN shift of the store (latest start wins)
    /// 3. Otherwise `None`
    ///
    /// Step 2 means a stale or empty slot cannot be used to open a second
    /// drawer while another terminal's shift is still open.
    pub fn resolve(shifts: &'a [CashShift], active_shift_id: Option<&str>) -> Self {
        let slotted = active_shift_id
            .and_then(|id| shifts.iter().find(|s| s.id == id))
            .filter(|s| s.is_open());

        let shift = slotted.or_else(|| {
            shifts
                .iter()
                .filter(|s| s.is_open())
                .max_by_key(|s| s.start_time)
        });

        match shift {
            Some(shift) => ShiftState::Open(shift),
            None => ShiftState::None,
        }
    }

    /// The active shift, if any.
    pub fn active(&self) -> Option<&'a CashShift> {
        match self {
            ShiftState::None => None,
            ShiftState::Open(shift) => Some(shift),
        }
    }
}

// =============================================================================
// Actions
// =============================================================================

/// A cashier action on the drawer.
///
/// Amounts are raw parsed input (see `validation::parse_amount_input`):
/// `None` means the amount box was left blank.
#[derive(Debug, Clone, PartialEq)]
pub enum CashAction {
    Open { amount: Option<f64> },
    /// A blank closing count is recorded as 0.
    Close { amount: Option<f64> },
    In {
        amount: Option<f64>,
        description: String,
    },
    Out {
        amount: Option<f64>,
        description: String,
    },
}

impl CashAction {
    /// Movement type this action records.
    pub fn movement_type(&self) -> MovementType {
        match self {
            CashAction::Open { .. } => MovementType::Open,
            CashAction::Close { .. } => MovementType::Close,
            CashAction::In { .. } => MovementType::In,
            CashAction::Out { .. } => MovementType::Out,
        }
    }
}

/// Ids and time injected into a transition.
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionContext {
    pub now: DateTime<Utc>,
    /// Used only when the action creates a shift.
    pub shift_id: String,
    pub movement_id: String,
}

impl TransitionContext {
    pub fn new(
        now: DateTime<Utc>,
        shift_id: impl Into<String>,
        movement_id: impl Into<String>,
    ) -> Self {
        TransitionContext {
            now,
            shift_id: shift_id.into(),
            movement_id: movement_id.into(),
        }
    }

    /// Fresh v4 ids and the current UTC time.
    pub fn generate() -> Self {
        TransitionContext {
            now: Utc::now(),
            shift_id: Uuid::new_v4().to_string(),
            movement_id: Uuid::new_v4().to_string(),
        }
    }
}

/// What the session's active-shift slot should become.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActiveShiftChange {
    Set(String),
    Clear,
    Unchanged,
}

/// Records produced by a valid action.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    /// New (OPEN) or updated (CLOSE) shift; `None` for IN/OUT.
    pub shift: Option<CashShift>,
    pub movement: CashMovement,
    pub active_shift: ActiveShiftChange,
}

impl Transition {
    /// Id of the shift this transition acts on.
    pub fn shift_id(&self) -> &str {
        &self.movement.shift_id
    }
}

// =============================================================================
// Apply
// =============================================================================

/// Validates `action` against `state` and returns the resulting records.
///
/// ## Errors
/// - `ShiftAlreadyOpen` - OPEN while a shift is open
/// - `NoActiveShift` - CLOSE / IN / OUT with no shift
/// - `ShiftClosed` - the state handed in holds a CLOSED shift
/// - `Validation` - missing, non-finite or negative amount, or an
///   over-long description
///
/// ## Example
/// ```rust
/// use posgo_core::shift::{apply, CashAction, ShiftState, TransitionContext};
///
/// let err = apply(
///     ShiftState::None,
///     &CashAction::Close { amount: Some(10.0) },
///     TransitionContext::generate(),
/// );
/// assert!(err.is_err());
/// ```
pub fn apply(
    state: ShiftState<'_>,
    action: &CashAction,
    ctx: TransitionContext,
) -> CoreResult<Transition> {
    match (state, action) {
        (ShiftState::Open(shift), CashAction::Open { .. }) => Err(CoreError::ShiftAlreadyOpen {
            shift_id: shift.id.clone(),
        }),
        (ShiftState::None, CashAction::Open { amount }) => open_shift(*amount, ctx),
        (ShiftState::None, other) => Err(CoreError::NoActiveShift {
            action: other.movement_type(),
        }),
        (ShiftState::Open(shift), _) if !shift.is_open() => Err(CoreError::ShiftClosed {
            shift_id: shift.id.clone(),
        }),
        (ShiftState::Open(shift), CashAction::Close { amount }) => close_shift(shift, *amount, ctx),
        (ShiftState::Open(shift), CashAction::In { amount, description }) => {
            manual_movement(shift, MovementType::In, *amount, description, ctx)
        }
        (ShiftState::Open(shift), CashAction::Out { amount, description }) => {
            manual_movement(shift, MovementType::Out, *amount, description, ctx)
        }
    }
}

fn open_shift(amount: Option<f64>, ctx: TransitionContext) -> CoreResult<Transition> {
    let amount = require_amount(amount, "amount")?;

    let shift = CashShift {
        id: ctx.shift_id,
        start_time: ctx.now,
        start_amount: amount,
        end_time: None,
        end_amount: None,
        status: ShiftStatus::Open,
        total_sales_cash: Money::zero(),
        total_sales_digital: Money::zero(),
    };

    let movement = CashMovement {
        id: ctx.movement_id,
        shift_id: shift.id.clone(),
        movement_type: MovementType::Open,
        amount,
        description: OPEN_MOVEMENT_DESCRIPTION.to_string(),
        timestamp: ctx.now,
    };

    Ok(Transition {
        active_shift: ActiveShiftChange::Set(shift.id.clone()),
        shift: Some(shift),
        movement,
    })
}

fn close_shift(
    shift: &CashShift,
    amount: Option<f64>,
    ctx: TransitionContext,
) -> CoreResult<Transition> {
    let amount = validate_amount(amount.unwrap_or(0.0), "amount")?;

    let closed = CashShift {
        end_time: Some(ctx.now),
        end_amount: Some(amount),
        status: ShiftStatus::Closed,
        ..shift.clone()
    };

    let movement = CashMovement {
        id: ctx.movement_id,
        shift_id: shift.id.clone(),
        movement_type: MovementType::Close,
        amount,
        description: CLOSE_MOVEMENT_DESCRIPTION.to_string(),
        timestamp: ctx.now,
    };

    Ok(Transition {
        shift: Some(closed),
        movement,
        active_shift: ActiveShiftChange::Clear,
    })
}

fn manual_movement(
    shift: &CashShift,
    movement_type: MovementType,
    amount: Option<f64>,
    description: &str,
    ctx: TransitionContext,
) -> CoreResult<Transition> {
    let amount = require_amount(amount, "amount")?;
    let description = validate_description(description)?;

    Ok(Transition {
        shift: None,
        movement: CashMovement {
            id: ctx.movement_id,
            shift_id: shift.id.clone(),
            movement_type,
            amount,
            description,
            timestamp: ctx.now,
        },
        active_shift: ActiveShiftChange::Unchanged,
    })
}

/// Refuses an OUT movement larger than the cash expected in the drawer.
///
/// Only consulted by stores that forbid a negative drawer; any other movement
/// passes.
pub fn ensure_drawer_covers(available: Money, movement: &CashMovement) -> CoreResult<()> {
    if movement.movement_type == MovementType::Out && movement.amount > available {
        return Err(CoreError::NegativeDrawer {
            available,
            requested: movement.amount,
        });
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationError;
    use chrono::TimeZone;

    fn ctx(minute: u32, n: u32) -> TransitionContext {
        TransitionContext::new(
            Utc.with_ymd_and_hms(2026, 3, 1, 9, minute, 0).unwrap(),
            format!("shift-{}", n),
            format!("move-{}", n),
        )
    }

    fn open(amount: f64) -> Transition {
        apply(
            ShiftState::None,
            &CashAction::Open {
                amount: Some(amount),
            },
            ctx(0, 1),
        )
        .unwrap()
    }

    #[test]
    fn test_open_builds_shift_and_movement() {
        let t = open(100.0);
        let shift = t.shift.clone().unwrap();

        assert_eq!(shift.id, "shift-1");
        assert_eq!(shift.status, ShiftStatus::Open);
        assert_eq!(shift.start_amount.cents(), 10_000);
        assert!(shift.end_time.is_none());

        assert_eq!(t.movement.movement_type, MovementType::Open);
        assert_eq!(t.movement.shift_id, "shift-1");
        assert_eq!(t.movement.amount, shift.start_amount);
        assert_eq!(t.movement.description, "Apertura de caja");
        assert_eq!(t.active_shift, ActiveShiftChange::Set("shift-1".into()));
    }

    #[test]
    fn test_open_with_empty_drawer() {
        let t = open(0.0);
        assert!(t.shift.unwrap().start_amount.is_zero());
    }

    #[test]
    fn test_open_requires_amount() {
        let err = apply(ShiftState::None, &CashAction::Open { amount: None }, ctx(0, 1))
            .unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::Required { .. })
        ));
    }

    #[test]
    fn test_reject_double_open() {
        let first = open(100.0);
        let shift = first.shift.unwrap();

        let err = apply(
            ShiftState::Open(&shift),
            &CashAction::Open { amount: Some(50.0) },
            ctx(5, 2),
        )
        .unwrap_err();

        match err {
            CoreError::ShiftAlreadyOpen { shift_id } => assert_eq!(shift_id, "shift-1"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_close_only_touches_closing_fields() {
        let shift = open(50.0).shift.unwrap();

        let t = apply(
            ShiftState::Open(&shift),
            &CashAction::Close { amount: Some(50.0) },
            ctx(30, 2),
        )
        .unwrap();
        let closed = t.shift.unwrap();

        assert_eq!(closed.id, shift.id);
        assert_eq!(closed.start_time, shift.start_time);
        assert_eq!(closed.start_amount, shift.start_amount);
        assert_eq!(closed.status, ShiftStatus::Closed);
        assert_eq!(closed.end_amount, Some(Money::from_cents(5000)));
        assert_eq!(closed.end_time, Some(t.movement.timestamp));

        assert_eq!(t.movement.movement_type, MovementType::Close);
        assert_eq!(t.movement.amount.cents(), 5000);
        assert_eq!(t.movement.description, "Cierre de caja");
        assert_eq!(t.active_shift, ActiveShiftChange::Clear);
    }

    #[test]
    fn test_close_blank_amount_falls_back_to_zero() {
        let shift = open(20.0).shift.unwrap();

        let t = apply(
            ShiftState::Open(&shift),
            &CashAction::Close { amount: None },
            ctx(30, 2),
        )
        .unwrap();

        assert_eq!(t.shift.unwrap().end_amount, Some(Money::zero()));
        assert!(t.movement.amount.is_zero());
    }

    #[test]
    fn test_actions_without_shift_are_rejected() {
        for action in [
            CashAction::Close { amount: Some(1.0) },
            CashAction::In {
                amount: Some(1.0),
                description: "cambio".into(),
            },
            CashAction::Out {
                amount: Some(1.0),
                description: "hielo".into(),
            },
        ] {
            let err = apply(ShiftState::None, &action, ctx(0, 1)).unwrap_err();
            assert!(matches!(err, CoreError::NoActiveShift { .. }));
        }
    }

    #[test]
    fn test_closed_shift_cannot_be_acted_on() {
        let mut shift = open(10.0).shift.unwrap();
        shift.status = ShiftStatus::Closed;

        let err = apply(
            ShiftState::Open(&shift),
            &CashAction::In {
                amount: Some(1.0),
                description: String::new(),
            },
            ctx(1, 2),
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::ShiftClosed { .. }));
    }

    #[test]
    fn test_manual_movements() {
        let shift = open(100.0).shift.unwrap();

        let t = apply(
            ShiftState::Open(&shift),
            &CashAction::Out {
                amount: Some(20.0),
                description: "  compra de hielo ".into(),
            },
            ctx(10, 2),
        )
        .unwrap();

        assert!(t.shift.is_none());
        assert_eq!(t.shift_id(), "shift-1");
        assert_eq!(t.movement.movement_type, MovementType::Out);
        assert_eq!(t.movement.amount.cents(), 2000);
        assert_eq!(t.movement.description, "compra de hielo");
        assert_eq!(t.active_shift, ActiveShiftChange::Unchanged);
    }

    #[test]
    fn test_manual_movement_rejects_bad_amounts() {
        let shift = open(100.0).shift.unwrap();

        for amount in [None, Some(f64::NAN), Some(-5.0)] {
            let result = apply(
                ShiftState::Open(&shift),
                &CashAction::In {
                    amount,
                    description: "cambio".into(),
                },
                ctx(10, 2),
            );
            assert!(matches!(result, Err(CoreError::Validation(_))));
        }
    }

    #[test]
    fn test_resolve_prefers_slot_then_any_open_shift() {
        let a = open(10.0).shift.unwrap();
        let mut b = apply(
            ShiftState::None,
            &CashAction::Open { amount: Some(5.0) },
            ctx(40, 2),
        )
        .unwrap()
        .shift
        .unwrap();
        b.status = ShiftStatus::Closed;
        let shifts = vec![b.clone(), a.clone()];

        assert_eq!(ShiftState::resolve(&shifts, Some("shift-1")).active(), Some(&a));
        // stale slot pointing at a closed shift still finds the open one
        assert_eq!(ShiftState::resolve(&shifts, Some("shift-2")).active(), Some(&a));
        assert_eq!(ShiftState::resolve(&shifts, None).active(), Some(&a));
        assert_eq!(ShiftState::resolve(&[b], None), ShiftState::None);
    }

    #[test]
    fn test_ensure_drawer_covers() {
        let shift = open(10.0).shift.unwrap();
        let out = apply(
            ShiftState::Open(&shift),
            &CashAction::Out {
                amount: Some(25.0),
                description: "retiro".into(),
            },
            ctx(10, 2),
        )
        .unwrap()
        .movement;

        assert!(ensure_drawer_covers(Money::from_cents(3000), &out).is_ok());
        assert!(matches!(
            ensure_drawer_covers(Money::from_cents(1000), &out),
            Err(CoreError::NegativeDrawer { .. })
        ));
    }
}
