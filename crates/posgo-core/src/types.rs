//! # Domain Types
//!
//! The three record kinds the cash ledger works with.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │   CashShift     │◄──│  CashMovement   │   │  Transaction    │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  id (UUID)      │       │
//! │  │  startAmount    │   │  shiftId (FK)   │   │  shiftId (FK) ──┼──►    │
//! │  │  endAmount?     │   │  type           │   │  total          │       │
//! │  │  status         │   │  amount         │   │  payments?      │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │  ShiftStatus    │   │  MovementType   │   │ PaymentMethod   │       │
//! │  │  OPEN           │   │  OPEN   CLOSE   │   │  cash           │       │
//! │  │  CLOSED         │   │  IN     OUT     │   │  card, yape, …  │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Wire Format
//! Field names are camelCase, timestamps ISO-8601, amounts decimal numbers.
//! Reading is lenient: a missing or malformed amount reads as zero and a
//! `payments` value that is not a list reads as absent.

use chrono::{DateTime, Utc};
use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

use crate::money::Money;

// =============================================================================
// Shift Status
// =============================================================================

/// Lifecycle status of a cash shift.
///
/// `Closed` is terminal: a closed shift is never modified again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "UPPERCASE"))]
#[serde(rename_all = "UPPERCASE")]
pub enum ShiftStatus {
    /// Drawer is open; sales and cash movements are allowed.
    Open,
    /// Drawer has been counted and closed.
    Closed,
}

impl fmt::Display for ShiftStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShiftStatus::Open => write!(f, "OPEN"),
            ShiftStatus::Closed => write!(f, "CLOSED"),
        }
    }
}

// =============================================================================
// Movement Type
// =============================================================================

/// Kind of a cash movement.
///
/// `Open` and `Close` are audit records of the counted float; only `In` and
/// `Out` change the expected drawer balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "UPPERCASE"))]
#[serde(rename_all = "UPPERCASE")]
pub enum MovementType {
    /// Opening float counted into the drawer.
    Open,
    /// Closing count.
    Close,
    /// Manual cash added to the drawer.
    In,
    /// Manual cash taken out of the drawer (expenses, withdrawals).
    Out,
}

impl fmt::Display for MovementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MovementType::Open => write!(f, "OPEN"),
            MovementType::Close => write!(f, "CLOSE"),
            MovementType::In => write!(f, "IN"),
            MovementType::Out => write!(f, "OUT"),
        }
    }
}

// =============================================================================
// Payment Method
// =============================================================================

/// How a sale (or one part of a split sale) was paid.
///
/// Only `Cash` lands in the drawer; every other method counts as digital.
/// Methods this build does not know are kept verbatim in `Other` so records
/// survive a read/write cycle unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PaymentMethod {
    /// Physical cash.
    Cash,
    /// Card on an external terminal.
    Card,
    /// Yape wallet transfer.
    Yape,
    /// Plin wallet transfer.
    Plin,
    /// Bank transfer.
    Transfer,
    /// Any other method name.
    Other(String),
}

impl PaymentMethod {
    /// Returns the wire name of the method.
    pub fn as_str(&self) -> &str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Card => "card",
            PaymentMethod::Yape => "yape",
            PaymentMethod::Plin => "plin",
            PaymentMethod::Transfer => "transfer",
            PaymentMethod::Other(name) => name,
        }
    }

    /// True for the only method that moves physical money into the drawer.
    #[inline]
    pub fn is_cash(&self) -> bool {
        matches!(self, PaymentMethod::Cash)
    }
}

impl From<String> for PaymentMethod {
    fn from(name: String) -> Self {
        match name.as_str() {
            "cash" => PaymentMethod::Cash,
            "card" => PaymentMethod::Card,
            "yape" => PaymentMethod::Yape,
            "plin" => PaymentMethod::Plin,
            "transfer" => PaymentMethod::Transfer,
            _ => PaymentMethod::Other(name),
        }
    }
}

impl From<&str> for PaymentMethod {
    fn from(name: &str) -> Self {
        PaymentMethod::from(name.to_string())
    }
}

impl From<PaymentMethod> for String {
    fn from(method: PaymentMethod) -> Self {
        match method {
            PaymentMethod::Other(name) => name,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Cash Shift
// =============================================================================

/// A bounded working session of the drawer.
///
/// ## Lifecycle
/// Created once on OPEN, mutated once on CLOSE (status, end time, end
/// amount), never deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CashShift {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// When the drawer was opened.
    pub start_time: DateTime<Utc>,

    /// Float counted into the drawer at open.
    #[serde(default)]
    pub start_amount: Money,

    /// When the drawer was closed. Absent while open.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,

    /// Counted amount at close. Absent while open.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_amount: Option<Money>,

    pub status: ShiftStatus,

    /// Cached aggregate; the source of truth is `compute_totals`.
    #[serde(default)]
    pub total_sales_cash: Money,

    /// Cached aggregate; the source of truth is `compute_totals`.
    #[serde(default)]
    pub total_sales_digital: Money,
}

impl CashShift {
    /// Returns true while the shift accepts sales and movements.
    #[inline]
    pub fn is_open(&self) -> bool {
        self.status == ShiftStatus::Open
    }
}

// =============================================================================
// Cash Movement
// =============================================================================

/// A discrete, append-only cash event within a shift.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CashMovement {
    pub id: String,

    /// Owning shift.
    pub shift_id: String,

    #[serde(rename = "type")]
    pub movement_type: MovementType,

    /// Always non-negative; OUT is subtracted by the calculator.
    #[serde(default)]
    pub amount: Money,

    #[serde(default)]
    pub description: String,

    pub timestamp: DateTime<Utc>,
}

// =============================================================================
// Transaction
// =============================================================================

/// One line of a sold cart (read-only here).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    /// Product id.
    #[serde(default)]
    pub id: String,

    #[serde(default)]
    pub name: String,

    /// Unit price at time of sale (frozen).
    #[serde(default)]
    pub price: Money,

    #[serde(default = "default_quantity", deserialize_with = "lenient_quantity")]
    pub quantity: i64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_variant_id: Option<String>,
}

fn default_quantity() -> i64 {
    1
}

impl CartLine {
    /// Unit price × quantity.
    pub fn line_total(&self) -> Money {
        Money::from_cents(self.price.cents().saturating_mul(self.quantity))
    }
}

/// One part of a split payment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentLine {
    pub method: PaymentMethod,

    #[serde(default)]
    pub amount: Money,
}

/// A completed sale, produced by checkout and read-only to the cash ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: String,

    pub date: DateTime<Utc>,

    #[serde(default, deserialize_with = "lenient_list")]
    pub items: Vec<CartLine>,

    #[serde(default)]
    pub subtotal: Money,

    #[serde(default)]
    pub tax: Money,

    #[serde(default)]
    pub discount: Money,

    #[serde(default)]
    pub total: Money,

    /// Single payment method (used when `payments` is absent).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<PaymentMethod>,

    /// Split payments. Takes precedence over `payment_method` when present.
    #[serde(
        default,
        deserialize_with = "lenient_optional_list",
        skip_serializing_if = "Option::is_none"
    )]
    pub payments: Option<Vec<PaymentLine>>,

    /// Shift that was open when the sale happened.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shift_id: Option<String>,
}

/// How a transaction was settled, resolved once instead of probing fields.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Tender<'a> {
    /// The whole total was paid with one method (or none was recorded).
    Single {
        method: Option<&'a PaymentMethod>,
        amount: Money,
    },
    /// Several payment lines, each with its own method.
    Split(&'a [PaymentLine]),
}

impl Transaction {
    /// Returns the settlement shape of this transaction.
    ///
    /// A present `payments` list always wins, even when empty.
    pub fn tender(&self) -> Tender<'_> {
        match &self.payments {
            Some(lines) => Tender::Split(lines),
            None => Tender::Single {
                method: self.payment_method.as_ref(),
                amount: self.total,
            },
        }
    }

    /// True when this sale was rung up during the given shift.
    #[inline]
    pub fn belongs_to(&self, shift_id: &str) -> bool {
        self.shift_id.as_deref() == Some(shift_id)
    }
}

/// Settlement chosen at checkout, used to build a new `Transaction`.
#[derive(Debug, Clone, PartialEq)]
pub enum Settlement {
    Single(PaymentMethod),
    Split(Vec<PaymentLine>),
}

// =============================================================================
// Lenient Deserializers
// =============================================================================

#[derive(Deserialize)]
#[serde(untagged)]
enum MaybeList<T> {
    List(Vec<T>),
    Other(IgnoredAny),
}

/// A list, or empty when the stored value is not a list of `T`.
fn lenient_list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(match MaybeList::deserialize(deserializer)? {
        MaybeList::List(items) => items,
        MaybeList::Other(_) => Vec::new(),
    })
}

/// `Some(list)`, or `None` when the stored value is not a list of `T`.
fn lenient_optional_list<'de, D, T>(deserializer: D) -> Result<Option<Vec<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(match MaybeList::deserialize(deserializer)? {
        MaybeList::List(items) => Some(items),
        MaybeList::Other(_) => None,
    })
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawQuantity {
    Number(f64),
    Other(IgnoredAny),
}

fn lenient_quantity<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    Ok(match RawQuantity::deserialize(deserializer)? {
        RawQuantity::Number(n) if n.is_finite() => n.round() as i64,
        _ => default_quantity(),
    })
}

// =============================================================================
// Unit Tests
// =============================================================================
