//! # Cash State
//!
//! The register's working copy of shifts, movements and sales, and the one
//! place cash actions are carried out.
//!
//! ## Action Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  perform(action)                                                        │
//! │                                                                         │
//! │  1. lock working copy ◄── serialization point for this terminal         │
//! │  2. ShiftState::resolve(shifts, active slot)                            │
//! │  3. shift::apply(state, action)  ──► Err? return, nothing changed       │
//! │  4. drawer check (allow_negative_drawer = false only)                   │
//! │  5. apply records to the working copy + active slot (optimistic)        │
//! │  6. gateway.commit_transition(shift, movement)                          │
//! │       └─ Err + strict ──► restore the step-5 snapshot                   │
//! │  7. reload everything from the gateway, success or not                  │
//! │  8. surface the write error, if any                                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! In optimistic mode a failed write leaves step 5 in place and relies on the
//! reload to reconcile. If the reload fails too, the working copy keeps the
//! unconfirmed records until the next successful refresh.
//!
//! The `Mutex` only serializes actions on one terminal. Two terminals on the
//! same store are kept to one open shift by the store itself (unique index in
//! SQLite, the same check in `MemoryGateway`).

use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::config::{CashSettings, ConsistencyMode};
use crate::state::session::LocalStore;
use posgo_core::ledger::{LedgerIssue, MovementLedger};
use posgo_core::shift::{
    apply, ensure_drawer_covers, ActiveShiftChange, CashAction, ShiftState, Transition,
    TransitionContext,
};
use posgo_core::totals::{compute_totals, summarize_shift, ShiftSummary, ShiftTotals};
use posgo_core::{
    CartLine, CashMovement, CashShift, Money, PaymentMethod, Settlement, ShiftStatus,
    Transaction,
};
use posgo_db::CashGateway;

// =============================================================================
// Working Copy
// =============================================================================

/// Local cache of the store's records, newest first like the gateway.
#[derive(Debug, Clone, Default)]
pub struct WorkingCopy {
    pub shifts: Vec<CashShift>,
    pub movements: Vec<CashMovement>,
    pub transactions: Vec<Transaction>,
    pub active_shift_id: Option<String>,
}

impl WorkingCopy {
    fn state(&self) -> ShiftState<'_> {
        ShiftState::resolve(&self.shifts, self.active_shift_id.as_deref())
    }

    fn apply_transition(&mut self, transition: &Transition) {
        if let Some(shift) = &transition.shift {
            match self.shifts.iter_mut().find(|s| s.id == shift.id) {
                Some(existing) => *existing = shift.clone(),
                None => self.shifts.insert(0, shift.clone()),
            }
        }

        self.movements.insert(0, transition.movement.clone());

        match &transition.active_shift {
            ActiveShiftChange::Set(id) => self.active_shift_id = Some(id.clone()),
            ActiveShiftChange::Clear => self.active_shift_id = None,
            ActiveShiftChange::Unchanged => {}
        }
    }

    /// Movements in insertion order, as the ledger expects.
    fn ledger(&self) -> Result<MovementLedger, ApiError> {
        Ok(MovementLedger::from_records(
            self.movements.iter().rev().cloned(),
        )?)
    }
}

// =============================================================================
// Views
// =============================================================================

/// What the cash control screen shows.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterStatus {
    pub active_shift: Option<CashShift>,
    pub totals: ShiftTotals,
    /// Newest first, limited by `cash.recent_movements`.
    pub recent_movements: Vec<CashMovement>,
}

/// Ledger problems found on one shift.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShiftAudit {
    pub shift_id: String,
    pub status: ShiftStatus,
    pub issues: Vec<LedgerIssue>,
}

// =============================================================================
// Cash State
// =============================================================================

/// Coordinator between the cashier, the cash rules and the gateway.
pub struct CashState {
    gateway: Arc<dyn CashGateway>,
    local: LocalStore,
    settings: CashSettings,
    working: Mutex<WorkingCopy>,
}

impl CashState {
    /// Creates an empty coordinator. Call [`CashState::refresh`] to load.
    pub fn new(gateway: Arc<dyn CashGateway>, local: LocalStore, settings: CashSettings) -> Self {
        let working = WorkingCopy {
            active_shift_id: local.active_shift_id(),
            ..WorkingCopy::default()
        };

        CashState {
            gateway,
            local,
            settings,
            working: Mutex::new(working),
        }
    }

    /// Creates a coordinator and loads the store's records.
    pub async fn load(
        gateway: Arc<dyn CashGateway>,
        local: LocalStore,
        settings: CashSettings,
    ) -> Result<Self, ApiError> {
        let state = Self::new(gateway, local, settings);
        state.refresh().await?;
        Ok(state)
    }

    pub fn store_id(&self) -> &str {
        self.gateway.store_id()
    }

    pub fn settings(&self) -> &CashSettings {
        &self.settings
    }

    /// Replaces the working copy with the store's records.
    pub async fn refresh(&self) -> Result<(), ApiError> {
        let mut working = self.working.lock().await;
        self.reload(&mut working).await
    }

    async fn reload(&self, working: &mut WorkingCopy) -> Result<(), ApiError> {
        let (shifts, movements, transactions) = tokio::try_join!(
            self.gateway.get_shifts(),
            self.gateway.get_movements(),
            self.gateway.get_transactions(),
        )?;

        debug!(
            store_id = %self.gateway.store_id(),
            shifts = shifts.len(),
            movements = movements.len(),
            transactions = transactions.len(),
            "Working copy reloaded"
        );

        working.shifts = shifts;
        working.movements = movements;
        working.transactions = transactions;
        working.active_shift_id = self.local.active_shift_id();
        Ok(())
    }

    /// Copy of the current working state.
    pub async fn snapshot(&self) -> WorkingCopy {
        self.working.lock().await.clone()
    }

    // =========================================================================
    // Cash Actions
    // =========================================================================

    /// Runs a cash action through validation, the optimistic update, the
    /// gateway write and the reload.
    ///
    /// ## Errors
    /// - Rule and validation errors: nothing was changed or written
    /// - Gateway errors: the write failed; see the module docs for what the
    ///   working copy holds afterwards
    pub async fn perform(&self, action: CashAction) -> Result<Transition, ApiError> {
        let mut working = self.working.lock().await;

        let transition = {
            let state = working.state();
            let transition = apply(state, &action, TransitionContext::generate())?;

            if !self.settings.allow_negative_drawer {
                let expected =
                    compute_totals(state.active(), &working.movements, &working.transactions);
                ensure_drawer_covers(expected.cash, &transition.movement)?;
            }

            transition
        };

        let snapshot = match self.settings.consistency {
            ConsistencyMode::Strict => Some(working.clone()),
            ConsistencyMode::Optimistic => None,
        };

        working.apply_transition(&transition);
        self.store_active_slot(working.active_shift_id.as_deref());

        info!(
            shift_id = %transition.shift_id(),
            movement_type = %transition.movement.movement_type,
            amount = %transition.movement.amount,
            "Cash action applied"
        );

        let written = self
            .gateway
            .commit_transition(transition.shift.as_ref(), &transition.movement)
            .await;

        if let Err(e) = &written {
            error!(
                shift_id = %transition.shift_id(),
                movement_id = %transition.movement.id,
                error = %e,
                "Cash action was not saved"
            );

            if let Some(snapshot) = snapshot {
                *working = snapshot;
                self.store_active_slot(working.active_shift_id.as_deref());
                warn!(shift_id = %transition.shift_id(), "Optimistic update rolled back");
            }
        }

        if let Err(e) = self.reload(&mut working).await {
            warn!(code = ?e.code, message = %e.message, "Reload after cash action failed");
        }

        written?;
        Ok(transition)
    }

    fn store_active_slot(&self, shift_id: Option<&str>) {
        if let Err(e) = self.local.set_active_shift_id(shift_id) {
            error!(error = %e, "Active shift slot was not saved");
        }
    }

    // =========================================================================
    // Sales
    // =========================================================================

    /// Rings up a sale on the active shift.
    ///
    /// The total is the sum of the cart lines; tax and discount are zero.
    /// Split payments must add up to the total.
    pub async fn record_sale(
        &self,
        items: Vec<CartLine>,
        settlement: Settlement,
    ) -> Result<Transaction, ApiError> {
        if items.is_empty() {
            return Err(ApiError::validation("Cart is empty"));
        }
        if let Some(line) = items.iter().find(|l| l.quantity <= 0 || l.price.is_negative()) {
            return Err(ApiError::validation(format!(
                "Invalid quantity or price for {}",
                line.name
            )));
        }

        let total = items
            .iter()
            .try_fold(Money::zero(), |acc, line| {
                line.price
                    .cents()
                    .checked_mul(line.quantity)
                    .and_then(|cents| acc.checked_add(Money::from_cents(cents)))
            })
            .ok_or_else(|| ApiError::validation("Sale total is too large"))?;

        let (payment_method, payments) = match settlement {
            Settlement::Single(method) => (Some(method), None),
            Settlement::Split(lines) => {
                if lines.iter().any(|l| l.amount.is_negative()) {
                    return Err(ApiError::validation("Payment amounts must not be negative"));
                }
                let paid = lines
                    .iter()
                    .try_fold(Money::zero(), |acc, l| acc.checked_add(l.amount));
                if paid != Some(total) {
                    return Err(ApiError::validation(format!(
                        "Split payments add up to {} but the total is {}",
                        paid.unwrap_or_default(),
                        total
                    )));
                }
                (Some(PaymentMethod::from("mixed")), Some(lines))
            }
        };

        let mut working = self.working.lock().await;

        let shift_id = working
            .state()
            .active()
            .map(|s| s.id.clone())
            .ok_or_else(|| ApiError::business("No active shift: open the drawer before selling"))?;

        let transaction = Transaction {
            id: Uuid::new_v4().to_string(),
            date: chrono::Utc::now(),
            items,
            subtotal: total,
            tax: Money::zero(),
            discount: Money::zero(),
            total,
            payment_method,
            payments,
            shift_id: Some(shift_id),
        };

        working.transactions.insert(0, transaction.clone());

        let written = self.gateway.save_transaction(&transaction).await;
        match &written {
            Ok(()) => info!(
                transaction_id = %transaction.id,
                total = %transaction.total,
                "Sale recorded"
            ),
            Err(e) => {
                error!(transaction_id = %transaction.id, error = %e, "Sale was not saved");
                if self.settings.consistency == ConsistencyMode::Strict {
                    working.transactions.retain(|t| t.id != transaction.id);
                }
            }
        }

        if let Err(e) = self.reload(&mut working).await {
            warn!(code = ?e.code, message = %e.message, "Reload after sale failed");
        }

        written?;
        Ok(transaction)
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub async fn active_shift(&self) -> Option<CashShift> {
        self.working.lock().await.state().active().cloned()
    }

    /// Expected drawer totals for the active shift (zero with none open).
    pub async fn totals(&self) -> ShiftTotals {
        let working = self.working.lock().await;
        compute_totals(
            working.state().active(),
            &working.movements,
            &working.transactions,
        )
    }

    pub async fn status(&self) -> Result<RegisterStatus, ApiError> {
        let working = self.working.lock().await;
        let active = working.state().active().cloned();

        let totals = compute_totals(active.as_ref(), &working.movements, &working.transactions);

        let recent_movements = match &active {
            Some(shift) => working
                .ledger()?
                .recent_for_shift(&shift.id, self.settings.recent_movements)
                .into_iter()
                .cloned()
                .collect(),
            None => Vec::new(),
        };

        Ok(RegisterStatus {
            active_shift: active,
            totals,
            recent_movements,
        })
    }

    /// Summaries of every shift, newest first.
    pub async fn history(&self) -> Vec<ShiftSummary> {
        let working = self.working.lock().await;
        working
            .shifts
            .iter()
            .map(|shift| summarize_shift(shift, &working.movements, &working.transactions))
            .collect()
    }

    /// Summary of one shift.
    pub async fn shift_report(&self, shift_id: &str) -> Result<ShiftSummary, ApiError> {
        let working = self.working.lock().await;
        let shift = working
            .shifts
            .iter()
            .find(|s| s.id == shift_id)
            .ok_or_else(|| ApiError::not_found("Shift", shift_id))?;

        Ok(summarize_shift(shift, &working.movements, &working.transactions))
    }

    /// Shifts whose movements do not match their status.
    pub async fn audit(&self) -> Result<Vec<ShiftAudit>, ApiError> {
        let working = self.working.lock().await;
        let ledger = working.ledger()?;

        let audits: Vec<ShiftAudit> = working
            .shifts
            .iter()
            .filter_map(|shift| {
                let issues = ledger.audit_shift(shift);
                (!issues.is_empty()).then(|| ShiftAudit {
                    shift_id: shift.id.clone(),
                    status: shift.status,
                    issues,
                })
            })
            .collect();

        if !audits.is_empty() {
            warn!(shifts = audits.len(), "Ledger audit found inconsistent shifts");
        }

        Ok(audits)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use posgo_core::{MovementType, PaymentLine};
    use posgo_db::{Database, DbConfig, MemoryGateway};

    struct Harness {
        _dir: tempfile::TempDir,
        memory: Arc<MemoryGateway>,
        cash: CashState,
    }

    fn settings(consistency: ConsistencyMode) -> CashSettings {
        CashSettings {
            consistency,
            ..CashSettings::default()
        }
    }

    async fn harness(settings: CashSettings) -> Harness {
        let dir = tempfile::tempdir().unwrap();
        let memory = Arc::new(MemoryGateway::new("store-1"));
        let gateway: Arc<dyn CashGateway> = memory.clone();
        let local = LocalStore::new(dir.path().join("session.json"));
        let cash = CashState::load(gateway, local, settings).await.unwrap();
        Harness {
            _dir: dir,
            memory,
            cash,
        }
    }

    fn line(name: &str, cents: i64, quantity: i64) -> CartLine {
        CartLine {
            id: name.to_string(),
            name: name.to_string(),
            price: Money::from_cents(cents),
            quantity,
            selected_variant_id: None,
        }
    }

    fn open(amount: f64) -> CashAction {
        CashAction::Open {
            amount: Some(amount),
        }
    }

    fn out(amount: f64, description: &str) -> CashAction {
        CashAction::Out {
            amount: Some(amount),
            description: description.to_string(),
        }
    }

    #[tokio::test]
    async fn test_simple_day() {
        let h = harness(CashSettings::default()).await;

        h.cash.perform(open(100.0)).await.unwrap();
        h.cash
            .record_sale(vec![line("Inca Kola", 5_000, 1)], Settlement::Single(PaymentMethod::Cash))
            .await
            .unwrap();
        h.cash
            .record_sale(vec![line("Pan", 1_000, 3)], Settlement::Single(PaymentMethod::Yape))
            .await
            .unwrap();
        h.cash.perform(out(20.0, "compra de hielo")).await.unwrap();

        let totals = h.cash.totals().await;
        assert_eq!(totals.cash, Money::from_cents(13_000));
        assert_eq!(totals.digital, Money::from_cents(3_000));
        assert_eq!(totals.start, Money::from_cents(10_000));
    }

    #[tokio::test]
    async fn test_split_payment() {
        let h = harness(CashSettings::default()).await;
        h.cash.perform(open(0.0)).await.unwrap();

        let sale = h
            .cash
            .record_sale(
                vec![line("Arroz", 10_000, 1)],
                Settlement::Split(vec![
                    PaymentLine {
                        method: PaymentMethod::Cash,
                        amount: Money::from_cents(4_000),
                    },
                    PaymentLine {
                        method: PaymentMethod::Card,
                        amount: Money::from_cents(6_000),
                    },
                ]),
            )
            .await
            .unwrap();
        assert_eq!(sale.total, Money::from_cents(10_000));

        let totals = h.cash.totals().await;
        assert_eq!(totals.cash, Money::from_cents(4_000));
        assert_eq!(totals.digital, Money::from_cents(6_000));
    }

    #[tokio::test]
    async fn test_split_must_cover_total() {
        let h = harness(CashSettings::default()).await;
        h.cash.perform(open(0.0)).await.unwrap();

        let err = h
            .cash
            .record_sale(
                vec![line("Arroz", 10_000, 1)],
                Settlement::Split(vec![PaymentLine {
                    method: PaymentMethod::Cash,
                    amount: Money::from_cents(4_000),
                }]),
            )
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
    }

    #[tokio::test]
    async fn test_reject_double_open() {
        let h = harness(CashSettings::default()).await;
        h.cash.perform(open(100.0)).await.unwrap();

        let err = h.cash.perform(open(50.0)).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::BusinessLogic);

        let shifts = h.memory.get_shifts().await.unwrap();
        assert_eq!(shifts.iter().filter(|s| s.is_open()).count(), 1);
        assert_eq!(h.memory.get_movements().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_close_then_query() {
        let h = harness(CashSettings::default()).await;
        let opened = h.cash.perform(open(50.0)).await.unwrap();
        h.cash
            .perform(CashAction::Close { amount: Some(50.0) })
            .await
            .unwrap();

        let shifts = h.memory.get_shifts().await.unwrap();
        assert_eq!(shifts.len(), 1);
        assert_eq!(shifts[0].status, ShiftStatus::Closed);
        assert_eq!(shifts[0].id, opened.shift_id());

        let movements = h.memory.get_movements().await.unwrap();
        assert_eq!(movements.len(), 2);
        assert!(movements
            .iter()
            .any(|m| m.movement_type == MovementType::Open && m.amount == Money::from_cents(5_000)));
        assert!(movements
            .iter()
            .any(|m| m.movement_type == MovementType::Close && m.amount == Money::from_cents(5_000)));

        assert!(h.cash.active_shift().await.is_none());
        assert!(h.cash.audit().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_sale_needs_open_shift() {
        let h = harness(CashSettings::default()).await;
        let err = h
            .cash
            .record_sale(vec![line("Pan", 100, 1)], Settlement::Single(PaymentMethod::Cash))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::BusinessLogic);
        assert!(h.memory.get_transactions().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_opens_serialize() {
        let h = harness(CashSettings::default()).await;
        let (a, b) = tokio::join!(h.cash.perform(open(10.0)), h.cash.perform(open(20.0)));
        assert!(a.is_ok() ^ b.is_ok());

        let shifts = h.memory.get_shifts().await.unwrap();
        assert_eq!(shifts.len(), 1);
    }

    #[tokio::test]
    async fn test_second_terminal_cannot_open() {
        let h = harness(CashSettings::default()).await;

        let dir = tempfile::tempdir().unwrap();
        let gateway: Arc<dyn CashGateway> = h.memory.clone();
        let other = CashState::load(
            gateway,
            LocalStore::new(dir.path().join("session.json")),
            CashSettings::default(),
        )
        .await
        .unwrap();

        h.cash.perform(open(100.0)).await.unwrap();

        // `other` has not refreshed and still believes the drawer is closed
        let err = other.perform(open(80.0)).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::BusinessLogic);

        // the reload after the failed write adopts the first terminal's shift
        let adopted = other.active_shift().await.unwrap();
        assert_eq!(adopted.start_amount, Money::from_cents(10_000));
    }

    #[tokio::test]
    async fn test_optimistic_update_stands_when_store_is_down() {
        let h = harness(settings(ConsistencyMode::Optimistic)).await;
        h.cash.perform(open(100.0)).await.unwrap();

        h.memory.fail_movement_writes(true);
        h.memory.fail_reads(true);

        let err = h.cash.perform(out(30.0, "proveedor")).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::PersistenceError);

        let working = h.cash.snapshot().await;
        assert_eq!(working.movements.len(), 2);
        assert_eq!(h.cash.totals().await.cash, Money::from_cents(7_000));

        // once the store is back the reload drops the unsaved movement
        h.memory.fail_movement_writes(false);
        h.memory.fail_reads(false);
        h.cash.refresh().await.unwrap();
        assert_eq!(h.cash.totals().await.cash, Money::from_cents(10_000));
    }

    #[tokio::test]
    async fn test_strict_mode_rolls_back() {
        let h = harness(settings(ConsistencyMode::Strict)).await;

        h.memory.fail_shift_writes(true);
        h.memory.fail_reads(true);

        let err = h.cash.perform(open(100.0)).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::PersistenceError);

        let working = h.cash.snapshot().await;
        assert!(working.shifts.is_empty());
        assert!(working.movements.is_empty());
        assert!(working.active_shift_id.is_none());
    }

    #[tokio::test]
    async fn test_optimistic_open_keeps_slot_when_store_is_down() {
        let h = harness(settings(ConsistencyMode::Optimistic)).await;

        h.memory.fail_shift_writes(true);
        h.memory.fail_reads(true);

        assert!(h.cash.perform(open(100.0)).await.is_err());

        let working = h.cash.snapshot().await;
        assert_eq!(working.shifts.len(), 1);
        assert!(working.active_shift_id.is_some());
    }

    #[tokio::test]
    async fn test_half_written_close_shows_in_audit() {
        let h = harness(CashSettings::default()).await;
        h.cash.perform(open(100.0)).await.unwrap();

        h.memory.fail_movement_writes(true);
        let err = h
            .cash
            .perform(CashAction::Close { amount: Some(100.0) })
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::PersistenceError);

        let audits = h.cash.audit().await.unwrap();
        assert_eq!(audits.len(), 1);
        assert_eq!(audits[0].status, ShiftStatus::Closed);
        assert_eq!(audits[0].issues, vec![LedgerIssue::MissingClose]);
    }

    #[tokio::test]
    async fn test_negative_drawer_guard() {
        let guarded = CashSettings {
            allow_negative_drawer: false,
            ..CashSettings::default()
        };
        let h = harness(guarded).await;
        h.cash.perform(open(10.0)).await.unwrap();

        let err = h.cash.perform(out(25.0, "vuelto")).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::BusinessLogic);
        assert_eq!(h.memory.get_movements().await.unwrap().len(), 1);

        h.cash.perform(out(10.0, "vuelto")).await.unwrap();
        assert_eq!(h.cash.totals().await.cash, Money::zero());
    }

    #[tokio::test]
    async fn test_negative_drawer_allowed_by_default() {
        let h = harness(CashSettings::default()).await;
        h.cash.perform(open(10.0)).await.unwrap();
        h.cash.perform(out(25.0, "vuelto")).await.unwrap();
        assert_eq!(h.cash.totals().await.cash, Money::from_cents(-1_500));
    }

    #[tokio::test]
    async fn test_status_lists_recent_movements() {
        let h = harness(CashSettings::default()).await;
        h.cash.perform(open(100.0)).await.unwrap();
        for n in 1..=4 {
            h.cash
                .perform(CashAction::In {
                    amount: Some(f64::from(n)),
                    description: format!("ingreso {}", n),
                })
                .await
                .unwrap();
        }

        let status = h.cash.status().await.unwrap();
        assert!(status.active_shift.is_some());
        assert_eq!(status.recent_movements.len(), 3);
        assert_eq!(status.totals.cash, Money::from_cents(11_000));
    }

    #[tokio::test]
    async fn test_report_and_history() {
        let h = harness(CashSettings::default()).await;
        let opened = h.cash.perform(open(100.0)).await.unwrap();
        h.cash
            .record_sale(vec![line("Hielo", 450, 2)], Settlement::Single(PaymentMethod::Cash))
            .await
            .unwrap();
        h.cash
            .perform(CashAction::Close { amount: Some(108.0) })
            .await
            .unwrap();

        let report = h.cash.shift_report(opened.shift_id()).await.unwrap();
        assert_eq!(report.sales_count, 1);
        assert_eq!(report.totals.cash, Money::from_cents(10_900));
        assert_eq!(report.variance, Some(Money::from_cents(-100)));

        assert_eq!(h.cash.history().await.len(), 1);
        assert_eq!(
            h.cash.shift_report("missing").await.unwrap_err().code,
            ErrorCode::NotFound
        );
    }

    #[tokio::test]
    async fn test_runs_against_sqlite() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let gateway: Arc<dyn CashGateway> = Arc::new(db.cash_gateway("store-1"));
        let cash = CashState::load(
            gateway,
            LocalStore::new(dir.path().join("session.json")),
            CashSettings::default(),
        )
        .await
        .unwrap();

        cash.perform(open(100.0)).await.unwrap();
        cash.record_sale(vec![line("Atún", 690, 1)], Settlement::Single(PaymentMethod::Cash))
            .await
            .unwrap();
        assert!(cash.perform(open(5.0)).await.is_err());

        cash.refresh().await.unwrap();
        assert_eq!(cash.totals().await.cash, Money::from_cents(10_690));
    }
}
