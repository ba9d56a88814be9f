//! # Persistence Gateway
//!
//! The store the coordinator reads and writes cash records through, scoped
//! to one store id fixed when the gateway is built.
//!
//! ## Implementations
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         CashGateway                                     │
//! │                                                                         │
//! │  get_shifts()        startTime DESC                                     │
//! │  save_shift()        upsert by id, CLOSED is final                      │
//! │  get_movements()     timestamp DESC                                     │
//! │  save_movement()     insert only                                        │
//! │  get_transactions()  date DESC                                          │
//! │  save_transaction()  insert only                                        │
//! │  commit_transition() shift + movement of one cash action                │
//! │                                                                         │
//! │  ┌──────────────────────────┐     ┌──────────────────────────────┐     │
//! │  │ SqliteGateway            │     │ MemoryGateway                │     │
//! │  │ one SQL transaction per  │     │ default commit_transition:   │     │
//! │  │ commit_transition        │     │ shift first, then movement,  │     │
//! │  │                          │     │ no atomicity                 │     │
//! │  └──────────────────────────┘     └──────────────────────────────┘     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual Write
//! The default `commit_transition` issues two independent writes. A failure
//! between them leaves a shift marked CLOSED with no CLOSE movement (or an
//! OPEN shift with no OPEN movement). `MovementLedger::audit_shift` reports
//! such leftovers.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::error::{DbError, DbResult};
use crate::pool::Database;
use crate::repository::movement::insert_movement;
use crate::repository::shift::upsert_shift;
use posgo_core::{CashMovement, CashShift, Transaction};

// =============================================================================
// Gateway Trait
// =============================================================================

/// Store-scoped persistence for shifts, movements and transactions.
#[async_trait]
pub trait CashGateway: Send + Sync {
    /// Store every call is scoped to.
    fn store_id(&self) -> &str;

    /// All shifts, newest `startTime` first.
    async fn get_shifts(&self) -> DbResult<Vec<CashShift>>;

    /// Upserts a shift by id. A CLOSED shift is never rewritten.
    async fn save_shift(&self, shift: &CashShift) -> DbResult<()>;

    /// All movements, newest `timestamp` first.
    async fn get_movements(&self) -> DbResult<Vec<CashMovement>>;

    /// Appends a movement. Never updates.
    async fn save_movement(&self, movement: &CashMovement) -> DbResult<()>;

    /// All transactions, newest `date` first.
    async fn get_transactions(&self) -> DbResult<Vec<Transaction>>;

    /// Stores a completed sale.
    async fn save_transaction(&self, transaction: &Transaction) -> DbResult<()>;

    /// Persists the records of one cash action: shift first, then movement.
    ///
    /// The default issues two independent writes.
    async fn commit_transition(
        &self,
        shift: Option<&CashShift>,
        movement: &CashMovement,
    ) -> DbResult<()> {
        if let Some(shift) = shift {
            self.save_shift(shift).await?;
        }

        if let Err(e) = self.save_movement(movement).await {
            if shift.is_some() {
                warn!(
                    shift_id = %movement.shift_id,
                    movement_id = %movement.id,
                    movement_type = %movement.movement_type,
                    error = %e,
                    "Shift saved but its movement was not"
                );
            }
            return Err(e);
        }

        Ok(())
    }
}

// =============================================================================
// SQLite Gateway
// =============================================================================

/// Gateway backed by the local SQLite database.
#[derive(Debug, Clone)]
pub struct SqliteGateway {
    db: Database,
    store_id: String,
}

impl SqliteGateway {
    pub fn new(db: Database, store_id: impl Into<String>) -> Self {
        SqliteGateway {
            db,
            store_id: store_id.into(),
        }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }
}

#[async_trait]
impl CashGateway for SqliteGateway {
    fn store_id(&self) -> &str {
        &self.store_id
    }

    async fn get_shifts(&self) -> DbResult<Vec<CashShift>> {
        self.db.shifts().list(&self.store_id).await
    }

    async fn save_shift(&self, shift: &CashShift) -> DbResult<()> {
        self.db.shifts().upsert(&self.store_id, shift).await
    }

    async fn get_movements(&self) -> DbResult<Vec<CashMovement>> {
        self.db.movements().list(&self.store_id).await
    }

    async fn save_movement(&self, movement: &CashMovement) -> DbResult<()> {
        self.db.movements().insert(&self.store_id, movement).await
    }

    async fn get_transactions(&self) -> DbResult<Vec<Transaction>> {
        self.db.transactions().list(&self.store_id).await
    }

    async fn save_transaction(&self, transaction: &Transaction) -> DbResult<()> {
        self.db
            .transactions()
            .insert(&self.store_id, transaction)
            .await
    }

    /// Both writes in one SQL transaction: either both land or neither does.
    async fn commit_transition(
        &self,
        shift: Option<&CashShift>,
        movement: &CashMovement,
    ) -> DbResult<()> {
        let mut tx = self
            .db
            .pool()
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        if let Some(shift) = shift {
            upsert_shift(&mut *tx, &self.store_id, shift).await?;
        }
        insert_movement(&mut *tx, &self.store_id, movement).await?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        debug!(
            movement_id = %movement.id,
            shift_id = %movement.shift_id,
            "Transition committed"
        );
        Ok(())
    }
}

// =============================================================================
// Memory Gateway
// =============================================================================

#[derive(Debug, Default)]
struct MemoryTables {
    /// Insertion order; an upsert keeps the original position.
    shifts: Vec<CashShift>,
    movements: Vec<CashMovement>,
    transactions: Vec<Transaction>,
}

/// In-memory gateway with the SQLite schema's rules, for tests and demos.
///
/// Writes can be made to fail on demand to exercise the coordinator's
/// error paths.
#[derive(Debug, Default)]
pub struct MemoryGateway {
    store_id: String,
    tables: Mutex<MemoryTables>,
    fail_shift_writes: AtomicBool,
    fail_movement_writes: AtomicBool,
    fail_reads: AtomicBool,
}

impl MemoryGateway {
    pub fn new(store_id: impl Into<String>) -> Self {
        MemoryGateway {
            store_id: store_id.into(),
            ..Default::default()
        }
    }

    /// Makes every following `save_shift` fail (or succeed again).
    pub fn fail_shift_writes(&self, fail: bool) {
        self.fail_shift_writes.store(fail, Ordering::SeqCst);
    }

    /// Makes every following `save_movement` fail (or succeed again).
    pub fn fail_movement_writes(&self, fail: bool) {
        self.fail_movement_writes.store(fail, Ordering::SeqCst);
    }

    /// Makes every following read fail (or succeed again).
    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    fn check(flag: &AtomicBool) -> DbResult<()> {
        if flag.load(Ordering::SeqCst) {
            return Err(DbError::Unavailable("simulated outage".to_string()));
        }
        Ok(())
    }
}

/// Newest first by `key`; ties keep newest-inserted first.
fn newest_first<T: Clone, K: Ord>(records: &[T], key: impl Fn(&T) -> K) -> Vec<T> {
    let mut sorted: Vec<T> = records.iter().rev().cloned().collect();
    sorted.sort_by(|a, b| key(b).cmp(&key(a)));
    sorted
}

#[async_trait]
impl CashGateway for MemoryGateway {
    fn store_id(&self) -> &str {
        &self.store_id
    }

    async fn get_shifts(&self) -> DbResult<Vec<CashShift>> {
        Self::check(&self.fail_reads)?;
        let tables = self.tables.lock().await;
        Ok(newest_first(&tables.shifts, |s| s.start_time))
    }

    async fn save_shift(&self, shift: &CashShift) -> DbResult<()> {
        Self::check(&self.fail_shift_writes)?;
        let mut tables = self.tables.lock().await;

        if let Some(existing) = tables.shifts.iter_mut().find(|s| s.id == shift.id) {
            if !existing.is_open() {
                return Err(DbError::immutable("Shift", shift.id.as_str()));
            }
            existing.end_time = shift.end_time;
            existing.end_amount = shift.end_amount;
            existing.status = shift.status;
            existing.total_sales_cash = shift.total_sales_cash;
            existing.total_sales_digital = shift.total_sales_digital;
            return Ok(());
        }

        if shift.is_open() && tables.shifts.iter().any(|s| s.is_open()) {
            return Err(DbError::duplicate("shifts.store_id", self.store_id.as_str()));
        }

        tables.shifts.push(shift.clone());
        Ok(())
    }

    async fn get_movements(&self) -> DbResult<Vec<CashMovement>> {
        Self::check(&self.fail_reads)?;
        let tables = self.tables.lock().await;
        Ok(newest_first(&tables.movements, |m| m.timestamp))
    }

    async fn save_movement(&self, movement: &CashMovement) -> DbResult<()> {
        Self::check(&self.fail_movement_writes)?;
        let mut tables = self.tables.lock().await;

        if tables.movements.iter().any(|m| m.id == movement.id) {
            return Err(DbError::duplicate("movements.id", movement.id.as_str()));
        }
        if !tables.shifts.iter().any(|s| s.id == movement.shift_id) {
            return Err(DbError::ForeignKeyViolation {
                message: format!("unknown shift {}", movement.shift_id),
            });
        }

        tables.movements.push(movement.clone());
        Ok(())
    }

    async fn get_transactions(&self) -> DbResult<Vec<Transaction>> {
        Self::check(&self.fail_reads)?;
        let tables = self.tables.lock().await;
        Ok(newest_first(&tables.transactions, |t| t.date))
    }

    async fn save_transaction(&self, transaction: &Transaction) -> DbResult<()> {
        let mut tables = self.tables.lock().await;

        if tables.transactions.iter().any(|t| t.id == transaction.id) {
            return Err(DbError::duplicate(
                "transactions.id",
                transaction.id.as_str(),
            ));
        }
        if let Some(shift_id) = &transaction.shift_id {
            if !tables.shifts.iter().any(|s| &s.id == shift_id) {
                return Err(DbError::ForeignKeyViolation {
                    message: format!("unknown shift {}", shift_id),
                });
            }
        }

        tables.transactions.push(transaction.clone());
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DbConfig;
    use chrono::{DateTime, TimeZone, Utc};
    use posgo_core::{Money, MovementType, PaymentMethod, ShiftStatus};
    use std::sync::Arc;

    fn at(minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 9, minute, 0).unwrap()
    }

    fn open_shift(id: &str, minute: u32) -> CashShift {
        CashShift {
            id: id.to_string(),
            start_time: at(minute),
            start_amount: Money::from_cents(5_000),
            end_time: None,
            end_amount: None,
            status: ShiftStatus::Open,
            total_sales_cash: Money::zero(),
            total_sales_digital: Money::zero(),
        }
    }

    fn close(shift: &CashShift, minute: u32) -> CashShift {
        CashShift {
            status: ShiftStatus::Closed,
            end_time: Some(at(minute)),
            end_amount: Some(Money::from_cents(5_000)),
            ..shift.clone()
        }
    }

    fn movement(id: &str, shift_id: &str, kind: MovementType, minute: u32) -> CashMovement {
        CashMovement {
            id: id.to_string(),
            shift_id: shift_id.to_string(),
            movement_type: kind,
            amount: Money::from_cents(5_000),
            description: String::new(),
            timestamp: at(minute),
        }
    }

    async fn gateways() -> Vec<Arc<dyn CashGateway>> {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let sqlite: Arc<dyn CashGateway> = Arc::new(db.cash_gateway("store-1"));
        let memory: Arc<dyn CashGateway> = Arc::new(MemoryGateway::new("store-1"));
        vec![sqlite, memory]
    }

    #[tokio::test]
    async fn test_open_then_close_cycle() {
        for gateway in gateways().await {
            let shift = open_shift("s-1", 0);
            gateway
                .commit_transition(Some(&shift), &movement("m-1", "s-1", MovementType::Open, 0))
                .await
                .unwrap();
            gateway
                .commit_transition(
                    Some(&close(&shift, 30)),
                    &movement("m-2", "s-1", MovementType::Close, 30),
                )
                .await
                .unwrap();

            let shifts = gateway.get_shifts().await.unwrap();
            assert_eq!(shifts.len(), 1);
            assert_eq!(shifts[0].status, ShiftStatus::Closed);

            let movements = gateway.get_movements().await.unwrap();
            let kinds: Vec<MovementType> = movements.iter().map(|m| m.movement_type).collect();
            assert_eq!(kinds, vec![MovementType::Close, MovementType::Open]);
            assert!(movements.iter().all(|m| m.amount.cents() == 5_000));
        }
    }

    #[tokio::test]
    async fn test_second_open_shift_is_refused() {
        for gateway in gateways().await {
            gateway.save_shift(&open_shift("s-1", 0)).await.unwrap();

            let err = gateway.save_shift(&open_shift("s-2", 5)).await.unwrap_err();
            assert!(matches!(err, DbError::UniqueViolation { .. }));

            let open: Vec<CashShift> = gateway
                .get_shifts()
                .await
                .unwrap()
                .into_iter()
                .filter(|s| s.is_open())
                .collect();
            assert_eq!(open.len(), 1);
        }
    }

    #[tokio::test]
    async fn test_closed_shift_is_final() {
        for gateway in gateways().await {
            let shift = open_shift("s-1", 0);
            gateway.save_shift(&shift).await.unwrap();
            gateway.save_shift(&close(&shift, 10)).await.unwrap();

            let err = gateway.save_shift(&shift).await.unwrap_err();
            assert!(matches!(err, DbError::Immutable { .. }));
        }
    }

    #[tokio::test]
    async fn test_sqlite_transition_is_atomic() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let gateway = db.cash_gateway("store-1");

        let shift = open_shift("s-1", 0);
        gateway
            .commit_transition(Some(&shift), &movement("m-1", "s-1", MovementType::Open, 0))
            .await
            .unwrap();

        // the CLOSE movement reuses an existing id, so the insert fails
        let err = gateway
            .commit_transition(
                Some(&close(&shift, 30)),
                &movement("m-1", "s-1", MovementType::Close, 30),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));

        let shifts = gateway.get_shifts().await.unwrap();
        assert!(shifts[0].is_open(), "shift update must roll back");
    }

    #[tokio::test]
    async fn test_default_transition_leaves_dual_write_gap() {
        let gateway = MemoryGateway::new("store-1");
        let shift = open_shift("s-1", 0);
        gateway
            .commit_transition(Some(&shift), &movement("m-1", "s-1", MovementType::Open, 0))
            .await
            .unwrap();

        gateway.fail_movement_writes(true);
        let result = gateway
            .commit_transition(
                Some(&close(&shift, 30)),
                &movement("m-2", "s-1", MovementType::Close, 30),
            )
            .await;
        assert!(matches!(result, Err(DbError::Unavailable(_))));

        let shifts = gateway.get_shifts().await.unwrap();
        assert_eq!(shifts[0].status, ShiftStatus::Closed);
        assert_eq!(gateway.get_movements().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_stores_are_isolated() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let first = db.cash_gateway("store-1");
        let second = db.cash_gateway("store-2");

        first.save_shift(&open_shift("s-1", 0)).await.unwrap();
        second.save_shift(&open_shift("s-2", 0)).await.unwrap();

        assert_eq!(first.get_shifts().await.unwrap()[0].id, "s-1");
        assert_eq!(second.get_shifts().await.unwrap()[0].id, "s-2");
        assert_eq!(second.store_id(), "store-2");
    }

    #[tokio::test]
    async fn test_transactions_newest_first() {
        for gateway in gateways().await {
            gateway.save_shift(&open_shift("s-1", 0)).await.unwrap();
            for (id, minute) in [("t-1", 10), ("t-2", 20)] {
                let t = Transaction {
                    id: id.to_string(),
                    date: at(minute),
                    items: Vec::new(),
                    subtotal: Money::from_cents(100),
                    tax: Money::zero(),
                    discount: Money::zero(),
                    total: Money::from_cents(100),
                    payment_method: Some(PaymentMethod::Yape),
                    payments: None,
                    shift_id: Some("s-1".to_string()),
                };
                gateway.save_transaction(&t).await.unwrap();
            }

            let ids: Vec<String> = gateway
                .get_transactions()
                .await
                .unwrap()
                .into_iter()
                .map(|t| t.id)
                .collect();
            assert_eq!(ids, vec!["t-2", "t-1"]);
        }
    }

    #[tokio::test]
    async fn test_memory_reads_can_fail() {
        let gateway = MemoryGateway::new("store-1");
        gateway.fail_reads(true);
        assert!(gateway.get_shifts().await.is_err());
        gateway.fail_reads(false);
        assert!(gateway.get_shifts().await.unwrap().is_empty());
    }
}
