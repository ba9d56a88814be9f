//! # Shift Repository
//!
//! Database operations for cash shifts.
//!
//! ## Write Rules
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Shift Upsert                                     │
//! │                                                                         │
//! │  id unknown          ──► INSERT (unique index refuses a 2nd OPEN)      │
//! │  id known, OPEN      ──► UPDATE closing fields + cached totals         │
//! │  id known, CLOSED    ──► nothing written ──► DbError::Immutable        │
//! │                                                                         │
//! │  start_time / start_amount are never rewritten.                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::{FromRow, Sqlite, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use posgo_core::{CashShift, Money, ShiftStatus};

/// Row shape of the `shifts` table.
#[derive(Debug, FromRow)]
struct ShiftRow {
    id: String,
    start_time: DateTime<Utc>,
    start_amount_cents: i64,
    end_time: Option<DateTime<Utc>>,
    end_amount_cents: Option<i64>,
    status: ShiftStatus,
    total_sales_cash_cents: i64,
    total_sales_digital_cents: i64,
}

impl From<ShiftRow> for CashShift {
    fn from(row: ShiftRow) -> Self {
        CashShift {
            id: row.id,
            start_time: row.start_time,
            start_amount: Money::from_cents(row.start_amount_cents),
            end_time: row.end_time,
            end_amount: row.end_amount_cents.map(Money::from_cents),
            status: row.status,
            total_sales_cash: Money::from_cents(row.total_sales_cash_cents),
            total_sales_digital: Money::from_cents(row.total_sales_digital_cents),
        }
    }
}

const SELECT_SHIFT: &str = r#"
    SELECT
        id,
        start_time,
        start_amount_cents,
        end_time,
        end_amount_cents,
        status,
        total_sales_cash_cents,
        total_sales_digital_cents
    FROM shifts
"#;

/// Repository for shift database operations.
#[derive(Debug, Clone)]
pub struct ShiftRepository {
    pool: SqlitePool,
}

impl ShiftRepository {
    /// Creates a new ShiftRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ShiftRepository { pool }
    }

    /// All shifts of a store, newest first.
    pub async fn list(&self, store_id: &str) -> DbResult<Vec<CashShift>> {
        let sql = format!(
            "{} WHERE store_id = ?1 ORDER BY start_time DESC, rowid DESC",
            SELECT_SHIFT
        );
        let rows: Vec<ShiftRow> = sqlx::query_as(&sql)
            .bind(store_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(CashShift::from).collect())
    }

    /// Gets a shift by ID.
    pub async fn get_by_id(&self, store_id: &str, id: &str) -> DbResult<Option<CashShift>> {
        let sql = format!("{} WHERE store_id = ?1 AND id = ?2", SELECT_SHIFT);
        let row: Option<ShiftRow> = sqlx::query_as(&sql)
            .bind(store_id)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(CashShift::from))
    }

    /// The store's OPEN shift, if any.
    pub async fn find_open(&self, store_id: &str) -> DbResult<Option<CashShift>> {
        let sql = format!("{} WHERE store_id = ?1 AND status = 'OPEN'", SELECT_SHIFT);
        let row: Option<ShiftRow> = sqlx::query_as(&sql)
            .bind(store_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(CashShift::from))
    }

    /// Inserts or updates a shift (see module docs for the rules).
    pub async fn upsert(&self, store_id: &str, shift: &CashShift) -> DbResult<()> {
        upsert_shift(&self.pool, store_id, shift).await
    }
}

/// Shift upsert usable inside a transaction.
pub(crate) async fn upsert_shift<'e, E>(
    executor: E,
    store_id: &str,
    shift: &CashShift,
) -> DbResult<()>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    debug!(shift_id = %shift.id, status = %shift.status, "Saving shift");

    let result = sqlx::query(
        r#"
        INSERT INTO shifts (
            id, store_id, start_time, start_amount_cents,
            end_time, end_amount_cents, status,
            total_sales_cash_cents, total_sales_digital_cents,
            updated_at
        ) VALUES (
            ?1, ?2, ?3, ?4,
            ?5, ?6, ?7,
            ?8, ?9,
            ?10
        )
        ON CONFLICT (id) DO UPDATE SET
            end_time = excluded.end_time,
            end_amount_cents = excluded.end_amount_cents,
            status = excluded.status,
            total_sales_cash_cents = excluded.total_sales_cash_cents,
            total_sales_digital_cents = excluded.total_sales_digital_cents,
            updated_at = excluded.updated_at
        WHERE shifts.status = 'OPEN' AND shifts.store_id = excluded.store_id
        "#,
    )
    .bind(shift.id.as_str())
    .bind(store_id)
    .bind(shift.start_time)
    .bind(shift.start_amount.cents())
    .bind(shift.end_time)
    .bind(shift.end_amount.map(|m| m.cents()))
    .bind(shift.status)
    .bind(shift.total_sales_cash.cents())
    .bind(shift.total_sales_digital.cents())
    .bind(Utc::now())
    .execute(executor)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::immutable("Shift", shift.id.as_str()));
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
