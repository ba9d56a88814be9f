//! # Transaction Repository
//!
//! Completed sales as the cash ledger sees them. Cart lines and split
//! payments are stored as JSON text; reading them back is lenient, like the
//! wire format: an unreadable `items` column is an empty cart and an
//! unreadable `payments` column means "single-method sale".

use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqlitePool};
use tracing::{debug, warn};

use crate::error::DbResult;
use posgo_core::{CartLine, Money, PaymentLine, PaymentMethod, Transaction};

#[derive(Debug, FromRow)]
struct TransactionRow {
    id: String,
    date: DateTime<Utc>,
    items: String,
    subtotal_cents: i64,
    tax_cents: i64,
    discount_cents: i64,
    total_cents: i64,
    payment_method: Option<String>,
    payments: Option<String>,
    shift_id: Option<String>,
}

impl From<TransactionRow> for Transaction {
    fn from(row: TransactionRow) -> Self {
        let items: Vec<CartLine> = serde_json::from_str(&row.items).unwrap_or_else(|e| {
            warn!(transaction_id = %row.id, error = %e, "Unreadable cart lines");
            Vec::new()
        });

        let payments: Option<Vec<PaymentLine>> =
            row.payments
                .as_deref()
                .and_then(|raw| match serde_json::from_str(raw) {
                    Ok(lines) => Some(lines),
                    Err(e) => {
                        warn!(transaction_id = %row.id, error = %e, "Unreadable split payments");
                        None
                    }
                });

        Transaction {
            id: row.id,
            date: row.date,
            items,
            subtotal: Money::from_cents(row.subtotal_cents),
            tax: Money::from_cents(row.tax_cents),
            discount: Money::from_cents(row.discount_cents),
            total: Money::from_cents(row.total_cents),
            payment_method: row.payment_method.map(PaymentMethod::from),
            payments,
            shift_id: row.shift_id,
        }
    }
}

const SELECT_TRANSACTION: &str = r#"
    SELECT
        id, date, items,
        subtotal_cents, tax_cents, discount_cents, total_cents,
        payment_method, payments, shift_id
    FROM transactions
"#;

/// Repository for transaction database operations.
#[derive(Debug, Clone)]
pub struct TransactionRepository {
    pool: SqlitePool,
}

impl TransactionRepository {
    /// Creates a new TransactionRepository.
    pub fn new(pool: SqlitePool) -> Self {
        TransactionRepository { pool }
    }

    /// All transactions of a store, newest first.
    pub async fn list(&self, store_id: &str) -> DbResult<Vec<Transaction>> {
        let sql = format!(
            "{} WHERE store_id = ?1 ORDER BY date DESC, rowid DESC",
            SELECT_TRANSACTION
        );
        let rows: Vec<TransactionRow> = sqlx::query_as(&sql)
            .bind(store_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(Transaction::from).collect())
    }

    /// Transactions rung up during one shift, newest first.
    pub async fn list_for_shift(
        &self,
        store_id: &str,
        shift_id: &str,
    ) -> DbResult<Vec<Transaction>> {
        let sql = format!(
            "{} WHERE store_id = ?1 AND shift_id = ?2 ORDER BY date DESC, rowid DESC",
            SELECT_TRANSACTION
        );
        let rows: Vec<TransactionRow> = sqlx::query_as(&sql)
            .bind(store_id)
            .bind(shift_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(Transaction::from).collect())
    }

    /// Inserts a completed sale.
    pub async fn insert(&self, store_id: &str, transaction: &Transaction) -> DbResult<()> {
        debug!(
            transaction_id = %transaction.id,
            total = %transaction.total,
            "Inserting transaction"
        );

        let items = serde_json::to_string(&transaction.items)?;
        let payments = transaction
            .payments
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        sqlx::query(
            r#"
            INSERT INTO transactions (
                id, store_id, date, items,
                subtotal_cents, tax_cents, discount_cents, total_cents,
                payment_method, payments, shift_id
            ) VALUES (
                ?1, ?2, ?3, ?4,
                ?5, ?6, ?7, ?8,
                ?9, ?10, ?11
            )
            "#,
        )
        .bind(transaction.id.as_str())
        .bind(store_id)
        .bind(transaction.date)
        .bind(items)
        .bind(transaction.subtotal.cents())
        .bind(transaction.tax.cents())
        .bind(transaction.discount.cents())
        .bind(transaction.total.cents())
        .bind(transaction.payment_method.as_ref().map(|m| m.as_str()))
        .bind(payments)
        .bind(transaction.shift_id.as_deref())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Counts a store's transactions.
    pub async fn count(&self, store_id: &str) -> DbResult<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM transactions WHERE store_id = ?1")
                .bind(store_id)
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
