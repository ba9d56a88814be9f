//! # Movement Repository
//!
//! Insert-only access to cash movements. The table's triggers refuse any
//! UPDATE or DELETE, so this repository offers neither.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, Sqlite, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use posgo_core::{CashMovement, Money, MovementType};

#[derive(Debug, FromRow)]
struct MovementRow {
    id: String,
    shift_id: String,
    movement_type: MovementType,
    amount_cents: i64,
    description: String,
    timestamp: DateTime<Utc>,
}

impl From<MovementRow> for CashMovement {
    fn from(row: MovementRow) -> Self {
        CashMovement {
            id: row.id,
            shift_id: row.shift_id,
            movement_type: row.movement_type,
            amount: Money::from_cents(row.amount_cents),
            description: row.description,
            timestamp: row.timestamp,
        }
    }
}

/// Repository for movement database operations.
#[derive(Debug, Clone)]
pub struct MovementRepository {
    pool: SqlitePool,
}

impl MovementRepository {
    /// Creates a new MovementRepository.
    pub fn new(pool: SqlitePool) -> Self {
        MovementRepository { pool }
    }

    /// All movements of a store, newest first.
    ///
    /// Movements sharing a timestamp come newest-inserted first, so reversing
    /// the list yields insertion order.
    pub async fn list(&self, store_id: &str) -> DbResult<Vec<CashMovement>> {
        let rows: Vec<MovementRow> = sqlx::query_as(
            r#"
            SELECT id, shift_id, movement_type, amount_cents, description, timestamp
            FROM movements
            WHERE store_id = ?1
            ORDER BY timestamp DESC, rowid DESC
            "#,
        )
        .bind(store_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(CashMovement::from).collect())
    }

    /// Movements of one shift, oldest first.
    pub async fn list_for_shift(
        &self,
        store_id: &str,
        shift_id: &str,
    ) -> DbResult<Vec<CashMovement>> {
        let rows: Vec<MovementRow> = sqlx::query_as(
            r#"
            SELECT id, shift_id, movement_type, amount_cents, description, timestamp
            FROM movements
            WHERE store_id = ?1 AND shift_id = ?2
            ORDER BY timestamp, rowid
            "#,
        )
        .bind(store_id)
        .bind(shift_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(CashMovement::from).collect())
    }

    /// Appends a movement.
    pub async fn insert(&self, store_id: &str, movement: &CashMovement) -> DbResult<()> {
        insert_movement(&self.pool, store_id, movement).await
    }

    /// Counts a store's movements.
    pub async fn count(&self, store_id: &str) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM movements WHERE store_id = ?1")
            .bind(store_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

/// Movement insert usable inside a transaction.
pub(crate) async fn insert_movement<'e, E>(
    executor: E,
    store_id: &str,
    movement: &CashMovement,
) -> DbResult<()>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    debug!(
        movement_id = %movement.id,
        shift_id = %movement.shift_id,
        movement_type = %movement.movement_type,
        amount = %movement.amount,
        "Appending movement"
    );

    sqlx::query(
        r#"
        INSERT INTO movements (
            id, store_id, shift_id, movement_type,
            amount_cents, description, timestamp
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        "#,
    )
    .bind(movement.id.as_str())
    .bind(store_id)
    .bind(movement.shift_id.as_str())
    .bind(movement.movement_type)
    .bind(movement.amount.cents())
    .bind(movement.description.as_str())
    .bind(movement.timestamp)
    .execute(executor)
    .await?;

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DbError;
    use crate::{Database, DbConfig};
    use chrono::TimeZone;
    use posgo_core::{CashShift, ShiftStatus};

    fn at(minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 9, minute, 0).unwrap()
    }

    fn movement(id: &str, kind: MovementType, minute: u32) -> CashMovement {
        CashMovement {
            id: id.to_string(),
            shift_id: "s-1".to_string(),
            movement_type: kind,
            amount: Money::from_cents(2_000),
            description: "compra de hielo".to_string(),
            timestamp: at(minute),
        }
    }

    async fn setup() -> Database {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let shift = CashShift {
            id: "s-1".to_string(),
            start_time: at(0),
            start_amount: Money::from_cents(10_000),
            end_time: None,
            end_amount: None,
            status: ShiftStatus::Open,
            total_sales_cash: Money::zero(),
            total_sales_digital: Money::zero(),
        };
        db.shifts().upsert("store-1", &shift).await.unwrap();
        db
    }

    #[tokio::test]
    async fn test_insert_and_list_order() {
        let db = setup().await;
        let repo = db.movements();

        repo.insert("store-1", &movement("m-1", MovementType::Open, 0))
            .await
            .unwrap();
        repo.insert("store-1", &movement("m-2", MovementType::Out, 5))
            .await
            .unwrap();
        repo.insert("store-1", &movement("m-3", MovementType::In, 5))
            .await
            .unwrap();

        let ids: Vec<String> = repo
            .list("store-1")
            .await
            .unwrap()
            .into_iter()
            .map(|m| m.id)
            .collect();
        assert_eq!(ids, vec!["m-3", "m-2", "m-1"]);

        let for_shift = repo.list_for_shift("store-1", "s-1").await.unwrap();
        assert_eq!(for_shift[0].movement_type, MovementType::Open);
        assert_eq!(for_shift[1].amount.cents(), 2_000);
        assert_eq!(repo.count("store-1").await.unwrap(), 3);
        assert_eq!(repo.count("store-2").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_duplicate_id_is_rejected() {
        let db = setup().await;
        let repo = db.movements();
        let m = movement("m-1", MovementType::In, 1);

        repo.insert("store-1", &m).await.unwrap();
        let err = repo.insert("store-1", &m).await.unwrap_err();

        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[tokio::test]
    async fn test_movement_needs_existing_shift() {
        let db = setup().await;
        let mut orphan = movement("m-9", MovementType::In, 1);
        orphan.shift_id = "missing".to_string();

        let err = db.movements().insert("store-1", &orphan).await.unwrap_err();
        assert!(matches!(err, DbError::ForeignKeyViolation { .. }));
    }

    #[tokio::test]
    async fn test_movements_cannot_be_changed() {
        let db = setup().await;
        db.movements()
            .insert("store-1", &movement("m-1", MovementType::Out, 1))
            .await
            .unwrap();

        let update = sqlx::query("UPDATE movements SET amount_cents = 1 WHERE id = 'm-1'")
            .execute(db.pool())
            .await;
        let delete = sqlx::query("DELETE FROM movements WHERE id = 'm-1'")
            .execute(db.pool())
            .await;

        assert!(update.is_err());
        assert!(delete.is_err());
        assert_eq!(db.movements().count("store-1").await.unwrap(), 1);
    }
}
