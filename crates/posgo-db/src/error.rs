//! # Database Errors
//!
//! Everything the persistence layer can fail with, sorted by what the
//! register should do about it.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  sqlx::Error ──► DbError ──► ApiError (register) ──► JSON on stderr     │
//! │                                                                         │
//! │  refused by the store        UniqueViolation, ForeignKeyViolation,      │
//! │  (is_constraint)             Immutable                                  │
//! │                                                                         │
//! │  store not reachable         ConnectionFailed, PoolExhausted,           │
//! │                              Unavailable, TransactionFailed             │
//! │                                                                         │
//! │  anything else               QueryFailed, MigrationFailed,              │
//! │                              Serialization, NotFound, Internal          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use sqlx::error::{DatabaseError, ErrorKind};
use thiserror::Error;

/// Raised by `trg_shifts_closed_immutable`.
const CLOSED_SHIFT_TRIGGER: &str = "closed shifts are immutable";

/// Raised by the triggers guarding the movement journal.
const APPEND_ONLY_TRIGGER: &str = "movements are append-only";

#[derive(Debug, Error)]
pub enum DbError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// `field` is the `table.column` SQLite names, e.g. `shifts.store_id`
    /// when a store already has an OPEN shift.
    #[error("Duplicate {field}: '{value}' already exists")]
    UniqueViolation { field: String, value: String },

    /// A movement or sale pointing at a shift that was never written.
    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// The row is final: a CLOSED shift, or a movement already journaled.
    #[error("{entity} {id} is closed and cannot be modified")]
    Immutable { entity: String, id: String },

    /// Cart lines or split payments could not be encoded to JSON.
    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    #[error("Connection pool exhausted")]
    PoolExhausted,

    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    pub fn immutable(entity: impl Into<String>, id: impl Into<String>) -> Self {
        DbError::Immutable {
            entity: entity.into(),
            id: id.into(),
        }
    }

    pub fn duplicate(field: impl Into<String>, value: impl Into<String>) -> Self {
        DbError::UniqueViolation {
            field: field.into(),
            value: value.into(),
        }
    }

    /// True when the write reached the store and was refused. False when
    /// the store itself could not be used.
    pub fn is_constraint(&self) -> bool {
        matches!(
            self,
            DbError::UniqueViolation { .. }
                | DbError::ForeignKeyViolation { .. }
                | DbError::Immutable { .. }
        )
    }

    /// Sorts an error reported by SQLite itself.
    fn from_database(err: &dyn DatabaseError) -> Self {
        let message = err.message();

        match err.kind() {
            ErrorKind::UniqueViolation => {
                // "UNIQUE constraint failed: shifts.store_id"
                let field = message
                    .rsplit_once(": ")
                    .map_or("unknown", |(_, columns)| columns);
                DbError::duplicate(field, "unknown")
            }
            ErrorKind::ForeignKeyViolation => DbError::ForeignKeyViolation {
                message: message.to_string(),
            },
            _ if message.contains(CLOSED_SHIFT_TRIGGER) => DbError::immutable("Shift", "unknown"),
            _ if message.contains(APPEND_ONLY_TRIGGER) => {
                DbError::immutable("Movement", "unknown")
            }
            _ => DbError::QueryFailed(message.to_string()),
        }
    }
}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::not_found("Record", "unknown"),
            sqlx::Error::Database(db_err) => DbError::from_database(db_err.as_ref()),
            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,
            sqlx::Error::PoolClosed => DbError::ConnectionFailed("pool is closed".to_string()),
            sqlx::Error::Io(e) => DbError::Unavailable(e.to_string()),
            other => DbError::Internal(other.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

pub type DbResult<T> = Result<T, DbError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(
            DbError::not_found("Shift", "s-1").to_string(),
            "Shift not found: s-1"
        );
        assert_eq!(
            DbError::immutable("Shift", "s-1").to_string(),
            "Shift s-1 is closed and cannot be modified"
        );
        assert_eq!(
            DbError::duplicate("movements.id", "m-1").to_string(),
            "Duplicate movements.id: 'm-1' already exists"
        );
    }

    #[test]
    fn test_constraint_classification() {
        assert!(DbError::duplicate("shifts.store_id", "store-1").is_constraint());
        assert!(DbError::immutable("Shift", "s-1").is_constraint());
        assert!(!DbError::Unavailable("timeout".into()).is_constraint());
        assert!(!DbError::PoolExhausted.is_constraint());
    }

    #[test]
    fn test_row_not_found_maps_to_not_found() {
        let err = DbError::from(sqlx::Error::RowNotFound);
        assert!(matches!(err, DbError::NotFound { .. }));
    }
}
