//! # API Error Type
//!
//! Unified error type for register commands.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in PosGo                                  │
//! │                                                                         │
//! │  CLI                         Rust Backend                               │
//! │  ───                         ────────────                               │
//! │                                                                         │
//! │  posgo cash-out 50 "hielo"                                              │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │  Command Function                                                │  │
//! │  │  Result<T, ApiError>                                             │  │
//! │  │         │                                                        │  │
//! │  │         ▼                                                        │  │
//! │  │  Rule broken? ──── CoreError::NoActiveShift ─────┐              │  │
//! │  │         │          (before any I/O)              │              │  │
//! │  │         ▼                                        ▼              │  │
//! │  │  Write failed? ─── DbError::Unavailable ──────► ApiError ──────►│  │
//! │  │         │          (optimistic state kept)                       │  │
//! │  │         ▼                                                        │  │
//! │  │  Success ──────────────────────────────────────────────────────►│  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! │                                                                         │
//! │  stderr: {"code":"BUSINESS_LOGIC","message":"No active shift: ..."}    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every command returns `Result<T, ApiError>`; the binary prints the error
//! as JSON with a machine-readable `code` and a human-readable `message`.

use serde::Serialize;

use crate::state::{ConfigError, SessionError};
use posgo_core::{CoreError, ValidationError};
use posgo_db::DbError;

/// API error returned from register commands.
///
/// ## Serialization
/// ```json
/// {
///   "code": "PERSISTENCE_ERROR",
///   "message": "Could not save to the store; data was reloaded"
/// }
/// ```
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    pub code: ErrorCode,
    /// Shown to the cashier as is.
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Record not found
    NotFound,

    /// Input validation failed (bad amount, over-long description)
    ValidationError,

    /// Local database failed (connection, migration, query)
    DatabaseError,

    /// A write or read against the store failed at runtime
    PersistenceError,

    /// A cash rule refused the action (no open shift, already open, ...)
    BusinessLogic,

    /// Session file or login problem
    SessionError,

    /// Internal error
    Internal,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    pub fn not_found(resource: &str, id: &str) -> Self {
        ApiError::new(
            ErrorCode::NotFound,
            format!("{} not found: {}", resource, id),
        )
    }

    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }

    pub fn business(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::BusinessLogic, message)
    }

    pub fn session(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::SessionError, message)
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Internal, message)
    }
}

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        use tracing::error;

        match err {
            DbError::NotFound { entity, id } => ApiError::not_found(&entity, &id),

            // Refused by the store: the cashier can act on these.
            DbError::UniqueViolation { field, .. } if field == "shifts.store_id" => {
                ApiError::business("A shift is already open for this store")
            }
            DbError::UniqueViolation { field, value } => {
                ApiError::business(format!("{} {} is already recorded", field, value))
            }
            DbError::Immutable { entity, id } => {
                ApiError::business(format!("{} {} is final", entity, id))
            }
            DbError::ForeignKeyViolation { message } => {
                error!(%message, "Write referenced a missing shift");
                ApiError::business("Record refers to a shift that does not exist")
            }

            // The write never landed; local state has been reloaded.
            DbError::Unavailable(reason) => {
                error!(%reason, "Cash store unreachable");
                ApiError::new(
                    ErrorCode::PersistenceError,
                    format!("Store unavailable: {}", reason),
                )
            }
            e @ (DbError::TransactionFailed(_) | DbError::Serialization(_)) => {
                error!(error = %e, "Cash action not saved");
                ApiError::new(ErrorCode::PersistenceError, "Could not save the cash action")
            }

            // Local database trouble: log the detail, show a short message.
            e => {
                error!(error = %e, "Database failure");
                let message = match e {
                    DbError::ConnectionFailed(_) => "Could not open the database",
                    DbError::MigrationFailed(_) => "Could not upgrade the database",
                    DbError::PoolExhausted => "Database is busy",
                    _ => "Database operation failed",
                };
                ApiError::new(ErrorCode::DatabaseError, message)
            }
        }
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Validation(e) => ApiError::from(e),
            CoreError::DuplicateMovement { movement_id } => {
                tracing::error!(%movement_id, "Duplicate movement in working copy");
                ApiError::internal(format!("Movement {} is already recorded", movement_id))
            }
            other @ (CoreError::ShiftAlreadyOpen { .. }
            | CoreError::NoActiveShift { .. }
            | CoreError::ShiftClosed { .. }
            | CoreError::NegativeDrawer { .. }) => ApiError::business(other.to_string()),
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::validation(err.to_string())
    }
}

impl From<ConfigError> for ApiError {
    fn from(err: ConfigError) -> Self {
        ApiError::validation(format!("Invalid configuration: {}", err))
    }
}

impl From<SessionError> for ApiError {
    fn from(err: SessionError) -> Self {
        tracing::error!("Session store failed: {}", err);
        ApiError::session(err.to_string())
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

#[cfg(test)]
mod tests {
    use super::*;
    use posgo_core::MovementType;

    #[test]
    fn test_rule_errors_are_business_logic() {
        let err = ApiError::from(CoreError::NoActiveShift {
            action: MovementType::Out,
        });
        assert_eq!(err.code, ErrorCode::BusinessLogic);
        assert_eq!(err.message, "No active shift: cannot record OUT");
    }

    #[test]
    fn test_validation_errors_keep_their_message() {
        let err = ApiError::from(CoreError::from(ValidationError::Negative {
            field: "amount".to_string(),
        }));
        assert_eq!(err.code, ErrorCode::ValidationError);
        assert_eq!(err.message, "amount must not be negative");
    }

    #[test]
    fn test_second_open_shift_constraint() {
        let err = ApiError::from(DbError::duplicate("shifts.store_id", "store-1"));
        assert_eq!(err.code, ErrorCode::BusinessLogic);
    }

    #[test]
    fn test_outage_is_persistence_error() {
        let err = ApiError::from(DbError::Unavailable("timeout".to_string()));
        assert_eq!(err.code, ErrorCode::PersistenceError);
    }

    #[test]
    fn test_serializes_screaming_code() {
        let json = serde_json::to_value(ApiError::session("not logged in")).unwrap();
        assert_eq!(json["code"], "SESSION_ERROR");
        assert_eq!(json["message"], "not logged in");
    }
}
