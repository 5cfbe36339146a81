//! # Database Error Types
//!
//! Error types for database operations and engine failures.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  SQLite Error (sqlx::Error)                                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  DbError (this module) ← Adds context and categorization               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  LedgerError (this module) ← Engine outcome: the WHOLE operation       │
//! │       │                       failed and was rolled back               │
//! │       ▼                                                                 │
//! │  Caller (POS, transfer UI) decides whether to resubmit                 │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

use stocklot_core::CoreError;

// =============================================================================
// Database Error
// =============================================================================

/// Database operation errors.
///
/// These errors wrap sqlx errors and provide additional context
/// for debugging and user feedback.
#[derive(Debug, Error)]
pub enum DbError {
    /// Entity not found in database.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Unique constraint violation.
    #[error("Duplicate {field}: '{value}' already exists")]
    UniqueViolation { field: String, value: String },

    /// Foreign key constraint violation.
    ///
    /// ## When This Occurs
    /// - A movement references a batch that doesn't exist
    /// - A transfer detail references a missing line
    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    /// CHECK constraint violation.
    ///
    /// The schema re-asserts the core invariants (quantity > 0,
    /// 0 <= available <= quantity); tripping one here means a bug upstream.
    #[error("Check constraint violation: {message}")]
    CheckViolation { message: String },

    /// Database connection failed.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Migration failed.
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// Query execution failed.
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Pool exhausted (all connections in use).
    #[error("Connection pool exhausted")]
    PoolExhausted,

    /// Internal database error.
    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }
}

/// Convert sqlx errors to DbError.
///
/// ## Error Mapping
/// ```text
/// sqlx::Error::RowNotFound    → DbError::NotFound
/// sqlx::Error::Database       → Analyze message for constraint type
/// sqlx::Error::PoolTimedOut   → DbError::PoolExhausted
/// Other                       → DbError::Internal
/// ```
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::NotFound {
                entity: "Record".to_string(),
                id: "unknown".to_string(),
            },

            sqlx::Error::Database(db_err) => {
                let msg = db_err.message();

                // SQLite constraint messages:
                // "UNIQUE constraint failed: <table>.<column>"
                // "FOREIGN KEY constraint failed"
                // "CHECK constraint failed: <table>"
                if msg.contains("UNIQUE constraint failed") {
                    let field = msg
                        .split("UNIQUE constraint failed: ")
                        .nth(1)
                        .unwrap_or("unknown")
                        .to_string();
                    DbError::UniqueViolation {
                        field,
                        value: "unknown".to_string(),
                    }
                } else if msg.contains("FOREIGN KEY constraint failed") {
                    DbError::ForeignKeyViolation {
                        message: msg.to_string(),
                    }
                } else if msg.contains("CHECK constraint failed") {
                    DbError::CheckViolation {
                        message: msg.to_string(),
                    }
                } else {
                    DbError::QueryFailed(msg.to_string())
                }
            }

            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,

            sqlx::Error::PoolClosed => DbError::ConnectionFailed("Pool is closed".to_string()),

            _ => DbError::Internal(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;

// =============================================================================
// Ledger Error
// =============================================================================

/// Engine-level failures.
///
/// Any `LedgerError` means the whole logical operation (one consume, one
/// transfer, one receipt) was aborted: either nothing was committed, or the
/// transaction it ran in was rolled back. There is never a partial outcome,
/// and the engines never retry on their own - resubmission is a caller
/// decision.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Domain rule violation (insufficient stock, invalid transfer,
    /// validation failure). Nothing was mutated.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A batch debit's precondition no longer held when the write was
    /// attempted: another writer drained the batch between the availability
    /// read and the guarded decrement. The operation was rolled back.
    #[error("Concurrent modification of batch {batch_id}; operation rolled back")]
    ConcurrencyConflict { batch_id: i64 },

    /// The movement ledger insert failed after a successful batch debit.
    /// Fatal to the operation: the debit was rolled back so batch state and
    /// ledger never diverge.
    #[error("Movement ledger write failed: {0}")]
    LedgerWriteFailure(DbError),

    /// Underlying database failure.
    #[error(transparent)]
    Db(#[from] DbError),
}

/// Result type for engine operations.
pub type LedgerResult<T> = Result<T, LedgerError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insufficient_stock_passes_through() {
        let err: LedgerError = CoreError::InsufficientStock {
            product_id: 10,
            location_id: 1,
            available: 3,
            requested: 5,
        }
        .into();
        assert!(matches!(
            err,
            LedgerError::Core(CoreError::InsufficientStock { .. })
        ));
    }

    #[test]
    fn test_conflict_message_names_batch() {
        let err = LedgerError::ConcurrencyConflict { batch_id: 42 };
        assert_eq!(
            err.to_string(),
            "Concurrent modification of batch 42; operation rolled back"
        );
    }
}
