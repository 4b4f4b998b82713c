//! # Database Error Types
//!
//! Every repository method returns [`DbResult`]. Raw sqlx errors are
//! converted on the way out so callers match on domain categories, not on
//! SQLite message strings; `apps/api` then maps each category to an HTTP
//! status.
//!
//! The two checkout-specific variants ([`DbError::StockConflict`] and
//! [`DbError::SlotCapacity`]) are raised by the order repository itself,
//! inside the write transaction, when the re-verified state no longer
//! supports the order. Everything else comes out of the generic
//! `From<sqlx::Error>` mapping below.

use thiserror::Error;

/// Database operation errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// No row matched: unknown id, soft-deleted record, or a guarded
    /// UPDATE whose status predicate no longer held.
    #[error("{entity} not found: {id}")]
    NotFound {
        entity: String,
        id: String,
    },

    /// A UNIQUE index rejected the write (duplicate SKU, duplicate
    /// employee email, duplicate (branch, date, window) slot).
    #[error("Duplicate {field}: '{value}' already exists")]
    UniqueViolation {
        field: String,
        value: String,
    },

    /// A referenced row does not exist (product, branch, category, ...).
    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation {
        message: String,
    },

    /// Branch stock fell short while the checkout transaction was drawing
    /// batches. A concurrent order consumed them after the advisory
    /// pre-check read its numbers. The transaction rolls back whole.
    #[error("Insufficient stock for product {product_id}: {available} available, {requested} requested")]
    StockConflict {
        product_id: String,
        available: i64,
        requested: i64,
    },

    /// The delivery slot filled up between selection and booking.
    #[error("Delivery slot {slot_id} is fully booked")]
    SlotCapacity {
        slot_id: String,
    },

    /// Could not open the database (missing file that cannot be created,
    /// permissions, closed pool).
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// A statement failed for a reason other than the constraint
    /// categories above.
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// All pool connections were busy past the acquire timeout.
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

    pub fn duplicate(field: impl Into<String>, value: impl Into<String>) -> Self {
        DbError::UniqueViolation {
            field: field.into(),
            value: value.into(),
        }
    }
}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::NotFound {
                entity: "Record".to_string(),
                id: "unknown".to_string(),
            },

            sqlx::Error::Database(db_err) => {
                let msg = db_err.message();

                // SQLite spells its constraint failures out in the message:
                // "UNIQUE constraint failed: <table>.<column>" and
                // "FOREIGN KEY constraint failed".
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
