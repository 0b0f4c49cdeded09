//! Error types for the database client

use thiserror::Error;
use vacationstay_common::VacationStayError;

/// Errors that can occur when working with the database client
#[derive(Debug, Error)]
pub enum DbError {
    /// Error from SQLx
    #[error("Database error: {0}")]
    SqlxError(#[from] sqlx::Error),

    /// Error with the database configuration
    #[error("Database configuration error: {0}")]
    ConfigError(String),

    /// Error with database URL parsing
    #[error("Database URL error: {0}")]
    UrlError(String),

    /// Error with database pool creation
    #[error("Database pool error: {0}")]
    PoolError(String),

    /// Error with database query
    #[error("Database query error: {0}")]
    QueryError(String),

    /// Error with database transaction
    #[error("Database transaction error: {0}")]
    TransactionError(String),

    /// A stored value could not be turned back into a model
    #[error("Corrupt row in {table}: {message}")]
    DecodeError { table: &'static str, message: String },

    /// A lock could not be taken before the busy timeout
    #[error("Database busy: {0}")]
    Busy(String),

    /// Unique constraint violated
    #[error("{0}")]
    Conflict(String),

    /// Row expected but missing
    #[error("{0}")]
    NotFound(String),
}

impl From<DbError> for VacationStayError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::Conflict(msg) => VacationStayError::ConflictError(msg),
            DbError::NotFound(msg) => VacationStayError::NotFoundError(msg),
            DbError::ConfigError(msg) => VacationStayError::ConfigError(msg),
            DbError::Busy(_) => VacationStayError::ConflictError(
                "These records are being changed by another request, please try again".to_string(),
            ),
            other => VacationStayError::DatabaseError(other.to_string()),
        }
    }
}

/// SQLite `BUSY`/`LOCKED` (with their extended codes) and PostgreSQL
/// serialization, deadlock and lock-not-available codes.
const LOCK_CODES: &[&str] = &["5", "6", "261", "262", "517", "40001", "40P01", "55P03"];

/// Lock contention becomes [`DbError::Busy`], anything else a query error.
pub(crate) fn map_lock_error(e: sqlx::Error) -> DbError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err
            .code()
            .is_some_and(|code| LOCK_CODES.contains(&&*code))
        {
            return DbError::Busy(db_err.message().to_string());
        }
    }
    DbError::QueryError(e.to_string())
}
