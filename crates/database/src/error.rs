//! Database error types.

use extractor::Rejection;
use thiserror::Error;

/// Errors that can occur during database operations.
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// SQLx error (connection, query, etc.)
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    /// Migration error
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Record not found
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// A record in an insert batch failed the validity rule.
    #[error("record {index} is not storable: {reason}")]
    Invalid { index: usize, reason: Rejection },
}

/// Result type for database operations.
pub type Result<T> = std::result::Result<T, DatabaseError>;
