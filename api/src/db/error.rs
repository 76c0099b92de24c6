// Error types for database operations

use sea_orm::{DbErr, SqlErr};
use thiserror::Error;

/// Error types for database connection and query operations
#[derive(Debug, Error)]
pub enum DbError {
    /// Error occurred during database connection attempt
    #[error("Database connection error: {0}")]
    ConnectionError(String),

    /// Error occurred during database query execution
    #[error("Database query error: {0}")]
    QueryError(String),

    /// A unique index rejected the write
    #[error("Unique constraint violation: {0}")]
    UniqueViolation(String),

    /// A foreign key rejected the write or delete
    #[error("Foreign key constraint violation: {0}")]
    ForeignKeyViolation(String),
}

impl DbError {
    pub fn is_unique_violation(&self) -> bool {
        matches!(self, DbError::UniqueViolation(_))
    }
}

impl From<DbErr> for DbError {
    fn from(err: DbErr) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(msg)) => DbError::UniqueViolation(msg),
            Some(SqlErr::ForeignKeyConstraintViolation(msg)) => DbError::ForeignKeyViolation(msg),
            _ => match err {
                DbErr::Conn(e) => DbError::ConnectionError(e.to_string()),
                DbErr::ConnectionAcquire(e) => DbError::ConnectionError(e.to_string()),
                other => DbError::QueryError(other.to_string()),
            },
        }
    }
}
