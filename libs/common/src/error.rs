//! Custom error types for the common library
//!
//! This module defines the storage error taxonomy shared by every crate that
//! talks to the document database.

use sqlx::Error as SqlxError;
use thiserror::Error;

/// Custom error type for database operations
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Error occurred during database connection
    #[error("Database connection error: {0}")]
    Connection(#[source] SqlxError),

    /// Error occurred during database query execution
    #[error("Database query error: {0}")]
    Query(#[source] SqlxError),

    /// Error occurred while creating collections or indexes
    #[error("Database migration error: {0}")]
    Migration(String),

    /// Configuration error
    #[error("Database configuration error: {0}")]
    Configuration(String),
}

impl DatabaseError {
    /// Returns the name of the violated unique constraint, if this error is one.
    pub fn unique_violation(&self) -> Option<&str> {
        match self {
            DatabaseError::Query(SqlxError::Database(db_err)) if db_err.is_unique_violation() => {
                db_err.constraint()
            }
            _ => None,
        }
    }
}

/// Type alias for Result with DatabaseError
pub type DatabaseResult<T> = Result<T, DatabaseError>;
