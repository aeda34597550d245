//! Error types surfaced by user document writes and lookups

use common::error::DatabaseError;
use thiserror::Error;
use uuid::Uuid;

use crate::validation::ValidationError;

/// Errors returned by the user model and its stores
#[derive(Error, Debug)]
pub enum UserError {
    /// The document violates the declared shape
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A unique field already holds this value in another document
    #[error("Duplicate key: {field} \"{value}\" already exists")]
    Duplicate { field: &'static str, value: String },

    /// No user with this id
    #[error("User {0} not found")]
    NotFound(Uuid),

    /// No message at this position in the user's list
    #[error("Message {index} not found")]
    MessageNotFound { index: usize },

    /// Storage failure
    #[error(transparent)]
    Database(#[from] DatabaseError),

    /// Stored document could not be encoded or decoded
    #[error("Document serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Type alias for user operation results
pub type UserResult<T> = Result<T, UserError>;
