//! Database error types for campus-db.

use campus_core::errors::CoreError;
use thiserror::Error;

/// Errors from database operations.
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// A SQL query failed or returned unparseable data.
    #[error("Query failed: {0}")]
    Query(String),

    /// Schema migration failed.
    #[error("Migration failed: {0}")]
    Migration(String),

    /// Expected a result row but none was returned.
    #[error("No result returned")]
    NoResult,

    /// The operation does not apply to the entity in its current state.
    #[error("{0}")]
    InvalidState(String),

    /// A uniqueness rule was violated (duplicate email, slug, enrollment).
    #[error("{0}")]
    Conflict(String),

    /// Input failed one or more record-level rules.
    #[error("Validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),

    /// Underlying libSQL error.
    #[error("libSQL error: {0}")]
    LibSql(#[from] libsql::Error),

    /// Domain error raised by a core rule (not found, capacity, transition).
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Catch-all for unexpected errors.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl DatabaseError {
    /// Shorthand for a `CoreError::NotFound` wrapped as a database error.
    pub fn not_found(entity_type: &str, id: &str) -> Self {
        Self::Core(CoreError::NotFound {
            entity_type: entity_type.to_string(),
            id: id.to_string(),
        })
    }

    /// Shorthand for a capacity failure with a verbatim message.
    pub fn capacity(message: impl Into<String>) -> Self {
        Self::Core(CoreError::CapacityExceeded(message.into()))
    }
}

impl From<serde_json::Error> for DatabaseError {
    fn from(e: serde_json::Error) -> Self {
        Self::Other(e.into())
    }
}
