//! Cross-cutting error types for Campus.
//!
//! Domain-specific errors (e.g., `DatabaseError`, `ConfigError`) are defined in
//! their respective crates. The HTTP layer converges all of them into its own
//! response error.

use thiserror::Error;

/// Errors that can be raised by any Campus crate.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Entity lookup returned no result.
    #[error("{entity_type} not found: {id}")]
    NotFound { entity_type: String, id: String },

    /// A state machine transition was attempted that is not allowed.
    #[error("Invalid state transition: {entity_type} {id} from {from} to {to}")]
    InvalidTransition {
        entity_type: String,
        id: String,
        from: String,
        to: String,
    },

    /// Input failed one or more validation rules.
    #[error("Validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),

    /// A seat or capacity limit would be exceeded.
    #[error("{0}")]
    CapacityExceeded(String),

    /// The caller's role does not permit the action.
    #[error("{0}")]
    Forbidden(String),

    /// Catch-all for unexpected errors.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_message_joins_rules() {
        let err = CoreError::Validation(vec![
            "Course ID is required".into(),
            "Trainer ID is required".into(),
        ]);
        assert_eq!(
            err.to_string(),
            "Validation failed: Course ID is required; Trainer ID is required"
        );
    }

    #[test]
    fn capacity_message_is_verbatim() {
        let err = CoreError::CapacityExceeded("Batch is full".into());
        assert_eq!(err.to_string(), "Batch is full");
    }
}
