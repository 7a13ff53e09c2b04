//! Domain error taxonomy shared by every layer.
//!
//! The API crate maps each variant to an HTTP status in one place; nothing
//! below the handlers knows about HTTP.

use crate::types::DbId;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// A referenced record does not exist (or is soft-deleted).
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    /// Shape, constraint, or enum-value violation in the input.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// The record's current state forbids the operation.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// A status change that the transition table does not permit.
    #[error("Cannot move {entity} from '{from}' to '{to}'")]
    InvalidTransition {
        entity: &'static str,
        from: String,
        to: String,
    },

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Role or ownership check failed.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<validator::ValidationErrors> for CoreError {
    fn from(errors: validator::ValidationErrors) -> Self {
        CoreError::Validation(errors.to_string())
    }
}
