//! Domain errors, mapped to HTTP statuses by the API layer.

use crate::types::DbId;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("{entity} with id {id} not found")]
    NotFound { entity: &'static str, id: DbId },

    /// Input breaks a business rule; maps to 400.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// The request clashes with current state (a taken seat, an overlapping
    /// screening, a booking already cancelled); maps to 409.
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),
}
