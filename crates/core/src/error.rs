use crate::types::DbId;

/// Domain error taxonomy shared by the store and HTTP layers.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    #[error("Validation failed: {0}")]
    Validation(String),

    /// Nothing left to show this viewer. Expected, not a failure.
    #[error("No eligible content")]
    NoEligibleContent,

    /// Rejected before any mutation took place.
    #[error("Invalid merge request: {0}")]
    InvalidMergeRequest(String),

    /// Safe to retry the whole operation from scratch.
    #[error("Transaction conflict: {0}")]
    TransactionConflict(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Internal error: {0}")]
    Internal(String),
}
