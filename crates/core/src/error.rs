use crate::issue::IssueStatus;
use crate::types::DbId;

/// Domain error taxonomy for the issue workflow.
///
/// Every variant carries enough context for a caller to render a specific
/// message. None of these are retried inside the core.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    #[error("Validation failed: {0}")]
    Validation(String),

    /// Missing or invalid credentials (the caller is not identified).
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// The caller is identified but a role or ownership rule denies the change.
    #[error("Not authorized: {0}")]
    NotAuthorized(String),

    #[error("Invalid status transition from {from} to {to}")]
    InvalidTransition { from: IssueStatus, to: IssueStatus },

    #[error("Assignment conflict: {0}")]
    AssignmentConflict(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// The issue changed between load and write (optimistic check failed).
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Storage failure: {0}")]
    Storage(String),
}
