//! Persistence ports consumed by the workflow service.

use async_trait::async_trait;

use crate::audit::{AuditEntry, AuditPage, NewAuditEntry, PageRequest};
use crate::error::CoreError;
use crate::issue::{Issue, IssueFilter, NewIssue, User};
use crate::types::DbId;

/// Errors returned by an [`IssueStore`] or [`UserDirectory`] backend.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The stored issue no longer has the version the write expected.
    #[error("concurrent conflict on issue {issue_id}: expected version {expected_version}")]
    Conflict { issue_id: DbId, expected_version: i64 },

    #[error("issue not found: {issue_id}")]
    NotFound { issue_id: DbId },

    /// Connection, query, or serialization failure inside the backend.
    #[error("storage backend error: {0}")]
    Backend(String),
}

impl From<StorageError> for CoreError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Conflict { .. } => CoreError::Conflict(
                "Issue was modified concurrently; reload and retry".to_string(),
            ),
            StorageError::NotFound { issue_id } => CoreError::NotFound {
                entity: "issue",
                id: issue_id,
            },
            StorageError::Backend(msg) => CoreError::Storage(msg),
        }
    }
}

/// Issue records and their append-only audit trail.
///
/// ## Atomicity
///
/// Every mutating method writes the issue and its audit entry together: either
/// both are durable when the call returns `Ok`, or neither is.
///
/// ## Optimistic concurrency
///
/// `update_issue` and `delete_issue` only apply when the stored `version`
/// equals the expected one, otherwise they fail with
/// [`StorageError::Conflict`] and write nothing.
#[async_trait]
pub trait IssueStore: Send + Sync + 'static {
    /// Cheap reachability probe for health checks.
    async fn ping(&self) -> Result<(), StorageError>;

    async fn find_issue(&self, id: DbId) -> Result<Option<Issue>, StorageError>;

    /// Issues matching `filter`, newest first.
    async fn list_issues(&self, filter: &IssueFilter) -> Result<Vec<Issue>, StorageError>;

    /// Insert a new issue at version 1 and append its `CREATE` entry.
    async fn insert_issue(&self, new: &NewIssue, performed_by: DbId)
        -> Result<Issue, StorageError>;

    /// Persist `issue` (expected at `issue.version`) and append `audit`.
    ///
    /// Returns the stored issue with `version` incremented and `updated_at`
    /// set to the write time.
    async fn update_issue(&self, issue: &Issue, audit: &NewAuditEntry)
        -> Result<Issue, StorageError>;

    /// Delete the issue and append `audit`. The trail outlives the issue.
    async fn delete_issue(
        &self,
        id: DbId,
        expected_version: i64,
        audit: &NewAuditEntry,
    ) -> Result<(), StorageError>;

    /// The audit log of every issue, newest first.
    async fn list_audit_entries(&self, page: PageRequest) -> Result<AuditPage, StorageError>;

    /// One issue's audit trail, newest first. Works for deleted issues.
    async fn audit_entries_for_issue(&self, issue_id: DbId)
        -> Result<Vec<AuditEntry>, StorageError>;
}

/// Read-only lookup of users, used for assignment targets and snapshots.
#[async_trait]
pub trait UserDirectory: Send + Sync + 'static {
    async fn find_user(&self, id: DbId) -> Result<Option<User>, StorageError>;
}
