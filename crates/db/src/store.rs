//! PostgreSQL adapters for the workflow persistence ports.

use async_trait::async_trait;
use tracker_core::audit::{AuditEntry, AuditPage, NewAuditEntry, PageRequest, Pagination};
use tracker_core::issue::{Issue, IssueFilter, NewIssue, User};
use tracker_core::store::{IssueStore, StorageError, UserDirectory};
use tracker_core::types::DbId;

use crate::models::audit::changes_to_json;
use crate::repositories::{AuditLogRepo, IssueRepo, UserRepo};
use crate::DbPool;

fn backend(err: sqlx::Error) -> StorageError {
    StorageError::Backend(err.to_string())
}

/// [`IssueStore`] over the `issues` and `issue_audit_logs` tables.
///
/// Each mutation runs in one transaction: the versioned issue write and the
/// audit insert commit together or not at all.
#[derive(Clone)]
pub struct PgIssueStore {
    pool: DbPool,
}

impl PgIssueStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Tell a lost optimistic race apart from a concurrently deleted row.
    async fn missed_write(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        issue_id: DbId,
        expected_version: i64,
    ) -> StorageError {
        match IssueRepo::exists(tx, issue_id).await {
            Ok(true) => {
                tracing::warn!(issue_id, expected_version, "Optimistic concurrency conflict");
                StorageError::Conflict {
                    issue_id,
                    expected_version,
                }
            }
            Ok(false) => StorageError::NotFound { issue_id },
            Err(err) => backend(err),
        }
    }
}

#[async_trait]
impl IssueStore for PgIssueStore {
    async fn ping(&self) -> Result<(), StorageError> {
        crate::health_check(&self.pool).await.map_err(backend)
    }

    async fn find_issue(&self, id: DbId) -> Result<Option<Issue>, StorageError> {
        IssueRepo::find_by_id(&self.pool, id)
            .await
            .map_err(backend)?
            .map(Issue::try_from)
            .transpose()
    }

    async fn list_issues(&self, filter: &IssueFilter) -> Result<Vec<Issue>, StorageError> {
        IssueRepo::list(&self.pool, filter)
            .await
            .map_err(backend)?
            .into_iter()
            .map(Issue::try_from)
            .collect()
    }

    async fn insert_issue(
        &self,
        new: &NewIssue,
        performed_by: DbId,
    ) -> Result<Issue, StorageError> {
        let audit = NewAuditEntry::create(performed_by);
        let changes = changes_to_json(&audit.changes)?;

        let mut tx = self.pool.begin().await.map_err(backend)?;
        let row = IssueRepo::insert(&mut tx, new).await.map_err(backend)?;
        AuditLogRepo::insert(&mut tx, row.id, audit.action.as_str(), performed_by, &changes)
            .await
            .map_err(backend)?;
        tx.commit().await.map_err(backend)?;

        Issue::try_from(row)
    }

    async fn update_issue(
        &self,
        issue: &Issue,
        audit: &NewAuditEntry,
    ) -> Result<Issue, StorageError> {
        let changes = changes_to_json(&audit.changes)?;

        let mut tx = self.pool.begin().await.map_err(backend)?;
        let Some(row) = IssueRepo::update_versioned(&mut tx, issue)
            .await
            .map_err(backend)?
        else {
            return Err(Self::missed_write(&mut tx, issue.id, issue.version).await);
        };
        AuditLogRepo::insert(
            &mut tx,
            issue.id,
            audit.action.as_str(),
            audit.performed_by,
            &changes,
        )
        .await
        .map_err(backend)?;
        tx.commit().await.map_err(backend)?;

        Issue::try_from(row)
    }

    async fn delete_issue(
        &self,
        id: DbId,
        expected_version: i64,
        audit: &NewAuditEntry,
    ) -> Result<(), StorageError> {
        let changes = changes_to_json(&audit.changes)?;

        let mut tx = self.pool.begin().await.map_err(backend)?;
        if !IssueRepo::delete_versioned(&mut tx, id, expected_version)
            .await
            .map_err(backend)?
        {
            return Err(Self::missed_write(&mut tx, id, expected_version).await);
        }
        AuditLogRepo::insert(&mut tx, id, audit.action.as_str(), audit.performed_by, &changes)
            .await
            .map_err(backend)?;
        tx.commit().await.map_err(backend)?;
        Ok(())
    }

    async fn list_audit_entries(&self, page: PageRequest) -> Result<AuditPage, StorageError> {
        let rows = AuditLogRepo::list_page(&self.pool, page.limit, page.offset())
            .await
            .map_err(backend)?;
        let total = AuditLogRepo::count(&self.pool).await.map_err(backend)?;

        let items = rows
            .into_iter()
            .map(AuditEntry::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(AuditPage {
            items,
            pagination: Pagination::new(page, total),
        })
    }

    async fn audit_entries_for_issue(
        &self,
        issue_id: DbId,
    ) -> Result<Vec<AuditEntry>, StorageError> {
        AuditLogRepo::list_for_issue(&self.pool, issue_id)
            .await
            .map_err(backend)?
            .into_iter()
            .map(AuditEntry::try_from)
            .collect()
    }
}

/// [`UserDirectory`] over the `users` table.
#[derive(Clone)]
pub struct PgUserDirectory {
    pool: DbPool,
}

impl PgUserDirectory {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserDirectory for PgUserDirectory {
    async fn find_user(&self, id: DbId) -> Result<Option<User>, StorageError> {
        UserRepo::find_by_id(&self.pool, id)
            .await
            .map_err(backend)?
            .map(User::try_from)
            .transpose()
    }
}
