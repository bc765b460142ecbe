//! In-process implementation of the persistence ports.
//!
//! Used by tests and for running the service without a database. A single
//! write lock makes every issue write and its audit append one atomic step.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::audit::{AuditEntry, AuditPage, NewAuditEntry, PageRequest, Pagination};
use crate::issue::{Assignment, Issue, IssueFilter, IssueStatus, NewIssue, User};
use crate::store::{IssueStore, StorageError, UserDirectory};
use crate::types::{DbId, Timestamp};

#[derive(Default)]
struct Inner {
    issues: BTreeMap<DbId, Issue>,
    audit: Vec<AuditEntry>,
    users: HashMap<DbId, User>,
    next_issue_id: DbId,
    next_audit_id: DbId,
}

impl Inner {
    /// Now, but never earlier than the last entry written for `issue_id`.
    fn audit_time(&self, issue_id: DbId) -> Timestamp {
        let now = Utc::now();
        self.audit
            .iter()
            .rev()
            .find(|entry| entry.issue_id == issue_id)
            .map_or(now, |last| now.max(last.timestamp))
    }

    fn append(&mut self, issue_id: DbId, entry: &NewAuditEntry, timestamp: Timestamp) {
        self.next_audit_id += 1;
        self.audit.push(AuditEntry {
            id: self.next_audit_id,
            issue_id,
            action: entry.action,
            performed_by: entry.performed_by,
            changes: entry.changes.clone(),
            timestamp,
        });
    }

    fn check_version(&self, issue_id: DbId, expected_version: i64) -> Result<(), StorageError> {
        match self.issues.get(&issue_id) {
            None => Err(StorageError::NotFound { issue_id }),
            Some(stored) if stored.version != expected_version => Err(StorageError::Conflict {
                issue_id,
                expected_version,
            }),
            Some(_) => Ok(()),
        }
    }
}

/// Map-backed [`IssueStore`] and [`UserDirectory`].
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed users in one call.
    pub fn with_users(users: impl IntoIterator<Item = User>) -> Self {
        let users = users.into_iter().map(|user| (user.id, user)).collect();
        Self {
            inner: RwLock::new(Inner {
                users,
                ..Default::default()
            }),
        }
    }

    pub async fn add_user(&self, user: User) {
        self.inner.write().await.users.insert(user.id, user);
    }
}

#[async_trait]
impl IssueStore for MemoryStore {
    async fn ping(&self) -> Result<(), StorageError> {
        Ok(())
    }

    async fn find_issue(&self, id: DbId) -> Result<Option<Issue>, StorageError> {
        Ok(self.inner.read().await.issues.get(&id).cloned())
    }

    async fn list_issues(&self, filter: &IssueFilter) -> Result<Vec<Issue>, StorageError> {
        let inner = self.inner.read().await;
        let mut issues: Vec<Issue> = inner
            .issues
            .values()
            .filter(|issue| filter.matches(issue))
            .cloned()
            .collect();
        issues.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(issues)
    }

    async fn insert_issue(
        &self,
        new: &NewIssue,
        performed_by: DbId,
    ) -> Result<Issue, StorageError> {
        let mut inner = self.inner.write().await;
        inner.next_issue_id += 1;
        let now = Utc::now();
        let issue = Issue {
            id: inner.next_issue_id,
            title: new.title.clone(),
            description: new.description.clone(),
            status: IssueStatus::Open,
            priority: new.priority,
            reporter: new.reporter,
            assignment: Assignment::Unassigned,
            version: 1,
            created_at: now,
            updated_at: now,
        };
        inner.issues.insert(issue.id, issue.clone());
        inner.append(issue.id, &NewAuditEntry::create(performed_by), now);
        Ok(issue)
    }

    async fn update_issue(
        &self,
        issue: &Issue,
        audit: &NewAuditEntry,
    ) -> Result<Issue, StorageError> {
        let mut inner = self.inner.write().await;
        inner.check_version(issue.id, issue.version)?;

        let now = inner.audit_time(issue.id);
        let mut stored = issue.clone();
        stored.version += 1;
        stored.updated_at = now;
        inner.issues.insert(stored.id, stored.clone());
        inner.append(stored.id, audit, now);
        Ok(stored)
    }

    async fn delete_issue(
        &self,
        id: DbId,
        expected_version: i64,
        audit: &NewAuditEntry,
    ) -> Result<(), StorageError> {
        let mut inner = self.inner.write().await;
        inner.check_version(id, expected_version)?;

        let now = inner.audit_time(id);
        inner.issues.remove(&id);
        inner.append(id, audit, now);
        Ok(())
    }

    async fn list_audit_entries(&self, page: PageRequest) -> Result<AuditPage, StorageError> {
        let inner = self.inner.read().await;
        let mut entries: Vec<&AuditEntry> = inner.audit.iter().collect();
        entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then(b.id.cmp(&a.id)));

        let items = entries
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.limit as usize)
            .cloned()
            .collect();
        Ok(AuditPage {
            items,
            pagination: Pagination::new(page, inner.audit.len() as i64),
        })
    }

    async fn audit_entries_for_issue(
        &self,
        issue_id: DbId,
    ) -> Result<Vec<AuditEntry>, StorageError> {
        let inner = self.inner.read().await;
        let mut entries: Vec<AuditEntry> = inner
            .audit
            .iter()
            .filter(|entry| entry.issue_id == issue_id)
            .cloned()
            .collect();
        entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then(b.id.cmp(&a.id)));
        Ok(entries)
    }
}

#[async_trait]
impl UserDirectory for MemoryStore {
    async fn find_user(&self, id: DbId) -> Result<Option<User>, StorageError> {
        Ok(self.inner.read().await.users.get(&id).cloned())
    }
}
