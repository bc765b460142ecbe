//! Audit trail record types.
//!
//! One immutable entry is written per accepted mutation. Entries reference
//! the issue by id only and outlive the issue itself.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::issue::{AssignmentStatus, IssuePriority, IssueStatus, UserRef};
use crate::types::{DbId, Timestamp};

// ---------------------------------------------------------------------------
// Actions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    Create,
    Update,
    Delete,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::Create => "CREATE",
            AuditAction::Update => "UPDATE",
            AuditAction::Delete => "DELETE",
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AuditAction {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CREATE" => Ok(AuditAction::Create),
            "UPDATE" => Ok(AuditAction::Update),
            "DELETE" => Ok(AuditAction::Delete),
            other => Err(CoreError::Validation(format!("Unknown audit action '{other}'"))),
        }
    }
}

// ---------------------------------------------------------------------------
// Field changes
// ---------------------------------------------------------------------------

/// A `{from, to}` pair for one field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Change<T> {
    pub from: T,
    pub to: T,
}

impl<T> Change<T> {
    pub fn new(from: T, to: T) -> Self {
        Self { from, to }
    }
}

/// Assignment status change, tagged with the developer it concerns.
///
/// `assignee` is the offered developer on assign, the responding developer on
/// accept/reject, and the previous assignee on unassign.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentStatusChange {
    pub from: Option<AssignmentStatus>,
    pub to: Option<AssignmentStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee: Option<UserRef>,
}

/// The field-level diff recorded with an `UPDATE` entry.
///
/// Only fields whose stored value actually changed are present.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Changes {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<Change<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<Change<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Change<IssuePriority>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<Change<IssueStatus>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee: Option<Change<Option<UserRef>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignment_status: Option<AssignmentStatusChange>,
}

impl Changes {
    pub fn is_empty(&self) -> bool {
        self.fields().is_empty()
    }

    /// Names of the changed fields, in wire form.
    pub fn fields(&self) -> Vec<&'static str> {
        [
            ("title", self.title.is_some()),
            ("description", self.description.is_some()),
            ("priority", self.priority.is_some()),
            ("status", self.status.is_some()),
            ("assignee", self.assignee.is_some()),
            ("assignment_status", self.assignment_status.is_some()),
        ]
        .into_iter()
        .filter_map(|(name, present)| present.then_some(name))
        .collect()
    }
}

// ---------------------------------------------------------------------------
// Entries
// ---------------------------------------------------------------------------

/// A persisted audit entry. Never updated or deleted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuditEntry {
    pub id: DbId,
    pub issue_id: DbId,
    pub action: AuditAction,
    pub performed_by: DbId,
    pub changes: Changes,
    pub timestamp: Timestamp,
}

/// An entry to append. The store fills in the issue id, id, and timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAuditEntry {
    pub action: AuditAction,
    pub performed_by: DbId,
    pub changes: Changes,
}

impl NewAuditEntry {
    pub fn create(performed_by: DbId) -> Self {
        Self {
            action: AuditAction::Create,
            performed_by,
            changes: Changes::default(),
        }
    }

    pub fn update(performed_by: DbId, changes: Changes) -> Self {
        Self {
            action: AuditAction::Update,
            performed_by,
            changes,
        }
    }

    pub fn delete(performed_by: DbId) -> Self {
        Self {
            action: AuditAction::Delete,
            performed_by,
            changes: Changes::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Pagination
// ---------------------------------------------------------------------------

pub const DEFAULT_PAGE_LIMIT: i64 = 50;
pub const MAX_PAGE_LIMIT: i64 = 200;
/// Highest page whose offset still fits in an `i64` at any allowed limit.
pub const MAX_PAGE: i64 = i64::MAX / MAX_PAGE_LIMIT;

/// A clamped, 1-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub limit: i64,
}

impl PageRequest {
    pub fn new(page: Option<i64>, limit: Option<i64>) -> Self {
        Self {
            page: page.unwrap_or(1).clamp(1, MAX_PAGE),
            limit: limit.unwrap_or(DEFAULT_PAGE_LIMIT).clamp(1, MAX_PAGE_LIMIT),
        }
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pagination {
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    pub pages: i64,
}

impl Pagination {
    pub fn new(request: PageRequest, total: i64) -> Self {
        Self {
            page: request.page,
            limit: request.limit,
            total,
            pages: (total + request.limit - 1) / request.limit,
        }
    }
}

/// One page of the global audit log, newest first.
#[derive(Debug, Clone, Serialize)]
pub struct AuditPage {
    pub items: Vec<AuditEntry>,
    pub pagination: Pagination,
}
