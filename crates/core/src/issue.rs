//! Issue entity, its enumerated fields, and the input DTOs accepted by the
//! workflow service.

use std::fmt;
use std::str::FromStr;

use serde::ser::SerializeStruct;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use validator::Validate;

use crate::error::CoreError;
use crate::roles::Role;
use crate::types::{DbId, Timestamp};

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum IssueStatus {
    #[default]
    Open,
    #[serde(rename = "In-Progress")]
    InProgress,
    Resolved,
}

impl IssueStatus {
    pub const ALL: [IssueStatus; 3] = [IssueStatus::Open, IssueStatus::InProgress, IssueStatus::Resolved];

    pub fn as_str(&self) -> &'static str {
        match self {
            IssueStatus::Open => "Open",
            IssueStatus::InProgress => "In-Progress",
            IssueStatus::Resolved => "Resolved",
        }
    }
}

impl fmt::Display for IssueStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IssueStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        IssueStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| CoreError::Validation(format!("Invalid issue status '{s}'")))
    }
}

// ---------------------------------------------------------------------------
// Priority
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum IssuePriority {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

impl IssuePriority {
    pub const ALL: [IssuePriority; 4] = [
        IssuePriority::Low,
        IssuePriority::Medium,
        IssuePriority::High,
        IssuePriority::Critical,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            IssuePriority::Low => "Low",
            IssuePriority::Medium => "Medium",
            IssuePriority::High => "High",
            IssuePriority::Critical => "Critical",
        }
    }
}

impl fmt::Display for IssuePriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IssuePriority {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        IssuePriority::ALL
            .into_iter()
            .find(|priority| priority.as_str() == s)
            .ok_or_else(|| CoreError::Validation(format!("Invalid issue priority '{s}'")))
    }
}

// ---------------------------------------------------------------------------
// Assignment
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AssignmentStatus {
    Pending,
    Accepted,
    Rejected,
}

impl AssignmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssignmentStatus::Pending => "Pending",
            AssignmentStatus::Accepted => "Accepted",
            AssignmentStatus::Rejected => "Rejected",
        }
    }
}

impl fmt::Display for AssignmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AssignmentStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(AssignmentStatus::Pending),
            "Accepted" => Ok(AssignmentStatus::Accepted),
            "Rejected" => Ok(AssignmentStatus::Rejected),
            other => Err(CoreError::Validation(format!(
                "Invalid assignment status '{other}'"
            ))),
        }
    }
}

/// The `(assignee, assignment_status)` pair of an issue.
///
/// Only these four combinations exist: an assignee is present exactly while
/// the assignment is `Pending` or `Accepted`. `Rejected` keeps no assignee;
/// the issue is back in the unassigned pool with the last offer declined.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Assignment {
    #[default]
    Unassigned,
    Pending(DbId),
    Accepted(DbId),
    Rejected,
}

impl Assignment {
    pub fn assignee(&self) -> Option<DbId> {
        match self {
            Assignment::Pending(id) | Assignment::Accepted(id) => Some(*id),
            Assignment::Unassigned | Assignment::Rejected => None,
        }
    }

    pub fn status(&self) -> Option<AssignmentStatus> {
        match self {
            Assignment::Unassigned => None,
            Assignment::Pending(_) => Some(AssignmentStatus::Pending),
            Assignment::Accepted(_) => Some(AssignmentStatus::Accepted),
            Assignment::Rejected => Some(AssignmentStatus::Rejected),
        }
    }

    /// Rebuild from the two stored columns, rejecting combinations the
    /// workflow can never produce.
    pub fn from_parts(
        assignee: Option<DbId>,
        status: Option<AssignmentStatus>,
    ) -> Result<Self, CoreError> {
        match (assignee, status) {
            (None, None) => Ok(Assignment::Unassigned),
            (Some(id), Some(AssignmentStatus::Pending)) => Ok(Assignment::Pending(id)),
            (Some(id), Some(AssignmentStatus::Accepted)) => Ok(Assignment::Accepted(id)),
            (None, Some(AssignmentStatus::Rejected)) => Ok(Assignment::Rejected),
            (assignee, status) => Err(CoreError::InvalidState(format!(
                "inconsistent assignment: assignee={assignee:?}, status={status:?}"
            ))),
        }
    }
}

impl Serialize for Assignment {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Assignment", 2)?;
        state.serialize_field("assignee", &self.assignee())?;
        state.serialize_field("assignment_status", &self.status())?;
        state.end()
    }
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

/// A user as resolved from the user directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub id: DbId,
    pub name: String,
    pub email: String,
    pub role: Role,
}

/// Denormalized user snapshot stored inside audit changes.
///
/// Captured at write time and never re-resolved, so history stays readable
/// after the user is renamed or removed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRef {
    pub id: DbId,
    pub name: String,
    pub email: String,
}

impl From<&User> for UserRef {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
        }
    }
}

/// The authenticated caller of a workflow operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub id: DbId,
    pub role: Role,
}

impl Actor {
    pub fn new(id: DbId, role: Role) -> Self {
        Self { id, role }
    }
}

// ---------------------------------------------------------------------------
// Issue entity
// ---------------------------------------------------------------------------

/// The workflow subject.
///
/// `version` starts at 1 and increases on every write; stores use it for the
/// optimistic check that serializes concurrent mutations of one issue.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Issue {
    pub id: DbId,
    pub title: String,
    pub description: String,
    pub status: IssueStatus,
    pub priority: IssuePriority,
    pub reporter: DbId,
    #[serde(flatten)]
    pub assignment: Assignment,
    pub version: i64,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Issue {
    pub fn assignee(&self) -> Option<DbId> {
        self.assignment.assignee()
    }

    pub fn assignment_status(&self) -> Option<AssignmentStatus> {
        self.assignment.status()
    }
}

// ---------------------------------------------------------------------------
// Input DTOs
// ---------------------------------------------------------------------------

/// Request body for creating an issue. The reporter always comes from the
/// actor, never from the payload.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateIssue {
    #[validate(length(
        min = 3,
        max = 100,
        message = "Title must be between 3 and 100 characters"
    ))]
    pub title: String,
    #[validate(length(
        min = 10,
        message = "Description must be at least 10 characters"
    ))]
    pub description: String,
    pub priority: Option<IssuePriority>,
}

/// A validated issue ready for insertion.
#[derive(Debug, Clone, PartialEq)]
pub struct NewIssue {
    pub title: String,
    pub description: String,
    pub priority: IssuePriority,
    pub reporter: DbId,
}

/// Partial update. `assignee` distinguishes absent (leave alone), `null`
/// (unassign), and an id (assign).
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct IssuePatch {
    #[validate(length(
        min = 3,
        max = 100,
        message = "Title must be between 3 and 100 characters"
    ))]
    pub title: Option<String>,
    #[validate(length(
        min = 10,
        message = "Description must be at least 10 characters"
    ))]
    pub description: Option<String>,
    pub status: Option<IssueStatus>,
    pub priority: Option<IssuePriority>,
    #[serde(default, deserialize_with = "double_option")]
    pub assignee: Option<Option<DbId>>,
}

fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Run `validator` rules and fold failures into [`CoreError::Validation`].
pub fn validate_input<T: Validate>(input: &T) -> Result<(), CoreError> {
    input
        .validate()
        .map_err(|errors| CoreError::Validation(errors.to_string()))
}

// ---------------------------------------------------------------------------
// Listing filter
// ---------------------------------------------------------------------------

/// Filter for issue listings.
///
/// Assignee criteria are mutually exclusive and resolved by precedence:
/// `assignee_exists` over `unassigned` over `assignee`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IssueFilter {
    pub status: Option<IssueStatus>,
    pub priority: Option<IssuePriority>,
    pub assignee_exists: Option<bool>,
    pub unassigned: Option<bool>,
    pub assignee: Option<DbId>,
    /// Forced to the actor's id for `User` callers; never taken from a query.
    #[serde(skip)]
    pub reporter: Option<DbId>,
}

/// Resolved form of the assignee criteria in an [`IssueFilter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssigneeScope {
    Any,
    Present,
    Absent,
    Exactly(DbId),
}

impl IssueFilter {
    pub fn assignee_scope(&self) -> AssigneeScope {
        if self.assignee_exists == Some(true) {
            AssigneeScope::Present
        } else if self.unassigned == Some(true) {
            AssigneeScope::Absent
        } else if let Some(id) = self.assignee {
            AssigneeScope::Exactly(id)
        } else {
            AssigneeScope::Any
        }
    }

    pub fn matches(&self, issue: &Issue) -> bool {
        if self.status.is_some_and(|s| s != issue.status) {
            return false;
        }
        if self.priority.is_some_and(|p| p != issue.priority) {
            return false;
        }
        if self.reporter.is_some_and(|r| r != issue.reporter) {
            return false;
        }
        match self.assignee_scope() {
            AssigneeScope::Any => true,
            AssigneeScope::Present => issue.assignee().is_some(),
            AssigneeScope::Absent => issue.assignee().is_none(),
            AssigneeScope::Exactly(id) => issue.assignee() == Some(id),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
