//! Issue row model.

use sqlx::FromRow;
use tracker_core::error::CoreError;
use tracker_core::issue::{Assignment, AssignmentStatus, Issue, IssuePriority, IssueStatus};
use tracker_core::store::StorageError;
use tracker_core::types::{DbId, Timestamp};

/// A row from the `issues` table. Enumerations are stored as their wire text.
#[derive(Debug, Clone, FromRow)]
pub struct IssueRow {
    pub id: DbId,
    pub title: String,
    pub description: String,
    pub status: String,
    pub priority: String,
    pub reporter_id: DbId,
    pub assignee_id: Option<DbId>,
    pub assignment_status: Option<String>,
    pub version: i64,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl TryFrom<IssueRow> for Issue {
    type Error = StorageError;

    fn try_from(row: IssueRow) -> Result<Self, Self::Error> {
        let id = row.id;
        let corrupt = move |err: CoreError| StorageError::Backend(format!("issue {id}: {err}"));

        let assignment_status = row
            .assignment_status
            .as_deref()
            .map(str::parse::<AssignmentStatus>)
            .transpose()
            .map_err(corrupt)?;

        Ok(Issue {
            id: row.id,
            status: row.status.parse::<IssueStatus>().map_err(corrupt)?,
            priority: row.priority.parse::<IssuePriority>().map_err(corrupt)?,
            assignment: Assignment::from_parts(row.assignee_id, assignment_status)
                .map_err(corrupt)?,
            title: row.title,
            description: row.description,
            reporter: row.reporter_id,
            version: row.version,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row() -> IssueRow {
        let now = chrono::Utc::now();
        IssueRow {
            id: 4,
            title: "Login bug".into(),
            description: "Cannot log in after reset".into(),
            status: "In-Progress".into(),
            priority: "High".into(),
            reporter_id: 10,
            assignee_id: Some(20),
            assignment_status: Some("Accepted".into()),
            version: 3,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn row_converts_to_issue() {
        let issue = Issue::try_from(row()).unwrap();
        assert_eq!(issue.status, IssueStatus::InProgress);
        assert_eq!(issue.priority, IssuePriority::High);
        assert_eq!(issue.assignment, Assignment::Accepted(20));
        assert_eq!(issue.reporter, 10);
        assert_eq!(issue.version, 3);
    }

    #[test]
    fn rejected_row_has_no_assignee() {
        let rejected = IssueRow {
            assignee_id: None,
            assignment_status: Some("Rejected".into()),
            ..row()
        };
        assert_eq!(Issue::try_from(rejected).unwrap().assignment, Assignment::Rejected);
    }

    #[test]
    fn unknown_status_is_a_backend_error() {
        let bad = IssueRow {
            status: "Closed".into(),
            ..row()
        };
        assert!(matches!(Issue::try_from(bad), Err(StorageError::Backend(msg)) if msg.contains("issue 4")));
    }

    #[test]
    fn inconsistent_assignment_is_a_backend_error() {
        let bad = IssueRow {
            assignment_status: None,
            ..row()
        };
        assert!(Issue::try_from(bad).is_err());
    }
}
