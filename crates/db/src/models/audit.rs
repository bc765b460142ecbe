//! Issue audit log row model.
//!
//! Rows are append-only; there is no `updated_at`. `changes` is stored as
//! JSONB in the same shape the API returns.

use sqlx::FromRow;
use tracker_core::audit::{AuditAction, AuditEntry, Changes};
use tracker_core::store::StorageError;
use tracker_core::types::{DbId, Timestamp};

/// A row from the `issue_audit_logs` table.
#[derive(Debug, Clone, FromRow)]
pub struct AuditLogRow {
    pub id: DbId,
    pub issue_id: DbId,
    pub action: String,
    pub performed_by: DbId,
    pub changes: serde_json::Value,
    pub timestamp: Timestamp,
}

impl TryFrom<AuditLogRow> for AuditEntry {
    type Error = StorageError;

    fn try_from(row: AuditLogRow) -> Result<Self, Self::Error> {
        let id = row.id;
        let action = row
            .action
            .parse::<AuditAction>()
            .map_err(|err| StorageError::Backend(format!("audit log {id}: {err}")))?;
        let changes: Changes = serde_json::from_value(row.changes)
            .map_err(|err| StorageError::Backend(format!("audit log {id}: bad changes: {err}")))?;

        Ok(AuditEntry {
            id,
            issue_id: row.issue_id,
            action,
            performed_by: row.performed_by,
            changes,
            timestamp: row.timestamp,
        })
    }
}

/// Encode a change set for the `changes` column.
pub fn changes_to_json(changes: &Changes) -> Result<serde_json::Value, StorageError> {
    serde_json::to_value(changes).map_err(|err| StorageError::Backend(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tracker_core::issue::IssueStatus;

    fn row(changes: serde_json::Value) -> AuditLogRow {
        AuditLogRow {
            id: 9,
            issue_id: 4,
            action: "UPDATE".into(),
            performed_by: 20,
            changes,
            timestamp: chrono::Utc::now(),
        }
    }

    #[test]
    fn row_converts_with_changes() {
        let entry = AuditEntry::try_from(row(json!({
            "status": { "from": "Open", "to": "In-Progress" }
        })))
        .unwrap();
        assert_eq!(entry.action, AuditAction::Update);
        let status = entry.changes.status.unwrap();
        assert_eq!(status.to, IssueStatus::InProgress);
    }

    #[test]
    fn empty_object_is_empty_changes() {
        let entry = AuditEntry::try_from(AuditLogRow {
            action: "CREATE".into(),
            ..row(json!({}))
        })
        .unwrap();
        assert!(entry.changes.is_empty());
    }

    #[test]
    fn malformed_changes_are_reported() {
        let err = AuditEntry::try_from(row(json!({ "status": "Open" }))).unwrap_err();
        assert!(err.to_string().contains("audit log 9"));
    }
}
