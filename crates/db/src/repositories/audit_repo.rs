//! Repository for the `issue_audit_logs` table.

use sqlx::PgPool;
use tracker_core::types::DbId;

use crate::models::audit::AuditLogRow;

/// Column list for `issue_audit_logs` SELECT queries.
const COLUMNS: &str = "id, issue_id, action, performed_by, changes, timestamp";

/// Append and query operations for the issue audit trail.
pub struct AuditLogRepo;

impl AuditLogRepo {
    /// Append one entry inside `tx`.
    ///
    /// The timestamp is taken from the database clock at insert time.
    pub async fn insert(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        issue_id: DbId,
        action: &str,
        performed_by: DbId,
        changes: &serde_json::Value,
    ) -> Result<AuditLogRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO issue_audit_logs (issue_id, action, performed_by, changes) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, AuditLogRow>(&query)
            .bind(issue_id)
            .bind(action)
            .bind(performed_by)
            .bind(changes)
            .fetch_one(&mut **tx)
            .await
    }

    /// One page of every issue's history, newest first.
    pub async fn list_page(
        pool: &PgPool,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<AuditLogRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM issue_audit_logs \
             ORDER BY timestamp DESC, id DESC \
             LIMIT $1 OFFSET $2"
        );
        sqlx::query_as::<_, AuditLogRow>(&query)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Total number of entries (for pagination metadata).
    pub async fn count(pool: &PgPool) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*)::BIGINT FROM issue_audit_logs")
            .fetch_one(pool)
            .await
    }

    /// All entries for one issue, newest first. The issue may be deleted.
    pub async fn list_for_issue(
        pool: &PgPool,
        issue_id: DbId,
    ) -> Result<Vec<AuditLogRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM issue_audit_logs \
             WHERE issue_id = $1 \
             ORDER BY timestamp DESC, id DESC"
        );
        sqlx::query_as::<_, AuditLogRow>(&query)
            .bind(issue_id)
            .fetch_all(pool)
            .await
    }
}
