//! Repository for the `issues` table.

use sqlx::PgPool;
use tracker_core::issue::{AssigneeScope, Issue, IssueFilter, NewIssue};
use tracker_core::types::DbId;

use crate::models::issue::IssueRow;

// ---------------------------------------------------------------------------
// Column lists
// ---------------------------------------------------------------------------

/// Column list for `issues` SELECT queries.
const COLUMNS: &str = "\
    id, title, description, status, priority, reporter_id, \
    assignee_id, assignment_status, version, created_at, updated_at";

// ---------------------------------------------------------------------------
// IssueRepo
// ---------------------------------------------------------------------------

/// CRUD operations for issues. Writes run inside the caller's transaction
/// and are guarded by the row `version`.
pub struct IssueRepo;

impl IssueRepo {
    /// Find an issue by its primary key.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<IssueRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM issues WHERE id = $1");
        sqlx::query_as::<_, IssueRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List issues matching `filter`, newest first.
    pub async fn list(pool: &PgPool, filter: &IssueFilter) -> Result<Vec<IssueRow>, sqlx::Error> {
        let (where_clause, bind_values) = build_issue_filter(filter);
        let query = format!(
            "SELECT {COLUMNS} FROM issues {where_clause} \
             ORDER BY created_at DESC, id DESC"
        );

        let mut q = sqlx::query_as::<_, IssueRow>(&query);
        for value in &bind_values {
            q = match value {
                BindValue::BigInt(v) => q.bind(*v),
                BindValue::Text(v) => q.bind(v.as_str()),
            };
        }
        q.fetch_all(pool).await
    }

    /// Insert a new issue at version 1, returning the created row.
    pub async fn insert(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        input: &NewIssue,
    ) -> Result<IssueRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO issues (title, description, priority, reporter_id) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, IssueRow>(&query)
            .bind(&input.title)
            .bind(&input.description)
            .bind(input.priority.as_str())
            .bind(input.reporter)
            .fetch_one(&mut **tx)
            .await
    }

    /// Overwrite the mutable fields of `issue` if the stored row is still at
    /// `issue.version`. Bumps the version and `updated_at`.
    ///
    /// Returns `None` when the row is gone or its version moved on.
    pub async fn update_versioned(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        issue: &Issue,
    ) -> Result<Option<IssueRow>, sqlx::Error> {
        let query = format!(
            "UPDATE issues SET \
                title = $3, \
                description = $4, \
                status = $5, \
                priority = $6, \
                assignee_id = $7, \
                assignment_status = $8, \
                version = version + 1, \
                updated_at = now() \
             WHERE id = $1 AND version = $2 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, IssueRow>(&query)
            .bind(issue.id)
            .bind(issue.version)
            .bind(&issue.title)
            .bind(&issue.description)
            .bind(issue.status.as_str())
            .bind(issue.priority.as_str())
            .bind(issue.assignee())
            .bind(issue.assignment_status().map(|status| status.as_str()))
            .fetch_optional(&mut **tx)
            .await
    }

    /// Delete the issue if it is still at `expected_version`.
    ///
    /// Returns `true` if a row was deleted.
    pub async fn delete_versioned(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        id: DbId,
        expected_version: i64,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM issues WHERE id = $1 AND version = $2")
            .bind(id)
            .bind(expected_version)
            .execute(&mut **tx)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Whether an issue row exists, used to tell a lost race from a delete.
    pub async fn exists(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        id: DbId,
    ) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM issues WHERE id = $1)")
            .bind(id)
            .fetch_one(&mut **tx)
            .await
    }
}

// ---------------------------------------------------------------------------
// Dynamic filter building
// ---------------------------------------------------------------------------

/// Typed bind value for dynamically-built issue queries.
#[derive(Debug, Clone, PartialEq)]
enum BindValue {
    BigInt(i64),
    Text(String),
}

/// Build the WHERE clause and bind values for an issue listing.
fn build_issue_filter(filter: &IssueFilter) -> (String, Vec<BindValue>) {
    let mut conditions: Vec<String> = Vec::new();
    let mut bind_values: Vec<BindValue> = Vec::new();

    if let Some(status) = filter.status {
        bind_values.push(BindValue::Text(status.as_str().to_string()));
        conditions.push(format!("status = ${}", bind_values.len()));
    }

    if let Some(priority) = filter.priority {
        bind_values.push(BindValue::Text(priority.as_str().to_string()));
        conditions.push(format!("priority = ${}", bind_values.len()));
    }

    if let Some(reporter) = filter.reporter {
        bind_values.push(BindValue::BigInt(reporter));
        conditions.push(format!("reporter_id = ${}", bind_values.len()));
    }

    match filter.assignee_scope() {
        AssigneeScope::Any => {}
        AssigneeScope::Present => conditions.push("assignee_id IS NOT NULL".to_string()),
        AssigneeScope::Absent => conditions.push("assignee_id IS NULL".to_string()),
        AssigneeScope::Exactly(id) => {
            bind_values.push(BindValue::BigInt(id));
            conditions.push(format!("assignee_id = ${}", bind_values.len()));
        }
    }

    let where_clause = if conditions.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", conditions.join(" AND "))
    };

    (where_clause, bind_values)
}
