use axum::routing::get;
use axum::Router;

use crate::handlers::audit;
use crate::state::AppState;

/// Audit routes mounted at `/audit-logs`.
///
/// ```text
/// GET  /                   -> list_audit_logs (admin)
/// GET  /issue/{issue_id}   -> list_issue_audit_logs
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(audit::list_audit_logs))
        .route("/issue/{issue_id}", get(audit::list_issue_audit_logs))
}
