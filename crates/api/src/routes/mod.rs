pub mod audit;
pub mod health;
pub mod issues;

use axum::routing::get;
use axum::Router;

use crate::handlers;
use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /issues                        list, create
/// /issues/{id}                   get, update, delete
/// /issues/{id}/accept            accept pending assignment
/// /issues/{id}/reject            reject pending assignment
/// /issues/{id}/roadmap           timeline
///
/// /audit-logs                    paginated audit log (admin)
/// /audit-logs/issue/{issue_id}   audit trail of one issue
///
/// /dashboard/stats               role-scoped statistics
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/issues", issues::router())
        .nest("/audit-logs", audit::router())
        .route("/dashboard/stats", get(handlers::dashboard::get_stats))
}
