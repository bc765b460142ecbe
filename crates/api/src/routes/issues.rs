use axum::routing::{get, patch};
use axum::Router;

use crate::handlers::issues;
use crate::state::AppState;

/// Issue routes mounted at `/issues`.
///
/// ```text
/// GET, POST            /                -> list_issues, create_issue
/// GET, PATCH, DELETE   /{id}            -> get_issue, update_issue, delete_issue
/// PATCH                /{id}/accept     -> accept_assignment
/// PATCH                /{id}/reject     -> reject_assignment
/// GET                  /{id}/roadmap    -> get_roadmap
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(issues::list_issues).post(issues::create_issue))
        .route(
            "/{id}",
            get(issues::get_issue)
                .patch(issues::update_issue)
                .delete(issues::delete_issue),
        )
        .route("/{id}/accept", patch(issues::accept_assignment))
        .route("/{id}/reject", patch(issues::reject_assignment))
        .route("/{id}/roadmap", get(issues::get_roadmap))
}
