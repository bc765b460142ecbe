//! Handlers for the issue audit trail.

use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;

use tracker_core::audit::PageRequest;
use tracker_core::types::DbId;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// Query parameters for `GET /audit-logs`. Out-of-range values are clamped.
#[derive(Debug, Default, Deserialize)]
pub struct AuditLogParams {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

/// Paginated global audit log, newest first. Admin only.
pub async fn list_audit_logs(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<AuditLogParams>,
) -> AppResult<impl IntoResponse> {
    let page = PageRequest::new(params.page, params.limit);
    let logs = state.service.list_audit_logs(auth.actor(), page).await?;
    Ok(Json(DataResponse { data: logs }))
}

/// One issue's audit trail, newest first.
pub async fn list_issue_audit_logs(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(issue_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let entries = state
        .service
        .audit_logs_for_issue(auth.actor(), issue_id)
        .await?;
    Ok(Json(DataResponse { data: entries }))
}
