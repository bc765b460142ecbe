//! Handlers for the issue workflow.
//!
//! Every handler resolves the actor from the bearer token and delegates to
//! [`IssueWorkflowService`](tracker_core::workflow::IssueWorkflowService);
//! authorization and validation happen there.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

use tracker_core::issue::{CreateIssue, IssueFilter, IssuePatch};
use tracker_core::types::DbId;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// POST /issues
// ---------------------------------------------------------------------------

pub async fn create_issue(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreateIssue>,
) -> AppResult<impl IntoResponse> {
    let issue = state.service.create_issue(auth.actor(), input).await?;

    tracing::info!(issue_id = issue.id, actor_id = auth.0.id, "Issue created");

    Ok((StatusCode::CREATED, Json(DataResponse { data: issue })))
}

// ---------------------------------------------------------------------------
// GET /issues
// ---------------------------------------------------------------------------

/// List issues with optional `status`, `priority`, `assignee_exists`,
/// `unassigned` and `assignee` filters. Reporters only see their own issues.
pub async fn list_issues(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(filter): Query<IssueFilter>,
) -> AppResult<impl IntoResponse> {
    let issues = state.service.list_issues(auth.actor(), filter).await?;
    Ok(Json(DataResponse { data: issues }))
}

// ---------------------------------------------------------------------------
// GET /issues/{id}
// ---------------------------------------------------------------------------

pub async fn get_issue(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let issue = state.service.get_issue(auth.actor(), id).await?;
    Ok(Json(DataResponse { data: issue }))
}

// ---------------------------------------------------------------------------
// PATCH /issues/{id}
// ---------------------------------------------------------------------------

/// Apply a partial update. `"assignee": null` unassigns; an absent
/// `assignee` leaves the assignment untouched.
pub async fn update_issue(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(patch): Json<IssuePatch>,
) -> AppResult<impl IntoResponse> {
    let status_requested = patch.status.is_some();
    let assignee_requested = patch.assignee.is_some();
    let issue = state.service.update_issue(auth.actor(), id, patch).await?;

    tracing::info!(
        issue_id = id,
        actor_id = auth.0.id,
        version = issue.version,
        status_requested,
        assignee_requested,
        "Issue update applied",
    );

    Ok(Json(DataResponse { data: issue }))
}

// ---------------------------------------------------------------------------
// PATCH /issues/{id}/accept, /issues/{id}/reject
// ---------------------------------------------------------------------------

pub async fn accept_assignment(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let issue = state.service.accept_assignment(auth.actor(), id).await?;

    tracing::info!(issue_id = id, actor_id = auth.0.id, "Assignment accepted");

    Ok(Json(DataResponse { data: issue }))
}

pub async fn reject_assignment(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let issue = state.service.reject_assignment(auth.actor(), id).await?;

    tracing::info!(issue_id = id, actor_id = auth.0.id, "Assignment rejected");

    Ok(Json(DataResponse { data: issue }))
}

// ---------------------------------------------------------------------------
// DELETE /issues/{id}
// ---------------------------------------------------------------------------

pub async fn delete_issue(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    state.service.delete_issue(auth.actor(), id).await?;

    tracing::info!(issue_id = id, actor_id = auth.0.id, "Issue deleted");

    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// GET /issues/{id}/roadmap
// ---------------------------------------------------------------------------

/// The issue's timeline, oldest event first.
pub async fn get_roadmap(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let events = state.service.roadmap(auth.actor(), id).await?;
    Ok(Json(DataResponse { data: events }))
}
