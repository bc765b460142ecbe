//! End-to-end workflow tests through the HTTP router.

mod common;

use axum::http::StatusCode;
use common::*;
use serde_json::json;

// ---------------------------------------------------------------------------
// Create / read
// ---------------------------------------------------------------------------

#[tokio::test]
async fn create_issue_returns_201_with_defaults() {
    let app = build_test_app();
    let response = post_json(
        &app,
        "/api/v1/issues",
        &reporter(),
        json!({ "title": "Login fails", "description": "Cannot log in after reset" }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    let issue = &json["data"];
    assert_eq!(issue["status"], "Open");
    assert_eq!(issue["priority"], "Medium");
    assert_eq!(issue["reporter"], REPORTER);
    assert!(issue["assignee"].is_null());
    assert!(issue["assignment_status"].is_null());
}

#[tokio::test]
async fn create_issue_with_short_title_is_a_validation_error() {
    let app = build_test_app();
    let response = post_json(
        &app,
        "/api/v1/issues",
        &reporter(),
        json!({ "title": "No", "description": "Cannot log in after reset" }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn reporter_cannot_change_status() {
    let app = build_test_app();
    let id = create_issue(&app, "Login fails").await;

    let response = patch_json(
        &app,
        &format!("/api/v1/issues/{id}"),
        &reporter(),
        json!({ "status": "In-Progress" }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_json(response).await["code"], "NOT_AUTHORIZED");
}

#[tokio::test]
async fn reporter_cannot_read_someone_elses_issue() {
    let app = build_test_app();
    let id = create_issue(&app, "Private issue").await;

    let response = get_auth(&app, &format!("/api/v1/issues/{id}"), &other_user()).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = get_auth(&app, &format!("/api/v1/issues/{id}"), &reporter()).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn missing_issue_returns_404() {
    let app = build_test_app();
    let response = get_auth(&app, "/api/v1/issues/999", &admin()).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["code"], "NOT_FOUND");
}

#[tokio::test]
async fn listing_is_scoped_to_the_reporter_for_users() {
    let app = build_test_app();
    create_issue(&app, "First issue").await;
    post_json(
        &app,
        "/api/v1/issues",
        &other_user(),
        json!({ "title": "Other issue", "description": "Reported by someone else" }),
    )
    .await;

    let mine = body_json(get_auth(&app, "/api/v1/issues", &reporter()).await).await;
    assert_eq!(mine["data"].as_array().unwrap().len(), 1);

    let all = body_json(get_auth(&app, "/api/v1/issues", &admin()).await).await;
    assert_eq!(all["data"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn listing_filters_by_query_parameters() {
    let app = build_test_app();
    let assigned = create_issue(&app, "Assigned issue").await;
    create_issue(&app, "Loose issue").await;
    patch_json(
        &app,
        &format!("/api/v1/issues/{assigned}"),
        &admin(),
        json!({ "assignee": DANA }),
    )
    .await;

    let json = body_json(get_auth(&app, "/api/v1/issues?unassigned=true", &admin()).await).await;
    let titles: Vec<_> = json["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|issue| issue["title"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(titles, vec!["Loose issue"]);

    let uri = format!("/api/v1/issues?assignee={DANA}&priority=High");
    let json = body_json(get_auth(&app, &uri, &admin()).await).await;
    assert_eq!(json["data"][0]["id"], assigned);
}

// ---------------------------------------------------------------------------
// Assignment lifecycle
// ---------------------------------------------------------------------------

#[tokio::test]
async fn assign_accept_and_resolve() {
    let app = build_test_app();
    let id = create_issue(&app, "Crash on save").await;
    let uri = format!("/api/v1/issues/{id}");

    let response = patch_json(&app, &uri, &admin(), json!({ "assignee": DANA })).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["assignee"], DANA);
    assert_eq!(json["data"]["assignment_status"], "Pending");

    let response = patch_empty(&app, &format!("{uri}/accept"), &dana()).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["assignment_status"], "Accepted");

    let response = patch_json(&app, &uri, &dana(), json!({ "status": "In-Progress" })).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = patch_json(&app, &uri, &dana(), json!({ "status": "Resolved" })).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["status"], "Resolved");
}

#[tokio::test]
async fn skipping_in_progress_is_an_invalid_transition() {
    let app = build_test_app();
    let id = create_issue(&app, "Crash on save").await;

    let response = patch_json(
        &app,
        &format!("/api/v1/issues/{id}"),
        &admin(),
        json!({ "status": "Resolved" }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "INVALID_TRANSITION");
}

#[tokio::test]
async fn reassigning_a_pending_issue_is_an_assignment_conflict() {
    let app = build_test_app();
    let id = create_issue(&app, "Crash on save").await;
    let uri = format!("/api/v1/issues/{id}");

    patch_json(&app, &uri, &admin(), json!({ "assignee": DANA })).await;
    let response = patch_json(&app, &uri, &admin(), json!({ "assignee": ELI })).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "ASSIGNMENT_CONFLICT");
}

#[tokio::test]
async fn reject_returns_issue_to_the_pool() {
    let app = build_test_app();
    let id = create_issue(&app, "Crash on save").await;
    let uri = format!("/api/v1/issues/{id}");

    patch_json(&app, &uri, &admin(), json!({ "assignee": DANA })).await;
    let response = patch_empty(&app, &format!("{uri}/reject"), &dana()).await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert!(json["data"]["assignee"].is_null());
    assert_eq!(json["data"]["assignment_status"], "Rejected");

    let response = patch_json(&app, &uri, &admin(), json!({ "assignee": ELI })).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn only_the_assignee_may_respond() {
    let app = build_test_app();
    let id = create_issue(&app, "Crash on save").await;
    let uri = format!("/api/v1/issues/{id}");
    patch_json(&app, &uri, &admin(), json!({ "assignee": DANA })).await;

    let response = patch_empty(&app, &format!("{uri}/accept"), &eli()).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    patch_empty(&app, &format!("{uri}/accept"), &dana()).await;
    let response = patch_empty(&app, &format!("{uri}/accept"), &dana()).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "INVALID_STATE");
}

#[tokio::test]
async fn null_assignee_unassigns() {
    let app = build_test_app();
    let id = create_issue(&app, "Crash on save").await;
    let uri = format!("/api/v1/issues/{id}");
    patch_json(&app, &uri, &admin(), json!({ "assignee": DANA })).await;

    let response = patch_json(&app, &uri, &admin(), json!({ "assignee": null })).await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert!(json["data"]["assignee"].is_null());
    assert!(json["data"]["assignment_status"].is_null());
}

// ---------------------------------------------------------------------------
// Delete, audit, roadmap, dashboard
// ---------------------------------------------------------------------------

#[tokio::test]
async fn delete_is_admin_only_and_keeps_history() {
    let app = build_test_app();
    let id = create_issue(&app, "Crash on save").await;
    let uri = format!("/api/v1/issues/{id}");

    let response = delete(&app, &uri, &reporter()).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = delete(&app, &uri, &admin()).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = get_auth(&app, &uri, &admin()).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let history = format!("/api/v1/audit-logs/issue/{id}");
    let json = body_json(get_auth(&app, &history, &admin()).await).await;
    let actions: Vec<_> = json["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|entry| entry["action"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(actions, vec!["DELETE", "CREATE"]);

    let response = get_auth(&app, &history, &reporter()).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn global_audit_log_is_paginated_for_admins() {
    let app = build_test_app();
    for title in ["First issue", "Second issue", "Third issue"] {
        create_issue(&app, title).await;
    }

    let response = get_auth(&app, "/api/v1/audit-logs?page=2&limit=2", &admin()).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["items"].as_array().unwrap().len(), 1);
    assert_eq!(json["data"]["pagination"]["total"], 3);
    assert_eq!(json["data"]["pagination"]["pages"], 2);

    let response = get_auth(&app, "/api/v1/audit-logs", &dana()).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn audit_log_page_beyond_range_is_empty_not_an_error() {
    let app = build_test_app();
    create_issue(&app, "First issue").await;

    let uri = format!("/api/v1/audit-logs?page={}&limit=200", i64::MAX);
    let response = get_auth(&app, &uri, &admin()).await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert!(json["data"]["items"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn unassign_after_reject_clears_assignment_status() {
    let app = build_test_app();
    let id = create_issue(&app, "Crash on save").await;
    let uri = format!("/api/v1/issues/{id}");
    patch_json(&app, &uri, &admin(), json!({ "assignee": DANA })).await;
    patch_empty(&app, &format!("{uri}/reject"), &dana()).await;

    let response = patch_json(&app, &uri, &admin(), json!({ "assignee": null })).await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert!(json["data"]["assignee"].is_null());
    assert!(json["data"]["assignment_status"].is_null());
}

#[tokio::test]
async fn update_audit_records_only_changed_fields() {
    let app = build_test_app();
    let id = create_issue(&app, "Crash on save").await;

    patch_json(
        &app,
        &format!("/api/v1/issues/{id}"),
        &admin(),
        json!({ "title": "Crash on save", "priority": "Critical" }),
    )
    .await;

    let json = body_json(
        get_auth(&app, &format!("/api/v1/audit-logs/issue/{id}"), &reporter()).await,
    )
    .await;
    let latest = &json["data"][0];
    assert_eq!(latest["action"], "UPDATE");
    assert_eq!(latest["changes"]["priority"]["from"], "High");
    assert_eq!(latest["changes"]["priority"]["to"], "Critical");
    assert!(latest["changes"].get("title").is_none());
}

#[tokio::test]
async fn roadmap_lists_events_oldest_first() {
    let app = build_test_app();
    let id = create_issue(&app, "Crash on save").await;
    let uri = format!("/api/v1/issues/{id}");
    patch_json(&app, &uri, &admin(), json!({ "assignee": DANA })).await;
    patch_empty(&app, &format!("{uri}/accept"), &dana()).await;

    let response = get_auth(&app, &format!("{uri}/roadmap"), &reporter()).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    let events = json["data"].as_array().unwrap();
    assert_eq!(events[0]["id"], "creation");
    assert_eq!(events[0]["kind"], "created");
    assert!(events.iter().any(|event| event["kind"] == "assignment_accepted"));
}

#[tokio::test]
async fn dashboard_is_scoped_by_role() {
    let app = build_test_app();
    let id = create_issue(&app, "Crash on save").await;
    create_issue(&app, "Slow search").await;
    patch_json(
        &app,
        &format!("/api/v1/issues/{id}"),
        &admin(),
        json!({ "assignee": DANA }),
    )
    .await;

    let admin_stats = body_json(get_auth(&app, "/api/v1/dashboard/stats", &admin()).await).await;
    assert_eq!(admin_stats["data"]["scope"], "all");
    assert_eq!(admin_stats["data"]["total"], 2);

    let dev_stats = body_json(get_auth(&app, "/api/v1/dashboard/stats", &dana()).await).await;
    assert_eq!(dev_stats["data"]["scope"], "assigned_to_me");
    assert_eq!(dev_stats["data"]["total"], 1);
    assert_eq!(dev_stats["data"]["available_unassigned"], 1);
}

#[tokio::test]
async fn dashboard_carries_role_sections() {
    let app = build_test_app();
    let id = create_issue(&app, "Crash on save").await;
    let free = create_issue(&app, "Slow search").await;
    patch_json(
        &app,
        &format!("/api/v1/issues/{id}"),
        &admin(),
        json!({ "assignee": DANA }),
    )
    .await;

    let admin_stats = body_json(get_auth(&app, "/api/v1/dashboard/stats", &admin()).await).await;
    let data = &admin_stats["data"];
    assert_eq!(data["recent_activity"].as_array().unwrap().len(), 3);
    assert_eq!(data["recent_activity"][0]["action"], "UPDATE");
    assert_eq!(data["issues_over_time"][0]["count"], 2);
    assert_eq!(data["top_reporters"][0]["reporter"]["name"], "Riley");
    assert_eq!(data["top_reporters"][0]["count"], 2);
    assert!(data.get("recent_issues").is_none());

    let dev_stats = body_json(get_auth(&app, "/api/v1/dashboard/stats", &dana()).await).await;
    let data = &dev_stats["data"];
    assert_eq!(data["resolved_this_month"], 0);
    assert_eq!(data["recent_issues"][0]["id"], id);
    assert_eq!(data["available_issues"][0]["id"], free);
    assert!(data.get("recent_activity").is_none());

    let user_stats = body_json(get_auth(&app, "/api/v1/dashboard/stats", &reporter()).await).await;
    let data = &user_stats["data"];
    assert_eq!(data["recent_issues"].as_array().unwrap().len(), 2);
    assert!(data.get("top_reporters").is_none());
}
