#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use tower::ServiceExt;

use tracker_api::auth::jwt::{generate_access_token, JwtConfig};
use tracker_api::config::ServerConfig;
use tracker_api::router::build_app_router;
use tracker_api::state::AppState;
use tracker_core::issue::User;
use tracker_core::memory::MemoryStore;
use tracker_core::roles::Role;
use tracker_core::workflow::IssueWorkflowService;

pub const ADMIN: i64 = 1;
pub const DANA: i64 = 20;
pub const ELI: i64 = 21;
pub const REPORTER: i64 = 10;
pub const OTHER_USER: i64 = 11;

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 30,
        db_max_connections: 1,
        jwt: JwtConfig {
            secret: "test-secret-that-is-long-enough-for-hmac".to_string(),
            access_token_expiry_mins: 15,
        },
    }
}

fn user(id: i64, name: &str, role: Role) -> User {
    User {
        id,
        name: name.to_string(),
        email: format!("{}@example.com", name.to_lowercase()),
        role,
    }
}

/// The full application router over an in-memory store seeded with an admin,
/// two developers, and two reporters.
pub fn build_test_app() -> Router {
    let store = Arc::new(MemoryStore::with_users([
        user(ADMIN, "Ada", Role::Admin),
        user(DANA, "Dana", Role::Developer),
        user(ELI, "Eli", Role::Developer),
        user(REPORTER, "Riley", Role::User),
        user(OTHER_USER, "Sam", Role::User),
    ]));
    let config = test_config();
    let state = AppState {
        service: IssueWorkflowService::new(store.clone(), store),
        config: Arc::new(config.clone()),
    };
    build_app_router(state, &config)
}

/// A bearer token for `user_id` acting as `role`.
pub fn token(user_id: i64, role: Role) -> String {
    generate_access_token(user_id, role, &test_config().jwt).expect("token generation")
}

pub fn admin() -> String {
    token(ADMIN, Role::Admin)
}

pub fn dana() -> String {
    token(DANA, Role::Developer)
}

pub fn eli() -> String {
    token(ELI, Role::Developer)
}

pub fn reporter() -> String {
    token(REPORTER, Role::User)
}

pub fn other_user() -> String {
    token(OTHER_USER, Role::User)
}

/// Read a response body as JSON.
pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Send an unauthenticated GET.
pub async fn get(app: Router, uri: &str) -> Response {
    app.oneshot(Request::get(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

/// Send an authenticated request with an optional JSON body.
pub async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: &str,
    body: Option<serde_json::Value>,
) -> Response {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("authorization", format!("Bearer {token}"));
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    app.clone().oneshot(request).await.unwrap()
}

pub async fn get_auth(app: &Router, uri: &str, token: &str) -> Response {
    send(app, Method::GET, uri, token, None).await
}

pub async fn post_json(app: &Router, uri: &str, token: &str, body: serde_json::Value) -> Response {
    send(app, Method::POST, uri, token, Some(body)).await
}

pub async fn patch_json(app: &Router, uri: &str, token: &str, body: serde_json::Value) -> Response {
    send(app, Method::PATCH, uri, token, Some(body)).await
}

pub async fn patch_empty(app: &Router, uri: &str, token: &str) -> Response {
    send(app, Method::PATCH, uri, token, None).await
}

pub async fn delete(app: &Router, uri: &str, token: &str) -> Response {
    send(app, Method::DELETE, uri, token, None).await
}

/// Create an issue as the default reporter and return its id.
pub async fn create_issue(app: &Router, title: &str) -> i64 {
    let response = post_json(
        app,
        "/api/v1/issues",
        &reporter(),
        serde_json::json!({
            "title": title,
            "description": "Steps to reproduce are attached",
            "priority": "High",
        }),
    )
    .await;
    assert_eq!(response.status(), axum::http::StatusCode::CREATED);
    body_json(response).await["data"]["id"].as_i64().unwrap()
}
