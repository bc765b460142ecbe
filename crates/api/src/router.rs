//! Router assembly for the tracker API.
//!
//! [`build_app_router`] is shared by the binary and the router tests, so a
//! test request passes through the same layers as production traffic.

use std::time::Duration;

use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderName, Method, StatusCode};
use axum::Router;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::config::ServerConfig;
use crate::routes;
use crate::state::AppState;

/// Header carrying the per-request correlation id.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Methods the issue routes answer to. There is no `PUT`: updates are
/// partial and go through `PATCH`.
const ALLOWED_METHODS: [Method; 4] = [Method::GET, Method::POST, Method::PATCH, Method::DELETE];

/// Browsers may cache the preflight answer for an hour.
const CORS_MAX_AGE: Duration = Duration::from_secs(3600);

/// Assemble `/health`, the `/api/v1` tree and the middleware around them.
///
/// Layers run outermost first on the way in:
///
/// 1. CORS
/// 2. Request id assignment
/// 3. Request/response tracing, with the id already on the span
/// 4. Request id echo on the response
/// 5. Request timeout (408)
/// 6. Panic recovery (500)
pub fn build_app_router(state: AppState, config: &ServerConfig) -> Router {
    let request_id = HeaderName::from_static(REQUEST_ID_HEADER);
    let timeout = Duration::from_secs(config.request_timeout_secs);

    Router::new()
        // Liveness stays outside the versioned prefix for load balancers.
        .merge(routes::health::router())
        .nest("/api/v1", routes::api_routes())
        // A panicking handler becomes a 500 instead of a dropped connection.
        .layer(CatchPanicLayer::new())
        // Slow store calls are cut off here, not by the client.
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            timeout,
        ))
        // Echo the id so clients can quote it when reporting a failure.
        .layer(PropagateRequestIdLayer::new(request_id.clone()))
        // One INFO span per request; handlers add issue and actor ids.
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        // Keep a caller-supplied id, otherwise mint a UUID.
        .layer(SetRequestIdLayer::new(request_id, MakeRequestUuid))
        // Outermost, so preflight requests never reach auth or the handlers.
        .layer(build_cors_layer(config))
        .with_state(state)
}

/// CORS for the configured front-end origins. Bearer tokens travel in the
/// `Authorization` header, so that header must be allowed.
///
/// Panics at startup on an origin that is not a valid header value.
pub fn build_cors_layer(config: &ServerConfig) -> CorsLayer {
    let origins: Vec<_> = config
        .cors_origins
        .iter()
        .map(|origin| {
            origin
                .parse()
                .unwrap_or_else(|e| panic!("Invalid CORS origin '{origin}': {e}"))
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(ALLOWED_METHODS)
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .allow_credentials(true)
        .max_age(CORS_MAX_AGE)
}
