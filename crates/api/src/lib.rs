//! HTTP surface of the issue tracker.
//!
//! Thin `axum` wiring over [`tracker_core::workflow::IssueWorkflowService`]:
//! handlers resolve the actor from a bearer token and map workflow errors to
//! JSON responses.

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod response;
pub mod router;
pub mod routes;
pub mod state;
