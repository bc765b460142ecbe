use std::sync::Arc;

use tracker_core::workflow::IssueWorkflowService;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable: the service holds its stores behind `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// Workflow operations over the configured stores.
    pub service: IssueWorkflowService,
    pub config: Arc<ServerConfig>,
}
