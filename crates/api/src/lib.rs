//! HTTP API layer with Axum routes.
//!
//! This crate provides:
//! - REST API routes over the workflow orchestrator
//! - Request extractors
//! - Error responses

pub mod error;
pub mod extractors;
pub mod routes;

use axum::Router;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use auditflow_core::workflow::WorkflowOrchestrator;
use auditflow_db::SeaOrmWorkflowStore;

/// The orchestrator type served by the API.
pub type Orchestrator = WorkflowOrchestrator<SeaOrmWorkflowStore>;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Workflow orchestrator over the database store.
    pub orchestrator: Arc<Orchestrator>,
}

impl AppState {
    /// Creates application state around an orchestrator.
    #[must_use]
    pub fn new(orchestrator: Orchestrator) -> Self {
        Self {
            orchestrator: Arc::new(orchestrator),
        }
    }
}

/// Creates the main application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1", routes::api_routes())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
