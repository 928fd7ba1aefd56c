//! HTTP surface for the four reliability reports.

pub mod envelope;
pub mod handlers;

use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::engine::ReliabilityEngine;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<ReliabilityEngine>,
}

/// Build the report API router.
pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(handlers::health))
        .route("/api/reports/reliability", get(handlers::reliability))
        .route(
            "/api/reports/failure-breakdown",
            get(handlers::failure_breakdown),
        )
        .route(
            "/api/reports/component-hours",
            get(handlers::component_hours),
        )
        .route(
            "/api/reports/component-swaps",
            get(handlers::component_swaps),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
