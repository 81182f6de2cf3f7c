//! drg-gw library - Deep Research Gateway service
//!
//! Relays one long-running research job per request as a live SSE stream
//! (subprocess or upstream mode) and proxies the report CRUD surface to
//! the external report store.

use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use drg_common::config::GatewayConfig;

pub mod api;
pub mod backend;

/// Application state shared across HTTP handlers
///
/// The gateway is stateless per request; this is configuration plus one
/// shared HTTP client (connection pool) for upstream mode and the report
/// proxy.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<GatewayConfig>,
    pub http: reqwest::Client,
}

impl AppState {
    /// Create new application state
    pub fn new(config: GatewayConfig) -> Self {
        Self {
            config: Arc::new(config),
            http: reqwest::Client::new(),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/research", get(api::research_stream))
        .route("/api/reports", get(api::list_reports))
        .route(
            "/api/reports/:id",
            get(api::get_report).delete(api::delete_report),
        )
        .route("/api/download/:id/:format", get(api::download_report))
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
