use axum::{
    middleware::from_fn,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use super::handlers;
use super::AppState;
use crate::middleware::{make_span_with_request_id, request_id_middleware};

/// Creates the main API router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        // Streaming catalog
        .route("/api/services", get(handlers::get_services))
        // TMDB passthrough
        .route("/api/tmdb", get(handlers::tmdb_proxy))
        // Mood-based discovery
        .route("/api/recommendations", get(handlers::get_recommendations))
        // AI analysis
        .route("/api/analyze-content", post(handlers::analyze_content))
        .with_state(state)
        // Request id runs outermost so the trace span can read it
        .layer(
            ServiceBuilder::new()
                .layer(from_fn(request_id_middleware))
                .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id))
                .layer(CorsLayer::permissive()),
        )
}
