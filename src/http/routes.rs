use super::handlers;
use super::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Create the HTTP router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Call control
        .route("/call/start", post(handlers::start_call))
        .route("/call/stop", post(handlers::stop_call))
        .route("/call/say", post(handlers::say))
        // Call queries
        .route("/call/status", get(handlers::call_status))
        .route("/call/transcript", get(handlers::call_transcript))
        .route("/faults", get(handlers::recent_faults))
        // Browser front-ends call this API from another origin
        .layer(CorsLayer::permissive())
        // Add tracing middleware for request logging
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
