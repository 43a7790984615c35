use super::handlers;
use super::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

/// Create the HTTP router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Session control
        .route("/session/connect", post(handlers::connect))
        .route("/session/record/start", post(handlers::start_recording))
        .route("/session/record/stop", post(handlers::stop_recording))
        .route("/session/disconnect", post(handlers::disconnect))
        // State queries
        .route("/session/state", get(handlers::get_state))
        // Add tracing middleware for request logging
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
