use super::state::AppState;
use crate::error::SessionError;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::{Deserialize, Serialize};
use tracing::info;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct StartRecordingRequest {
    /// Meeting title; must be non-empty after trimming
    pub title: String,
}

#[derive(Debug, Serialize)]
pub struct CommandResponse {
    pub status: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn error_response(e: SessionError) -> axum::response::Response {
    let status = match e {
        SessionError::AlreadyRecording | SessionError::NotRecording => StatusCode::CONFLICT,
        SessionError::EmptyTitle => StatusCode::UNPROCESSABLE_ENTITY,
        SessionError::Unauthenticated => StatusCode::UNAUTHORIZED,
        SessionError::Capture(_) | SessionError::Transport(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (
        status,
        Json(ErrorResponse {
            error: e.to_string(),
        }),
    )
        .into_response()
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /session/connect
/// Open the transport channel to the ingestion endpoint
pub async fn connect(State(state): State<AppState>) -> impl IntoResponse {
    match state.controller.connect().await {
        Ok(()) => (
            StatusCode::OK,
            Json(CommandResponse {
                status: "connected".to_string(),
            }),
        )
            .into_response(),
        Err(e) => error_response(e),
    }
}

/// POST /session/record/start
/// Start a new recording
pub async fn start_recording(
    State(state): State<AppState>,
    Json(req): Json<StartRecordingRequest>,
) -> impl IntoResponse {
    info!("Recording start requested: {}", req.title);
    match state.controller.start_recording(&req.title).await {
        Ok(()) => (
            StatusCode::OK,
            Json(CommandResponse {
                status: "recording".to_string(),
            }),
        )
            .into_response(),
        Err(e) => error_response(e),
    }
}

/// POST /session/record/stop
/// Stop the current recording
pub async fn stop_recording(State(state): State<AppState>) -> impl IntoResponse {
    match state.controller.stop_recording().await {
        Ok(()) => (
            StatusCode::OK,
            Json(CommandResponse {
                status: "stopped".to_string(),
            }),
        )
            .into_response(),
        Err(e) => error_response(e),
    }
}

/// POST /session/disconnect
/// Tear the session down and reset state
pub async fn disconnect(State(state): State<AppState>) -> impl IntoResponse {
    state.controller.disconnect().await;
    (
        StatusCode::OK,
        Json(CommandResponse {
            status: "disconnected".to_string(),
        }),
    )
        .into_response()
}

/// GET /session/state
/// Current session snapshot
pub async fn get_state(State(state): State<AppState>) -> impl IntoResponse {
    let snapshot = state.controller.state().await;
    (StatusCode::OK, Json(snapshot)).into_response()
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
