//! HTTP API server for external control (the product UI)
//!
//! This module provides a REST surface for driving the session controller:
//! - POST /session/connect - Open the ingestion channel
//! - POST /session/record/start - Start a recording
//! - POST /session/record/stop - Stop the current recording
//! - POST /session/disconnect - Tear down and reset
//! - GET /session/state - Current session snapshot
//! - GET /health - Health check

mod handlers;
mod routes;
mod state;

pub use routes::create_router;
pub use state::AppState;
