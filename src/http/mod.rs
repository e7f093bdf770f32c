//! HTTP API server for the StudyMate interview UI
//!
//! This module provides a REST API for controlling capture sessions:
//! - POST /capture/start - Start a new capture session
//! - POST /capture/stop/:id - Stop a session and release its devices
//! - GET /capture/:id/status - Query session status
//! - GET /capture/:id/transcript - Get accumulated transcript
//! - GET/POST /capture/:id/metrics - Live metrics snapshot / signal ingestion
//! - GET /health - Health check

mod handlers;
mod routes;
mod state;

pub use routes::create_router;
pub use state::AppState;
