use super::state::AppState;
use crate::session::{
    BehaviorSignal, CaptureConfig, CaptureEvent, CaptureSession, CommunicationSignal,
    FaceMetricsSummary, FacialSignal, MetricsSnapshot, SessionState, SessionStats,
    TranscriptSegment,
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct StartCaptureRequest {
    /// Optional session ID (if not provided, generate UUID)
    pub session_id: Option<String>,

    /// Recording cap in seconds (default: 180)
    pub max_duration_secs: Option<u32>,

    /// Transcript streaming endpoint override
    pub transcript_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct StartCaptureResponse {
    pub session_id: String,
    pub status: String,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct StopCaptureResponse {
    pub session_id: String,
    pub status: String,
    pub message: String,
    pub stats: SessionStats,
}

#[derive(Debug, Deserialize)]
pub struct MetricsUpdateRequest {
    /// Facial scores from the frame-analysis service
    pub facial: Option<FacialSignal>,

    /// Behavioral tracking from the frame-analysis service
    pub behavior: Option<BehaviorSignal>,

    /// Speech delivery scores from the communication-analysis service
    pub communication: Option<CommunicationSignal>,
}

#[derive(Debug, Serialize)]
pub struct MetricsResponse {
    pub session_id: String,
    pub snapshot: MetricsSnapshot,
    pub face_summary: FaceMetricsSummary,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /capture/start
/// Start a new capture session
pub async fn start_capture(
    State(state): State<AppState>,
    Json(req): Json<StartCaptureRequest>,
) -> impl IntoResponse {
    let session_id = req
        .session_id
        .unwrap_or_else(|| format!("interview-{}", uuid::Uuid::new_v4()));

    info!("starting capture for session: {}", session_id);

    // Check if already recording
    {
        let sessions = state.sessions.read().await;
        if sessions.contains_key(&session_id) {
            return (
                StatusCode::CONFLICT,
                Json(ErrorResponse {
                    error: format!("session {} is already capturing", session_id),
                }),
            )
                .into_response();
        }
    }

    let config = CaptureConfig {
        session_id: session_id.clone(),
        max_duration_secs: req
            .max_duration_secs
            .unwrap_or(state.defaults.max_duration_secs),
        transcript_url: req
            .transcript_url
            .or_else(|| state.defaults.transcript_url.clone()),
        ..state.defaults.clone()
    };

    let (session, events) = CaptureSession::new(config, Arc::clone(&state.backend));
    let session = Arc::new(session);

    spawn_event_consumer(session_id.clone(), events, state.recordings_dir.clone());

    if let Err(e) = session.start().await {
        error!("failed to start capture: {}", e);
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: format!("failed to start capture: {}", e),
            }),
        )
            .into_response();
    }

    // start() is a no-op when the microphone could not be acquired
    if session.state() != SessionState::Recording {
        if let Err(e) = session.close().await {
            warn!("failed to close session after start failure: {}", e);
        }
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: "microphone unavailable".to_string(),
            }),
        )
            .into_response();
    }

    {
        let mut sessions = state.sessions.write().await;
        sessions.insert(session_id.clone(), session);
    }

    info!("capture started for session: {}", session_id);

    (
        StatusCode::OK,
        Json(StartCaptureResponse {
            session_id: session_id.clone(),
            status: "recording".to_string(),
            message: format!("capture started for session {}", session_id),
        }),
    )
        .into_response()
}

/// POST /capture/stop/:session_id
/// Stop a capture session and release its devices
pub async fn stop_capture(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> impl IntoResponse {
    info!("stopping capture for session: {}", session_id);

    let session = {
        let mut sessions = state.sessions.write().await;
        sessions.remove(&session_id)
    };

    match session {
        Some(session) => {
            if let Err(e) = session.close().await {
                error!("failed to stop capture: {}", e);
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorResponse {
                        error: format!("failed to stop capture: {}", e),
                    }),
                )
                    .into_response();
            }

            let stats = session.stats().await;
            info!("capture stopped for session: {}", session_id);
            (
                StatusCode::OK,
                Json(StopCaptureResponse {
                    session_id: session_id.clone(),
                    status: "stopped".to_string(),
                    message: "capture stopped".to_string(),
                    stats,
                }),
            )
                .into_response()
        }
        None => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: format!("session {} not found", session_id),
            }),
        )
            .into_response(),
    }
}

/// GET /capture/:session_id/status
/// Get status of a capture session
pub async fn get_capture_status(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> impl IntoResponse {
    let sessions = state.sessions.read().await;

    match sessions.get(&session_id) {
        Some(session) => {
            let stats = session.stats().await;
            (StatusCode::OK, Json(stats)).into_response()
        }
        None => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: format!("session {} not found", session_id),
            }),
        )
            .into_response(),
    }
}

/// GET /capture/:session_id/transcript
/// Get transcript for a session (accumulated so far)
pub async fn get_capture_transcript(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> impl IntoResponse {
    let sessions = state.sessions.read().await;

    match sessions.get(&session_id) {
        Some(session) => {
            let transcript: Vec<TranscriptSegment> = session.transcript().await;
            (StatusCode::OK, Json(transcript)).into_response()
        }
        None => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: format!("session {} not found", session_id),
            }),
        )
            .into_response(),
    }
}

/// POST /capture/:session_id/metrics
/// Fold externally-computed analysis signals into the session's live metrics
pub async fn update_capture_metrics(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(req): Json<MetricsUpdateRequest>,
) -> impl IntoResponse {
    let sessions = state.sessions.read().await;

    match sessions.get(&session_id) {
        Some(session) => {
            if let Some(facial) = req.facial {
                session
                    .ingest_face_analysis(facial, req.behavior.unwrap_or_default())
                    .await;
            }
            if let Some(communication) = req.communication {
                session.ingest_communication(communication).await;
            }
            StatusCode::NO_CONTENT.into_response()
        }
        None => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: format!("session {} not found", session_id),
            }),
        )
            .into_response(),
    }
}

/// GET /capture/:session_id/metrics
/// Get the live metrics snapshot and per-recording facial averages
pub async fn get_capture_metrics(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> impl IntoResponse {
    let sessions = state.sessions.read().await;

    match sessions.get(&session_id) {
        Some(session) => {
            let response = MetricsResponse {
                session_id: session_id.clone(),
                snapshot: session.metrics_snapshot().await,
                face_summary: session.face_summary().await,
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        None => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: format!("session {} not found", session_id),
            }),
        )
            .into_response(),
    }
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

/// The server-side host for session events: logs the stream and persists the
/// final recording when a recordings directory is configured
fn spawn_event_consumer(
    session_id: String,
    mut events: mpsc::UnboundedReceiver<CaptureEvent>,
    recordings_dir: Option<std::path::PathBuf>,
) {
    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            match event {
                CaptureEvent::RecordingChange(recording) => {
                    info!("session {}: recording = {}", session_id, recording);
                }
                CaptureEvent::AudioReady(blob) => {
                    info!(
                        "session {}: audio ready ({} bytes, {:.1}s)",
                        session_id,
                        blob.len(),
                        blob.duration_seconds()
                    );
                    if let Some(dir) = &recordings_dir {
                        let path = dir.join(format!("{}.wav", session_id));
                        match blob.write_wav(&path) {
                            Ok(()) => info!("session {}: saved {:?}", session_id, path),
                            Err(e) => error!("session {}: failed to save recording: {:#}", session_id, e),
                        }
                    }
                }
                CaptureEvent::FaceFrame(uri) => {
                    debug!("session {}: face frame ({} bytes)", session_id, uri.len());
                }
                CaptureEvent::TranscriptUpdate(text) => {
                    debug!("session {}: transcript: {}", session_id, text);
                }
                CaptureEvent::AudioLevel(level) => {
                    debug!("session {}: level = {}", session_id, level);
                }
            }
        }
    });
}
