use super::state::AppState;
use crate::error::SessionError;
use crate::fault::Fault;
use crate::manager::ManagerStatus;
use crate::session::TranscriptEntry;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use tracing::info;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct StartCallRequest {
    /// Optional assistant ID (if not provided, use the configured one)
    pub assistant_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SayRequest {
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct CallResponse {
    pub status: String,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn error_response(err: &SessionError) -> Response {
    let status = match err {
        SessionError::InvalidState { .. } | SessionError::NotActive { .. } | SessionError::Aborted => {
            StatusCode::CONFLICT
        }
        SessionError::Init(_) | SessionError::Transport(_) => StatusCode::BAD_GATEWAY,
    };

    (
        status,
        Json(ErrorResponse {
            error: err.to_string(),
        }),
    )
        .into_response()
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /call/start
/// Start a call with the assistant
pub async fn start_call(
    State(state): State<AppState>,
    body: Option<Json<StartCallRequest>>,
) -> Response {
    let req = body.map(|Json(req)| req).unwrap_or_default();
    let assistant_id = req
        .assistant_id
        .unwrap_or_else(|| state.default_assistant.clone());

    info!("Starting call with assistant: {}", assistant_id);

    match state.manager.start(&assistant_id).await {
        Ok(()) => (
            StatusCode::OK,
            Json(CallResponse {
                status: "active".to_string(),
                message: "You're connected to the AI assistant".to_string(),
            }),
        )
            .into_response(),
        Err(e) => error_response(&e),
    }
}

/// POST /call/stop
/// End the current call (no-op if there is none)
pub async fn stop_call(State(state): State<AppState>) -> Response {
    let stopped = state.manager.stop().await;

    let message = if stopped {
        "Your call with the AI assistant has ended"
    } else {
        "No call in progress"
    };

    (
        StatusCode::OK,
        Json(CallResponse {
            status: "ended".to_string(),
            message: message.to_string(),
        }),
    )
        .into_response()
}

/// POST /call/say
/// Send user text into the active call
pub async fn say(State(state): State<AppState>, Json(req): Json<SayRequest>) -> Response {
    match state.manager.send_text(&req.text).await {
        Ok(()) => (
            StatusCode::OK,
            Json(CallResponse {
                status: "sent".to_string(),
                message: "Message sent".to_string(),
            }),
        )
            .into_response(),
        Err(e) => error_response(&e),
    }
}

/// GET /call/status
pub async fn call_status(State(state): State<AppState>) -> Json<ManagerStatus> {
    Json(state.manager.status())
}

/// GET /call/transcript
/// Transcript of the current call (or the last one, per retention policy)
pub async fn call_transcript(State(state): State<AppState>) -> Json<Vec<TranscriptEntry>> {
    Json(state.manager.transcript())
}

/// GET /faults
/// Recent faults for user-facing notification
pub async fn recent_faults(State(state): State<AppState>) -> Json<Vec<Fault>> {
    Json(state.faults.recent())
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
