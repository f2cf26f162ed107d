//! HTTP request handlers

use crate::api::server::AppContext;
use crate::error::Error;
use crate::output::AudioOutputRouter;
use crate::playback::{PlaybackState, PlayerStatus, SessionId};
use crate::settings_store::SettingsUpdate;
use crate::telephony::TelephonyObserver;
use axum::{extract::State, http::StatusCode, Json};
use klaxon_common::{AlarmSettings, AlertId, CallState, Command};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: String,
    module: String,
    version: String,
    git_hash: String,
    build_timestamp: String,
    build_profile: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub struct CommandRequest {
    pub action: String,
    #[serde(default)]
    pub alert_id: Option<AlertId>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CommandResponse {
    pub command: String,
    pub sticky: bool,
    pub state: PlaybackState,
    pub session_id: Option<SessionId>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TelephonyRequest {
    pub call_state: CallState,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OutputRequest {
    pub stream_gain: f32,
}

type ApiError = (StatusCode, Json<StatusResponse>);

fn error_response(e: Error) -> ApiError {
    let status = match &e {
        Error::ControllerGone => StatusCode::SERVICE_UNAVAILABLE,
        Error::NotFound(_) => StatusCode::NOT_FOUND,
        Error::Config(_) | Error::UnknownCommand(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    error!("Request failed: {}", e);
    (
        status,
        Json(StatusResponse {
            status: e.to_string(),
        }),
    )
}

// ============================================================================
// Health and Status
// ============================================================================

/// GET /health
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        module: "klaxon-ap".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        git_hash: env!("GIT_HASH").to_string(),
        build_timestamp: env!("BUILD_TIMESTAMP").to_string(),
        build_profile: env!("BUILD_PROFILE").to_string(),
    })
}

/// GET /status
pub async fn get_status(State(ctx): State<AppContext>) -> Json<PlayerStatus> {
    Json(ctx.controller.status())
}

// ============================================================================
// Commands
// ============================================================================

/// POST /commands
///
/// Unrecognized actions are still delivered (as unknown commands), so the
/// player stops and reports a non-sticky outcome.
pub async fn post_command(
    State(ctx): State<AppContext>,
    Json(req): Json<CommandRequest>,
) -> Result<Json<CommandResponse>, ApiError> {
    let command = Command::from_action(&req.action, req.alert_id);
    info!("Command received: {}", command);

    let name = command.action().to_string();
    let outcome = ctx.controller.send(command).await.map_err(error_response)?;
    let status = ctx.controller.status();

    Ok(Json(CommandResponse {
        command: name,
        sticky: outcome.is_sticky(),
        state: status.state,
        session_id: status.session_id,
    }))
}

// ============================================================================
// Telephony, Settings, Output
// ============================================================================

/// PUT /telephony
pub async fn put_telephony(
    State(ctx): State<AppContext>,
    Json(req): Json<TelephonyRequest>,
) -> Json<TelephonyRequest> {
    ctx.telephony.set(req.call_state);
    Json(TelephonyRequest {
        call_state: ctx.telephony.call_state(),
    })
}

/// GET /settings
pub async fn get_settings(State(ctx): State<AppContext>) -> Json<AlarmSettings> {
    Json(ctx.settings.current())
}

/// PUT /settings
///
/// Out-of-range levels are clamped, not rejected.
pub async fn put_settings(
    State(ctx): State<AppContext>,
    Json(update): Json<SettingsUpdate>,
) -> Result<Json<AlarmSettings>, ApiError> {
    let settings = ctx.settings.update(update).await.map_err(error_response)?;
    Ok(Json(settings))
}

/// PUT /output
pub async fn put_output(
    State(ctx): State<AppContext>,
    Json(req): Json<OutputRequest>,
) -> Json<OutputRequest> {
    ctx.output.set_stream_gain(req.stream_gain);
    Json(OutputRequest {
        stream_gain: ctx.output.stream_gain(),
    })
}
