//! HTTP endpoint handlers

use std::sync::Arc;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use tracing::{error, info, warn};

use crate::{alarm::SoundType, state::{AppState, Toggle, MAX_TOTAL_SECONDS}};
use super::responses::{
    ApiResponse, ErrorResponse, HealthResponse, PresetsResponse, SoundRequest, SoundResponse,
    StateResponse, StatusResponse,
};

type HandlerError = (StatusCode, Json<ErrorResponse>);

fn internal(context: &str, e: String) -> HandlerError {
    error!("{}: {}", context, e);
    (StatusCode::INTERNAL_SERVER_ERROR, Json(ErrorResponse::new(format!("{}: {}", context, e))))
}

fn bad_request(message: String) -> HandlerError {
    warn!("Rejected request: {}", message);
    (StatusCode::BAD_REQUEST, Json(ErrorResponse::new(message)))
}

/// Handle GET /state - Return the timer state and its rendered view
pub async fn state_handler(State(state): State<Arc<AppState>>) -> Result<Json<StateResponse>, HandlerError> {
    let timer = state.get_timer_state().map_err(|e| internal("Failed to get timer state", e))?;
    let sound = state.get_sound().map_err(|e| internal("Failed to get sound", e))?;

    Ok(Json(StateResponse {
        state: timer,
        view: state.view(),
        sound,
    }))
}

/// Handle POST /start-stop - Toggle the countdown like the start/stop button
pub async fn start_stop_handler(State(state): State<Arc<AppState>>) -> Result<Json<ApiResponse>, HandlerError> {
    let toggle = state.start_stop().map_err(|e| internal("Failed to toggle countdown", e))?;
    info!("Start-stop endpoint called - {:?}", toggle);

    let message = match toggle {
        Toggle::Started => "Countdown started",
        Toggle::Stopped => "Countdown stopped",
        Toggle::Unchanged => "Nothing left to count down",
    };
    Ok(Json(ApiResponse::from_view(message.to_string(), state.view())))
}

/// Handle POST /start - Start the countdown
pub async fn start_handler(State(state): State<Arc<AppState>>) -> Result<Json<ApiResponse>, HandlerError> {
    let started = state.start().map_err(|e| internal("Failed to start countdown", e))?;
    info!("Start endpoint called - started={}", started);

    let message = if started { "Countdown started" } else { "Countdown not started" };
    Ok(Json(ApiResponse::from_view(message.to_string(), state.view())))
}

/// Handle POST /stop - Stop the countdown
pub async fn stop_handler(State(state): State<Arc<AppState>>) -> Result<Json<ApiResponse>, HandlerError> {
    let stopped = state.stop().map_err(|e| internal("Failed to stop countdown", e))?;
    info!("Stop endpoint called - stopped={}", stopped);

    let message = if stopped { "Countdown stopped" } else { "Countdown was not running" };
    Ok(Json(ApiResponse::stopped(message.to_string(), state.view())))
}

/// Handle POST /reset - Refill the countdown from its total
pub async fn reset_handler(State(state): State<Arc<AppState>>) -> Result<Json<ApiResponse>, HandlerError> {
    let view = state.reset().map_err(|e| internal("Failed to reset countdown", e))?;
    info!("Reset endpoint called");
    Ok(Json(ApiResponse::stopped("Countdown reset".to_string(), view)))
}

/// Handle POST /preset/:seconds - Switch to a new total duration
pub async fn preset_handler(
    State(state): State<Arc<AppState>>,
    Path(seconds): Path<u64>,
) -> Result<Json<ApiResponse>, HandlerError> {
    if seconds == 0 {
        return Err(bad_request("Preset duration must be positive".to_string()));
    }
    if seconds > MAX_TOTAL_SECONDS {
        return Err(bad_request(format!("Preset duration must be at most {}s", MAX_TOTAL_SECONDS)));
    }

    let view = state.set_preset(seconds).map_err(|e| internal("Failed to set preset", e))?;
    info!("Preset endpoint called - {}s", seconds);
    Ok(Json(ApiResponse::stopped(format!("Preset set to {}s", seconds), view)))
}

/// Handle GET /presets - List the configured presets
pub async fn presets_handler(State(state): State<Arc<AppState>>) -> Json<PresetsResponse> {
    Json(PresetsResponse {
        presets: state.presets.clone(),
        active: state.view().active_preset,
    })
}

/// Handle POST /alarm/dismiss - Silence the alarm
pub async fn dismiss_handler(State(state): State<Arc<AppState>>) -> Result<Json<ApiResponse>, HandlerError> {
    let was_sounding = state.dismiss_alarm().map_err(|e| internal("Failed to dismiss alarm", e))?;
    info!("Dismiss endpoint called - was_sounding={}", was_sounding);

    let message = if was_sounding { "Alarm dismissed" } else { "Alarm was not sounding" };
    Ok(Json(ApiResponse::from_view(message.to_string(), state.view())))
}

/// Handle PUT /sound - Select the alarm sound and preview it
pub async fn sound_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SoundRequest>,
) -> Result<Json<SoundResponse>, HandlerError> {
    let sound: SoundType = request.sound.parse().map_err(bad_request)?;
    let previewing = state.select_sound(sound.clone())
        .map_err(|e| internal("Failed to select sound", e))?;

    info!("Sound endpoint called - {} (preview={})", sound, previewing);
    Ok(Json(SoundResponse { sound, previewing }))
}

/// Handle GET /status - Return server and timer status
pub async fn status_handler(State(state): State<Arc<AppState>>) -> Result<Json<StatusResponse>, HandlerError> {
    let timer = state.get_timer_state().map_err(|e| internal("Failed to get timer state", e))?;
    let alarm_sounding = state.is_alarm_sounding().map_err(|e| internal("Failed to get alarm state", e))?;
    let (last_action, last_action_time) = state.get_last_action();

    Ok(Json(StatusResponse {
        timer_running: timer.is_running,
        timer_remaining_seconds: timer.time_left,
        alarm_sounding,
        countdown_active: state.is_countdown_active(),
        uptime: state.get_uptime(),
        port: state.port,
        host: state.host.clone(),
        last_action,
        last_action_time,
    }))
}

/// Handle GET /health - Health check endpoint
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}
