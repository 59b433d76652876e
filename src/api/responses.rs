//! API response structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{alarm::SoundType, render::View, state::TimerState};

/// API response structure for timer actions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse {
    pub status: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub view: View,
}

impl ApiResponse {
    /// Create a new API response
    pub fn new(status: String, message: String, view: View) -> Self {
        Self {
            status,
            message,
            timestamp: Utc::now(),
            view,
        }
    }

    /// Countdown is running after the action
    pub fn running(message: String, view: View) -> Self {
        Self::new("running".to_string(), message, view)
    }

    /// Countdown is stopped after the action
    pub fn stopped(message: String, view: View) -> Self {
        Self::new("stopped".to_string(), message, view)
    }

    /// Pick `running` or `stopped` from the rendered button
    pub fn from_view(message: String, view: View) -> Self {
        if view.button_label == "STOP" {
            Self::running(message, view)
        } else {
            Self::stopped(message, view)
        }
    }
}

/// Full timer snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateResponse {
    pub state: TimerState,
    pub view: View,
    pub sound: SoundType,
}

/// Configured preset durations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresetsResponse {
    pub presets: Vec<u64>,
    pub active: Option<u64>,
}

/// Body of `PUT /sound`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SoundRequest {
    pub sound: String,
}

/// Result of a sound selection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SoundResponse {
    pub sound: SoundType,
    pub previewing: bool,
}

/// Server status with timer information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub timer_running: bool,
    pub timer_remaining_seconds: u64,
    pub alarm_sounding: bool,
    pub countdown_active: bool,
    pub uptime: String,
    pub port: u16,
    pub host: String,
    pub last_action: Option<String>,
    pub last_action_time: Option<DateTime<Utc>>,
}

/// Error body for rejected requests
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub status: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(message: String) -> Self {
        Self { status: "error".to_string(), message }
    }
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub version: String,
}

impl HealthResponse {
    /// Create a new health response
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
            timestamp: Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}
