//! State management module
//!
//! This module contains the persisted timer record, the session that keeps it
//! in step with the shared store, and the application state that ties the
//! session to the alarm and the renderer.

pub mod app_state;
pub mod clock;
pub mod session;
pub mod timer_state;

// Re-export main types
pub use app_state::AppState;
pub use clock::{Clock, ManualClock, SystemClock};
pub use session::{PollOutcome, TimerSession, Toggle, STATE_KEY};
pub use timer_state::{TimerState, DEFAULT_TOTAL_SECONDS, MAX_TOTAL_SECONDS};
