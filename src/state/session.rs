//! Countdown session backed by the shared store
//!
//! Every state-changing operation follows the same protocol: reload from the
//! store, modify, persist. Two instances racing within the same tick may lose
//! one of the writes; the last writer wins.

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use super::{
    clock::Clock,
    timer_state::{TimerState, DEFAULT_TOTAL_SECONDS, MAX_TOTAL_SECONDS},
};
use crate::store::KeyValueStore;

/// Store key holding the serialized [`TimerState`]
pub const STATE_KEY: &str = "noodleTimerState";

/// Result of one countdown poll
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// The timer is not running
    Idle,
    /// Still counting down, with the remaining seconds
    Ticking(u64),
    /// Reached zero on this poll and was stopped
    Expired,
}

/// Result of [`TimerSession::toggle`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Toggle {
    Started,
    Stopped,
    /// Nothing left to count down
    Unchanged,
}

#[derive(Debug)]
pub struct TimerSession {
    state: TimerState,
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
}

impl TimerSession {
    /// Create a session with the default state, then load whatever is persisted
    pub fn open(store: Arc<dyn KeyValueStore>, clock: Arc<dyn Clock>) -> Self {
        let mut session = Self { state: TimerState::new(), store, clock };
        session.load_state();
        session
    }

    pub fn state(&self) -> &TimerState {
        &self.state
    }

    pub fn store(&self) -> &Arc<dyn KeyValueStore> {
        &self.store
    }

    /// Pull the latest persisted state and reconcile it with the wall clock
    ///
    /// An absent key keeps the in-memory state; an unreadable or malformed
    /// value falls back to the default. Neither is reported to the caller.
    pub fn load_state(&mut self) {
        match self.store.get(STATE_KEY) {
            Ok(Some(raw)) => match serde_json::from_str::<TimerState>(&raw) {
                Ok(state) if state.in_range() => self.state = state,
                Ok(state) => {
                    warn!("Discarding out of range timer state: {}s of {}s", state.time_left, state.total_time);
                    self.state = TimerState::new();
                }
                Err(e) => {
                    warn!("Discarding malformed timer state: {}", e);
                    self.state = TimerState::new();
                }
            },
            Ok(None) => debug!("No persisted timer state, keeping current"),
            Err(e) => {
                warn!("Failed to read timer state: {}", e);
                self.state = TimerState::new();
            }
        }

        self.state.refresh(self.clock.now_ms());
    }

    fn save_state(&self) -> Result<(), String> {
        let json = serde_json::to_string(&self.state)
            .map_err(|e| format!("Failed to serialize timer state: {}", e))?;
        self.store.set(STATE_KEY, &json)
    }

    /// Begin counting down from the current `time_left`
    ///
    /// Returns `false` without touching the store when already running or
    /// when there is nothing left to count.
    pub fn start(&mut self) -> Result<bool, String> {
        if self.state.is_running || self.state.time_left == 0 {
            return Ok(false);
        }

        let now = self.clock.now_ms();
        let target = i64::try_from(self.state.time_left)
            .ok()
            .and_then(|seconds| seconds.checked_mul(1000))
            .and_then(|ms| now.checked_add(ms))
            .ok_or_else(|| format!("Cannot count down {}s", self.state.time_left))?;
        self.state.is_running = true;
        self.state.target_end_time = target;
        info!("Countdown started with {}s left", self.state.time_left);
        self.save_state()?;
        Ok(true)
    }

    /// Freeze the countdown at the current remaining time
    pub fn stop(&mut self) -> Result<bool, String> {
        if !self.state.is_running {
            return Ok(false);
        }

        self.state.time_left = self.state.remaining_at(self.clock.now_ms());
        self.state.is_running = false;
        info!("Countdown stopped with {}s left", self.state.time_left);
        self.save_state()?;
        Ok(true)
    }

    /// Reload, then stop if running or start otherwise
    pub fn toggle(&mut self) -> Result<Toggle, String> {
        self.load_state();
        if self.state.is_running {
            self.stop()?;
            Ok(Toggle::Stopped)
        } else if self.start()? {
            Ok(Toggle::Started)
        } else {
            Ok(Toggle::Unchanged)
        }
    }

    /// Stop and refill the countdown from the total time
    ///
    /// A zero total falls back to the 3 minute default.
    pub fn reset(&mut self) -> Result<(), String> {
        self.state.is_running = false;
        self.state.time_left = if self.state.total_time > 0 {
            self.state.total_time
        } else {
            DEFAULT_TOTAL_SECONDS
        };
        self.state.total_time = self.state.time_left;
        info!("Countdown reset to {}s", self.state.time_left);
        self.save_state()
    }

    /// Stop and switch to a new total duration
    pub fn set_preset(&mut self, seconds: u64) -> Result<(), String> {
        if seconds == 0 {
            return Err("Preset duration must be positive".to_string());
        }
        if seconds > MAX_TOTAL_SECONDS {
            return Err(format!("Preset duration must be at most {}s", MAX_TOTAL_SECONDS));
        }

        self.state = TimerState::stopped(seconds);
        info!("Preset selected: {}s", seconds);
        self.save_state()
    }

    /// Recompute the remaining time, stopping at zero
    ///
    /// A failure to persist the expiry is logged; the countdown still ends.
    pub fn poll(&mut self) -> PollOutcome {
        if !self.state.is_running {
            return PollOutcome::Idle;
        }

        let remaining = self.state.remaining_at(self.clock.now_ms());
        if remaining > 0 {
            self.state.time_left = remaining;
            return PollOutcome::Ticking(remaining);
        }

        self.state.time_left = 0;
        self.state.is_running = false;
        info!("Countdown finished");
        if let Err(e) = self.save_state() {
            error!("Failed to persist finished countdown: {}", e);
        }
        PollOutcome::Expired
    }
}
