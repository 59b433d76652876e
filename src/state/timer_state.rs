//! Timer state structure and management

use serde::{Deserialize, Serialize};

/// Duration used when no total time has ever been chosen (3 minutes)
pub const DEFAULT_TOTAL_SECONDS: u64 = 180;

/// Longest countdown accepted from a preset or the store (24 hours)
pub const MAX_TOTAL_SECONDS: u64 = 24 * 60 * 60;

/// Persisted countdown record
///
/// Field names are serialized in camelCase so the stored JSON stays
/// `{"totalTime":..,"timeLeft":..,"isRunning":..,"targetEndTime":..}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerState {
    /// Total duration of the current countdown in seconds
    pub total_time: u64,
    /// Cached remaining seconds, refreshed on every poll and load
    pub time_left: u64,
    pub is_running: bool,
    /// Absolute end of the countdown in epoch milliseconds, only meaningful while running
    pub target_end_time: i64,
}

impl TimerState {
    /// Create the default, stopped 3 minute timer
    pub fn new() -> Self {
        Self::stopped(DEFAULT_TOTAL_SECONDS)
    }

    /// Create a stopped timer with a full countdown of `seconds`
    pub fn stopped(seconds: u64) -> Self {
        Self {
            total_time: seconds,
            time_left: seconds,
            is_running: false,
            target_end_time: 0,
        }
    }

    /// Remaining whole seconds at `now_ms`, rounded up and clamped at zero
    pub fn remaining_at(&self, now_ms: i64) -> u64 {
        remaining_seconds(self.target_end_time, now_ms)
    }

    /// Whether both durations are within [`MAX_TOTAL_SECONDS`]
    pub fn in_range(&self) -> bool {
        self.total_time <= MAX_TOTAL_SECONDS && self.time_left <= MAX_TOTAL_SECONDS
    }

    /// Refresh the cached `time_left` from the wall clock if running
    pub fn refresh(&mut self, now_ms: i64) {
        if self.is_running {
            self.time_left = self.remaining_at(now_ms);
        }
    }
}

impl Default for TimerState {
    fn default() -> Self {
        Self::new()
    }
}

/// `ceil((target - now) / 1000)`, never negative
pub fn remaining_seconds(target_end_ms: i64, now_ms: i64) -> u64 {
    let delta = target_end_ms.saturating_sub(now_ms);
    if delta <= 0 {
        0
    } else {
        // delta is positive so the cast is lossless
        (delta / 1000 + i64::from(delta % 1000 != 0)) as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_three_minutes_stopped() {
        let state = TimerState::default();
        assert_eq!(state.total_time, 180);
        assert_eq!(state.time_left, 180);
        assert!(!state.is_running);
    }

    #[test]
    fn remaining_rounds_up_partial_seconds() {
        assert_eq!(remaining_seconds(10_000, 0), 10);
        assert_eq!(remaining_seconds(10_001, 0), 11);
        assert_eq!(remaining_seconds(10_000, 9_999), 1);
        assert_eq!(remaining_seconds(10_000, 10_000), 0);
        assert_eq!(remaining_seconds(10_000, 20_000), 0);
    }

    #[test]
    fn remaining_survives_extreme_timestamps() {
        assert_eq!(remaining_seconds(i64::MAX, 0), (i64::MAX / 1000 + 1) as u64);
        assert_eq!(remaining_seconds(i64::MAX, i64::MIN), (i64::MAX / 1000 + 1) as u64);
        assert_eq!(remaining_seconds(i64::MIN, i64::MAX), 0);
    }

    #[test]
    fn range_check_caps_both_durations() {
        assert!(TimerState::stopped(MAX_TOTAL_SECONDS).in_range());
        assert!(!TimerState::stopped(MAX_TOTAL_SECONDS + 1).in_range());
        let state = TimerState { time_left: u64::MAX, ..TimerState::new() };
        assert!(!state.in_range());
    }

    #[test]
    fn refresh_only_touches_running_timers() {
        let mut stopped = TimerState::stopped(60);
        stopped.target_end_time = 5_000;
        stopped.refresh(0);
        assert_eq!(stopped.time_left, 60);

        let mut running = TimerState { is_running: true, target_end_time: 5_000, ..TimerState::stopped(60) };
        running.refresh(0);
        assert_eq!(running.time_left, 5);
    }

    #[test]
    fn serializes_with_camel_case_fields() {
        let json = serde_json::to_string(&TimerState::stopped(90)).unwrap();
        assert_eq!(
            json,
            r#"{"totalTime":90,"timeLeft":90,"isRunning":false,"targetEndTime":0}"#
        );
    }
}
