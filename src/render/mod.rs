//! Display and progress rendering
//!
//! Everything here is a pure function of the timer state. The [`View`] is
//! what a front end needs to draw the clock, the start/stop button, the
//! preset highlight and the three stacked backdrop layers.

use serde::{Deserialize, Serialize};

use crate::state::TimerState;

/// Opacity of each stacked backdrop layer, each in `[0, 1]`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Backdrop {
    pub blue: f64,
    pub yellow: f64,
    pub red: f64,
}

impl Backdrop {
    /// Untouched timer, fully blue
    pub const FRESH: Backdrop = Backdrop { blue: 1.0, yellow: 0.0, red: 0.0 };

    /// Cross-fade blue→yellow over `[0, 0.5)` and yellow→red over `[0.5, 1]`
    pub fn at(progress: f64) -> Self {
        let p = progress.clamp(0.0, 1.0);
        if p < 0.5 {
            Self { blue: 1.0 - p * 2.0, yellow: p * 2.0, red: 0.0 }
        } else {
            Self { blue: 0.0, yellow: 1.0 - (p - 0.5) * 2.0, red: (p - 0.5) * 2.0 }
        }
    }
}

/// Everything a front end draws for one frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct View {
    pub minutes: String,
    pub seconds: String,
    pub progress: f64,
    pub backdrop: Backdrop,
    /// `START` or `STOP`
    pub button_label: String,
    /// Preset matching the current total, if any
    pub active_preset: Option<u64>,
    /// Countdown stopped at zero
    pub finished: bool,
    pub alarm_sounding: bool,
}

/// Zero padded `(minutes, seconds)` text
pub fn clock_text(seconds: u64) -> (String, String) {
    (format!("{:02}", seconds / 60), format!("{:02}", seconds % 60))
}

/// Fraction of the countdown already elapsed, `None` without a total
pub fn progress(time_left: u64, total_time: u64) -> Option<f64> {
    if total_time == 0 {
        return None;
    }
    let elapsed = total_time.saturating_sub(time_left);
    Some(elapsed as f64 / total_time as f64)
}

/// Render the full view for a timer state
pub fn render(state: &TimerState, alarm_sounding: bool, presets: &[u64]) -> View {
    let (minutes, seconds) = clock_text(state.time_left);
    let progress = progress(state.time_left, state.total_time);

    View {
        minutes,
        seconds,
        progress: progress.unwrap_or(0.0),
        backdrop: progress.map(Backdrop::at).unwrap_or(Backdrop::FRESH),
        button_label: if state.is_running { "STOP" } else { "START" }.to_string(),
        active_preset: presets.iter().copied().find(|&p| p == state.total_time),
        finished: !state.is_running && state.time_left == 0,
        alarm_sounding,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn clock_is_zero_padded() {
        assert_eq!(clock_text(0), ("00".to_string(), "00".to_string()));
        assert_eq!(clock_text(185), ("03".to_string(), "05".to_string()));
        assert_eq!(clock_text(6000), ("100".to_string(), "00".to_string()));
    }

    #[test]
    fn progress_is_elapsed_over_total() {
        for total in [1u64, 7, 60, 180, 3599] {
            for elapsed in [0, total / 3, total / 2, total] {
                let p = progress(total - elapsed, total).unwrap();
                assert!(close(p, elapsed as f64 / total as f64), "total={} elapsed={}", total, elapsed);
            }
        }
        assert_eq!(progress(0, 0), None);
    }

    #[test]
    fn colours_cross_at_the_midpoint() {
        let start = Backdrop::at(0.0);
        assert_eq!(start, Backdrop::FRESH);

        let mid = Backdrop::at(0.5);
        assert!(close(mid.blue, 0.0) && close(mid.yellow, 1.0) && close(mid.red, 0.0));

        let end = Backdrop::at(1.0);
        assert!(close(end.blue, 0.0) && close(end.yellow, 0.0) && close(end.red, 1.0));

        let quarter = Backdrop::at(0.25);
        assert!(close(quarter.blue, 0.5) && close(quarter.yellow, 0.5));

        let three_quarters = Backdrop::at(0.75);
        assert!(close(three_quarters.yellow, 0.5) && close(three_quarters.red, 0.5));
    }

    #[test]
    fn opacities_always_sum_to_one() {
        for step in 0..=100 {
            let b = Backdrop::at(step as f64 / 100.0);
            assert!(close(b.blue + b.yellow + b.red, 1.0), "step {}", step);
        }
    }

    #[test]
    fn view_reflects_running_and_finished() {
        let presets = [180, 240, 300];
        let mut state = TimerState::stopped(240);
        let view = render(&state, false, &presets);
        assert_eq!(view.button_label, "START");
        assert_eq!(view.active_preset, Some(240));
        assert!(!view.finished);

        state.is_running = true;
        state.time_left = 120;
        let view = render(&state, false, &presets);
        assert_eq!(view.button_label, "STOP");
        assert!(close(view.progress, 0.5));

        state.is_running = false;
        state.time_left = 0;
        let view = render(&state, true, &presets);
        assert!(view.finished);
        assert!(view.alarm_sounding);
    }

    #[test]
    fn custom_total_highlights_no_preset() {
        let view = render(&TimerState::stopped(95), false, &[180, 240]);
        assert_eq!(view.active_preset, None);
    }
}
