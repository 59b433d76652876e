//! Countdown poll background task

use std::{sync::Arc, time::Duration};
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error};

use crate::state::AppState;

/// Period of the countdown poll
pub const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Recompute the remaining time every 100ms until the countdown stops
///
/// The remaining time always comes from the wall clock, so a poll delayed by
/// a suspended machine catches up on its next tick.
pub async fn countdown_task(state: Arc<AppState>) {
    debug!("Countdown poll started");

    let mut ticker = interval(POLL_INTERVAL);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        ticker.tick().await;
        match state.tick() {
            Ok(true) => {}
            Ok(false) => break,
            Err(e) => {
                error!("Countdown poll failed: {}", e);
                break;
            }
        }
    }

    debug!("Countdown poll finished");
}
