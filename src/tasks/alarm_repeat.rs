//! Alarm repeat background task

use std::sync::Arc;
use tokio::time::{interval_at, Instant};
use tracing::{debug, warn};

use crate::{alarm::REPEAT_INTERVAL, state::AppState};

/// Re-run the alarm action once a second while it is sounding
///
/// The first run happens when the alarm starts, so the first tick here is one
/// interval later.
pub async fn alarm_repeat_task(state: Arc<AppState>) {
    let mut ticker = interval_at(Instant::now() + REPEAT_INTERVAL, REPEAT_INTERVAL);

    loop {
        ticker.tick().await;
        match state.retrigger_alarm() {
            Ok(true) => {}
            Ok(false) => break,
            Err(e) => {
                warn!("Failed to re-trigger alarm: {}", e);
                break;
            }
        }
    }

    debug!("Alarm repeat finished");
}
