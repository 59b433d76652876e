//! Sound preview auto-stop

use std::time::Duration;
use tokio::time::sleep;
use tracing::debug;

use crate::alarm::AudioHandle;

/// Let a preview play for `duration`, then stop it
pub async fn preview_timeout_task(mut handle: Box<dyn AudioHandle>, duration: Duration) {
    sleep(duration).await;
    handle.stop();
    debug!("Preview finished");
}
