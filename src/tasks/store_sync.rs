//! Cross-instance synchronisation through the shared store

use std::{sync::Arc, time::Duration};
use tokio::{sync::broadcast::error::RecvError, time::interval};
use tracing::{info, warn};

use crate::{
    state::{AppState, STATE_KEY},
    store::FileStore,
};

/// Reload and re-render whenever another instance changes the timer state
pub async fn store_sync_task(state: Arc<AppState>) {
    info!("Starting store sync task");

    let origin = state.store().origin();
    let mut changes = state.store().subscribe();

    loop {
        match changes.recv().await {
            Ok(event) if event.key == STATE_KEY && event.origin != origin => {
                if let Err(e) = state.reload() {
                    warn!("Failed to reload timer state: {}", e);
                }
            }
            Ok(_) => {}
            Err(RecvError::Lagged(missed)) => {
                warn!("Missed {} store changes, reloading", missed);
                if let Err(e) = state.reload() {
                    warn!("Failed to reload timer state: {}", e);
                }
            }
            Err(RecvError::Closed) => {
                info!("Store change channel closed, stopping sync");
                break;
            }
        }
    }
}

/// Poll the state directory for writes made by other processes
pub async fn store_watcher_task(store: Arc<FileStore>, period: Duration) {
    info!("Watching {} for external changes", store.dir().display());

    let mut ticker = interval(period);
    loop {
        ticker.tick().await;
        if let Err(e) = store.scan_for_changes() {
            warn!("Failed to scan state directory: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        alarm::testing::FakeDevice,
        state::{app_state::testing::{app, T0}, ManualClock},
        store::{KeyValueStore, MemoryStore},
    };

    async fn settle() {
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn foreign_writes_trigger_a_reload() {
        let store = MemoryStore::new();
        let clock = Arc::new(ManualClock::new(T0));
        let device = Arc::new(FakeDevice::default());
        let ours = app(&store, &clock, &device);
        let theirs = app(&store, &clock, &device);

        let sync = tokio::spawn(store_sync_task(Arc::clone(&ours)));
        settle().await;

        theirs.set_preset(45).unwrap();
        settle().await;

        let state = ours.get_timer_state().unwrap();
        assert_eq!((state.total_time, state.time_left), (45, 45));
        assert_eq!(ours.view().seconds, "45");
        sync.abort();
    }

    #[tokio::test]
    async fn file_watcher_announces_other_processes() {
        let dir = tempfile::TempDir::new().unwrap();
        let ours = Arc::new(FileStore::open(dir.path()).unwrap());
        let theirs = FileStore::open(dir.path()).unwrap();
        let mut changes = ours.subscribe();

        ours.get(STATE_KEY).unwrap();
        let watcher = tokio::spawn(store_watcher_task(Arc::clone(&ours), Duration::from_millis(10)));

        theirs.set(STATE_KEY, "{}").unwrap();
        let event = tokio::time::timeout(Duration::from_secs(2), changes.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(event.key, STATE_KEY);
        watcher.abort();
    }
}
