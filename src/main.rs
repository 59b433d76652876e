//! Noodle Timer - A cooking countdown timer daemon
//!
//! This is the main entry point for the noodle-timer application.

use std::{sync::Arc, time::Duration};
use tokio::net::TcpListener;
use tracing::info;

use noodle_timer::{
    alarm::{AlarmController, AlarmDevice, SoundLibrary, SystemDevice},
    api::create_router,
    config::Config,
    state::{AppState, SystemClock, TimerSession},
    store::{FileStore, KeyValueStore, MemoryStore},
    tasks::{store_sync_task, store_watcher_task},
    utils::shutdown_signal,
};

/// How often the state directory is checked for writes by other instances
const STORE_SCAN_INTERVAL: Duration = Duration::from_millis(250);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // Initialize tracing with appropriate log level
    tracing_subscriber::fmt()
        .with_env_filter(format!("noodle_timer={},tower_http=info", config.log_level()))
        .init();

    info!("Starting noodle-timer v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration: host={}, port={}, presets={:?}, sound={}",
          config.host, config.port, config.presets, config.sound);

    // Shared timer state, on disk unless running in memory
    let store: Arc<dyn KeyValueStore> = match config.state_dir() {
        Some(dir) => {
            let file_store = Arc::new(FileStore::open(dir).map_err(anyhow::Error::msg)?);
            tokio::spawn(store_watcher_task(Arc::clone(&file_store), STORE_SCAN_INTERVAL));
            file_store as Arc<dyn KeyValueStore>
        }
        None => {
            info!("Keeping timer state in memory");
            Arc::new(MemoryStore::new())
        }
    };

    let device = Arc::new(SystemDevice::new(config.player.clone(), config.bell));
    device.warm_up_speech();

    let session = TimerSession::open(Arc::clone(&store), Arc::new(SystemClock));
    let alarm = AlarmController::new(device, SoundLibrary::new(config.sounds_dir.clone()));
    let state = Arc::new(AppState::new(
        session,
        alarm,
        config.sound.clone(),
        config.presets.clone(),
        config.port,
        config.host.clone(),
    ));

    // Resume a countdown left running by a previous run or another instance
    let view = state.sync().map_err(anyhow::Error::msg)?;
    info!("Timer at {}:{}", view.minutes, view.seconds);

    let sync_state = Arc::clone(&state);
    tokio::spawn(async move {
        store_sync_task(sync_state).await;
    });

    // Create HTTP router with all endpoints
    let app = create_router(Arc::clone(&state));

    // Bind to the specified address
    let addr = config.address();
    let listener = TcpListener::bind(&addr).await?;

    info!("Server running on http://{}", addr);
    info!("Endpoints:");
    info!("  GET  /state           - Timer state and rendered view");
    info!("  POST /start-stop      - Toggle the countdown");
    info!("  POST /start, /stop    - Start or stop the countdown");
    info!("  POST /reset           - Refill the countdown");
    info!("  POST /preset/:seconds - Select a preset duration");
    info!("  GET  /presets         - List presets");
    info!("  POST /alarm/dismiss   - Silence the alarm");
    info!("  PUT  /sound           - Select and preview the alarm sound");
    info!("  GET  /status          - Server status");
    info!("  GET  /health          - Health check");

    // Setup graceful shutdown
    let server = axum::serve(listener, app);

    tokio::select! {
        result = server => {
            if let Err(e) = result {
                tracing::error!("Server error: {}", e);
            }
        }
        _ = shutdown_signal() => {
            info!("Shutdown signal received");
        }
    }

    if let Err(e) = state.dismiss_alarm() {
        tracing::warn!("Failed to silence alarm on shutdown: {}", e);
    }

    info!("Server shutdown complete");
    Ok(())
}
