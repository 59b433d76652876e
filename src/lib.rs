//! Noodle Timer - A cooking countdown timer daemon
//!
//! This library provides a countdown session that survives restarts and is
//! shared between running instances through a key-value store, a renderer for
//! the clock and the colour backdrop, and an alarm that loops sound and
//! vibration until dismissed.

pub mod alarm;
pub mod api;
pub mod config;
pub mod render;
pub mod state;
pub mod store;
pub mod tasks;
pub mod utils;

// Re-export commonly used types
pub use config::Config;
pub use state::AppState;
pub use api::create_router;
pub use utils::signals::shutdown_signal;
