//! Background tasks module
//!
//! This module contains the timer-driven tasks that run alongside the HTTP
//! server: the countdown poll, the alarm repeat, the preview auto-stop and the
//! cross-instance store synchronisation.

pub mod alarm_repeat;
pub mod countdown;
pub mod preview;
pub mod store_sync;

// Re-export main functions
pub use alarm_repeat::alarm_repeat_task;
pub use countdown::countdown_task;
pub use preview::preview_timeout_task;
pub use store_sync::{store_sync_task, store_watcher_task};
