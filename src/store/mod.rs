//! Shared key-value storage
//!
//! The timer state lives in a store that several running instances can share.
//! Every instance re-reads the store before changing anything and listens for
//! change events written by the others.

pub mod file;
pub mod memory;

use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::broadcast;

pub use file::FileStore;
pub use memory::MemoryStore;

/// Identity of a store handle, used to tell our own writes from foreign ones
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Origin(u64);

impl Origin {
    /// Writes observed on disk without knowing who made them
    pub const EXTERNAL: Origin = Origin(0);

    /// Allocate a fresh origin, distinct from every other handle in this process
    pub fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Origin(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// Notification that a key changed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreEvent {
    pub key: String,
    pub origin: Origin,
}

/// Key-value store with change notifications
pub trait KeyValueStore: Send + Sync + std::fmt::Debug {
    /// Read a value, `None` when the key has never been written
    fn get(&self, key: &str) -> Result<Option<String>, String>;

    /// Write a value
    fn set(&self, key: &str, value: &str) -> Result<(), String>;

    /// Subscribe to change events for every key
    fn subscribe(&self) -> broadcast::Receiver<StoreEvent>;

    /// Origin stamped on events caused by this handle's own writes
    fn origin(&self) -> Origin;
}

/// Capacity of the change event channels
pub(crate) const EVENT_CAPACITY: usize = 64;
