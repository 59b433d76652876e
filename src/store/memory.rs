//! In-process store shared between handles

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use tokio::sync::broadcast;
use tracing::debug;

use super::{KeyValueStore, Origin, StoreEvent, EVENT_CAPACITY};

#[derive(Debug)]
struct Shared {
    values: Mutex<HashMap<String, String>>,
    events: broadcast::Sender<StoreEvent>,
}

/// A handle onto an in-memory map
///
/// Handles created with [`MemoryStore::connect`] see the same data and the
/// same change events, each with its own [`Origin`].
#[derive(Debug, Clone)]
pub struct MemoryStore {
    shared: Arc<Shared>,
    origin: Origin,
}

impl MemoryStore {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            shared: Arc::new(Shared { values: Mutex::new(HashMap::new()), events }),
            origin: Origin::next(),
        }
    }

    /// Open another handle onto the same data
    pub fn connect(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
            origin: Origin::next(),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, String> {
        let values = self.shared.values.lock()
            .map_err(|e| format!("Failed to lock memory store: {}", e))?;
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), String> {
        let mut values = self.shared.values.lock()
            .map_err(|e| format!("Failed to lock memory store: {}", e))?;
        values.insert(key.to_string(), value.to_string());
        drop(values);

        // No subscribers is fine
        if self.shared.events.send(StoreEvent { key: key.to_string(), origin: self.origin }).is_err() {
            debug!("No listeners for change of {}", key);
        }
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.shared.events.subscribe()
    }

    fn origin(&self) -> Origin {
        self.origin
    }
}
