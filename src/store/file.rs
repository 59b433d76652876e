//! Directory-backed store shared between processes

use std::{
    collections::HashMap,
    fs, io,
    path::{Path, PathBuf},
    sync::Mutex,
};

use tokio::sync::broadcast;
use tracing::{debug, info};

use super::{KeyValueStore, Origin, StoreEvent, EVENT_CAPACITY};

/// Stores each key as `<dir>/<key>.json`
///
/// Other processes writing the same directory are only noticed through
/// [`FileStore::scan_for_changes`], which the store watcher task calls
/// periodically.
#[derive(Debug)]
pub struct FileStore {
    dir: PathBuf,
    origin: Origin,
    events: broadcast::Sender<StoreEvent>,
    /// Last content this handle read or wrote per key
    seen: Mutex<HashMap<String, Option<String>>>,
}

impl FileStore {
    /// Open (and create if needed) a store directory
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, String> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .map_err(|e| format!("Failed to create store directory {}: {}", dir.display(), e))?;
        info!("Using state directory {}", dir.display());

        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Ok(Self {
            dir,
            origin: Origin::next(),
            events,
            seen: Mutex::new(HashMap::new()),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, String> {
        let valid = !key.is_empty()
            && key.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(format!("Invalid store key: {:?}", key));
        }
        Ok(self.dir.join(format!("{}.json", key)))
    }

    fn read(&self, key: &str) -> Result<Option<String>, String> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(format!("Failed to read {}: {}", path.display(), e)),
        }
    }

    /// Compare every known key with its file and announce foreign changes
    ///
    /// Returns the keys that changed.
    pub fn scan_for_changes(&self) -> Result<Vec<String>, String> {
        let mut seen = self.seen.lock()
            .map_err(|e| format!("Failed to lock file store: {}", e))?;

        let mut changed = Vec::new();
        for (key, last) in seen.iter_mut() {
            let current = self.read(key)?;
            if current != *last {
                *last = current;
                changed.push(key.clone());
            }
        }
        drop(seen);

        for key in &changed {
            debug!("Detected external change of {}", key);
            let _ = self.events.send(StoreEvent { key: key.clone(), origin: Origin::EXTERNAL });
        }
        Ok(changed)
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, String> {
        let value = self.read(key)?;
        let mut seen = self.seen.lock()
            .map_err(|e| format!("Failed to lock file store: {}", e))?;
        seen.insert(key.to_string(), value.clone());
        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), String> {
        let path = self.path_for(key)?;
        let tmp = path.with_extension(format!("json.{}.tmp", std::process::id()));

        fs::write(&tmp, value)
            .map_err(|e| format!("Failed to write {}: {}", tmp.display(), e))?;
        fs::rename(&tmp, &path)
            .map_err(|e| format!("Failed to replace {}: {}", path.display(), e))?;

        let mut seen = self.seen.lock()
            .map_err(|e| format!("Failed to lock file store: {}", e))?;
        seen.insert(key.to_string(), Some(value.to_string()));
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }

    fn origin(&self) -> Origin {
        self.origin
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_key_reads_as_none() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::open(dir.path()).unwrap();
        assert_eq!(store.get("noodleTimerState").unwrap(), None);
    }

    #[test]
    fn values_survive_reopening() {
        let dir = TempDir::new().unwrap();
        FileStore::open(dir.path()).unwrap().set("k", "hello").unwrap();

        let reopened = FileStore::open(dir.path()).unwrap();
        assert_eq!(reopened.get("k").unwrap(), Some("hello".to_string()));
    }

    #[test]
    fn rejects_keys_that_escape_the_directory() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::open(dir.path()).unwrap();
        assert!(store.set("../evil", "x").is_err());
        assert!(store.get("").is_err());
    }

    #[test]
    fn scan_reports_writes_from_another_handle_only() {
        let dir = TempDir::new().unwrap();
        let ours = FileStore::open(dir.path()).unwrap();
        let theirs = FileStore::open(dir.path()).unwrap();
        let mut rx = ours.subscribe();

        ours.set("k", "one").unwrap();
        assert!(ours.scan_for_changes().unwrap().is_empty());

        theirs.set("k", "two").unwrap();
        assert_eq!(ours.scan_for_changes().unwrap(), vec!["k".to_string()]);
        let event = rx.try_recv().unwrap();
        assert_eq!(event.origin, Origin::EXTERNAL);

        // Already seen
        assert!(ours.scan_for_changes().unwrap().is_empty());
        assert_eq!(ours.get("k").unwrap(), Some("two".to_string()));
    }
}
