//! Threat Event Store
//!
//! Bounded, most-recent-first event log.
//! Every mutation rewrites the whole snapshot; a corrupt snapshot loads as empty.

use std::collections::{BTreeMap, VecDeque};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use thiserror::Error;
use tokio::sync::watch;
use uuid::Uuid;

use super::event::ThreatEvent;
use crate::constants::MAX_STORED_EVENTS;

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("snapshot I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("snapshot serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

// ============================================================================
// PERSISTENCE BACKENDS
// ============================================================================

/// Storage for the serialized snapshot under a single key
pub trait SnapshotBackend: Send + Sync {
    /// Read the snapshot, `None` if nothing was ever written
    fn load(&self) -> Result<Option<Vec<u8>>, StoreError>;
    /// Replace the snapshot
    fn save(&self, data: &[u8]) -> Result<(), StoreError>;
    fn describe(&self) -> String;
}

/// Snapshot kept as `<dir>/<key>.json`
#[derive(Debug, Clone)]
pub struct FileBackend {
    path: PathBuf,
}

impl FileBackend {
    pub fn new(dir: &Path, key: &str) -> Self {
        Self {
            path: dir.join(format!("{}.json", key)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SnapshotBackend for FileBackend {
    fn load(&self) -> Result<Option<Vec<u8>>, StoreError> {
        if !self.path.exists() {
            return Ok(None);
        }
        Ok(Some(fs::read(&self.path)?))
    }

    fn save(&self, data: &[u8]) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        // Write-then-rename so readers never see a half-written snapshot
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, data)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// In-process snapshot, for tests and ephemeral runs
#[derive(Debug, Default)]
pub struct MemoryBackend {
    data: Mutex<Option<Vec<u8>>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_contents(data: &[u8]) -> Self {
        Self {
            data: Mutex::new(Some(data.to_vec())),
        }
    }

    pub fn contents(&self) -> Option<Vec<u8>> {
        self.data.lock().clone()
    }
}

impl SnapshotBackend for MemoryBackend {
    fn load(&self) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.data.lock().clone())
    }

    fn save(&self, data: &[u8]) -> Result<(), StoreError> {
        *self.data.lock() = Some(data.to_vec());
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}

// Lets callers keep a handle to the backend they passed in
impl<B: SnapshotBackend + ?Sized> SnapshotBackend for Arc<B> {
    fn load(&self) -> Result<Option<Vec<u8>>, StoreError> {
        (**self).load()
    }

    fn save(&self, data: &[u8]) -> Result<(), StoreError> {
        (**self).save(data)
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}

// ============================================================================
// LIVE STREAM
// ============================================================================

/// Live view of the store contents, most recent first
#[derive(Debug, Clone)]
pub struct EventStream {
    rx: watch::Receiver<Arc<Vec<ThreatEvent>>>,
}

impl EventStream {
    /// Latest published contents
    pub fn current(&self) -> Arc<Vec<ThreatEvent>> {
        self.rx.borrow().clone()
    }

    /// Wait for the next mutation; `None` once the store is gone
    pub async fn changed(&mut self) -> Option<Arc<Vec<ThreatEvent>>> {
        match self.rx.changed().await {
            Ok(()) => Some(self.rx.borrow_and_update().clone()),
            Err(_) => None,
        }
    }
}

// ============================================================================
// EVENT STORE
// ============================================================================

pub struct EventStore {
    events: Mutex<VecDeque<ThreatEvent>>,
    backend: Box<dyn SnapshotBackend>,
    capacity: usize,
    publisher: watch::Sender<Arc<Vec<ThreatEvent>>>,
}

impl EventStore {
    /// Open a store on the given backend with the default capacity
    pub fn open(backend: impl SnapshotBackend + 'static) -> Self {
        Self::with_capacity(backend, MAX_STORED_EVENTS)
    }

    pub fn with_capacity(backend: impl SnapshotBackend + 'static, capacity: usize) -> Self {
        let mut events = Self::load_snapshot(&backend);
        events.truncate(capacity);

        let (publisher, _) = watch::channel(Arc::new(events.iter().cloned().collect::<Vec<_>>()));
        log::info!(
            "Event store opened: {} ({} events, cap {})",
            backend.describe(),
            events.len(),
            capacity
        );

        Self {
            events: Mutex::new(events),
            backend: Box::new(backend),
            capacity,
            publisher,
        }
    }

    fn load_snapshot(backend: &dyn SnapshotBackend) -> VecDeque<ThreatEvent> {
        let data = match backend.load() {
            Ok(Some(data)) => data,
            Ok(None) => return VecDeque::new(),
            Err(e) => {
                log::warn!("Event snapshot unreadable ({}), starting empty: {}", backend.describe(), e);
                return VecDeque::new();
            }
        };

        match serde_json::from_slice::<Vec<ThreatEvent>>(&data) {
            Ok(events) => events.into(),
            Err(e) => {
                log::warn!("Event snapshot corrupt ({}), starting empty: {}", backend.describe(), e);
                VecDeque::new()
            }
        }
    }

    /// Insert at the head, evicting the oldest entry past capacity
    pub fn append(&self, event: ThreatEvent) {
        let mut events = self.events.lock();
        events.push_front(event);
        while events.len() > self.capacity {
            if let Some(evicted) = events.pop_back() {
                log::debug!("Evicted event {} ({})", evicted.id, evicted.category);
            }
        }
        self.commit(&events);
    }

    /// Remove every event
    pub fn clear(&self) {
        let mut events = self.events.lock();
        events.clear();
        self.commit(&events);
        log::info!("Event store cleared");
    }

    /// Live stream of all events, most recent first
    pub fn all(&self) -> EventStream {
        EventStream {
            rx: self.publisher.subscribe(),
        }
    }

    pub fn get_by_id(&self, id: Uuid) -> Option<ThreatEvent> {
        self.events.lock().iter().find(|e| e.id == id).cloned()
    }

    pub fn snapshot(&self) -> Vec<ThreatEvent> {
        self.events.lock().iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Count stored events by category
    pub fn count_by_category(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for event in self.events.lock().iter() {
            *counts.entry(event.category.clone()).or_insert(0) += 1;
        }
        counts
    }

    // Called with the lock held so snapshot writes are serialized
    fn commit(&self, events: &VecDeque<ThreatEvent>) {
        let list: Vec<ThreatEvent> = events.iter().cloned().collect();

        if let Err(e) = self.persist(&list) {
            log::error!("Failed to persist event snapshot ({}): {}", self.backend.describe(), e);
        }

        self.publisher.send_replace(Arc::new(list));
    }

    fn persist(&self, list: &[ThreatEvent]) -> Result<(), StoreError> {
        let data = serde_json::to_vec(list)?;
        self.backend.save(&data)
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::telemetry::event::Attributes;
    use tempfile::TempDir;

    fn event(category: &str) -> ThreatEvent {
        ThreatEvent::new(category, Attributes::new())
    }

    #[test]
    fn test_append_is_most_recent_first() {
        let store = EventStore::open(MemoryBackend::new());
        let first = event("RootedDevice");
        let second = event("DebuggerDetected");
        store.append(first.clone());
        store.append(second.clone());

        let all = store.all().current();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id, second.id);
        assert_eq!(all[1].id, first.id);
    }

    #[test]
    fn test_cap_evicts_oldest() {
        let store = EventStore::open(MemoryBackend::new());
        let events: Vec<ThreatEvent> = (0..101).map(|_| event("RootedDevice")).collect();
        for e in &events {
            store.append(e.clone());
        }

        let all = store.all().current();
        assert_eq!(all.len(), 100);
        assert_eq!(all[0].id, events[100].id);
        assert!(store.get_by_id(events[0].id).is_none());
        assert!(store.get_by_id(events[1].id).is_some());
    }

    #[test]
    fn test_clear_then_all_is_empty() {
        let store = EventStore::open(MemoryBackend::new());
        store.append(event("RootedDevice"));
        store.clear();
        assert!(store.all().current().is_empty());
        assert!(store.is_empty());
    }

    #[test]
    fn test_get_by_id_not_found() {
        let store = EventStore::open(MemoryBackend::new());
        assert!(store.get_by_id(Uuid::new_v4()).is_none());
    }

    #[test]
    fn test_file_snapshot_survives_reopen() {
        let temp_dir = TempDir::new().unwrap();
        let kept = event("EmulatorDetected");
        {
            let store = EventStore::open(FileBackend::new(temp_dir.path(), "events"));
            store.append(event("RootedDevice"));
            store.append(kept.clone());
        }

        let store = EventStore::open(FileBackend::new(temp_dir.path(), "events"));
        assert_eq!(store.len(), 2);
        assert_eq!(store.snapshot()[0], kept);
    }

    #[test]
    fn test_corrupt_snapshot_loads_empty() {
        let temp_dir = TempDir::new().unwrap();
        let backend = FileBackend::new(temp_dir.path(), "events");
        std::fs::write(backend.path(), b"{not json").unwrap();

        let store = EventStore::open(backend);
        assert!(store.is_empty());

        // Store remains usable and overwrites the corrupt snapshot
        store.append(event("RootedDevice"));
        let reopened = EventStore::open(FileBackend::new(temp_dir.path(), "events"));
        assert_eq!(reopened.len(), 1);
    }

    #[test]
    fn test_snapshot_written_after_every_mutation() {
        let backend = Arc::new(MemoryBackend::new());
        let store = EventStore::open(backend.clone());

        store.append(event("RootedDevice"));
        let saved: Vec<ThreatEvent> = serde_json::from_slice(&backend.contents().unwrap()).unwrap();
        assert_eq!(saved.len(), 1);

        store.clear();
        let saved: Vec<ThreatEvent> = serde_json::from_slice(&backend.contents().unwrap()).unwrap();
        assert!(saved.is_empty());
    }

    #[test]
    fn test_concurrent_appends_do_not_lose_updates() {
        let backend = Arc::new(MemoryBackend::new());
        let store = Arc::new(EventStore::open(backend.clone()));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = store.clone();
                std::thread::spawn(move || {
                    for _ in 0..10 {
                        store.append(event("RootedDevice"));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(store.len(), 80);
        let saved: Vec<ThreatEvent> = serde_json::from_slice(&backend.contents().unwrap()).unwrap();
        assert_eq!(saved.len(), 80);
    }

    #[test]
    fn test_count_by_category() {
        let store = EventStore::open(MemoryBackend::new());
        store.append(event("RootedDevice"));
        store.append(event("RootedDevice"));
        store.append(event("HookFrameworkDetected"));

        let counts = store.count_by_category();
        assert_eq!(counts.get("RootedDevice"), Some(&2));
        assert_eq!(counts.get("HookFrameworkDetected"), Some(&1));
    }

    #[tokio::test]
    async fn test_existing_subscriber_sees_mutations() {
        let store = EventStore::open(MemoryBackend::new());
        let mut stream = store.all();
        assert!(stream.current().is_empty());

        store.append(event("RootedDevice"));
        let seen = stream.changed().await.unwrap();
        assert_eq!(seen.len(), 1);

        store.clear();
        let seen = stream.changed().await.unwrap();
        assert!(seen.is_empty());
    }

    #[tokio::test]
    async fn test_every_subscriber_sees_mutations() {
        let store = EventStore::open(MemoryBackend::new());
        let mut first = store.all();
        let mut second = store.all();

        let kept = event("RootedDevice");
        store.append(kept.clone());
        assert_eq!(*first.changed().await.unwrap(), vec![kept.clone()]);
        assert_eq!(*second.changed().await.unwrap(), vec![kept]);

        store.clear();
        assert!(first.changed().await.unwrap().is_empty());
        assert!(second.changed().await.unwrap().is_empty());
    }
}
