//! Telemetry Module
//!
//! Canonical threat events and the bounded event store.
//!
//! ## Structure
//! - `event.rs` - ThreatEvent struct (immutable, timestamped) + raw payloads
//! - `store.rs` - Bounded most-recent-first store with snapshot persistence
//!
//! ## Usage
//! ```ignore
//! use crate::logic::telemetry::{EventStore, FileBackend, ThreatEvent};
//!
//! let store = EventStore::open(FileBackend::new(&dir, "threat_events"));
//! store.append(event);
//! let mut stream = store.all();
//! while let Some(events) = stream.changed().await { /* ... */ }
//! ```

pub mod event;
pub mod store;

pub use event::{
    attr,
    Attributes,
    RawPayload,
    ReceiptClock,
    ThreatEvent,
};

pub use store::{
    EventStore,
    EventStream,
    FileBackend,
    MemoryBackend,
    SnapshotBackend,
    StoreError,
};
