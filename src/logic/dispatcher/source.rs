//! Event Sources
//!
//! Inbound side: the detection layer delivers payloads per subscribed category
//! on its own threads.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::logic::telemetry::RawPayload;

pub type Listener = Arc<dyn Fn(RawPayload) + Send + Sync>;

/// External notification source
pub trait EventSource: Send + Sync {
    fn subscribe(&self, category: &str, listener: Listener);
}

/// In-process broadcaster keyed by category
#[derive(Default)]
pub struct LocalEventSource {
    listeners: RwLock<HashMap<String, Vec<Listener>>>,
}

impl LocalEventSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver to every listener of the payload's category.
    /// Returns the number of deliveries.
    pub fn publish(&self, payload: RawPayload) -> usize {
        let listeners: Vec<Listener> = match payload.category.as_deref() {
            Some(category) => self.listeners.read().get(category).cloned().unwrap_or_default(),
            None => Vec::new(),
        };

        for listener in &listeners {
            listener(payload.clone());
        }
        listeners.len()
    }

    pub fn subscribed_categories(&self) -> usize {
        self.listeners.read().len()
    }
}

impl EventSource for LocalEventSource {
    fn subscribe(&self, category: &str, listener: Listener) {
        self.listeners
            .write()
            .entry(category.to_string())
            .or_default()
            .push(listener);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_publish_only_to_subscribed_category() {
        let source = LocalEventSource::new();
        let hits = Arc::new(AtomicU32::new(0));
        let counter = hits.clone();
        source.subscribe("RootedDevice", Arc::new(move |_: RawPayload| {
            counter.fetch_add(1, Ordering::SeqCst);
        }));

        assert_eq!(source.publish(RawPayload::new("RootedDevice")), 1);
        assert_eq!(source.publish(RawPayload::new("VpnDetected")), 0);
        assert_eq!(source.publish(RawPayload::default()), 0);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }
}
