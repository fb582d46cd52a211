//! Handler Registry
//!
//! Per-category extension point: at most one `(Event) -> ()` handler per
//! category. New categories are configuration, not new code.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::logic::telemetry::ThreatEvent;

pub type EventHandler = Arc<dyn Fn(&ThreatEvent) + Send + Sync>;

#[derive(Default)]
pub struct HandlerRegistry {
    handlers: RwLock<HashMap<String, EventHandler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for `category`, replacing any previous one.
    /// Returns true if a handler was replaced.
    pub fn register<F>(&self, category: &str, handler: F) -> bool
    where
        F: Fn(&ThreatEvent) + Send + Sync + 'static,
    {
        let replaced = self
            .handlers
            .write()
            .insert(category.to_string(), Arc::new(handler))
            .is_some();
        if replaced {
            log::warn!("Handler for '{}' replaced", category);
        } else {
            log::debug!("Handler registered for '{}'", category);
        }
        replaced
    }

    pub fn unregister(&self, category: &str) -> bool {
        self.handlers.write().remove(category).is_some()
    }

    pub fn get(&self, category: &str) -> Option<EventHandler> {
        self.handlers.read().get(category).cloned()
    }

    pub fn contains(&self, category: &str) -> bool {
        self.handlers.read().contains_key(category)
    }

    pub fn len(&self) -> usize {
        self.handlers.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn categories(&self) -> Vec<String> {
        let mut list: Vec<String> = self.handlers.read().keys().cloned().collect();
        list.sort();
        list
    }
}
