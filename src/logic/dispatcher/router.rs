//! Dispatcher / Router
//!
//! Builds canonical events from raw payloads and routes them:
//! bot-defense → classify → policy → display (unless LOG_ONLY);
//! everything else → per-category handler → display.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use serde::Serialize;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use uuid::Uuid;

use super::categories::{is_known_category, BOT_DEFENSE_CATEGORY, KNOWN_CATEGORIES};
use super::handlers::HandlerRegistry;
use super::source::EventSource;
use crate::constants::{
    BOT_ADVISORY_MESSAGE, COUNTERMEASURES_MESSAGE, CRITICAL_THREAT_MESSAGE, POLICY_ERROR_MESSAGE,
};
use crate::logic::events::DisplaySurface;
use crate::logic::native_guard::run_guarded;
use crate::logic::policy::{PolicyEngine, PolicyOutcome, ResponseAction};
use crate::logic::telemetry::{EventStore, RawPayload, ReceiptClock, ThreatEvent};
use crate::logic::threat::classify;

// ============================================================================
// STATS
// ============================================================================

#[derive(Debug, Default)]
struct Counters {
    received: AtomicU64,
    dropped: AtomicU64,
    displayed: AtomicU64,
    suppressed: AtomicU64,
    handler_invocations: AtomicU64,
}

/// Snapshot of dispatcher activity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DispatcherStats {
    pub received: u64,
    pub dropped: u64,
    pub displayed: u64,
    pub suppressed: u64,
    pub handler_invocations: u64,
}

// ============================================================================
// DELIVERY
// ============================================================================

/// Result of one delivery. Bot-defense routing completes asynchronously.
#[derive(Debug)]
pub struct Delivery {
    pub event_id: Option<Uuid>,
    pending: Option<JoinHandle<()>>,
}

impl Delivery {
    fn dropped() -> Self {
        Self { event_id: None, pending: None }
    }

    fn routed(event_id: Uuid) -> Self {
        Self { event_id: Some(event_id), pending: None }
    }

    pub fn is_dropped(&self) -> bool {
        self.event_id.is_none()
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Wait until routing for this event has finished
    pub async fn settled(self) {
        if let Some(task) = self.pending {
            if let Err(e) = task.await {
                log::error!("Routing task failed: {}", e);
            }
        }
    }
}

// ============================================================================
// DISPATCHER
// ============================================================================

pub struct Dispatcher {
    display: Arc<dyn DisplaySurface>,
    handlers: HandlerRegistry,
    store: Option<Arc<EventStore>>,
    bot_defense: Option<Arc<PolicyEngine>>,
    runtime: Handle,
    clock: ReceiptClock,
    counters: Arc<Counters>,
}

impl Dispatcher {
    pub fn new(display: Arc<dyn DisplaySurface>, runtime: Handle) -> Self {
        Self {
            display,
            handlers: HandlerRegistry::new(),
            store: None,
            bot_defense: None,
            runtime,
            clock: ReceiptClock::new(),
            counters: Arc::new(Counters::default()),
        }
    }

    /// Persist every accepted event
    pub fn with_store(mut self, store: Arc<EventStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Run bot-defense events through classification and policy
    pub fn with_policy_engine(mut self, engine: Arc<PolicyEngine>) -> Self {
        self.bot_defense = Some(engine);
        self
    }

    pub fn with_handlers(mut self, handlers: HandlerRegistry) -> Self {
        self.handlers = handlers;
        self
    }

    pub fn handlers(&self) -> &HandlerRegistry {
        &self.handlers
    }

    pub fn store(&self) -> Option<&Arc<EventStore>> {
        self.store.as_ref()
    }

    /// Subscribe to every known category of `source`
    pub fn attach(self: &Arc<Self>, source: &dyn EventSource) {
        for category in KNOWN_CATEGORIES {
            let dispatcher: Weak<Self> = Arc::downgrade(self);
            source.subscribe(
                category,
                Arc::new(move |payload: RawPayload| {
                    if let Some(dispatcher) = dispatcher.upgrade() {
                        dispatcher.deliver(payload);
                    }
                }),
            );
        }
        log::info!("Dispatcher subscribed to {} categories", KNOWN_CATEGORIES.len());
    }

    /// Accept one payload. Reentrant; returns without waiting for policy work.
    pub fn deliver(&self, payload: RawPayload) -> Delivery {
        self.counters.received.fetch_add(1, Ordering::Relaxed);

        let category = match payload.category() {
            Some(category) => category.to_string(),
            None => {
                log::warn!(
                    "Dropping payload without category ({} attributes)",
                    payload.attributes.len()
                );
                self.counters.dropped.fetch_add(1, Ordering::Relaxed);
                return Delivery::dropped();
            }
        };

        if !is_known_category(&category) {
            log::debug!("Unknown category '{}' - routing generically", category);
        }

        let event = ThreatEvent::received(&category, payload.attributes, self.clock.stamp());
        let event_id = event.id;

        if let Some(store) = &self.store {
            store.append(event.clone());
        }

        if event.is_category(BOT_DEFENSE_CATEGORY) {
            return self.route_bot_defense(event);
        }

        if let Some(handler) = self.handlers.get(&event.category) {
            self.counters.handler_invocations.fetch_add(1, Ordering::Relaxed);
            let operation = format!("handler:{}", event.category);
            let guarded = panic::catch_unwind(AssertUnwindSafe(|| {
                run_guarded(&operation, || {
                    handler(&event);
                    Ok(())
                })
            }));
            match guarded {
                Ok(Ok(_)) => {}
                Ok(Err(e)) => {
                    log::error!("[{}] Handler failed for event {}: {}", operation, event_id, e);
                }
                Err(payload) => {
                    // Display first, then let the bug surface to the caller
                    log::error!("[{}] Handler panicked for event {}", operation, event_id);
                    show(self.display.as_ref(), &self.counters, &event);
                    panic::resume_unwind(payload);
                }
            }
        }

        show(self.display.as_ref(), &self.counters, &event);
        Delivery::routed(event_id)
    }

    fn route_bot_defense(&self, event: ThreatEvent) -> Delivery {
        let event_id = event.id;

        let engine = match &self.bot_defense {
            Some(engine) => engine,
            None => {
                log::debug!("No bot-defense handler configured - displaying event {}", event_id);
                show(self.display.as_ref(), &self.counters, &event);
                return Delivery::routed(event_id);
            }
        };

        let classification = classify(&event);
        let ticket = engine.handle(event.clone(), classification);
        let display = self.display.clone();
        let counters = self.counters.clone();

        let task = self.runtime.spawn(async move {
            let outcomes = ticket.collect().await;
            match resolve_display(&event, &outcomes) {
                Some(routed) => show(display.as_ref(), &counters, &routed),
                None => {
                    log::debug!("Event {} suppressed (log only)", event.id);
                    counters.suppressed.fetch_add(1, Ordering::Relaxed);
                }
            }
        });

        Delivery {
            event_id: Some(event_id),
            pending: Some(task),
        }
    }

    pub fn stats(&self) -> DispatcherStats {
        DispatcherStats {
            received: self.counters.received.load(Ordering::Relaxed),
            dropped: self.counters.dropped.load(Ordering::Relaxed),
            displayed: self.counters.displayed.load(Ordering::Relaxed),
            suppressed: self.counters.suppressed.load(Ordering::Relaxed),
            handler_invocations: self.counters.handler_invocations.load(Ordering::Relaxed),
        }
    }
}

fn show(display: &dyn DisplaySurface, counters: &Counters, event: &ThreatEvent) {
    counters.displayed.fetch_add(1, Ordering::Relaxed);
    display.show(event);
}

/// Event to display for a finished policy run, `None` to suppress
pub fn resolve_display(event: &ThreatEvent, outcomes: &[PolicyOutcome]) -> Option<ThreatEvent> {
    let action = outcomes.iter().find_map(|o| match o {
        PolicyOutcome::Completed(action) => Some(*action),
        _ => None,
    });
    let failed = outcomes.iter().any(|o| matches!(o, PolicyOutcome::Failed(_)));

    let action = match action {
        Some(action) => action,
        None => {
            // Run ended without a verdict; stay visible
            log::error!("Policy run for event {} ended without completion", event.id);
            return Some(event.with_message(POLICY_ERROR_MESSAGE));
        }
    };

    match action {
        ResponseAction::LogOnly => None,
        ResponseAction::AppProtection => Some(event.with_message(CRITICAL_THREAT_MESSAGE)),
        _ if failed => Some(event.with_message(POLICY_ERROR_MESSAGE)),
        ResponseAction::SecurityMeasures => Some(event.with_fallback_message(COUNTERMEASURES_MESSAGE)),
        ResponseAction::WarnUser => {
            let advisory = outcomes
                .iter()
                .find_map(|o| match o {
                    PolicyOutcome::NotificationRequired(message) => Some(message.as_str()),
                    _ => None,
                })
                .unwrap_or(BOT_ADVISORY_MESSAGE);
            Some(event.with_message(advisory))
        }
        ResponseAction::Monitor => Some(event.clone()),
    }
}

// ============================================================================
// TESTS
// ============================================================================
