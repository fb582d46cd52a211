//! Display Surface
//!
//! Outbound contract towards the screen that presents routed events.

use crate::constants::DEFAULT_ADVISORY_MESSAGE;
use crate::logic::telemetry::ThreatEvent;

/// Presents a routed event to the user. Receives the full canonical event.
pub trait DisplaySurface: Send + Sync {
    fn show(&self, event: &ThreatEvent);
}

/// Text a display should present: the message, or the default advisory
pub fn display_message(event: &ThreatEvent) -> String {
    event
        .message()
        .map(str::to_string)
        .unwrap_or_else(|| DEFAULT_ADVISORY_MESSAGE.to_string())
}

/// Display surface that writes routed events to the log
#[derive(Debug, Default)]
pub struct LogDisplay;

impl DisplaySurface for LogDisplay {
    fn show(&self, event: &ThreatEvent) {
        log::info!(
            "[display] {} ({}) at {}: {}",
            event.category,
            event.id,
            event.received_at.to_rfc3339(),
            display_message(event)
        );
    }
}

// Any closure over an event can act as a display
impl<F> DisplaySurface for F
where
    F: Fn(&ThreatEvent) + Send + Sync,
{
    fn show(&self, event: &ThreatEvent) {
        self(event)
    }
}

// ============================================================================
// TESTS
// ============================================================================
