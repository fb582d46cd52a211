//! Policy Callbacks
//!
//! Side-effect hooks invoked by the policy engine. Every hook is optional;
//! failures and panics are caught by the engine and reported via `on_error`.

use crate::logic::telemetry::ThreatEvent;

use super::types::{PolicyError, ResponseAction};

pub trait PolicyCallbacks: Send + Sync {
    /// User-facing advisory
    fn on_notify_user(&self, _message: &str) -> anyhow::Result<()> {
        Ok(())
    }

    /// Security countermeasures for a HIGH event
    fn on_countermeasures(&self, _event: &ThreatEvent) -> anyhow::Result<()> {
        Ok(())
    }

    /// App protection for a CRITICAL event, carries the original event
    fn on_critical_threat(&self, _event: &ThreatEvent) -> anyhow::Result<()> {
        Ok(())
    }

    /// Called exactly once per handled event
    fn on_complete(&self, _action: ResponseAction) {}

    fn on_error(&self, _error: &PolicyError) {}
}
