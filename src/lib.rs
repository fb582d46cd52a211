//! Mobile Shield Core
//!
//! Threat event ingestion and bot-defense decision engine for telemetry
//! emitted by an embedded mobile threat-detection layer.
//!
//! ## Pipeline
//! event source → Dispatcher → ThreatEvent → EventStore
//!   → (bot-defense) classify() → PolicyEngine → DisplaySurface
//!   → (other) HandlerRegistry → DisplaySurface

pub mod constants;
pub mod logic;

pub use logic::config::AppConfig;
pub use logic::dispatcher::{Dispatcher, HandlerRegistry, LocalEventSource};
pub use logic::events::{DisplaySurface, LogDisplay};
pub use logic::policy::{PolicyConfig, PolicyEngine, ResponseAction};
pub use logic::telemetry::{EventStore, RawPayload, ThreatEvent};
