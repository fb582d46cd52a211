//! Dispatcher Module
//!
//! Intake and routing of detection-layer events.
//!
//! ## Structure
//! - `categories`: Known category names
//! - `handlers`: Per-category handler registry
//! - `source`: Event source contract + in-process source
//! - `router`: Dispatcher (payload → event → pipeline → display)
//!
//! ## Pipeline
//! payload → ThreatEvent → EventStore
//!   bot-defense: classify() → PolicyEngine → display (unless LOG_ONLY)
//!   other:       handler (if registered) → display

pub mod categories;
pub mod handlers;
pub mod source;
pub mod router;

pub use categories::{is_known_category, BOT_DEFENSE_CATEGORY, KNOWN_CATEGORIES};
pub use handlers::{EventHandler, HandlerRegistry};
pub use source::{EventSource, Listener, LocalEventSource};
pub use router::{resolve_display, Delivery, Dispatcher, DispatcherStats};
