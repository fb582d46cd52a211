//! Policy Module
//!
//! Quyết định response action dựa trên Severity và PolicyConfig.
//!
//! ## Structure
//! - `types`: Core types (ResponseAction, PolicyDecision, PolicyOutcome)
//! - `config`: Policy configuration
//! - `callbacks`: Side-effect hooks
//! - `engine`: Decision logic + asynchronous execution
//!
//! ## Usage
//! ```ignore
//! use crate::logic::policy::{PolicyConfig, PolicyEngine, PolicyOutcome};
//!
//! let engine = PolicyEngine::new(PolicyConfig::default(), runtime.handle().clone());
//! let ticket = engine.handle(event, classification);
//! match ticket.completion().await {
//!     Some(ResponseAction::LogOnly) => {}
//!     Some(action) => show(action),
//!     None => {}
//! }
//! ```

pub mod types;
pub mod config;
pub mod callbacks;
pub mod engine;

pub use types::{
    PolicyDecision,
    PolicyError,
    PolicyOutcome,
    ResponseAction,
    SideEffect,
};

pub use config::{PolicyConfig, Sensitivity};

pub use callbacks::PolicyCallbacks;

pub use engine::{decide, PolicyEngine, PolicyTicket};
