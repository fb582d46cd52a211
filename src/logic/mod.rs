//! Logic Module - Business Logic & Engines
//!
//! Chứa các engines xử lý: Native Guard, Threat Classifier, Policy Engine,
//! Event Store, Dispatcher.

pub mod config;
pub mod events;
pub mod native_guard;
pub mod telemetry;
pub mod threat;
pub mod policy;
pub mod dispatcher;
