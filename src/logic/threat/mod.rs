//! Threat Module
//!
//! Phân loại bot-defense events thành severity tiers.
//!
//! ## Structure
//! - `types`: Core types (Severity, ClassificationResult)
//! - `rules`: Threat-code, emulator and dev-build markers
//! - `classifier`: Classification logic
//!
//! ## Usage
//! ```ignore
//! use crate::logic::threat::{classify, Severity};
//!
//! let result = classify(&event);
//! if result.severity == Severity::Critical { /* ... */ }
//! ```

pub mod types;
pub mod rules;
pub mod classifier;

pub use types::{ClassificationResult, Severity};

pub use classifier::{classify, severity_for_code, is_emulator_model, is_dev_build};
