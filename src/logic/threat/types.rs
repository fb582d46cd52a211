//! Threat Types
//!
//! Core types cho threat classification.
//! KHÔNG chứa logic - chỉ data structures.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// SEVERITY TIERS
// ============================================================================

/// Severity tier of a bot-defense event
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub const ALL: [Severity; 4] = [
        Severity::Low,
        Severity::Medium,
        Severity::High,
        Severity::Critical,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "LOW",
            Severity::Medium => "MEDIUM",
            Severity::High => "HIGH",
            Severity::Critical => "CRITICAL",
        }
    }

    pub fn is_high(&self) -> bool {
        matches!(self, Severity::High | Severity::Critical)
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// CLASSIFICATION RESULT
// ============================================================================

/// Result of severity classification (ephemeral, never persisted)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub is_suspicious: bool,
    pub severity: Severity,
    /// Supporting indicators, in the order they were found
    pub indicators: Vec<String>,
    pub classified_at: DateTime<Utc>,
}

impl ClassificationResult {
    /// Equality ignoring `classified_at`
    pub fn same_verdict(&self, other: &ClassificationResult) -> bool {
        self.is_suspicious == other.is_suspicious
            && self.severity == other.severity
            && self.indicators == other.indicators
    }
}

impl Default for ClassificationResult {
    fn default() -> Self {
        Self {
            is_suspicious: false,
            severity: Severity::Low,
            indicators: vec![],
            classified_at: Utc::now(),
        }
    }
}
