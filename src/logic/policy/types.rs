//! Policy Types
//!
//! Core types cho policy decisions.
//! KHÔNG chứa logic - chỉ data structures.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::logic::telemetry::ThreatEvent;
use crate::logic::threat::Severity;

// ============================================================================
// RESPONSE ACTIONS
// ============================================================================

/// Chosen escalation level, ordered from least to most severe
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResponseAction {
    /// Record only, nothing reaches the user
    LogOnly,
    /// Keep watching, surface the event as-is
    Monitor,
    /// Advise the user
    WarnUser,
    /// Activate security countermeasures
    SecurityMeasures,
    /// Protect the app from a critical threat
    AppProtection,
}

impl ResponseAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseAction::LogOnly => "LOG_ONLY",
            ResponseAction::Monitor => "MONITOR",
            ResponseAction::WarnUser => "WARN_USER",
            ResponseAction::SecurityMeasures => "SECURITY_MEASURES",
            ResponseAction::AppProtection => "APP_PROTECTION",
        }
    }

    pub fn escalation_level(&self) -> u8 {
        match self {
            ResponseAction::LogOnly => 0,
            ResponseAction::Monitor => 1,
            ResponseAction::WarnUser => 2,
            ResponseAction::SecurityMeasures => 3,
            ResponseAction::AppProtection => 4,
        }
    }

    /// Whether downstream display is suppressed
    pub fn is_silent(&self) -> bool {
        matches!(self, ResponseAction::LogOnly)
    }
}

impl std::fmt::Display for ResponseAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// DECISION
// ============================================================================

/// Side effect requested by a decision, executed by the engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SideEffect {
    NotifyUser(String),
    Countermeasures,
    CriticalThreat,
}

/// Pure policy decision for one severity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyDecision {
    pub severity: Severity,
    pub action: ResponseAction,
    /// Executed in order
    pub effects: Vec<SideEffect>,
    pub reasons: Vec<String>,
}

// ============================================================================
// ERRORS & OUTCOMES
// ============================================================================

/// A policy callback failed; never escalated past the engine
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolicyError {
    #[error("callback '{callback}' failed: {reason}")]
    Callback { callback: &'static str, reason: String },
    #[error("callback '{callback}' panicked: {reason}")]
    Panicked { callback: &'static str, reason: String },
}

/// Message on a policy ticket. Exactly one `Completed` ends every ticket.
#[derive(Debug, Clone, PartialEq)]
pub enum PolicyOutcome {
    NotificationRequired(String),
    CountermeasuresTriggered,
    CriticalThreat(ThreatEvent),
    Failed(PolicyError),
    Completed(ResponseAction),
}

impl PolicyOutcome {
    pub fn is_terminal(&self) -> bool {
        matches!(self, PolicyOutcome::Completed(_))
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_actions_ordered_by_escalation() {
        let mut actions = vec![
            ResponseAction::AppProtection,
            ResponseAction::LogOnly,
            ResponseAction::SecurityMeasures,
            ResponseAction::Monitor,
            ResponseAction::WarnUser,
        ];
        actions.sort();
        let levels: Vec<u8> = actions.iter().map(|a| a.escalation_level()).collect();
        assert_eq!(levels, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_action_serializes_screaming_case() {
        let json = serde_json::to_string(&ResponseAction::SecurityMeasures).unwrap();
        assert_eq!(json, "\"SECURITY_MEASURES\"");
        assert!(ResponseAction::LogOnly.is_silent());
        assert!(!ResponseAction::Monitor.is_silent());
    }
}
