//! Policy Configuration
//!
//! Immutable configuration for policy decisions.
//! Reconfiguration means constructing a new engine.

use serde::{Deserialize, Serialize};

/// Detection sensitivity reported with every decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sensitivity {
    Low,
    Medium,
    High,
}

impl Sensitivity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sensitivity::Low => "low",
            Sensitivity::Medium => "medium",
            Sensitivity::High => "high",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "low" => Some(Sensitivity::Low),
            "medium" => Some(Sensitivity::Medium),
            "high" => Some(Sensitivity::High),
            _ => None,
        }
    }
}

/// Policy configuration (can be loaded from config file or env)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyConfig {
    pub sensitivity: Sensitivity,
    /// MEDIUM → WARN_USER; HIGH also notifies the user
    pub enable_user_notification: bool,
    /// HIGH → SECURITY_MEASURES
    pub enable_security_countermeasures: bool,
    /// CRITICAL → APP_PROTECTION
    pub enable_app_protection: bool,
    /// LOW events are only logged, never displayed
    pub is_log_only_mode: bool,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            sensitivity: Sensitivity::Medium,
            enable_user_notification: true,
            enable_security_countermeasures: true,
            enable_app_protection: true,
            is_log_only_mode: false,
        }
    }
}

impl PolicyConfig {
    /// Observe only - no user-facing responses
    pub fn log_only() -> Self {
        Self {
            sensitivity: Sensitivity::Low,
            enable_user_notification: false,
            enable_security_countermeasures: false,
            enable_app_protection: false,
            is_log_only_mode: true,
        }
    }

    /// Every response enabled, LOW events stay silent
    pub fn protective() -> Self {
        Self {
            sensitivity: Sensitivity::High,
            is_log_only_mode: true,
            ..Default::default()
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
