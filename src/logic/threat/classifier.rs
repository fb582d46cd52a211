//! Bot-Defense Classifier
//!
//! CHỈ chứa logic classify - không có types, không có policy.
//! Input: ThreatEvent
//! Output: ClassificationResult

use chrono::Utc;

use super::rules::{
    DEFAULT_SEVERITY, DEV_BUILD_EXACT, DEV_BUILD_MARKERS, EMULATOR_MARKERS, THREAT_CODE_TIERS,
};
use super::types::{ClassificationResult, Severity};
use crate::logic::telemetry::{attr, ThreatEvent};

// ============================================================================
// MAIN CLASSIFICATION FUNCTION
// ============================================================================

/// Classify a bot-defense event
///
/// Pure: no side effects, safe to call concurrently. Only the threat code
/// decides severity; device and build indicators are informational.
pub fn classify(event: &ThreatEvent) -> ClassificationResult {
    let mut indicators = Vec::new();
    let mut severity = DEFAULT_SEVERITY;

    if let Some(code) = present(event, attr::THREAT_CODE) {
        indicators.push(code.to_string());
        severity = severity_for_code(code);
    }

    if let Some(model) = present(event, attr::DEVICE_MODEL) {
        if is_emulator_model(model) {
            indicators.push(format!("Emulator device model: {}", model));
        }
    }

    for (key, label) in [(attr::BUILD_HOST, "host"), (attr::BUILD_USER, "user")] {
        if let Some(value) = present(event, key) {
            if is_dev_build(value) {
                indicators.push(format!("Development build {}: {}", label, value));
            }
        }
    }

    ClassificationResult {
        is_suspicious: !indicators.is_empty(),
        severity,
        indicators,
        classified_at: Utc::now(),
    }
}

/// Severity for a threat code, first matching marker wins
pub fn severity_for_code(code: &str) -> Severity {
    let upper = code.to_uppercase();
    THREAT_CODE_TIERS
        .iter()
        .find(|(marker, _)| upper.contains(marker))
        .map(|(_, severity)| *severity)
        .unwrap_or(DEFAULT_SEVERITY)
}

pub fn is_emulator_model(model: &str) -> bool {
    let lower = model.to_lowercase();
    EMULATOR_MARKERS.iter().any(|m| lower.contains(m))
}

pub fn is_dev_build(value: &str) -> bool {
    let lower = value.to_lowercase();
    lower == DEV_BUILD_EXACT || DEV_BUILD_MARKERS.iter().any(|m| lower.contains(m))
}

fn present<'a>(event: &'a ThreatEvent, key: &str) -> Option<&'a str> {
    event.attr(key).filter(|v| !v.trim().is_empty())
}

// ============================================================================
// TESTS
// ============================================================================
