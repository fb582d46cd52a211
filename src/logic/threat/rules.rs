//! Bot-Defense Classification Rules
//!
//! Markers the classifier looks for in event attributes.
//! KHÔNG chứa logic classify - chỉ constants.

use super::types::Severity;

// ============================================================================
// THREAT CODE MARKERS (priority order)
// ============================================================================

/// Substring of `threatCode` → severity, first match wins
pub const THREAT_CODE_TIERS: &[(&str, Severity)] = &[
    ("BOT_CRITICAL", Severity::Critical),
    ("BOT_HIGH", Severity::High),
    ("BOT_MEDIUM", Severity::Medium),
];

/// Severity when a threat code matches no marker
pub const DEFAULT_SEVERITY: Severity = Severity::Low;

// ============================================================================
// ENVIRONMENT MARKERS (informational, never escalate)
// ============================================================================

/// Lower-case substrings of `deviceModel` that indicate a virtual device
pub const EMULATOR_MARKERS: &[&str] = &["emulator", "simulator", "generic"];

/// Lower-case substrings of `buildHost`/`buildUser` that indicate a dev build
pub const DEV_BUILD_MARKERS: &[&str] = &["build", "test"];

/// Exact `buildHost`/`buildUser` value of platform build farms
pub const DEV_BUILD_EXACT: &str = "android-build";
