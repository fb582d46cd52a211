//! Crash Fingerprints
//!
//! Diagnostic-text signatures of faults raised inside the native detection layer.
//! KHÔNG chứa containment logic - chỉ pattern matching.

use once_cell::sync::Lazy;
use regex::{RegexSet, RegexSetBuilder};

// ============================================================================
// DEFAULT FINGERPRINTS
// ============================================================================

/// Segmentation-fault signatures as they appear in fault diagnostics
pub const SEGFAULT_SIGNATURES: &[&str] = &[
    "SIGSEGV",
    "segmentation fault",
    "signal 11",
    "SEGV_MAPERR",
    "SEGV_ACCERR",
];

/// Symbols of the third-party native components known to crash
pub const THIRD_PARTY_SYMBOLS: &[&str] = &[
    "libmtdcore",
    "MtdNativeBridge",
];

static DEFAULT_FINGERPRINTS: Lazy<CrashFingerprints> = Lazy::new(CrashFingerprints::default);

/// Process-wide default fingerprint list
pub fn default_fingerprints() -> &'static CrashFingerprints {
    &DEFAULT_FINGERPRINTS
}

// ============================================================================
// CRASH FINGERPRINTS
// ============================================================================

/// Case-insensitive literal fingerprints matched against free-text diagnostics
#[derive(Debug, Clone)]
pub struct CrashFingerprints {
    patterns: Vec<String>,
    matcher: RegexSet,
}

impl CrashFingerprints {
    pub fn new<I, S>(patterns: I) -> Result<Self, regex::Error>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns: Vec<String> = patterns
            .into_iter()
            .map(|p| p.as_ref().to_string())
            .filter(|p| !p.is_empty())
            .collect();

        let matcher = RegexSetBuilder::new(patterns.iter().map(|p| regex::escape(p)))
            .case_insensitive(true)
            .build()?;

        Ok(Self { patterns, matcher })
    }

    /// Matches nothing
    pub fn empty() -> Self {
        Self {
            patterns: Vec::new(),
            matcher: RegexSet::empty(),
        }
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    pub fn matches(&self, text: &str) -> bool {
        self.matcher.is_match(text)
    }

    /// First fingerprint found in `text`
    pub fn matched(&self, text: &str) -> Option<&str> {
        self.matcher
            .matches(text)
            .iter()
            .next()
            .map(|i| self.patterns[i].as_str())
    }
}

impl Default for CrashFingerprints {
    fn default() -> Self {
        let all = SEGFAULT_SIGNATURES.iter().chain(THIRD_PARTY_SYMBOLS.iter());
        Self::new(all).unwrap_or_else(|e| {
            log::error!("Invalid crash fingerprint list, matching disabled: {}", e);
            Self::empty()
        })
    }
}

// ============================================================================
// TESTS
// ============================================================================
