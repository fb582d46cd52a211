//! Central Configuration Constants
//!
//! Single source of truth for all configuration defaults.

/// App version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// App name
pub const APP_NAME: &str = "Mobile-Shield";

/// Category tag of the bot-defense telemetry stream
pub const BOT_DEFENSE_CATEGORY: &str = "MobileBotDefenseCheck";

/// Maximum number of events kept by the event store
pub const MAX_STORED_EVENTS: usize = 100;

/// Storage key of the persisted event snapshot
pub const DEFAULT_STORE_KEY: &str = "threat_events";

/// Directory name under the local data dir
pub const DEFAULT_STORE_DIR_NAME: &str = "mobile-shield";

/// Shown when a routed event carries no usable message
pub const DEFAULT_ADVISORY_MESSAGE: &str =
    "A security issue was detected on this device. Please review your device security settings.";

/// Sent to the notify-user callback for MEDIUM bot-defense events
pub const BOT_ADVISORY_MESSAGE: &str =
    "Suspicious automated activity was detected. Please verify you are using the official app.";

/// Synthesized message for HIGH bot-defense events
pub const COUNTERMEASURES_MESSAGE: &str =
    "Security countermeasures have been activated due to suspicious automated activity.";

/// Synthesized message for CRITICAL bot-defense events
pub const CRITICAL_THREAT_MESSAGE: &str =
    "A critical threat was detected. App protection has been enabled to keep your data safe.";

/// Synthesized message when the policy pipeline reported a failure
pub const POLICY_ERROR_MESSAGE: &str =
    "A security check could not be completed. Some features may be limited.";

// ============================================
// Helper functions to read from env with fallback
// ============================================

/// Get store directory from environment or use the local data dir
pub fn get_store_dir() -> std::path::PathBuf {
    std::env::var("SHIELD_STORE_DIR")
        .map(std::path::PathBuf::from)
        .unwrap_or_else(|_| {
            dirs::data_local_dir()
                .unwrap_or_else(|| std::path::PathBuf::from("."))
                .join(DEFAULT_STORE_DIR_NAME)
        })
}

/// Get storage key from environment or use default
pub fn get_store_key() -> String {
    std::env::var("SHIELD_STORE_KEY")
        .unwrap_or_else(|_| DEFAULT_STORE_KEY.to_string())
}
