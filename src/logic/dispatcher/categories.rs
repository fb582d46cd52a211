//! Known Event Categories
//!
//! Categories the dispatcher subscribes to. Matching is exact string equality;
//! categories outside this list are still accepted when delivered directly.

pub use crate::constants::BOT_DEFENSE_CATEGORY;

pub const KNOWN_CATEGORIES: &[&str] = &[
    // Device integrity
    "RootedDevice",
    "JailbrokenDevice",
    "EmulatorDetected",
    "DeveloperModeEnabled",
    "UsbDebuggingEnabled",
    "UnknownSourcesEnabled",
    "OsVersionNotSupported",
    "DeviceIdChanged",
    // App integrity
    "TamperedApp",
    "AppIntegrityFailure",
    "DebuggerDetected",
    "HookFrameworkDetected",
    "CodeInjectionDetected",
    "RuntimeManipulationDetected",
    "UntrustedInstallerDetected",
    // Network
    "SslCertificateValidationFailed",
    "MitmAttackDetected",
    "UnsecureWifiDetected",
    "VpnDetected",
    "ProxyDetected",
    // Screen & input
    "ScreenRecordingDetected",
    "ScreenshotBlocked",
    "OverlayDetected",
    "AccessibilityServiceAbuse",
    "KeyloggerDetected",
    "ClickjackingDetected",
    // Fraud & environment
    "MaliciousAppDetected",
    "SimSwapDetected",
    "GeoFencingViolation",
    "RemoteAccessToolDetected",
    // Bot defense
    BOT_DEFENSE_CATEGORY,
];

pub fn is_known_category(category: &str) -> bool {
    KNOWN_CATEGORIES.contains(&category)
}
