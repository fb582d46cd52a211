//! Application Configuration
//!
//! Loaded once at startup from environment variables (and `.env`).

use std::path::PathBuf;

use thiserror::Error;

use crate::constants;
use crate::logic::policy::{PolicyConfig, Sensitivity};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value '{value}' for {key}")]
    InvalidValue { key: &'static str, value: String },
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Directory holding the event snapshot
    pub store_dir: PathBuf,

    /// Storage key of the event snapshot
    pub store_key: String,

    /// Persist events to disk (otherwise kept in memory)
    pub persist_events: bool,

    /// Bot-defense policy
    pub policy: PolicyConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            store_dir: constants::get_store_dir(),
            store_key: constants::get_store_key(),
            persist_events: true,
            policy: PolicyConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = PolicyConfig::default();

        let sensitivity = match lookup("SHIELD_SENSITIVITY") {
            Some(value) => Sensitivity::parse(&value).ok_or(ConfigError::InvalidValue {
                key: "SHIELD_SENSITIVITY",
                value,
            })?,
            None => defaults.sensitivity,
        };

        let policy = PolicyConfig {
            sensitivity,
            enable_user_notification: flag(&lookup, "SHIELD_NOTIFY_USER", defaults.enable_user_notification)?,
            enable_security_countermeasures: flag(&lookup, "SHIELD_COUNTERMEASURES", defaults.enable_security_countermeasures)?,
            enable_app_protection: flag(&lookup, "SHIELD_APP_PROTECTION", defaults.enable_app_protection)?,
            is_log_only_mode: flag(&lookup, "SHIELD_LOG_ONLY", defaults.is_log_only_mode)?,
        };

        Ok(Self {
            store_dir: lookup("SHIELD_STORE_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(constants::get_store_dir),
            store_key: lookup("SHIELD_STORE_KEY")
                .unwrap_or_else(|| constants::DEFAULT_STORE_KEY.to_string()),
            persist_events: flag(&lookup, "SHIELD_PERSIST_EVENTS", true)?,
            policy,
        })
    }
}

fn flag<F>(lookup: &F, key: &'static str, default: bool) -> Result<bool, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(default),
        Some(value) => match value.trim().to_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(ConfigError::InvalidValue { key, value }),
        },
    }
}

// ============================================================================
// TESTS
// ============================================================================
