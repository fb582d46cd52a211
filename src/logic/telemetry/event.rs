//! Threat Event Types
//!
//! Immutable, timestamped threat events received from the detection layer.
//! Derived copies (message overrides) are new values; the original is never touched.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// ATTRIBUTE KEYS
// ============================================================================

/// Well-known attribute keys of the inbound payload.
///
/// The vendor key names are an external, versioned contract; only the keys
/// read by this crate are listed here.
pub mod attr {
    pub const MESSAGE: &str = "message";
    pub const THREAT_CODE: &str = "threatCode";
    pub const DEVICE_ID: &str = "deviceID";
    pub const DEVICE_MODEL: &str = "deviceModel";
    pub const OS_VERSION: &str = "osVersion";
    pub const CARRIER: &str = "carrier";
    pub const BUILD_HOST: &str = "buildHost";
    pub const BUILD_USER: &str = "buildUser";
    pub const ENFORCEMENT: &str = "enforcement";
}

/// Attribute map: every value may be absent
pub type Attributes = BTreeMap<String, Option<String>>;

// ============================================================================
// RAW PAYLOAD
// ============================================================================

/// Payload as delivered by the event source, before validation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawPayload {
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub attributes: Attributes,
}

impl RawPayload {
    pub fn new(category: &str) -> Self {
        Self {
            category: Some(category.to_string()),
            attributes: Attributes::new(),
        }
    }

    pub fn with_attr(mut self, key: &str, value: &str) -> Self {
        self.attributes.insert(key.to_string(), Some(value.to_string()));
        self
    }

    /// Category if present and non-blank
    pub fn category(&self) -> Option<&str> {
        self.category
            .as_deref()
            .filter(|c| !c.trim().is_empty())
    }
}

// ============================================================================
// THREAT EVENT (Main struct)
// ============================================================================

/// One received threat/security notification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreatEvent {
    /// Unique event ID, assigned at receipt
    pub id: Uuid,
    /// Event type tag, drives routing
    pub category: String,
    /// When the event was received (UTC)
    pub received_at: DateTime<Utc>,
    /// Device/environment/threat metadata
    pub attributes: Attributes,
}

impl ThreatEvent {
    /// Create a new event stamped with the current time
    pub fn new(category: &str, attributes: Attributes) -> Self {
        Self::received(category, attributes, Utc::now())
    }

    /// Create a new event with an explicit receipt time
    pub fn received(category: &str, attributes: Attributes, received_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            category: category.to_string(),
            received_at,
            attributes,
        }
    }

    /// Attribute value, treating blank strings as present
    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).and_then(|v| v.as_deref())
    }

    /// Message attribute if present and non-blank
    pub fn message(&self) -> Option<&str> {
        self.attr(attr::MESSAGE).filter(|m| !m.trim().is_empty())
    }

    pub fn is_category(&self, category: &str) -> bool {
        self.category == category
    }

    /// Derived copy carrying an overridden message
    pub fn with_message(&self, message: &str) -> Self {
        let mut attributes = self.attributes.clone();
        attributes.insert(attr::MESSAGE.to_string(), Some(message.to_string()));
        Self {
            attributes,
            ..self.clone()
        }
    }

    /// Derived copy carrying a message only when the original has none
    pub fn with_fallback_message(&self, message: &str) -> Self {
        match self.message() {
            Some(_) => self.clone(),
            None => self.with_message(message),
        }
    }
}

// ============================================================================
// RECEIPT CLOCK
// ============================================================================

/// Hands out strictly increasing receipt timestamps (microsecond resolution)
#[derive(Debug, Default)]
pub struct ReceiptClock {
    last_micros: AtomicI64,
}

impl ReceiptClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stamp(&self) -> DateTime<Utc> {
        let now = Utc::now().timestamp_micros();
        let mut last = self.last_micros.load(Ordering::SeqCst);
        loop {
            let next = now.max(last + 1);
            match self.last_micros.compare_exchange(last, next, Ordering::SeqCst, Ordering::SeqCst) {
                Ok(_) => return DateTime::from_timestamp_micros(next).unwrap_or_else(Utc::now),
                Err(current) => last = current,
            }
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
