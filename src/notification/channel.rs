//! Notification channels and the routing policy table

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::importance::Importance;

pub const HIGH_IMPORTANCE_CHANNEL: &str = "high_importance_channel";
pub const DEFAULT_CHANNEL: &str = "default_channel";

/// Vibration used by the high importance channel (ms: wait, buzz, wait, buzz)
pub const STRONG_VIBRATION: [u64; 4] = [0, 500, 1000, 500];

/// A channel the host registers with the OS once at startup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelSpec {
    /// Channel id referenced by render requests
    pub id: String,
    /// User-visible channel name
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub importance: Importance,
    /// Vibration pattern in milliseconds, empty for none
    #[serde(default)]
    pub vibration_pattern: Vec<u64>,
    #[serde(default = "default_true")]
    pub sound: bool,
    #[serde(default)]
    pub show_badge: bool,
    #[serde(default)]
    pub enable_lights: bool,
}

fn default_true() -> bool {
    true
}

impl ChannelSpec {
    pub fn high_importance() -> Self {
        Self {
            id: HIGH_IMPORTANCE_CHANNEL.to_string(),
            name: "High Importance Notifications".to_string(),
            description: "Used for important notifications like messages and alerts".to_string(),
            importance: Importance::High,
            vibration_pattern: STRONG_VIBRATION.to_vec(),
            sound: true,
            show_badge: true,
            enable_lights: true,
        }
    }

    pub fn default_channel() -> Self {
        Self {
            id: DEFAULT_CHANNEL.to_string(),
            name: "Notifications".to_string(),
            description: "General notifications".to_string(),
            importance: Importance::Default,
            vibration_pattern: Vec::new(),
            sound: true,
            show_badge: true,
            enable_lights: false,
        }
    }

    /// Per-message assignment derived from this channel
    pub fn assignment(&self) -> ChannelAssignment {
        ChannelAssignment {
            channel_id: self.id.clone(),
            importance: self.importance,
            vibration_pattern: self.vibration_pattern.clone(),
            sound: self.sound,
            show_badge: self.show_badge,
            enable_lights: self.enable_lights,
        }
    }
}

/// Channel chosen for one intent, not persisted beyond the call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelAssignment {
    pub channel_id: String,
    pub importance: Importance,
    pub vibration_pattern: Vec<u64>,
    pub sound: bool,
    pub show_badge: bool,
    pub enable_lights: bool,
}

/// Data-driven routing table
///
/// Looks up `selector` in the message data and picks the channel whose rule
/// key matches the value (trimmed, case-insensitive). No match, or no such
/// field, routes to `fallback`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelPolicy {
    #[serde(default = "default_selector")]
    pub selector: String,
    #[serde(default)]
    pub rules: BTreeMap<String, ChannelSpec>,
    #[serde(default = "ChannelSpec::default_channel")]
    pub fallback: ChannelSpec,
}

fn default_selector() -> String {
    "priority".to_string()
}

impl Default for ChannelPolicy {
    fn default() -> Self {
        let mut rules = BTreeMap::new();
        rules.insert("high".to_string(), ChannelSpec::high_importance());
        Self {
            selector: default_selector(),
            rules,
            fallback: ChannelSpec::default_channel(),
        }
    }
}

impl ChannelPolicy {
    /// Pick the channel for a message's data map
    pub fn select(&self, data: &BTreeMap<String, String>) -> &ChannelSpec {
        data.get(&self.selector)
            .map(|value| value.trim().to_lowercase())
            .and_then(|value| {
                self.rules
                    .iter()
                    .find(|(key, _)| key.trim().to_lowercase() == value)
                    .map(|(_, spec)| spec)
            })
            .unwrap_or(&self.fallback)
    }

    pub fn assign(&self, data: &BTreeMap<String, String>) -> ChannelAssignment {
        self.select(data).assignment()
    }

    /// Every distinct channel the table can route to, fallback last
    pub fn channel_specs(&self) -> Vec<&ChannelSpec> {
        let mut specs: Vec<&ChannelSpec> = Vec::new();
        for spec in self.rules.values().chain(std::iter::once(&self.fallback)) {
            if !specs.iter().any(|s| s.id == spec.id) {
                specs.push(spec);
            }
        }
        specs
    }
}
