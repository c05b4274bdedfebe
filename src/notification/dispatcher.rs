//! Delivery dispatcher - accepted intent to render request

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::channel::ChannelAssignment;
use super::dedup_key::notification_id_for;
use super::importance::Importance;
use super::normalizer::NotificationIntent;

/// Request handed to the external renderer
///
/// `notification_id` depends only on the intent id, so re-rendering the same
/// intent replaces the visible notification instead of adding another one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderRequest {
    pub notification_id: i32,
    /// Intent the request was built from
    pub intent_id: String,
    pub title: String,
    pub body: String,
    pub channel_id: String,
    pub importance: Importance,
    #[serde(default)]
    pub vibration_pattern: Vec<u64>,
    #[serde(default)]
    pub sound: bool,
    /// Dismiss on tap
    #[serde(default)]
    pub auto_cancel: bool,
    /// Payload forwarded to the tap action
    #[serde(default)]
    pub data: BTreeMap<String, String>,
}

/// Builds render requests; stateless
#[derive(Debug, Clone, Copy, Default)]
pub struct DeliveryDispatcher;

impl DeliveryDispatcher {
    pub fn new() -> Self {
        Self
    }

    pub fn dispatch(&self, intent: &NotificationIntent, assignment: &ChannelAssignment) -> RenderRequest {
        RenderRequest {
            notification_id: notification_id_for(&intent.id),
            intent_id: intent.id.clone(),
            title: intent.title.clone(),
            body: intent.body.clone(),
            channel_id: assignment.channel_id.clone(),
            importance: assignment.importance,
            vibration_pattern: assignment.vibration_pattern.clone(),
            sound: assignment.sound,
            auto_cancel: true,
            data: intent.data.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notification::channel::{ChannelSpec, HIGH_IMPORTANCE_CHANNEL};
    use chrono::{Duration, Utc};

    fn intent(id: &str) -> NotificationIntent {
        let mut data = BTreeMap::new();
        data.insert("priority".to_string(), "high".to_string());
        NotificationIntent {
            id: id.to_string(),
            title: "Hi".to_string(),
            body: "Hello".to_string(),
            data,
            received_at: Utc::now(),
            sent_at: None,
            from: None,
        }
    }

    #[test]
    fn test_dispatch_copies_intent_and_assignment() {
        let assignment = ChannelSpec::high_importance().assignment();
        let request = DeliveryDispatcher::new().dispatch(&intent("m1"), &assignment);

        assert_eq!(request.title, "Hi");
        assert_eq!(request.body, "Hello");
        assert_eq!(request.channel_id, HIGH_IMPORTANCE_CHANNEL);
        assert_eq!(request.importance, Importance::High);
        assert_eq!(request.vibration_pattern, vec![0, 500, 1000, 500]);
        assert!(request.auto_cancel);
        assert_eq!(request.data.get("priority").map(String::as_str), Some("high"));
        assert_eq!(request.intent_id, "m1");
    }

    #[test]
    fn test_same_intent_id_same_notification_id() {
        let dispatcher = DeliveryDispatcher::new();
        let assignment = ChannelSpec::default_channel().assignment();

        let first = intent("m1");
        let mut later = intent("m1");
        later.received_at = first.received_at + Duration::minutes(10);
        later.body = "Edited".to_string();

        let a = dispatcher.dispatch(&first, &assignment);
        let b = dispatcher.dispatch(&later, &assignment);
        assert_eq!(a.notification_id, b.notification_id);
        assert!(a.notification_id >= 0);
    }

    #[test]
    fn test_different_intents_get_different_slots() {
        let dispatcher = DeliveryDispatcher::new();
        let assignment = ChannelSpec::default_channel().assignment();
        let a = dispatcher.dispatch(&intent("m1"), &assignment);
        let b = dispatcher.dispatch(&intent("m2"), &assignment);
        assert_ne!(a.notification_id, b.notification_id);
    }
}
