//! Inbound push payload as decoded by the messaging transport

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Notification block of a push message (display fields set by the sender)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationBlock {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

/// Raw push message, immutable once received
///
/// Field names follow the transport's camelCase JSON:
/// ```json
/// {"messageId": "m1", "from": "1234", "sentTime": 1760000000000,
///  "notification": {"title": "Hi", "body": "Hello"},
///  "data": {"priority": "high"}}
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawPushPayload {
    /// Key/value data; `BTreeMap` keeps entries in key order for hashing
    #[serde(default)]
    pub data: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notification: Option<NotificationBlock>,
    /// Provider-assigned message id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    /// Provider send time, epoch milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sent_time: Option<i64>,
    /// Sender id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
}

impl RawPushPayload {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_message_id(mut self, id: impl Into<String>) -> Self {
        self.message_id = Some(id.into());
        self
    }

    pub fn with_notification(mut self, title: impl Into<String>, body: impl Into<String>) -> Self {
        self.notification = Some(NotificationBlock {
            title: Some(title.into()),
            body: Some(body.into()),
        });
        self
    }

    pub fn with_data(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }

    pub fn with_sent_time(mut self, millis: i64) -> Self {
        self.sent_time = Some(millis);
        self
    }

    pub fn with_from(mut self, from: impl Into<String>) -> Self {
        self.from = Some(from.into());
        self
    }

    /// Provider message id, if present and non-empty
    pub fn provider_id(&self) -> Option<&str> {
        self.message_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
    }

    pub fn notification_title(&self) -> Option<&str> {
        self.notification.as_ref().and_then(|n| non_empty(n.title.as_deref()))
    }

    pub fn notification_body(&self) -> Option<&str> {
        self.notification.as_ref().and_then(|n| non_empty(n.body.as_deref()))
    }

    pub fn data_value(&self, key: &str) -> Option<&str> {
        non_empty(self.data.get(key).map(String::as_str))
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}
