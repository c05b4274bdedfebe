//! Message normalizer - raw push payload to canonical intent

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::dedup_key::derive_intent_id;
use super::payload::RawPushPayload;
use crate::error::InvalidPayloadError;

/// Canonical notification record, never mutated after normalization
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationIntent {
    /// Provider message id, or a content-derived `local-` id
    pub id: String,
    pub title: String,
    pub body: String,
    pub data: BTreeMap<String, String>,
    pub received_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sent_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
}

/// Turns raw payloads into intents using configured fallbacks
#[derive(Debug, Clone)]
pub struct MessageNormalizer {
    default_title: String,
    default_body: String,
    id_bucket_secs: u64,
}

impl MessageNormalizer {
    pub fn new(default_title: impl Into<String>, default_body: impl Into<String>) -> Self {
        Self {
            default_title: default_title.into(),
            default_body: default_body.into(),
            id_bucket_secs: 1,
        }
    }

    /// Set the time bucket used when deriving ids (seconds, minimum 1)
    pub fn with_id_bucket_secs(mut self, secs: u64) -> Self {
        self.id_bucket_secs = secs.max(1);
        self
    }

    pub fn normalize(&self, payload: &RawPushPayload) -> Result<NotificationIntent, InvalidPayloadError> {
        self.normalize_at(payload, Utc::now())
    }

    /// Normalize with an explicit receive time
    ///
    /// # Resolution
    /// - title: `notification.title` → `data["title"]` → default
    /// - body: `notification.body` → `data["body"]` → default
    /// - id: provider message id, else a hash of the resolved content
    pub fn normalize_at(
        &self,
        payload: &RawPushPayload,
        received_at: DateTime<Utc>,
    ) -> Result<NotificationIntent, InvalidPayloadError> {
        let shown_title = payload.notification_title();
        let shown_body = payload.notification_body();

        if shown_title.is_none() && shown_body.is_none() && payload.data.is_empty() {
            return Err(InvalidPayloadError {
                message_id: payload.provider_id().map(str::to_string),
            });
        }

        let title = shown_title
            .or_else(|| payload.data_value("title"))
            .unwrap_or(self.default_title.as_str())
            .to_string();
        let body = shown_body
            .or_else(|| payload.data_value("body"))
            .unwrap_or(self.default_body.as_str())
            .to_string();

        let id = match payload.provider_id() {
            Some(id) => id.to_string(),
            None => derive_intent_id(&title, &body, &payload.data, received_at, self.id_bucket_secs),
        };

        Ok(NotificationIntent {
            id,
            title,
            body,
            data: payload.data.clone(),
            received_at,
            sent_at: payload
                .sent_time
                .and_then(|ms| Utc.timestamp_millis_opt(ms).single()),
            from: payload.from.clone(),
        })
    }
}
