//! Delivery error types
//!
//! Domain errors are typed so callers can tell a payload that will never
//! render apart from a renderer that refused a well-formed request.

use thiserror::Error;

/// Normalization found nothing worth showing.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid push payload{}: no title, body or data", quoted_id(.message_id))]
pub struct InvalidPayloadError {
    /// Provider message id, if the payload carried one
    pub message_id: Option<String>,
}

fn quoted_id(message_id: &Option<String>) -> String {
    message_id
        .as_deref()
        .map(|id| format!(" '{}'", id))
        .unwrap_or_default()
}

/// The external renderer rejected or failed a render request.
#[derive(Error, Debug)]
pub enum RenderDeliveryError {
    #[error("renderer '{renderer}' rejected notification {notification_id}: {reason}")]
    Rejected {
        renderer: String,
        notification_id: i32,
        reason: String,
    },

    #[error("renderer '{renderer}' failed for notification {notification_id}")]
    Io {
        renderer: String,
        notification_id: i32,
        #[source]
        source: std::io::Error,
    },

    #[error("renderer '{renderer}' transport error for notification {notification_id}")]
    Transport {
        renderer: String,
        notification_id: i32,
        #[source]
        source: reqwest::Error,
    },
}

impl RenderDeliveryError {
    pub fn rejected(renderer: &str, notification_id: i32, reason: impl Into<String>) -> Self {
        Self::Rejected {
            renderer: renderer.to_string(),
            notification_id,
            reason: reason.into(),
        }
    }

    pub fn notification_id(&self) -> i32 {
        match self {
            Self::Rejected { notification_id, .. }
            | Self::Io { notification_id, .. }
            | Self::Transport { notification_id, .. } => *notification_id,
        }
    }
}

/// Anything that stops a single inbound message from being delivered.
#[derive(Error, Debug)]
pub enum DeliveryError {
    #[error(transparent)]
    InvalidPayload(#[from] InvalidPayloadError),

    #[error(transparent)]
    RenderDelivery(#[from] RenderDeliveryError),
}
