//! Webhook renderer - POSTs render requests to an HTTP endpoint
//!
//! Used when the presenting device sits behind a relay (e.g. a companion app
//! that owns the OS notification APIs).

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::error::RenderDeliveryError;
use crate::notification::dispatcher::RenderRequest;
use crate::notification::renderer::NotificationRenderer;

/// Webhook renderer configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookConfig {
    /// Endpoint receiving `POST` with the render request as JSON
    pub url: String,
    /// Bearer token, sent when non-empty
    #[serde(default)]
    pub token: String,
    /// Timeout (seconds)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    10
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:9080/notifications".to_string(),
            token: String::new(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Webhook response body (optional; an empty 2xx counts as accepted)
#[derive(Debug, Deserialize)]
pub struct WebhookResponse {
    #[serde(default = "default_ok")]
    pub ok: bool,
    #[serde(default)]
    pub error: Option<String>,
}

fn default_ok() -> bool {
    true
}

#[derive(Debug)]
pub struct WebhookRenderer {
    client: Client,
    config: WebhookConfig,
}

impl WebhookRenderer {
    pub fn new(config: WebhookConfig) -> Result<Self, String> {
        if config.url.trim().is_empty() {
            return Err("webhook url is required".to_string());
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| format!("Failed to create HTTP client: {}", e))?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &WebhookConfig {
        &self.config
    }
}

#[async_trait]
impl NotificationRenderer for WebhookRenderer {
    fn name(&self) -> &str {
        "webhook"
    }

    async fn render(&self, request: &RenderRequest) -> Result<(), RenderDeliveryError> {
        let notification_id = request.notification_id;
        let transport = |source| RenderDeliveryError::Transport {
            renderer: "webhook".to_string(),
            notification_id,
            source,
        };

        let mut builder = self.client.post(&self.config.url).json(request);
        if !self.config.token.is_empty() {
            builder = builder.bearer_auth(&self.config.token);
        }

        let response = builder.send().await.map_err(transport)?;
        let status = response.status();
        if !status.is_success() {
            return Err(RenderDeliveryError::rejected(
                self.name(),
                notification_id,
                format!("HTTP {}", status),
            ));
        }

        let body = response.text().await.map_err(transport)?;
        if !body.trim().is_empty() {
            if let Ok(parsed) = serde_json::from_str::<WebhookResponse>(&body) {
                if !parsed.ok {
                    return Err(RenderDeliveryError::rejected(
                        self.name(),
                        notification_id,
                        parsed.error.unwrap_or_else(|| "Unknown error".to_string()),
                    ));
                }
            }
        }

        debug!(renderer = "webhook", notification_id, status = %status, "Render request accepted");
        Ok(())
    }
}
