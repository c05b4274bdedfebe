//! Delivery core builder - wires stages and renderer from configuration

use anyhow::{anyhow, Context, Result};
use std::sync::Arc;
use tracing::info;

use super::normalizer::MessageNormalizer;
use super::pipeline::DeliveryCore;
use super::renderer::{ConsoleRenderer, NotificationRenderer};
use super::renderers::{JournalRenderer, WebhookRenderer};
use super::router::ChannelRouter;
use super::token::TokenRegistry;
use crate::config::{DeliveryConfig, RendererConfig};

/// Assembles a [`DeliveryCore`] from a [`DeliveryConfig`]
pub struct DeliveryCoreBuilder {
    config: DeliveryConfig,
    renderer: Option<Arc<dyn NotificationRenderer>>,
    tokens: Option<TokenRegistry>,
    dry_run: bool,
}

impl DeliveryCoreBuilder {
    /// Builder over the default configuration
    pub fn new() -> Self {
        Self::from_config(DeliveryConfig::default())
    }

    /// Builder over a loaded configuration
    pub fn from_config(config: DeliveryConfig) -> Self {
        Self {
            config,
            renderer: None,
            tokens: None,
            dry_run: false,
        }
    }

    /// Use this renderer instead of the one named in the config
    pub fn renderer(mut self, renderer: Arc<dyn NotificationRenderer>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    /// Start from a previously saved token registry
    pub fn tokens(mut self, tokens: TokenRegistry) -> Self {
        self.tokens = Some(tokens);
        self
    }

    /// Build render requests without rendering them
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Validate the config and wire normalizer, router and renderer
    ///
    /// Fails on an invalid config or a webhook renderer that cannot be created.
    pub fn build(self) -> Result<DeliveryCore> {
        self.config.validate().context("invalid delivery config")?;

        let renderer = match self.renderer {
            Some(renderer) => renderer,
            None => Self::renderer_from_config(&self.config.renderer)?,
        };

        let normalizer = MessageNormalizer::new(
            self.config.default_title.clone(),
            self.config.default_body.clone(),
        )
        .with_id_bucket_secs(self.config.id_bucket_secs);

        let router = ChannelRouter::new(
            self.config.channels.clone(),
            self.config.dedup_window(),
            self.config.dedup_cache_capacity,
        );

        info!(
            renderer = renderer.name(),
            dedup_window_secs = self.config.dedup_window_secs,
            dedup_capacity = self.config.dedup_cache_capacity,
            failure_policy = ?self.config.render_failure,
            "Delivery core ready"
        );

        Ok(DeliveryCore::new(normalizer, router, renderer)
            .with_failure_policy(self.config.render_failure)
            .with_tokens(self.tokens.unwrap_or_default())
            .with_dry_run(self.dry_run))
    }

    /// Renderer named by the `renderer` section of the config
    fn renderer_from_config(config: &RendererConfig) -> Result<Arc<dyn NotificationRenderer>> {
        Ok(match config {
            RendererConfig::Console => Arc::new(ConsoleRenderer::new()),
            RendererConfig::Journal { path } => {
                let path = path.clone().unwrap_or_else(JournalRenderer::default_path);
                Arc::new(JournalRenderer::new(path))
            }
            RendererConfig::Webhook(webhook) => {
                Arc::new(WebhookRenderer::new(webhook.clone()).map_err(|e| anyhow!(e))?)
            }
        })
    }
}

impl Default for DeliveryCoreBuilder {
    fn default() -> Self {
        Self::new()
    }
}
