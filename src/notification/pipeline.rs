//! Delivery core - Normalizer → Router → Dispatcher → renderer
//!
//! Per message: `Received → Normalized → {Suppressed | Routed} → Dispatched`.
//! Nothing is re-queued. A render failure is handled by the configured
//! [`RenderFailurePolicy`]; dedup state stays committed either way, so a
//! retried render can never be mistaken for a fresh message.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use super::channel::ChannelSpec;
use super::dispatcher::{DeliveryDispatcher, RenderRequest};
use super::normalizer::MessageNormalizer;
use super::payload::RawPushPayload;
use super::renderer::NotificationRenderer;
use super::router::ChannelRouter;
use super::token::{mask_token, TokenRegistry};
use crate::error::{DeliveryError, RenderDeliveryError};

/// What to do when the renderer fails a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum RenderFailurePolicy {
    /// Return the error to the caller
    #[default]
    Surface,
    /// Log the error and report the message as dropped
    DropAndLog,
    /// Retry once after `backoff_ms`, then return the error
    RetryOnce { backoff_ms: u64 },
}

/// Stage a message reached in the pipeline
///
/// `Received → Normalized → {Suppressed | Routed}`, then from `Routed`
/// exactly one of `Dispatched`, `DryRun` or `Dropped`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStage {
    Received,
    Normalized,
    Suppressed,
    Routed,
    Dispatched,
    /// Render request built, renderer skipped
    DryRun,
    /// Renderer failed under `DropAndLog`
    Dropped,
}

impl DeliveryStage {
    /// No further stage follows this one
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            DeliveryStage::Suppressed
                | DeliveryStage::Dispatched
                | DeliveryStage::DryRun
                | DeliveryStage::Dropped
        )
    }
}

/// Result of a handled message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DeliveryOutcome {
    /// Rendered by the renderer
    Dispatched(RenderRequest),
    /// Same identity seen within the dedup window
    Suppressed { intent_id: String },
    /// Dry-run: built but not rendered
    DryRun(RenderRequest),
    /// Renderer failed and the policy is `DropAndLog`
    Dropped { request: RenderRequest, reason: String },
}

impl DeliveryOutcome {
    /// Terminal stage this outcome ended in
    pub fn stage(&self) -> DeliveryStage {
        match self {
            DeliveryOutcome::Suppressed { .. } => DeliveryStage::Suppressed,
            DeliveryOutcome::Dispatched(_) => DeliveryStage::Dispatched,
            DeliveryOutcome::DryRun(_) => DeliveryStage::DryRun,
            DeliveryOutcome::Dropped { .. } => DeliveryStage::Dropped,
        }
    }

    /// The request built for this message, if it got past the router
    pub fn render_request(&self) -> Option<&RenderRequest> {
        match self {
            DeliveryOutcome::Dispatched(r) | DeliveryOutcome::DryRun(r) => Some(r),
            DeliveryOutcome::Dropped { request, .. } => Some(request),
            DeliveryOutcome::Suppressed { .. } => None,
        }
    }
}

/// Counter snapshot
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryStats {
    pub received: u64,
    pub invalid: u64,
    pub suppressed: u64,
    pub dispatched: u64,
    pub dry_run: u64,
    pub failed: u64,
    pub dropped: u64,
}

#[derive(Debug, Default)]
struct Counters {
    received: AtomicU64,
    invalid: AtomicU64,
    suppressed: AtomicU64,
    dispatched: AtomicU64,
    dry_run: AtomicU64,
    failed: AtomicU64,
    dropped: AtomicU64,
}

impl Counters {
    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn snapshot(&self) -> DeliveryStats {
        DeliveryStats {
            received: self.received.load(Ordering::Relaxed),
            invalid: self.invalid.load(Ordering::Relaxed),
            suppressed: self.suppressed.load(Ordering::Relaxed),
            dispatched: self.dispatched.load(Ordering::Relaxed),
            dry_run: self.dry_run.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
        }
    }
}

/// Notification delivery core, shared across concurrent inbound messages
pub struct DeliveryCore {
    normalizer: MessageNormalizer,
    router: ChannelRouter,
    dispatcher: DeliveryDispatcher,
    renderer: Arc<dyn NotificationRenderer>,
    failure_policy: RenderFailurePolicy,
    tokens: TokenRegistry,
    dry_run: bool,
    counters: Counters,
}

impl DeliveryCore {
    /// Core with the default failure policy, no dry-run and an empty token registry
    pub fn new(
        normalizer: MessageNormalizer,
        router: ChannelRouter,
        renderer: Arc<dyn NotificationRenderer>,
    ) -> Self {
        Self {
            normalizer,
            router,
            dispatcher: DeliveryDispatcher::new(),
            renderer,
            failure_policy: RenderFailurePolicy::default(),
            tokens: TokenRegistry::new(),
            dry_run: false,
            counters: Counters::default(),
        }
    }

    /// How renderer failures are handled (default: surface the error)
    pub fn with_failure_policy(mut self, policy: RenderFailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    /// Build render requests but never call the renderer
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Start from a restored token registry
    pub fn with_tokens(mut self, tokens: TokenRegistry) -> Self {
        self.tokens = tokens;
        self
    }

    /// Handle one inbound push message
    ///
    /// Safe to call concurrently; the router admits exactly one delivery per
    /// intent id within the dedup window. Returns `InvalidPayload` for a
    /// payload with nothing to show, `RenderDelivery` when the renderer fails
    /// and the policy surfaces it.
    pub async fn on_message(&self, payload: RawPushPayload) -> Result<DeliveryOutcome, DeliveryError> {
        Counters::bump(&self.counters.received);
        debug!(
            message_id = ?payload.message_id,
            from = ?payload.from,
            data_keys = payload.data.len(),
            has_notification = payload.notification.is_some(),
            "Push message received"
        );

        let intent = match self.normalizer.normalize(&payload) {
            Ok(intent) => intent,
            Err(e) => {
                Counters::bump(&self.counters.invalid);
                warn!(error = %e, "Dropping push message with no usable content");
                return Err(e.into());
            }
        };

        let intent_id = intent.id.clone();
        let Some((intent, assignment)) = self.router.route(intent) else {
            Counters::bump(&self.counters.suppressed);
            debug!(intent_id = %intent_id, "Notification suppressed (duplicate)");
            return Ok(DeliveryOutcome::Suppressed { intent_id });
        };

        let request = self.dispatcher.dispatch(&intent, &assignment);

        if self.dry_run {
            Counters::bump(&self.counters.dry_run);
            eprintln!(
                "[DRY-RUN] Would render via {}: {}",
                self.renderer.name(),
                serde_json::to_string(&request).unwrap_or_default()
            );
            return Ok(DeliveryOutcome::DryRun(request));
        }

        match self.render_with_policy(&request).await {
            Ok(()) => {
                Counters::bump(&self.counters.dispatched);
                info!(
                    intent_id = %request.intent_id,
                    notification_id = request.notification_id,
                    channel = %request.channel_id,
                    importance = request.importance.as_str(),
                    renderer = self.renderer.name(),
                    "Notification dispatched"
                );
                Ok(DeliveryOutcome::Dispatched(request))
            }
            Err(e) => {
                Counters::bump(&self.counters.failed);
                error!(
                    intent_id = %request.intent_id,
                    notification_id = request.notification_id,
                    renderer = self.renderer.name(),
                    error = %e,
                    "Render failed"
                );
                if self.failure_policy == RenderFailurePolicy::DropAndLog {
                    Counters::bump(&self.counters.dropped);
                    return Ok(DeliveryOutcome::Dropped {
                        request,
                        reason: e.to_string(),
                    });
                }
                Err(e.into())
            }
        }
    }

    /// Render once, plus one retry after backoff under `RetryOnce`
    async fn render_with_policy(&self, request: &RenderRequest) -> Result<(), RenderDeliveryError> {
        match self.renderer.render(request).await {
            Ok(()) => Ok(()),
            Err(e) => match self.failure_policy {
                RenderFailurePolicy::RetryOnce { backoff_ms } => {
                    warn!(
                        notification_id = request.notification_id,
                        backoff_ms,
                        error = %e,
                        "Render failed, retrying once"
                    );
                    tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                    self.renderer.render(request).await
                }
                RenderFailurePolicy::Surface | RenderFailurePolicy::DropAndLog => Err(e),
            },
        }
    }

    /// Transport handed out a new registration token
    ///
    /// Returns `true` if the token changed. Persisting it is up to the caller.
    pub fn on_new_token(&self, token: &str) -> bool {
        let changed = self.tokens.update(token);
        if changed {
            info!(token = %mask_token(token.trim()), "Registration token refreshed");
        } else {
            debug!("Registration token unchanged");
        }
        changed
    }

    /// Current registration token state
    pub fn tokens(&self) -> &TokenRegistry {
        &self.tokens
    }

    /// Channels the host must register before the first render
    pub fn channel_specs(&self) -> Vec<&ChannelSpec> {
        self.router.channel_specs()
    }

    /// Drop dedup entries whose window has passed, returns how many
    pub fn purge_expired(&self) -> usize {
        self.router.purge_expired()
    }

    /// Snapshot of the per-outcome counters
    pub fn stats(&self) -> DeliveryStats {
        self.counters.snapshot()
    }

    /// Name of the configured renderer (for logs)
    pub fn renderer_name(&self) -> &str {
        self.renderer.name()
    }
}
