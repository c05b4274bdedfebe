//! Notification delivery core
//!
//! # Pipeline
//! 1. `normalizer`: raw push payload → `NotificationIntent`
//! 2. `router`: dedup by intent id, pick a channel from the policy table
//! 3. `dispatcher`: intent + channel → `RenderRequest` with a stable id
//! 4. `renderer`: hands the request to whatever presents it
//!
//! # Usage
//! ```ignore
//! use push_delivery::notification::{DeliveryCoreBuilder, RawPushPayload};
//!
//! let core = DeliveryCoreBuilder::new().build()?;
//! let payload = RawPushPayload::new()
//!     .with_message_id("m1")
//!     .with_notification("Hi", "Hello");
//! core.on_message(payload).await?;
//! ```

pub mod builder;
pub mod channel;
pub mod dedup_key;
pub mod deduplicator;
pub mod dispatcher;
pub mod importance;
pub mod normalizer;
pub mod payload;
pub mod pipeline;
pub mod renderer;
pub mod renderers;
pub mod router;
pub mod token;

pub use builder::DeliveryCoreBuilder;
pub use channel::{ChannelAssignment, ChannelPolicy, ChannelSpec};
pub use deduplicator::{DedupCache, DedupDecision};
pub use dispatcher::{DeliveryDispatcher, RenderRequest};
pub use importance::Importance;
pub use normalizer::{MessageNormalizer, NotificationIntent};
pub use payload::{NotificationBlock, RawPushPayload};
pub use pipeline::{DeliveryCore, DeliveryOutcome, DeliveryStage, DeliveryStats, RenderFailurePolicy};
pub use renderer::{ConsoleRenderer, NotificationRenderer};
pub use router::ChannelRouter;
pub use token::TokenRegistry;
