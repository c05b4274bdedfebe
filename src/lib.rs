//! Push Delivery - normalize, dedup, route and dispatch inbound push messages

pub mod cli;
pub mod config;
pub mod error;
pub mod notification;

pub use config::{DeliveryConfig, RendererConfig};
pub use error::{DeliveryError, InvalidPayloadError, RenderDeliveryError};
pub use notification::{
    ChannelAssignment, ChannelPolicy, ChannelRouter, ChannelSpec, DeliveryCore, DeliveryCoreBuilder,
    DeliveryDispatcher, DeliveryOutcome, DeliveryStats, Importance, MessageNormalizer,
    NotificationIntent, NotificationRenderer, RawPushPayload, RenderFailurePolicy, RenderRequest,
};
