//! Concrete renderers

pub mod journal;
pub mod webhook;

pub use journal::{JournalEntry, JournalRenderer};
pub use webhook::{WebhookConfig, WebhookRenderer};
