//! Output formatting for CLI commands

use serde::Serialize;

use crate::notification::{DeliveryOutcome, DeliveryStats};

/// Format output as pretty JSON or with the given text formatter
pub fn format_output<T: Serialize>(data: &T, json: bool, text: impl FnOnce(&T) -> String) -> String {
    if json {
        serde_json::to_string_pretty(data).unwrap_or_else(|_| "{}".to_string())
    } else {
        text(data)
    }
}

pub fn describe_outcome(outcome: &DeliveryOutcome) -> String {
    match outcome {
        DeliveryOutcome::Dispatched(r) => format!(
            "dispatched #{} to {} ({}): {}",
            r.notification_id, r.channel_id, r.importance, r.title
        ),
        DeliveryOutcome::DryRun(r) => format!(
            "dry-run #{} to {} ({}): {}",
            r.notification_id, r.channel_id, r.importance, r.title
        ),
        DeliveryOutcome::Suppressed { intent_id } => format!("suppressed duplicate {}", intent_id),
        DeliveryOutcome::Dropped { request, reason } => {
            format!("dropped #{}: {}", request.notification_id, reason)
        }
    }
}

pub fn describe_stats(stats: &DeliveryStats) -> String {
    format!(
        "received {} | dispatched {} | suppressed {} | invalid {} | failed {} | dropped {} | dry-run {}",
        stats.received,
        stats.dispatched,
        stats.suppressed,
        stats.invalid,
        stats.failed,
        stats.dropped,
        stats.dry_run
    )
}
