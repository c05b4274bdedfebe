//! Stable identity hashing for push messages
//!
//! Two derived values live here:
//! - the intent id used as the dedup key when the provider sent no message id
//! - the numeric notification id handed to the renderer
//!
//! Both are BLAKE3 based so they stay stable across builds and restarts,
//! which `DefaultHasher` does not promise.

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

/// Prefix for ids derived from content, keeps them apart from provider ids
pub const DERIVED_ID_PREFIX: &str = "local-";

/// Derive an intent id from message content
///
/// `received_at` is truncated to `bucket_secs`, so literally identical
/// retries inside the same bucket collapse to one identity.
pub fn derive_intent_id(
    title: &str,
    body: &str,
    data: &BTreeMap<String, String>,
    received_at: DateTime<Utc>,
    bucket_secs: u64,
) -> String {
    let mut hasher = blake3::Hasher::new();
    // Length-prefix every field so ("ab", "c") and ("a", "bc") differ
    update_field(&mut hasher, title);
    update_field(&mut hasher, body);
    for (key, value) in data {
        update_field(&mut hasher, key);
        update_field(&mut hasher, value);
    }
    hasher.update(&time_bucket(received_at, bucket_secs).to_le_bytes());

    let hash = hasher.finalize();
    format!("{}{:016x}", DERIVED_ID_PREFIX, leading_u64(hash.as_bytes()))
}

/// Map an intent id to a renderer slot id
///
/// Keeps the low 31 bits so the result is a non-negative `i32`, the id type
/// notification managers accept.
pub fn notification_id_for(intent_id: &str) -> i32 {
    let hash = blake3::hash(intent_id.as_bytes());
    (leading_u64(hash.as_bytes()) & 0x7fff_ffff) as i32
}

/// Index of the time bucket containing `at`
pub fn time_bucket(at: DateTime<Utc>, bucket_secs: u64) -> i64 {
    let bucket = bucket_secs.max(1) as i64;
    at.timestamp().div_euclid(bucket)
}

fn update_field(hasher: &mut blake3::Hasher, field: &str) {
    hasher.update(&(field.len() as u64).to_le_bytes());
    hasher.update(field.as_bytes());
}

fn leading_u64(bytes: &[u8; 32]) -> u64 {
    let mut head = [0u8; 8];
    head.copy_from_slice(&bytes[..8]);
    u64::from_le_bytes(head)
}
