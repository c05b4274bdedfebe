//! Dedup & channel router
//!
//! The dedup cache is the only shared mutable state in the pipeline. Lookup
//! and insert/evict run under one lock scope so two concurrent deliveries of
//! the same id cannot both observe "not present".

use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};
use tracing::debug;

use super::channel::{ChannelAssignment, ChannelPolicy, ChannelSpec};
use super::deduplicator::{DedupCache, DedupDecision};
use super::normalizer::NotificationIntent;

/// Dedup cache plus channel policy table, shared by concurrent deliveries
pub struct ChannelRouter {
    cache: Mutex<DedupCache>,
    policy: ChannelPolicy,
}

impl ChannelRouter {
    /// Router with an empty cache of at most `capacity` ids, each remembered for `window`
    pub fn new(policy: ChannelPolicy, window: Duration, capacity: usize) -> Self {
        Self {
            cache: Mutex::new(DedupCache::with_limits(window, capacity)),
            policy,
        }
    }

    /// Route an intent, `None` means suppressed as a duplicate
    pub fn route(&self, intent: NotificationIntent) -> Option<(NotificationIntent, ChannelAssignment)> {
        self.route_at(intent, Instant::now())
    }

    /// Route with an explicit clock reading
    ///
    /// Check-and-record happens under the cache lock; the lock is released
    /// before the channel lookup.
    pub fn route_at(
        &self,
        intent: NotificationIntent,
        now: Instant,
    ) -> Option<(NotificationIntent, ChannelAssignment)> {
        let decision = self.lock_cache().check_and_record(&intent.id, now);

        match decision {
            DedupDecision::Duplicate { .. } => None,
            DedupDecision::Accepted { evicted } => {
                let assignment = self.policy.assign(&intent.data);
                debug!(
                    intent_id = %intent.id,
                    channel = %assignment.channel_id,
                    importance = assignment.importance.as_str(),
                    evicted = ?evicted,
                    "Intent routed"
                );
                Some((intent, assignment))
            }
        }
    }

    /// Drop expired dedup entries, returns how many were removed
    pub fn purge_expired(&self) -> usize {
        self.lock_cache().purge_expired(Instant::now())
    }

    /// Number of ids currently remembered
    pub fn cached_len(&self) -> usize {
        self.lock_cache().len()
    }

    /// Distinct channels the policy can assign, fallback last
    pub fn channel_specs(&self) -> Vec<&ChannelSpec> {
        self.policy.channel_specs()
    }

    /// Channel policy table in use
    pub fn policy(&self) -> &ChannelPolicy {
        &self.policy
    }

    // A panic while holding the lock cannot leave the cache half-updated,
    // so a poisoned lock is still usable.
    fn lock_cache(&self) -> MutexGuard<'_, DedupCache> {
        self.cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
