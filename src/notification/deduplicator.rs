//! Dedup cache - suppresses redelivered push messages
//!
//! Push transports deliver at least once, so the same message can arrive
//! twice within seconds. The cache remembers when each identity was last
//! let through and rejects repeats inside the dedup window.
//!
//! ## Rules
//! 1. Lookup by intent id, compare against a monotonic `Instant`
//! 2. A suppressed repeat does not refresh the last-seen time
//! 3. Bounded: when full, the least-recently-seen identity is evicted

use std::collections::{BTreeMap, HashMap};
use std::time::{Duration, Instant};
use tracing::debug;

pub const DEFAULT_DEDUP_WINDOW: Duration = Duration::from_secs(30);
pub const DEFAULT_DEDUP_CAPACITY: usize = 200;

/// Result of a cache check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DedupDecision {
    /// First sighting (or window expired); the identity is now recorded
    Accepted {
        /// Identity pushed out to make room, if the cache was full
        evicted: Option<String>,
    },
    /// Seen within the window
    Duplicate {
        /// Time since the identity was last accepted
        elapsed: Duration,
    },
}

impl DedupDecision {
    pub fn is_duplicate(&self) -> bool {
        matches!(self, DedupDecision::Duplicate { .. })
    }
}

/// Bounded identity → last-seen map
///
/// `order` indexes entries by `(last_seen, seq)`; `seq` breaks ties between
/// identical instants so eviction order stays deterministic.
#[derive(Debug)]
pub struct DedupCache {
    entries: HashMap<String, (Instant, u64)>,
    order: BTreeMap<(Instant, u64), String>,
    window: Duration,
    capacity: usize,
    next_seq: u64,
}

impl DedupCache {
    /// Create a cache with the default 30 second window and 200 entries
    pub fn new() -> Self {
        Self::with_limits(DEFAULT_DEDUP_WINDOW, DEFAULT_DEDUP_CAPACITY)
    }

    /// Capacity is clamped to at least one entry
    pub fn with_limits(window: Duration, capacity: usize) -> Self {
        Self {
            entries: HashMap::new(),
            order: BTreeMap::new(),
            window,
            capacity: capacity.max(1),
            next_seq: 0,
        }
    }

    /// Check an identity at `now`, recording it when accepted
    pub fn check_and_record(&mut self, id: &str, now: Instant) -> DedupDecision {
        if let Some(&(last_seen, seq)) = self.entries.get(id) {
            let elapsed = now.saturating_duration_since(last_seen);
            if elapsed < self.window {
                debug!(
                    intent_id = %id,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "Duplicate within dedup window"
                );
                return DedupDecision::Duplicate { elapsed };
            }
            // Window expired: re-record below as a fresh sighting
            self.order.remove(&(last_seen, seq));
            self.entries.remove(id);
        }

        let evicted = if self.entries.len() >= self.capacity {
            self.evict_oldest()
        } else {
            None
        };

        let seq = self.next_seq;
        self.next_seq += 1;
        self.entries.insert(id.to_string(), (now, seq));
        self.order.insert((now, seq), id.to_string());

        DedupDecision::Accepted { evicted }
    }

    fn evict_oldest(&mut self) -> Option<String> {
        let (&key, _) = self.order.iter().next()?;
        let id = self.order.remove(&key)?;
        self.entries.remove(&id);
        debug!(intent_id = %id, "Evicted least-recently-seen dedup entry");
        Some(id)
    }

    /// Drop entries whose window has passed, returns how many were removed
    pub fn purge_expired(&mut self, now: Instant) -> usize {
        let window = self.window;
        let expired: Vec<(Instant, u64)> = self
            .order
            .keys()
            .take_while(|(seen, _)| now.saturating_duration_since(*seen) >= window)
            .copied()
            .collect();

        for key in &expired {
            if let Some(id) = self.order.remove(key) {
                self.entries.remove(&id);
            }
        }
        expired.len()
    }

    pub fn last_seen(&self, id: &str) -> Option<Instant> {
        self.entries.get(id).map(|(seen, _)| *seen)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn window(&self) -> Duration {
        self.window
    }
}

impl Default for DedupCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_id_within_window_is_duplicate() {
        let mut cache = DedupCache::new();
        let t0 = Instant::now();

        assert!(!cache.check_and_record("m1", t0).is_duplicate());
        let second = cache.check_and_record("m1", t0 + Duration::from_secs(5));
        assert_eq!(
            second,
            DedupDecision::Duplicate { elapsed: Duration::from_secs(5) }
        );
    }

    #[test]
    fn test_window_expiry_accepts_again() {
        let mut cache = DedupCache::with_limits(Duration::from_secs(30), 10);
        let t0 = Instant::now();

        assert!(!cache.check_and_record("m1", t0).is_duplicate());
        assert!(cache.check_and_record("m1", t0 + Duration::from_secs(29)).is_duplicate());
        assert!(!cache.check_and_record("m1", t0 + Duration::from_secs(30)).is_duplicate());
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.last_seen("m1"), Some(t0 + Duration::from_secs(30)));
    }

    #[test]
    fn test_duplicate_does_not_refresh_last_seen() {
        let mut cache = DedupCache::with_limits(Duration::from_secs(30), 10);
        let t0 = Instant::now();

        cache.check_and_record("m1", t0);
        cache.check_and_record("m1", t0 + Duration::from_secs(20));
        assert_eq!(cache.last_seen("m1"), Some(t0));
        // 31s after the first acceptance, even though a repeat came at 20s
        assert!(!cache.check_and_record("m1", t0 + Duration::from_secs(31)).is_duplicate());
    }

    #[test]
    fn test_different_ids_are_independent() {
        let mut cache = DedupCache::new();
        let t0 = Instant::now();
        assert!(!cache.check_and_record("m1", t0).is_duplicate());
        assert!(!cache.check_and_record("m2", t0).is_duplicate());
        assert!(!cache.check_and_record("m3", t0).is_duplicate());
        assert_eq!(cache.len(), 3);
    }

    #[test]
    fn test_capacity_never_exceeded() {
        let mut cache = DedupCache::with_limits(Duration::from_secs(30), 5);
        let t0 = Instant::now();

        for i in 0..50u64 {
            cache.check_and_record(&format!("m{}", i), t0 + Duration::from_millis(i));
            assert!(cache.len() <= 5);
        }
        assert_eq!(cache.len(), 5);
    }

    #[test]
    fn test_full_cache_evicts_exactly_least_recently_seen() {
        let mut cache = DedupCache::with_limits(Duration::from_secs(300), 3);
        let t0 = Instant::now();

        cache.check_and_record("a", t0);
        cache.check_and_record("b", t0 + Duration::from_secs(1));
        cache.check_and_record("c", t0 + Duration::from_secs(2));

        let decision = cache.check_and_record("d", t0 + Duration::from_secs(3));
        assert_eq!(decision, DedupDecision::Accepted { evicted: Some("a".to_string()) });
        assert!(!cache.contains("a"));
        assert!(cache.contains("b") && cache.contains("c") && cache.contains("d"));
        assert_eq!(cache.len(), 3);
    }

    #[test]
    fn test_reaccepted_entry_moves_to_back_of_eviction_order() {
        let mut cache = DedupCache::with_limits(Duration::from_secs(10), 2);
        let t0 = Instant::now();

        cache.check_and_record("a", t0);
        cache.check_and_record("b", t0 + Duration::from_secs(5));
        // "a" expired and is accepted again, so "b" is now the oldest
        cache.check_and_record("a", t0 + Duration::from_secs(11));

        let decision = cache.check_and_record("c", t0 + Duration::from_secs(12));
        assert_eq!(decision, DedupDecision::Accepted { evicted: Some("b".to_string()) });
    }

    #[test]
    fn test_same_instant_evicts_in_insertion_order() {
        let mut cache = DedupCache::with_limits(Duration::from_secs(30), 2);
        let t0 = Instant::now();

        cache.check_and_record("first", t0);
        cache.check_and_record("second", t0);
        let decision = cache.check_and_record("third", t0);
        assert_eq!(decision, DedupDecision::Accepted { evicted: Some("first".to_string()) });
    }

    #[test]
    fn test_purge_expired() {
        let mut cache = DedupCache::with_limits(Duration::from_secs(10), 10);
        let t0 = Instant::now();

        cache.check_and_record("old-1", t0);
        cache.check_and_record("old-2", t0 + Duration::from_secs(1));
        cache.check_and_record("fresh", t0 + Duration::from_secs(8));

        assert_eq!(cache.purge_expired(t0 + Duration::from_secs(12)), 2);
        assert_eq!(cache.len(), 1);
        assert!(cache.contains("fresh"));
    }

    #[test]
    fn test_zero_capacity_is_clamped() {
        let cache = DedupCache::with_limits(Duration::from_secs(1), 0);
        assert_eq!(cache.capacity(), 1);
    }

    #[test]
    fn test_default_limits() {
        let cache = DedupCache::new();
        assert_eq!(cache.window(), Duration::from_secs(30));
        assert_eq!(cache.capacity(), 200);
        assert!(cache.is_empty());
    }
}
