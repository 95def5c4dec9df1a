use std::sync::Arc;
use std::time::{Duration, Instant};

/// A value stored in the cache together with when it was stored and how
/// long it stays valid.
#[derive(Debug)]
pub struct CacheEntry<V> {
    pub value: Arc<V>,
    pub stored_at: Instant,
    pub ttl: Duration,
}

impl<V> CacheEntry<V> {
    pub fn new(value: V, stored_at: Instant, ttl: Duration) -> Self {
        Self {
            value: Arc::new(value),
            stored_at,
            ttl,
        }
    }

    /// Wrap a value that is already shared with callers.
    pub fn shared(value: Arc<V>, stored_at: Instant, ttl: Duration) -> Self {
        Self {
            value,
            stored_at,
            ttl,
        }
    }

    /// Valid iff `now - stored_at < ttl`. A `now` earlier than `stored_at`
    /// counts as zero elapsed time.
    pub fn is_fresh_at(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.stored_at) < self.ttl
    }
}

impl<V> Clone for CacheEntry<V> {
    fn clone(&self) -> Self {
        Self {
            value: Arc::clone(&self.value),
            stored_at: self.stored_at,
            ttl: self.ttl,
        }
    }
}

/// Snapshot of cache statistics.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    /// Lookups that found nothing usable, stale entries included.
    pub misses: u64,
    /// Lookups that found an entry past its TTL.
    pub expired: u64,
    pub inserts: u64,
    pub current_size: usize,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total > 0 {
            self.hits as f64 / total as f64
        } else {
            0.0
        }
    }

    /// Add `other`'s counters into `self`.
    pub fn accumulate(&mut self, other: &CacheStats) {
        self.hits += other.hits;
        self.misses += other.misses;
        self.expired += other.expired;
        self.inserts += other.inserts;
        self.current_size += other.current_size;
    }
}
