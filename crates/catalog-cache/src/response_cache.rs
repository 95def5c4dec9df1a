use crate::clock::{Clock, SystemClock};
use crate::entry::{CacheEntry, CacheStats};
use crate::sharded::ShardedCache;
use std::sync::Arc;
use std::time::Duration;

/// Owned, injectable response cache.
///
/// Wraps the sharded store with a clock and a default TTL. Construct one per
/// process (or per test) and hand it to whatever needs it; there is no
/// global instance.
pub struct ResponseCache<V> {
    store: ShardedCache<V>,
    clock: Arc<dyn Clock>,
    default_ttl: Duration,
}

impl<V> ResponseCache<V> {
    pub fn new(default_ttl: Duration) -> Self {
        Self::with_clock(default_ttl, Arc::new(SystemClock))
    }

    pub fn with_clock(default_ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            store: ShardedCache::new(),
            clock,
            default_ttl,
        }
    }

    /// Fresh value for `key`, if any.
    pub fn get(&self, key: &str) -> Option<Arc<V>> {
        self.store.get(key, self.clock.now())
    }

    /// Store `value` under `key` with the default TTL.
    pub fn put(&self, key: impl Into<String>, value: V) {
        self.put_with_ttl(key, value, self.default_ttl);
    }

    /// Store `value` under `key`, overwriting any previous (possibly stale)
    /// entry.
    pub fn put_with_ttl(&self, key: impl Into<String>, value: V, ttl: Duration) {
        let entry = CacheEntry::new(value, self.clock.now(), ttl);
        self.store.insert(key.into(), entry);
    }

    /// Store an already shared value with the default TTL, so the caller can
    /// keep handing out the same `Arc`.
    pub fn put_shared(&self, key: impl Into<String>, value: Arc<V>) {
        let entry = CacheEntry::shared(value, self.clock.now(), self.default_ttl);
        self.store.insert(key.into(), entry);
    }

    pub fn remove(&self, key: &str) -> bool {
        self.store.remove(key)
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        self.store.stats()
    }
}
