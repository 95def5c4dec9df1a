use crate::entry::{CacheEntry, CacheStats};
use crate::ttl::TtlMap;
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Instant;

/// Number of shards. Must be a power of two for fast modulo via bitmask.
const NUM_SHARDS: usize = 64;
const SHARD_MASK: u64 = (NUM_SHARDS as u64) - 1;

/// Thread-safe sharded wrapper around [`TtlMap`].
///
/// Keys are spread over 64 independent shards, each behind its own `RwLock`,
/// so concurrent handlers only contend when their keys land in the same
/// shard. Lookups take the write lock because they update hit/miss counters.
///
/// Shard selection uses `ahash` with fixed seeds so a key always maps to the
/// same shard for the lifetime of the process.
pub struct ShardedCache<V> {
    shards: Box<[RwLock<TtlMap<V>>]>,
}

impl<V> ShardedCache<V> {
    pub fn new() -> Self {
        let shards: Vec<RwLock<TtlMap<V>>> =
            (0..NUM_SHARDS).map(|_| RwLock::new(TtlMap::new())).collect();
        Self {
            shards: shards.into_boxed_slice(),
        }
    }

    #[inline]
    fn shard(&self, key: &str) -> &RwLock<TtlMap<V>> {
        let hash = ahash::RandomState::with_seeds(1, 2, 3, 4).hash_one(key);
        &self.shards[(hash & SHARD_MASK) as usize]
    }

    pub fn get(&self, key: &str, now: Instant) -> Option<Arc<V>> {
        self.shard(key).write().get(key, now)
    }

    pub fn insert(&self, key: String, entry: CacheEntry<V>) {
        self.shard(&key).write().insert(key, entry);
    }

    pub fn remove(&self, key: &str) -> bool {
        self.shard(key).write().remove(key)
    }

    /// Total number of entries across all shards, stale ones included.
    pub fn len(&self) -> usize {
        self.shards.iter().map(|s| s.read().len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.shards.iter().all(|s| s.read().is_empty())
    }

    /// Aggregate statistics across all shards.
    pub fn stats(&self) -> CacheStats {
        let mut total = CacheStats::default();
        for shard in self.shards.iter() {
            total.accumulate(&shard.read().stats());
        }
        total
    }
}

impl<V> Default for ShardedCache<V> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn entry(value: u32, at: Instant) -> CacheEntry<u32> {
        CacheEntry::new(value, at, Duration::from_secs(60))
    }

    #[test]
    fn sharded_basic() {
        let now = Instant::now();
        let cache = ShardedCache::new();

        cache.insert("hello".into(), entry(1, now));
        assert_eq!(cache.get("hello", now).as_deref(), Some(&1));
        assert!(cache.get("missing", now).is_none());
    }

    #[test]
    fn page_keys_spread_over_shards() {
        let now = Instant::now();
        let cache = ShardedCache::new();

        for offset in (0..1000).step_by(5) {
            let key = format!("GET:/products?limit=5&skip={offset}&sortBy=price&order=asc");
            cache.insert(key, entry(offset, now));
        }
        assert_eq!(cache.len(), 200);

        let used = cache.shards.iter().filter(|s| !s.read().is_empty()).count();
        assert!(used > NUM_SHARDS / 4, "only {used} shards in use");
    }

    #[test]
    fn remove_works() {
        let now = Instant::now();
        let cache = ShardedCache::new();

        cache.insert("a".into(), entry(1, now));
        assert!(cache.remove("a"));
        assert!(cache.get("a", now).is_none());
        assert!(!cache.remove("a"));
        assert!(cache.is_empty());
    }

    #[test]
    fn stats_aggregate() {
        let now = Instant::now();
        let cache = ShardedCache::new();

        cache.insert("a".into(), entry(1, now));
        cache.insert("b".into(), entry(2, now));
        cache.get("a", now); // hit
        cache.get("z", now); // miss
        cache.get("b", now + Duration::from_secs(90)); // stale

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 2);
        assert_eq!(stats.expired, 1);
        assert_eq!(stats.inserts, 2);
        assert_eq!(stats.current_size, 2);
    }

    #[test]
    fn readers_and_writers_share_the_store() {
        use std::thread;

        let start = Instant::now();
        let cache = Arc::new(ShardedCache::new());

        let workers: Vec<_> = (0..4u32)
            .map(|worker| {
                let cache = Arc::clone(&cache);
                thread::spawn(move || {
                    for n in 0..500u32 {
                        let key = format!("GET:/products/{}", n % 50);
                        if n % 10 == worker {
                            cache.insert(key, entry(n, start));
                        } else {
                            cache.get(&key, start + Duration::from_secs(u64::from(n % 120)));
                        }
                    }
                })
            })
            .collect();
        for worker in workers {
            worker.join().unwrap();
        }

        assert!(cache.len() <= 50);
        let stats = cache.stats();
        assert_eq!(stats.hits + stats.misses, 4 * 500 - stats.inserts);
        assert!(stats.expired <= stats.misses);
    }

    #[test]
    fn is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ShardedCache<String>>();
    }
}
