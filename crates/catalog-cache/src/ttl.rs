use crate::entry::{CacheEntry, CacheStats};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

/// Unbounded key/value map with per-entry TTL and lazy expiry.
///
/// Staleness is only checked on `get`. A stale entry is reported as a miss
/// but left in place; the next `insert` for the same key replaces it and
/// refreshes `stored_at`. Nothing is evicted proactively.
///
/// Methods take `&mut self` so lookups can update statistics. Thread safety
/// is handled by the sharded wrapper.
#[derive(Debug)]
pub struct TtlMap<V> {
    map: HashMap<String, CacheEntry<V>>,
    hits: u64,
    misses: u64,
    expired: u64,
    inserts: u64,
}

impl<V> TtlMap<V> {
    pub fn new() -> Self {
        Self {
            map: HashMap::new(),
            hits: 0,
            misses: 0,
            expired: 0,
            inserts: 0,
        }
    }

    /// Look up a key. Returns the value if present and still fresh at `now`.
    pub fn get(&mut self, key: &str, now: Instant) -> Option<Arc<V>> {
        match self.map.get(key) {
            Some(entry) if entry.is_fresh_at(now) => {
                self.hits += 1;
                Some(Arc::clone(&entry.value))
            }
            Some(_) => {
                self.misses += 1;
                self.expired += 1;
                None
            }
            None => {
                self.misses += 1;
                None
            }
        }
    }

    /// Insert or overwrite an entry.
    pub fn insert(&mut self, key: String, entry: CacheEntry<V>) {
        self.inserts += 1;
        self.map.insert(key, entry);
    }

    /// Remove a key explicitly.
    pub fn remove(&mut self, key: &str) -> bool {
        self.map.remove(key).is_some()
    }

    /// Number of stored entries, stale ones included.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits,
            misses: self.misses,
            expired: self.expired,
            inserts: self.inserts,
            current_size: self.map.len(),
        }
    }
}

impl<V> Default for TtlMap<V> {
    fn default() -> Self {
        Self::new()
    }
}
