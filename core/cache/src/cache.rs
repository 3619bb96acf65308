//! Bounded in-memory cache of decrypted file buffers.
//!
//! The serving layer decrypts vault files in memory; this cache keeps the
//! most recently viewed buffers around so re-displaying a file does not
//! pay the derivation and decryption cost again. Capacity is bounded by
//! LRU eviction and entries age out after a TTL, but expiry is enforced
//! only by the explicit [`DecryptionCache::clean_expired`] sweep.

use bytes::Bytes;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::debug;

use crate::lru::RecencyList;
use foliovault_crypto::ENCRYPTED_SUFFIX;

/// Default maximum number of cached buffers.
pub const DEFAULT_CAPACITY: usize = 150;

/// Default time-to-live for a cached buffer.
pub const DEFAULT_TTL: Duration = Duration::from_secs(30 * 60);

/// Configuration for the decryption cache.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Maximum number of entries before LRU eviction.
    pub capacity: usize,
    /// Age at which an entry becomes eligible for the expiry sweep.
    pub ttl: Duration,
}

impl CacheConfig {
    /// Set the entry capacity.
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Set the time-to-live.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            ttl: DEFAULT_TTL,
        }
    }
}

/// Point-in-time cache counters.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheStats {
    pub size: usize,
    pub capacity: usize,
    pub hits: u64,
    pub misses: u64,
    /// Hits over total lookups; 0.0 before any lookup.
    pub hit_rate: f64,
}

struct CacheInner {
    config: CacheConfig,
    map: HashMap<String, usize>,
    list: RecencyList,
    hits: u64,
    misses: u64,
}

/// Thread-safe LRU+TTL cache of decrypted buffers, keyed by canonical
/// file identity.
///
/// The encrypted and plaintext forms of one logical file share a single
/// entry: keys are slash-normalized, lowercased, and stripped of exactly
/// one trailing encrypted suffix.
pub struct DecryptionCache {
    inner: Mutex<CacheInner>,
}

impl DecryptionCache {
    /// Create a cache with the given bounds.
    pub fn new(config: CacheConfig) -> Self {
        Self {
            inner: Mutex::new(CacheInner {
                config,
                map: HashMap::new(),
                list: RecencyList::new(),
                hits: 0,
                misses: 0,
            }),
        }
    }

    /// Look up the buffer for `path`, promoting it to most recently used.
    ///
    /// An entry past its TTL but not yet swept is still returned.
    pub fn get(&self, path: &Path) -> Option<Bytes> {
        let key = canonical_key(path);
        let mut inner = self.inner.lock();

        let idx = inner.map.get(&key).copied();
        let data = match idx {
            Some(idx) => {
                inner.list.move_to_front(idx);
                inner.list.get(idx).map(|entry| entry.data.clone())
            }
            None => None,
        };

        match data {
            Some(data) => {
                inner.hits += 1;
                Some(data)
            }
            None => {
                inner.misses += 1;
                None
            }
        }
    }

    /// Insert or refresh the buffer for `path` at the most-recent end.
    ///
    /// Re-inserting an existing key replaces its content and restarts its
    /// TTL without creating a duplicate entry. When the cache is full the
    /// least recently used entry is evicted first.
    pub fn put(&self, path: &Path, data: Bytes) {
        let key = canonical_key(path);
        let mut inner = self.inner.lock();

        if inner.config.capacity == 0 {
            return;
        }

        if let Some(idx) = inner.map.get(&key).copied() {
            if let Some(entry) = inner.list.get_mut(idx) {
                entry.data = data;
                entry.inserted_at = Instant::now();
            }
            inner.list.move_to_front(idx);
            return;
        }

        while inner.map.len() >= inner.config.capacity {
            let Some(tail) = inner.list.tail_index() else {
                break;
            };
            let Some(evicted) = inner.list.remove(tail) else {
                break;
            };
            inner.map.remove(&evicted.key);
            debug!(key = %evicted.key, "evicted least recently used buffer");
        }

        let idx = inner.list.push_front(key.clone(), data, Instant::now());
        inner.map.insert(key, idx);
    }

    /// Drop the entry for `path`, under whichever path form it was cached.
    pub fn invalidate(&self, path: &Path) {
        let key = canonical_key(path);
        let mut inner = self.inner.lock();
        if let Some(idx) = inner.map.remove(&key) {
            inner.list.remove(idx);
        }
    }

    /// Remove every entry at or past its TTL, returning how many were
    /// removed. Expiry happens only here; no background timer runs.
    pub fn clean_expired(&self) -> usize {
        let mut inner = self.inner.lock();
        let ttl = inner.config.ttl;
        let now = Instant::now();

        let expired: Vec<(usize, String)> = inner
            .list
            .iter()
            .filter(|(_, entry)| now.duration_since(entry.inserted_at) >= ttl)
            .map(|(idx, entry)| (idx, entry.key.clone()))
            .collect();

        for (idx, key) in &expired {
            inner.map.remove(key);
            inner.list.remove(*idx);
        }

        if !expired.is_empty() {
            debug!(count = expired.len(), "swept expired buffers");
        }
        expired.len()
    }

    /// Empty the cache and reset the hit/miss counters.
    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.map.clear();
        inner.list.clear();
        inner.hits = 0;
        inner.misses = 0;
    }

    /// Snapshot of size and lookup counters.
    pub fn stats(&self) -> CacheStats {
        let inner = self.inner.lock();
        let total = inner.hits + inner.misses;
        let hit_rate = if total == 0 {
            0.0
        } else {
            inner.hits as f64 / total as f64
        };
        CacheStats {
            size: inner.map.len(),
            capacity: inner.config.capacity,
            hits: inner.hits,
            misses: inner.misses,
            hit_rate,
        }
    }
}

impl Default for DecryptionCache {
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}

/// Canonical cache identity of a path: separators normalized to `/`, the
/// whole path lowercased, and exactly one trailing encrypted suffix
/// stripped. `A\b\scan.JPG.enc` and `a/b/scan.jpg` share one entry.
fn canonical_key(path: &Path) -> String {
    let mut key = path.to_string_lossy().replace('\\', "/").to_lowercase();
    if key.ends_with(ENCRYPTED_SUFFIX) {
        key.truncate(key.len() - ENCRYPTED_SUFFIX.len());
    }
    key
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn small_cache(capacity: usize) -> DecryptionCache {
        DecryptionCache::new(CacheConfig::default().with_capacity(capacity))
    }

    fn buf(s: &str) -> Bytes {
        Bytes::copy_from_slice(s.as_bytes())
    }

    #[test]
    fn test_get_returns_inserted_buffer() {
        let cache = DecryptionCache::default();
        cache.put(Path::new("portfolios/ana/scan.jpg"), buf("bytes"));

        assert_eq!(cache.get(Path::new("portfolios/ana/scan.jpg")), Some(buf("bytes")));
        assert_eq!(cache.get(Path::new("portfolios/ana/other.jpg")), None);
    }

    #[test]
    fn test_suffixed_and_plain_paths_share_one_entry() {
        let cache = DecryptionCache::default();
        cache.put(Path::new("portfolios/ana/scan.jpg.enc"), buf("bytes"));

        assert_eq!(cache.get(Path::new("portfolios/ana/scan.jpg")), Some(buf("bytes")));
        assert_eq!(cache.stats().size, 1);

        // Refresh through the other form does not duplicate
        cache.put(Path::new("portfolios/ana/scan.jpg"), buf("newer"));
        assert_eq!(cache.stats().size, 1);
        assert_eq!(cache.get(Path::new("portfolios/ana/scan.jpg.enc")), Some(buf("newer")));
    }

    #[test]
    fn test_backslash_and_case_forms_share_one_entry() {
        let cache = DecryptionCache::default();
        cache.put(Path::new(r"Portfolios\Ana\Scan.JPG"), buf("bytes"));

        assert_eq!(cache.get(Path::new("portfolios/ana/scan.jpg")), Some(buf("bytes")));
        assert_eq!(cache.stats().size, 1);
    }

    #[test]
    fn test_capacity_overflow_evicts_least_recently_used() {
        let cache = small_cache(3);
        cache.put(Path::new("a"), buf("a"));
        cache.put(Path::new("b"), buf("b"));
        cache.put(Path::new("c"), buf("c"));
        cache.put(Path::new("d"), buf("d"));

        assert_eq!(cache.get(Path::new("a")), None);
        assert!(cache.get(Path::new("b")).is_some());
        assert!(cache.get(Path::new("c")).is_some());
        assert!(cache.get(Path::new("d")).is_some());
        assert_eq!(cache.stats().size, 3);
    }

    #[test]
    fn test_get_promotes_entry_over_eviction() {
        let cache = small_cache(3);
        cache.put(Path::new("a"), buf("a"));
        cache.put(Path::new("b"), buf("b"));
        cache.put(Path::new("c"), buf("c"));

        // Touch the oldest so "b" becomes the eviction candidate
        assert!(cache.get(Path::new("a")).is_some());
        cache.put(Path::new("d"), buf("d"));

        assert!(cache.get(Path::new("a")).is_some());
        assert_eq!(cache.get(Path::new("b")), None);
    }

    #[test]
    fn test_invalidate_removes_under_any_form() {
        let cache = DecryptionCache::default();
        cache.put(Path::new("portfolios/ana/scan.jpg.enc"), buf("bytes"));

        cache.invalidate(Path::new("portfolios/ana/scan.jpg"));

        assert_eq!(cache.get(Path::new("portfolios/ana/scan.jpg.enc")), None);
        assert_eq!(cache.stats().size, 0);
    }

    #[test]
    fn test_clean_expired_before_ttl_removes_nothing() {
        let cache = DecryptionCache::new(CacheConfig::default());
        cache.put(Path::new("a"), buf("a"));
        cache.put(Path::new("b"), buf("b"));

        assert_eq!(cache.clean_expired(), 0);
        assert_eq!(cache.stats().size, 2);
    }

    #[test]
    fn test_clean_expired_after_ttl_removes_all() {
        let cache = DecryptionCache::new(CacheConfig::default().with_ttl(Duration::ZERO));
        cache.put(Path::new("a"), buf("a"));
        cache.put(Path::new("b"), buf("b"));

        assert_eq!(cache.clean_expired(), 2);
        assert_eq!(cache.stats().size, 0);
    }

    #[test]
    fn test_expired_entry_still_served_until_swept() {
        let cache = DecryptionCache::new(CacheConfig::default().with_ttl(Duration::ZERO));
        cache.put(Path::new("a"), buf("a"));

        // No sweep has run, so the stale entry is still a hit
        assert_eq!(cache.get(Path::new("a")), Some(buf("a")));

        cache.clean_expired();
        assert_eq!(cache.get(Path::new("a")), None);
    }

    #[test]
    fn test_put_refreshes_ttl_in_place() {
        let cache = DecryptionCache::new(CacheConfig::default().with_ttl(Duration::from_millis(40)));
        cache.put(Path::new("a"), buf("old"));

        std::thread::sleep(Duration::from_millis(55));
        cache.put(Path::new("a"), buf("new"));

        assert_eq!(cache.clean_expired(), 0);
        assert_eq!(cache.get(Path::new("a")), Some(buf("new")));
    }

    #[test]
    fn test_stats_track_hits_and_misses() {
        let cache = DecryptionCache::default();
        cache.put(Path::new("a"), buf("a"));

        cache.get(Path::new("a"));
        cache.get(Path::new("a"));
        cache.get(Path::new("missing"));

        let stats = cache.stats();
        assert_eq!(stats.hits, 2);
        assert_eq!(stats.misses, 1);
        assert!((stats.hit_rate - 2.0 / 3.0).abs() < 1e-9);
        assert_eq!(stats.capacity, DEFAULT_CAPACITY);
    }

    #[test]
    fn test_clear_resets_entries_and_counters() {
        let cache = DecryptionCache::default();
        cache.put(Path::new("a"), buf("a"));
        cache.get(Path::new("a"));
        cache.get(Path::new("missing"));

        cache.clear();

        let stats = cache.stats();
        assert_eq!(stats.size, 0);
        assert_eq!(stats.hits, 0);
        assert_eq!(stats.misses, 0);
        assert_eq!(stats.hit_rate, 0.0);
    }

    #[test]
    fn test_zero_capacity_caches_nothing() {
        let cache = small_cache(0);
        cache.put(Path::new("a"), buf("a"));

        assert_eq!(cache.get(Path::new("a")), None);
        assert_eq!(cache.stats().size, 0);
    }

    proptest! {
        #[test]
        fn canonical_key_normalizes_separators_and_case(raw in r"[A-Za-z0-9_./\\-]{1,40}") {
            let key = canonical_key(Path::new(&raw));
            prop_assert!(!key.contains('\\'));
            prop_assert_eq!(key.clone(), key.to_lowercase());
        }

        #[test]
        fn suffix_never_survives_canonicalization(raw in r"[a-z0-9_/-]{1,30}") {
            let suffixed = format!("{}{}", raw, ENCRYPTED_SUFFIX);
            prop_assert_eq!(canonical_key(Path::new(&suffixed)), canonical_key(Path::new(&raw)));
        }
    }
}
