pub mod entry;
pub use entry::CacheEntry;

pub mod key;
pub use key::fingerprint;

pub mod metrics;
pub use metrics::CacheMetrics;

pub mod stats;
pub use stats::CacheStats;

use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, atomic::Ordering};

use lru::LruCache;

use crate::error::ConfigError;

/// Fixed-capacity key/value store with least-recently-used eviction.
///
/// Cloning is cheap and yields a handle to the same store. A single mutex guards the
/// entries together with their recency order, so `len() <= capacity()` holds at every
/// point observable by another thread.
#[derive(Clone)]
pub struct BoundedCache {
    cache: Arc<Mutex<LruCache<String, CacheEntry>>>,
    metrics: Arc<CacheMetrics>,
}

impl BoundedCache {
    pub fn new(capacity: usize) -> Result<Self, ConfigError> {
        let capacity = NonZeroUsize::new(capacity).ok_or(ConfigError::InvalidCapacity(capacity))?;

        Ok(Self {
            cache: Arc::new(Mutex::new(LruCache::new(capacity))),
            metrics: Arc::new(CacheMetrics::default()),
        })
    }

    fn lock(&self) -> MutexGuard<'_, LruCache<String, CacheEntry>> {
        // Every mutation is a single LruCache call, so a poisoned lock still holds a valid map
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Look up `key`, refreshing its recency and access count on a hit.
    pub fn get(&self, key: &str) -> Option<String> {
        let mut cache = self.lock();

        if let Some(entry) = cache.get_mut(key) {
            entry.touch();
            self.metrics.record_hit();
            return Some(entry.value.clone());
        }

        self.metrics.record_miss();
        None
    }

    /// Read an entry without touching its recency.
    pub fn peek(&self, key: &str) -> Option<CacheEntry> {
        self.lock().peek(key).cloned()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.lock().contains(key)
    }

    /// Insert or overwrite `key`. A new key at capacity evicts exactly one entry first.
    pub fn set(&self, key: String, value: String) {
        let mut cache = self.lock();

        if cache.len() >= cache.cap().get() && !cache.contains(&key) {
            if let Some((evicted, _)) = cache.pop_lru() {
                self.metrics.record_evictions(1);
                tracing::trace!("Cache full, evicted least recently used entry {:?}", evicted);
            }
        }

        cache.put(key, CacheEntry::new(value));
    }

    /// Remove the least recently accessed entry.
    pub fn evict_one(&self) -> Option<(String, CacheEntry)> {
        let evicted = self.lock().pop_lru();

        if evicted.is_some() {
            self.metrics.record_evictions(1);
        }

        evicted
    }

    /// Evict least recently used entries until at most `target` remain. Returns how many
    /// entries were removed.
    pub fn shrink_to(&self, target: usize) -> usize {
        let mut cache = self.lock();
        let mut evicted = 0;

        while cache.len() > target {
            if cache.pop_lru().is_none() {
                break;
            }
            evicted += 1;
        }

        self.metrics.record_evictions(evicted);
        evicted
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.lock().cap().get()
    }

    pub fn clear(&self) {
        self.lock().clear();
        tracing::info!("Cache cleared");
    }

    pub fn stats(&self) -> CacheStats {
        let cache = self.lock();

        CacheStats {
            entries: cache.len(),
            capacity: cache.cap().get(),
            hit_rate: self.metrics.hit_rate(),
            hits: self.metrics.hits.load(Ordering::Relaxed),
            misses: self.metrics.misses.load(Ordering::Relaxed),
            evictions: self.metrics.evictions.load(Ordering::Relaxed),
        }
    }
}
