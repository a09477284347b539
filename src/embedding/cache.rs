//! Bounded LRU cache of generated embeddings.
//!
//! Keys identify the model, the language and the (case-insensitive) text, so
//! a cached vector is always bit-identical to what the generator would
//! produce again. Concurrent inserts for the same key are therefore harmless.

use std::num::NonZeroUsize;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use lru::LruCache;
use parking_lot::Mutex;

/// Capacity used when the configured value is zero.
const MIN_CAPACITY: NonZeroUsize = NonZeroUsize::MIN;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub model: String,
    pub language: String,
    pub text_hash: String,
}

impl CacheKey {
    pub fn new(model: &str, language: &str, text_hash: String) -> Self {
        Self {
            model: model.to_string(),
            language: language.to_string(),
            text_hash,
        }
    }
}

#[derive(Debug)]
pub struct EmbeddingCache {
    entries: Mutex<LruCache<CacheKey, Arc<[f32]>>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl EmbeddingCache {
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(MIN_CAPACITY);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Looks up `key`, marking it most recently used and counting the outcome.
    pub fn get(&self, key: &CacheKey) -> Option<Arc<[f32]>> {
        let found = self.entries.lock().get(key).cloned();
        let counter = if found.is_some() {
            &self.hits
        } else {
            &self.misses
        };
        counter.fetch_add(1, Ordering::Relaxed);
        found
    }

    pub fn insert(&self, key: CacheKey, embedding: Arc<[f32]>) {
        self.entries.lock().put(key, embedding);
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.entries.lock().cap().get()
    }

    /// Drops every entry; hit/miss counters are kept.
    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    /// Fraction of lookups served from the cache, `0.0` before any lookup.
    pub fn hit_rate(&self) -> f64 {
        let hits = self.hits();
        let total = hits + self.misses();
        if total == 0 {
            0.0
        } else {
            hits as f64 / total as f64
        }
    }

    /// Approximate heap footprint of the cached vectors and keys.
    pub fn memory_bytes(&self) -> usize {
        self.entries
            .lock()
            .iter()
            .map(|(key, vector)| {
                key.model.len()
                    + key.language.len()
                    + key.text_hash.len()
                    + vector.len() * std::mem::size_of::<f32>()
            })
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(text: &str) -> CacheKey {
        CacheKey::new("mayan", "yua", text.to_string())
    }

    #[test]
    fn test_hit_and_miss_counting() {
        let cache = EmbeddingCache::new(4);
        assert!(cache.get(&key("a")).is_none());
        cache.insert(key("a"), Arc::from(vec![1.0, 0.0]));
        assert_eq!(cache.get(&key("a")).as_deref(), Some(&[1.0, 0.0][..]));

        assert_eq!(cache.hits(), 1);
        assert_eq!(cache.misses(), 1);
        assert!((cache.hit_rate() - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_least_recently_used_is_evicted() {
        let cache = EmbeddingCache::new(2);
        cache.insert(key("a"), Arc::from(vec![1.0]));
        cache.insert(key("b"), Arc::from(vec![2.0]));
        // Touch "a" so "b" becomes the eviction candidate
        cache.get(&key("a"));
        cache.insert(key("c"), Arc::from(vec![3.0]));

        assert_eq!(cache.len(), 2);
        assert!(cache.get(&key("a")).is_some());
        assert!(cache.get(&key("b")).is_none());
        assert!(cache.get(&key("c")).is_some());
    }

    #[test]
    fn test_zero_capacity_is_clamped() {
        let cache = EmbeddingCache::new(0);
        assert_eq!(cache.capacity(), 1);
    }

    #[test]
    fn test_clear_keeps_counters() {
        let cache = EmbeddingCache::new(8);
        cache.insert(key("a"), Arc::from(vec![1.0, 2.0]));
        cache.get(&key("a"));
        assert!(cache.memory_bytes() > 0);

        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.hits(), 1);
        assert_eq!(cache.memory_bytes(), 0);
    }

    #[test]
    fn test_keys_differ_by_language() {
        let cache = EmbeddingCache::new(8);
        cache.insert(CacheKey::new("m", "yua", "h".into()), Arc::from(vec![1.0]));
        assert!(cache.get(&CacheKey::new("m", "quc", "h".into())).is_none());
    }
}
