//! Query-path embedding cache
//!
//! TTL cache for on-demand embeddings so repeated queries for identical
//! text skip the provider entirely. Built on the moka crate for
//! thread-safe, async-compatible caching; entries leave only by expiry.

use moka::future::Cache;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Cache for query embeddings, keyed by a hash of the text content
#[derive(Clone)]
pub struct EmbeddingCache {
    cache: Cache<u64, Vec<f32>>,
    stats: Arc<CacheStats>,
}

impl EmbeddingCache {
    /// Create a cache holding up to `capacity` vectors for `ttl` each
    pub fn new(capacity: u64, ttl: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(capacity)
            .time_to_live(ttl)
            .build();

        Self {
            cache,
            stats: Arc::new(CacheStats::default()),
        }
    }

    /// Get the cached embedding for a text, if present and unexpired
    pub async fn get(&self, text: &str) -> Option<Vec<f32>> {
        let result = self.cache.get(&cache_key(text)).await;

        if result.is_some() {
            self.stats.hits.fetch_add(1, Ordering::Relaxed);
        } else {
            self.stats.misses.fetch_add(1, Ordering::Relaxed);
        }

        result
    }

    /// Store an embedding for a text
    pub async fn put(&self, text: &str, embedding: Vec<f32>) {
        self.cache.insert(cache_key(text), embedding).await;
        self.stats.writes.fetch_add(1, Ordering::Relaxed);
    }

    /// Current number of cached entries
    pub fn entry_count(&self) -> u64 {
        self.cache.entry_count()
    }

    /// Cache statistics
    pub fn stats(&self) -> Arc<CacheStats> {
        Arc::clone(&self.stats)
    }
}

/// Hit/miss/write counters for cache monitoring
#[derive(Debug, Default)]
pub struct CacheStats {
    hits: AtomicU64,
    misses: AtomicU64,
    writes: AtomicU64,
}

impl CacheStats {
    /// Total cache hits
    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    /// Total cache misses
    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    /// Total cache writes
    pub fn writes(&self) -> u64 {
        self.writes.load(Ordering::Relaxed)
    }

    /// Hit rate in 0.0 - 1.0
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits() + self.misses();
        if total == 0 {
            0.0
        } else {
            self.hits() as f64 / total as f64
        }
    }
}

/// Deterministic 64-bit key from the normalized text content
fn cache_key(text: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    text.trim().hash(&mut hasher);
    hasher.finish()
}

// ============================================================================
// Tests
// ============================================================================
