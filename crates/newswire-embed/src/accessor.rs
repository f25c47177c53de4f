//! Cache-aside embedding accessor
//!
//! Single-text embedding for the chat query path. Reads through a TTL
//! cache, makes at most one short-timeout provider call on a miss, and
//! degrades to `None` on any failure so the caller can fall back to a
//! non-vector retrieval strategy. Deliberately less resilient than the
//! bulk path: this sits on a user-facing request/response cycle.

use crate::batch::{embed_with_retries, RetryPolicy};
use crate::cache::EmbeddingCache;
use crate::gateway::{EmbeddingProvider, JinaEmbedding};
use newswire_core::{EmbeddingConfig, NewswireError, Result};
use std::sync::Arc;
use std::time::Duration;

/// On-demand embedding accessor with a read-through cache
pub struct QueryEmbedder {
    provider: Option<Arc<dyn EmbeddingProvider>>,
    cache: EmbeddingCache,
    retry: RetryPolicy,
}

impl QueryEmbedder {
    /// Create a new accessor; `provider = None` means no credential is
    /// configured and every request resolves to `Ok(None)`
    pub fn new(
        provider: Option<Arc<dyn EmbeddingProvider>>,
        cache: EmbeddingCache,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            provider,
            cache,
            retry,
        }
    }

    /// Create from config
    pub fn from_config(config: &EmbeddingConfig) -> Self {
        let provider = JinaEmbedding::from_config(config)
            .ok()
            .map(|p| Arc::new(p) as Arc<dyn EmbeddingProvider>);

        Self::new(
            provider,
            EmbeddingCache::new(
                config.cache_capacity,
                Duration::from_secs(config.cache_ttl_secs),
            ),
            RetryPolicy::query(config),
        )
    }

    /// Embed one text for similarity search.
    ///
    /// `Ok(None)` means "proceed without semantic retrieval": no credential
    /// configured, or the provider call failed within its single attempt.
    /// Only an empty input is an error.
    pub async fn embed_one(&self, text: &str) -> Result<Option<Vec<f32>>> {
        if text.trim().is_empty() {
            return Err(NewswireError::InvalidInput(
                "text must be a non-empty string".to_string(),
            ));
        }

        let Some(provider) = &self.provider else {
            tracing::debug!("no embedding credential configured; skipping semantic retrieval");
            return Ok(None);
        };

        if let Some(cached) = self.cache.get(text).await {
            tracing::debug!("query embedding served from cache");
            return Ok(Some(cached));
        }

        let request = [text.to_string()];
        let vector = match embed_with_retries(provider.as_ref(), &request, &self.retry).await {
            Ok(Some(mut vectors)) if !vectors.is_empty() => vectors.swap_remove(0),
            Ok(_) => return Ok(None),
            Err(err) => {
                // Auth failures included: the query path never surfaces
                // provider errors, it degrades.
                tracing::warn!("query embedding failed: {err}");
                return Ok(None);
            }
        };

        // Best-effort write; a future identical query skips the provider.
        self.cache.put(text, vector.clone()).await;

        Ok(Some(vector))
    }

    /// Cache statistics for the query path
    pub fn cache_stats(&self) -> Arc<crate::cache::CacheStats> {
        self.cache.stats()
    }
}

// ============================================================================
// Tests
// ============================================================================
