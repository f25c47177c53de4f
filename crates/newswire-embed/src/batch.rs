//! Batched embedding client
//!
//! Drives bulk embedding against the provider gateway: texts are split into
//! fixed-size batches, each batch goes through a retry loop with exponential
//! backoff and jitter, and the output stays positionally aligned with the
//! input even when whole batches fail. Batches are strictly sequential, with
//! a fixed pause between them to stay under the provider's rate limit.

use crate::gateway::EmbeddingProvider;
use newswire_core::{EmbeddingConfig, Result};
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;

// ============================================================================
// Policies
// ============================================================================

/// Retry behavior for a single gateway call
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Attempts before the call is given up
    pub max_attempts: u32,

    /// Per-request timeout
    pub request_timeout: Duration,

    /// Base for the exponential backoff between attempts
    pub backoff_base: Duration,

    /// Upper bound of the uniform jitter added to each backoff
    pub backoff_jitter: Duration,
}

impl RetryPolicy {
    /// Bulk-path retry policy from config
    pub fn bulk(config: &EmbeddingConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            request_timeout: Duration::from_millis(config.request_timeout_ms),
            backoff_base: Duration::from_millis(config.backoff_base_ms),
            backoff_jitter: Duration::from_millis(config.backoff_jitter_ms),
        }
    }

    /// Query-path retry policy from config: one short attempt, so a
    /// user-facing request never accumulates backoff delays
    pub fn query(config: &EmbeddingConfig) -> Self {
        Self {
            max_attempts: 1,
            request_timeout: Duration::from_millis(config.query_timeout_ms),
            backoff_base: Duration::from_millis(config.backoff_base_ms),
            backoff_jitter: Duration::from_millis(config.backoff_jitter_ms),
        }
    }
}

/// Batching and pacing for the bulk path
#[derive(Debug, Clone)]
pub struct BatchPolicy {
    /// Texts per gateway call
    pub batch_size: usize,

    /// Fixed pause after every batch, success or failure
    pub inter_batch_delay: Duration,

    /// Retry behavior per batch
    pub retry: RetryPolicy,
}

impl BatchPolicy {
    /// Bulk-path policy from config
    pub fn from_config(config: &EmbeddingConfig) -> Self {
        Self {
            batch_size: config.batch_size,
            inter_batch_delay: Duration::from_millis(config.inter_batch_delay_ms),
            retry: RetryPolicy::bulk(config),
        }
    }
}

// ============================================================================
// Retry Loop
// ============================================================================

/// Drive one gateway call through the attempt loop.
///
/// Returns `Ok(Some(vectors))` on success, `Ok(None)` once every attempt has
/// failed with a transient error, and `Err` immediately (before any backoff
/// sleep) on a non-retryable failure such as an authorization rejection.
pub async fn embed_with_retries(
    provider: &dyn EmbeddingProvider,
    texts: &[String],
    policy: &RetryPolicy,
) -> Result<Option<Vec<Vec<f32>>>> {
    let mut attempt = 0;

    while attempt < policy.max_attempts {
        attempt += 1;
        tracing::debug!(attempt, batch_len = texts.len(), "embedding provider call");

        match provider.embed(texts, policy.request_timeout).await {
            Ok(vectors) if vectors.len() == texts.len() => return Ok(Some(vectors)),
            Ok(vectors) => {
                // A misaligned batch carries no usable per-item outcome;
                // treat it like any other transient failure.
                tracing::warn!(
                    expected = texts.len(),
                    got = vectors.len(),
                    "provider returned a misaligned batch"
                );
            }
            Err(err) if !err.is_retryable() => {
                tracing::error!("non-retryable provider failure: {err}");
                return Err(err);
            }
            Err(err) => {
                tracing::warn!(attempt, "provider attempt failed: {err}");
            }
        }

        if attempt >= policy.max_attempts {
            break;
        }

        let backoff = backoff_delay(policy, attempt);
        tracing::debug!(?backoff, "retrying after backoff");
        tokio::time::sleep(backoff).await;
    }

    tracing::warn!(
        attempts = policy.max_attempts,
        batch_len = texts.len(),
        "provider call exhausted all attempts"
    );
    Ok(None)
}

/// Exponential backoff after the given (1-based) failed attempt: the base
/// doubled per attempt, plus uniform jitter to avoid synchronized retries
fn backoff_delay(policy: &RetryPolicy, attempt: u32) -> Duration {
    let exponential = policy.backoff_base * 2u32.saturating_pow(attempt);
    let jitter_ms = policy.backoff_jitter.as_millis() as u64;
    let jitter = if jitter_ms > 0 {
        Duration::from_millis(rand::rng().random_range(0..jitter_ms))
    } else {
        Duration::ZERO
    };
    exponential + jitter
}

// ============================================================================
// Batched Embedder
// ============================================================================

/// Bulk embedding client used by the ingestion path
pub struct BatchedEmbedder {
    provider: Arc<dyn EmbeddingProvider>,
    policy: BatchPolicy,
}

impl BatchedEmbedder {
    /// Create a new batched embedder
    pub fn new(provider: Arc<dyn EmbeddingProvider>, policy: BatchPolicy) -> Self {
        Self { provider, policy }
    }

    /// Embed every text, preserving positional alignment.
    ///
    /// The output always has exactly one element per input text: a vector on
    /// success, `None` for every text of a batch that exhausted its retries.
    /// Failure is batch-granular because a rejected provider call carries no
    /// per-item outcome. Only a non-retryable provider failure propagates as
    /// an error.
    pub async fn embed_all(&self, texts: &[String]) -> Result<Vec<Option<Vec<f32>>>> {
        let batch_size = self.policy.batch_size.max(1);
        let total_batches = texts.len().div_ceil(batch_size);
        let mut embeddings = Vec::with_capacity(texts.len());

        for (batch_index, batch) in texts.chunks(batch_size).enumerate() {
            tracing::info!(
                batch = batch_index + 1,
                total_batches,
                items = batch.len(),
                "generating embeddings"
            );

            match embed_with_retries(self.provider.as_ref(), batch, &self.policy.retry).await? {
                Some(vectors) => embeddings.extend(vectors.into_iter().map(Some)),
                None => {
                    tracing::warn!(
                        items = batch.len(),
                        "batch failed after retries; items will be skipped"
                    );
                    embeddings.extend(std::iter::repeat_with(|| None).take(batch.len()));
                }
            }

            // Stay under the provider's rate limit before the next batch.
            tokio::time::sleep(self.policy.inter_batch_delay).await;
        }

        Ok(embeddings)
    }
}

// ============================================================================
// Tests
// ============================================================================
