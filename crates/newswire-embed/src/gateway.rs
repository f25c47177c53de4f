//! Embedding provider gateway
//!
//! Thin client around the provider's batched embedding call. Responses are
//! decoded into typed shapes right here at the boundary, and failures are
//! classified into the authorization (fatal) and transient (retryable)
//! error classes the retry layer acts on.

use async_trait::async_trait;
use newswire_core::{EmbeddingConfig, NewswireError, Result};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

// ============================================================================
// Provider Trait
// ============================================================================

/// Trait for batched embedding generation
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Convert a batch of texts into vectors, one per input, in input order.
    ///
    /// Fails with [`NewswireError::ProviderAuth`] when the provider rejects
    /// the caller's credentials and [`NewswireError::Provider`] for
    /// everything else (timeouts, malformed responses, server errors).
    async fn embed(&self, texts: &[String], timeout: Duration) -> Result<Vec<Vec<f32>>>;

    /// Vector dimensionality produced by this provider
    fn dimension(&self) -> usize;
}

// ============================================================================
// Jina Embedding Client
// ============================================================================

/// Jina embeddings API client
pub struct JinaEmbedding {
    client: Client,
    api_url: String,
    api_key: String,
    model: String,
    dimension: usize,
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest {
    model: String,
    input: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    index: usize,
}

impl JinaEmbedding {
    /// Create a new client
    pub fn new(
        api_key: impl Into<String>,
        model: impl Into<String>,
        api_url: impl Into<String>,
        dimension: usize,
    ) -> Self {
        Self {
            client: Client::new(),
            api_url: api_url.into(),
            api_key: api_key.into(),
            model: model.into(),
            dimension,
        }
    }

    /// Create from config; requires an API key
    pub fn from_config(config: &EmbeddingConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .as_ref()
            .ok_or_else(|| NewswireError::Config("embedding API key required".to_string()))?;

        Ok(Self::new(
            api_key.clone(),
            config.model.clone(),
            config.api_url.clone(),
            config.dimension,
        ))
    }
}

#[async_trait]
impl EmbeddingProvider for JinaEmbedding {
    async fn embed(&self, texts: &[String], timeout: Duration) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let request = EmbeddingRequest {
            model: self.model.clone(),
            input: texts.to_vec(),
        };

        let response = self
            .client
            .post(&self.api_url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .timeout(timeout)
            .json(&request)
            .send()
            .await
            .map_err(|e| NewswireError::Provider(format!("embedding request failed: {e}")))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            let error_text = response.text().await.unwrap_or_default();
            return Err(NewswireError::ProviderAuth(format!(
                "{status}: {error_text}"
            )));
        }
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(NewswireError::Provider(format!("{status}: {error_text}")));
        }

        let result: EmbeddingResponse = response.json().await.map_err(|e| {
            NewswireError::Provider(format!("failed to parse embedding response: {e}"))
        })?;

        // The provider is not guaranteed to echo items in request order
        let mut data = result.data;
        data.sort_by_key(|d| d.index);

        Ok(data.into_iter().map(|d| d.embedding).collect())
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

// ============================================================================
// Tests
// ============================================================================
