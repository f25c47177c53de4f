//! Newswire Vector - Vector store abstraction
//!
//! Provides the article persistence and retrieval contract plus its
//! Qdrant implementation.

use async_trait::async_trait;
use newswire_core::{Document, RetrievedArticle, Result};
use serde::{Deserialize, Serialize};

/// Payload stored alongside each article vector
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArticlePayload {
    pub title: String,
    pub content: String,
    pub url: String,
    pub source: String,
    pub published_at: String,
    pub summary: String,
}

impl From<&Document> for ArticlePayload {
    fn from(doc: &Document) -> Self {
        Self {
            title: doc.title.clone(),
            content: doc.content.clone(),
            url: doc.url.clone(),
            source: doc.source.clone(),
            published_at: doc.published_at.to_rfc3339(),
            summary: doc.summary.clone(),
        }
    }
}

/// Trait for article vector store operations
#[async_trait]
pub trait ArticleStore: Send + Sync {
    /// Persist one article vector under its natural id
    async fn upsert(&self, natural_id: &str, vector: Vec<f32>, payload: ArticlePayload)
        -> Result<()>;

    /// Similarity search returning payloads with scores
    async fn search(&self, query_vector: &[f32], limit: usize) -> Result<Vec<RetrievedArticle>>;

    /// Fetch arbitrary stored articles, used when no query embedding is
    /// available
    async fn scroll(&self, limit: usize) -> Result<Vec<RetrievedArticle>>;
}

pub mod qdrant_store;

pub use qdrant_store::QdrantArticleStore;
