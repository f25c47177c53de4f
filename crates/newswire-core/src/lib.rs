//! Newswire Core - Domain models, errors, and shared traits
//!
//! This crate defines the abstractions used throughout the Newswire system:
//! - Feed source descriptors and harvested documents
//! - Retrieved article and chat answer shapes
//! - Common error types with retryability classification
//! - The LLM client trait
//! - Configuration management

pub mod config;

pub use config::{
    AppConfig, ConfigError, DatabaseConfig, EmbeddingConfig, HarvestConfig, IngestConfig,
    LlmConfig, LoggingConfig,
};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Core error types for Newswire operations
#[derive(Error, Debug)]
pub enum NewswireError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("embedding provider rejected credentials: {0}")]
    ProviderAuth(String),

    #[error("embedding provider error: {0}")]
    Provider(String),

    #[error("feed error: {0}")]
    Feed(String),

    #[error("vector store error: {0}")]
    Database(String),

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl NewswireError {
    /// Whether a failed call may be retried.
    ///
    /// Only transient provider failures (timeouts, malformed responses,
    /// 5xx-class errors) qualify. Authorization rejections and input errors
    /// never do.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Provider(_))
    }
}

pub type Result<T> = std::result::Result<T, NewswireError>;

// ============================================================================
// Feed Sources
// ============================================================================

/// A configured syndication source to harvest from
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedSource {
    /// Display name (e.g., "BBC")
    pub name: String,

    /// Feed URL (RSS or Atom)
    pub feed_url: String,
}

impl FeedSource {
    /// Create a new feed source descriptor
    pub fn new(name: impl Into<String>, feed_url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            feed_url: feed_url.into(),
        }
    }
}

// ============================================================================
// Documents
// ============================================================================

/// One harvested article, ready for embedding
///
/// Created by the harvester from a feed entry plus the fetched page text.
/// Immutable once created; consumed exactly once per ingestion run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Natural id: `<source-lowercase>_<epoch-millis>_<entry-index>`
    pub id: String,

    /// Cleaned article title
    pub title: String,

    /// Cleaned body text, bounded in length by the harvester
    pub content: String,

    /// Link to the original article page
    pub url: String,

    /// Source display name
    pub source: String,

    /// Publication timestamp from the feed entry
    pub published_at: DateTime<Utc>,

    /// Short snippet from the feed entry
    pub summary: String,
}

impl Document {
    /// Compose the text submitted to the embedding provider for this document
    pub fn embedding_text(&self) -> String {
        format!("{}\n\n{}\n\nSource: {}", self.title, self.content, self.source)
    }
}

// ============================================================================
// Retrieval and Chat Types
// ============================================================================

/// An article returned from the vector store
///
/// `score` is present for similarity search results and absent for
/// scroll-based (no-embedding) retrieval.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievedArticle {
    pub title: String,
    pub content: String,
    pub url: String,
    pub source: String,
    pub published_at: String,
    pub summary: String,
    pub score: Option<f32>,
}

/// Role of a chat turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

/// One turn of conversation history, supplied by the caller
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    /// Create a user turn
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    /// Create an assistant turn
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// Citation-ready reference to a retrieved article
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceRef {
    pub title: String,
    pub url: String,
    pub source: String,
    pub relevance_score: Option<f32>,
}

impl From<&RetrievedArticle> for SourceRef {
    fn from(article: &RetrievedArticle) -> Self {
        Self {
            title: article.title.clone(),
            url: article.url.clone(),
            source: article.source.clone(),
            relevance_score: article.score,
        }
    }
}

/// A generated answer plus the articles it drew from
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatAnswer {
    pub answer: String,
    pub sources: Vec<SourceRef>,
}

// ============================================================================
// Traits
// ============================================================================

/// Trait for answer-generation clients
#[async_trait::async_trait]
pub trait LlmClient: Send + Sync {
    /// Generate a response for the given conversation
    async fn generate(&self, messages: &[ChatMessage]) -> Result<String>;
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_document() -> Document {
        Document {
            id: "bbc_1700000000000_0".to_string(),
            title: "Markets rally".to_string(),
            content: "Stocks rose sharply across Europe on Tuesday.".to_string(),
            url: "https://example.com/markets".to_string(),
            source: "BBC".to_string(),
            published_at: Utc::now(),
            summary: "Stocks rose.".to_string(),
        }
    }

    #[test]
    fn test_embedding_text_composition() {
        let doc = sample_document();
        let text = doc.embedding_text();

        assert!(text.starts_with("Markets rally\n\n"));
        assert!(text.contains("Stocks rose sharply"));
        assert!(text.ends_with("Source: BBC"));
    }

    #[test]
    fn test_error_retryability() {
        assert!(NewswireError::Provider("timeout".to_string()).is_retryable());

        assert!(!NewswireError::ProviderAuth("401".to_string()).is_retryable());
        assert!(!NewswireError::InvalidInput("empty".to_string()).is_retryable());
        assert!(!NewswireError::Database("down".to_string()).is_retryable());
    }

    #[test]
    fn test_source_ref_from_article() {
        let article = RetrievedArticle {
            title: "Title".to_string(),
            content: "Body".to_string(),
            url: "https://example.com/a".to_string(),
            source: "CNN".to_string(),
            published_at: "2026-01-01T00:00:00Z".to_string(),
            summary: "s".to_string(),
            score: Some(0.87),
        };

        let source = SourceRef::from(&article);
        assert_eq!(source.title, "Title");
        assert_eq!(source.relevance_score, Some(0.87));
    }
}
