//! Newswire Configuration Management
//!
//! Handles configuration from environment variables and TOML config files
//! with sensible defaults for development.

use crate::FeedSource;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Feed sources to harvest
    pub sources: Vec<FeedSource>,

    /// Harvester behavior
    pub harvest: HarvestConfig,

    /// Embedding provider and batching behavior
    pub embedding: EmbeddingConfig,

    /// Vector store connection
    pub database: DatabaseConfig,

    /// Answer-generation LLM
    pub llm: LlmConfig,

    /// Ingestion run behavior
    pub ingest: IngestConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            sources: default_sources(),
            harvest: HarvestConfig::default(),
            embedding: EmbeddingConfig::default(),
            database: DatabaseConfig::default(),
            llm: LlmConfig::default(),
            ingest: IngestConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// The sources harvested when none are configured
fn default_sources() -> Vec<FeedSource> {
    vec![
        FeedSource::new("BBC", "http://feeds.bbci.co.uk/news/rss.xml"),
        FeedSource::new("CNN", "http://rss.cnn.com/rss/edition.rss"),
        FeedSource::new("TechCrunch", "https://techcrunch.com/feed/"),
        FeedSource::new(
            "NYTimes",
            "https://rss.nytimes.com/services/xml/rss/nyt/HomePage.xml",
        ),
    ]
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        // Embedding provider
        if let Ok(key) = std::env::var("JINA_API_KEY") {
            config.embedding.api_key = Some(key);
        }
        if let Ok(timeout) = std::env::var("JINA_TIMEOUT_MS") {
            config.embedding.request_timeout_ms = parse_value("JINA_TIMEOUT_MS", timeout)?;
        }
        if let Ok(timeout) = std::env::var("JINA_CHAT_TIMEOUT_MS") {
            config.embedding.query_timeout_ms = parse_value("JINA_CHAT_TIMEOUT_MS", timeout)?;
        }
        if let Ok(ttl) = std::env::var("EMBEDDING_CACHE_TTL") {
            config.embedding.cache_ttl_secs = parse_value("EMBEDDING_CACHE_TTL", ttl)?;
        }

        // Qdrant
        if let Ok(url) = std::env::var("QDRANT_URL") {
            config.database.qdrant_url = url;
        }
        if let Ok(key) = std::env::var("QDRANT_API_KEY") {
            config.database.qdrant_api_key = Some(key);
        }

        // LLM
        if let Ok(key) = std::env::var("GEMINI_API_KEY") {
            config.llm.gemini_api_key = Some(key);
        }
        if let Ok(model) = std::env::var("GEMINI_MODEL") {
            config.llm.model = model;
        }

        // Logging
        if let Ok(level) = std::env::var("LOG_LEVEL") {
            config.logging.level = level;
        }

        Ok(config)
    }

    /// Load from a TOML file
    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::FileReadError {
            path: path.clone(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path,
            message: e.to_string(),
        })
    }
}

fn parse_value<T: std::str::FromStr>(key: &str, value: String) -> Result<T, ConfigError> {
    value.parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value,
    })
}

/// Harvester configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HarvestConfig {
    /// Maximum entries processed per source
    pub max_articles_per_source: usize,

    /// Per-page fetch timeout in seconds
    pub fetch_timeout_secs: u64,

    /// Politeness delay between entries of one source, in milliseconds
    pub entry_delay_ms: u64,

    /// Maximum retained content length in characters
    pub max_content_chars: usize,

    /// Minimum content length for a document to be retained
    pub min_content_chars: usize,

    /// User agent sent on page fetches
    pub user_agent: String,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            max_articles_per_source: 15,
            fetch_timeout_secs: 10,
            entry_delay_ms: 700,
            max_content_chars: 2000,
            min_content_chars: 100,
            user_agent: "Mozilla/5.0 (compatible; NewswireBot/1.0)".to_string(),
        }
    }
}

/// Embedding provider and batching configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Provider API key; the query path degrades gracefully when absent
    pub api_key: Option<String>,

    /// Provider endpoint URL
    pub api_url: String,

    /// Embedding model name
    pub model: String,

    /// Vector dimensionality (must match the store's collection)
    pub dimension: usize,

    /// Texts per provider call on the bulk path
    pub batch_size: usize,

    /// Attempts per batch on the bulk path
    pub max_attempts: u32,

    /// Per-request timeout on the bulk path, in milliseconds
    pub request_timeout_ms: u64,

    /// Per-request timeout on the query path, in milliseconds
    pub query_timeout_ms: u64,

    /// Fixed delay between batches, in milliseconds
    pub inter_batch_delay_ms: u64,

    /// Base for exponential backoff, in milliseconds
    pub backoff_base_ms: u64,

    /// Upper bound of uniform backoff jitter, in milliseconds
    pub backoff_jitter_ms: u64,

    /// Query-path cache entry lifetime, in seconds
    pub cache_ttl_secs: u64,

    /// Maximum cached embeddings
    pub cache_capacity: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_url: "https://api.jina.ai/v1/embeddings".to_string(),
            model: "jina-embeddings-v2-base-en".to_string(),
            dimension: 768,
            batch_size: 3,
            max_attempts: 3,
            request_timeout_ms: 30_000,
            query_timeout_ms: 8_000,
            inter_batch_delay_ms: 1200,
            backoff_base_ms: 1000,
            backoff_jitter_ms: 500,
            cache_ttl_secs: 3600,
            cache_capacity: 10_000,
        }
    }
}

/// Vector store connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Qdrant gRPC URL
    pub qdrant_url: String,

    /// Qdrant API key, for managed deployments
    pub qdrant_api_key: Option<String>,

    /// Qdrant collection name
    pub collection: String,

    /// Vector dimension (must match embedding model)
    pub vector_dimension: usize,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            qdrant_url: "http://localhost:6334".to_string(),
            qdrant_api_key: None,
            collection: "news_articles".to_string(),
            vector_dimension: 768,
        }
    }
}

/// Answer-generation LLM configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Gemini API key; answers degrade to a source listing when absent
    pub gemini_api_key: Option<String>,

    /// Model name
    pub model: String,

    /// Conversation turns included in the prompt
    pub max_history_turns: usize,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            gemini_api_key: None,
            model: "gemini-1.5-flash".to_string(),
            max_history_turns: 6,
            timeout_secs: 30,
        }
    }
}

/// Ingestion run configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    /// Derive point ids from a content hash so re-ingesting identical
    /// content overwrites in place instead of accumulating duplicates
    pub dedupe_by_content: bool,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            dedupe_by_content: false,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    FileReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },
}
