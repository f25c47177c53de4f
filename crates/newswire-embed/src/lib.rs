//! Newswire Embed - Resilient embedding generation
//!
//! This crate turns text into vector embeddings against an external,
//! rate-limited provider:
//! - [`gateway`] — the thin provider client; decodes responses and
//!   classifies failures at the boundary
//! - [`batch`] — the bulk path: fixed-size batches, retry with backoff,
//!   positional alignment under partial failure
//! - [`cache`] — TTL cache for query-path embeddings
//! - [`accessor`] — the latency-sensitive cache-aside path used by chat
//!   queries

pub mod accessor;
pub mod batch;
pub mod cache;
pub mod gateway;

pub use accessor::QueryEmbedder;
pub use batch::{embed_with_retries, BatchPolicy, BatchedEmbedder, RetryPolicy};
pub use cache::{CacheStats, EmbeddingCache};
pub use gateway::{EmbeddingProvider, JinaEmbedding};
