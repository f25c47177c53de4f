//! Qdrant implementation for article vector storage
//!
//! Provides connection management, point-id normalization, and the
//! upsert/search/scroll operations used by the ingestion and query paths.

use crate::{ArticlePayload, ArticleStore};
use async_trait::async_trait;
use newswire_core::{DatabaseConfig, NewswireError, Result, RetrievedArticle};
use qdrant_client::qdrant::{
    CreateCollectionBuilder, Distance, PointId, PointStruct, ScrollPointsBuilder,
    SearchPointsBuilder, UpsertPointsBuilder, VectorParamsBuilder,
};
use qdrant_client::Qdrant;
use std::collections::HashMap;
use uuid::Uuid;

/// Qdrant-backed article store
pub struct QdrantArticleStore {
    client: Qdrant,
    collection: String,
    dimension: usize,
}

impl QdrantArticleStore {
    /// Create a new Qdrant connection
    pub async fn new(config: &DatabaseConfig) -> Result<Self> {
        let mut builder = Qdrant::from_url(&config.qdrant_url);
        if let Some(api_key) = &config.qdrant_api_key {
            builder = builder.api_key(api_key.clone());
        }

        let client = builder
            .build()
            .map_err(|e| NewswireError::Database(format!("Qdrant connection failed: {e}")))?;

        Ok(Self {
            client,
            collection: config.collection.clone(),
            dimension: config.vector_dimension,
        })
    }

    /// Initialize the collection (run once on setup)
    pub async fn init_collection(&self) -> Result<()> {
        let collections = self
            .client
            .list_collections()
            .await
            .map_err(|e| NewswireError::Database(format!("failed to list collections: {e}")))?;

        let exists = collections
            .collections
            .iter()
            .any(|c| c.name == self.collection);

        if !exists {
            tracing::info!(collection = %self.collection, "creating Qdrant collection");
            self.client
                .create_collection(
                    CreateCollectionBuilder::new(&self.collection).vectors_config(
                        VectorParamsBuilder::new(self.dimension as u64, Distance::Cosine),
                    ),
                )
                .await
                .map_err(|e| {
                    NewswireError::Database(format!("failed to create collection: {e}"))
                })?;
        }

        Ok(())
    }
}

/// Map a natural article id into the store's narrower id space: purely
/// numeric ids are reused so re-ingestion overwrites, anything else gets a
/// fresh random unique id
pub fn normalize_point_id(natural_id: &str) -> PointId {
    let purely_numeric =
        !natural_id.is_empty() && natural_id.chars().all(|c| c.is_ascii_digit());

    match natural_id.parse::<u64>() {
        Ok(num) if purely_numeric => PointId::from(num),
        _ => PointId::from(Uuid::new_v4().to_string()),
    }
}

fn payload_map(payload: &ArticlePayload) -> HashMap<String, qdrant_client::qdrant::Value> {
    serde_json::to_value(payload)
        .unwrap_or_default()
        .as_object()
        .cloned()
        .unwrap_or_default()
        .into_iter()
        .map(|(k, v)| (k, v.into()))
        .collect()
}

fn article_from_payload(
    payload: &HashMap<String, qdrant_client::qdrant::Value>,
    score: Option<f32>,
) -> RetrievedArticle {
    let field = |name: &str| {
        payload
            .get(name)
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
            .unwrap_or_default()
    };

    RetrievedArticle {
        title: field("title"),
        content: field("content"),
        url: field("url"),
        source: field("source"),
        published_at: field("published_at"),
        summary: field("summary"),
        score,
    }
}

#[async_trait]
impl ArticleStore for QdrantArticleStore {
    async fn upsert(
        &self,
        natural_id: &str,
        vector: Vec<f32>,
        payload: ArticlePayload,
    ) -> Result<()> {
        let point = PointStruct::new(normalize_point_id(natural_id), vector, payload_map(&payload));

        self.client
            .upsert_points(UpsertPointsBuilder::new(&self.collection, vec![point]).wait(true))
            .await
            .map_err(|e| {
                NewswireError::Database(format!("failed to upsert article {natural_id}: {e}"))
            })?;

        Ok(())
    }

    async fn search(&self, query_vector: &[f32], limit: usize) -> Result<Vec<RetrievedArticle>> {
        let results = self
            .client
            .search_points(
                SearchPointsBuilder::new(&self.collection, query_vector.to_vec(), limit as u64)
                    .with_payload(true),
            )
            .await
            .map_err(|e| NewswireError::Database(format!("vector search failed: {e}")))?;

        Ok(results
            .result
            .into_iter()
            .map(|point| article_from_payload(&point.payload, Some(point.score)))
            .collect())
    }

    async fn scroll(&self, limit: usize) -> Result<Vec<RetrievedArticle>> {
        let results = self
            .client
            .scroll(
                ScrollPointsBuilder::new(&self.collection)
                    .limit(limit as u32)
                    .with_payload(true),
            )
            .await
            .map_err(|e| NewswireError::Database(format!("scroll failed: {e}")))?;

        Ok(results
            .result
            .into_iter()
            .map(|point| article_from_payload(&point.payload, None))
            .collect())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use qdrant_client::qdrant::point_id::PointIdOptions;

    #[test]
    fn test_numeric_natural_id_is_reused() {
        let id = normalize_point_id("42");
        assert!(matches!(id.point_id_options, Some(PointIdOptions::Num(42))));
    }

    #[test]
    fn test_non_numeric_natural_id_gets_fresh_uuid() {
        let id = normalize_point_id("techcrunch_171234_3");
        match id.point_id_options {
            Some(PointIdOptions::Uuid(s)) => {
                assert!(Uuid::parse_str(&s).is_ok());
                assert_ne!(s, "techcrunch_171234_3");
            }
            other => panic!("expected uuid point id, got {other:?}"),
        }
    }

    #[test]
    fn test_non_numeric_ids_are_fresh_each_time() {
        let a = normalize_point_id("bbc_1700000000000_0");
        let b = normalize_point_id("bbc_1700000000000_0");
        assert_ne!(a, b);
    }

    #[test]
    fn test_overflowing_numeric_id_falls_back_to_uuid() {
        let id = normalize_point_id("999999999999999999999999999");
        assert!(matches!(
            id.point_id_options,
            Some(PointIdOptions::Uuid(_))
        ));
    }

    #[test]
    fn test_payload_round_trip() {
        let payload = ArticlePayload {
            title: "Title".to_string(),
            content: "Body text".to_string(),
            url: "https://example.com/a".to_string(),
            source: "BBC".to_string(),
            published_at: "2026-01-01T00:00:00+00:00".to_string(),
            summary: "Short".to_string(),
        };

        let map = payload_map(&payload);
        let article = article_from_payload(&map, Some(0.9));

        assert_eq!(article.title, "Title");
        assert_eq!(article.content, "Body text");
        assert_eq!(article.source, "BBC");
        assert_eq!(article.score, Some(0.9));
    }

    #[test]
    fn test_missing_payload_fields_default_empty() {
        let article = article_from_payload(&HashMap::new(), None);
        assert!(article.title.is_empty());
        assert!(article.score.is_none());
    }
}
