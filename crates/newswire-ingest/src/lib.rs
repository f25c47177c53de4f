//! Newswire Ingest - Ingestion orchestration
//!
//! Drives one full ingestion run: harvest every configured source in
//! sequence, compose embeddable text per document, embed the whole
//! collection through the batched client, and persist each successfully
//! embedded document into the vector store. Partial failure never aborts
//! the run; it always ends with a stored/skipped summary.

use newswire_core::{Document, FeedSource, Result};
use newswire_embed::BatchedEmbedder;
use newswire_harvest::DocumentSource;
use newswire_vector::{ArticlePayload, ArticleStore};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Outcome of one ingestion run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    /// Documents collected across all sources
    pub collected: usize,

    /// Vectors persisted
    pub stored: usize,

    /// Documents skipped because no embedding was produced
    pub skipped: usize,
}

/// Orchestrator for one ingestion run
pub struct IngestionRunner {
    sources: Vec<FeedSource>,
    harvester: Arc<dyn DocumentSource>,
    embedder: BatchedEmbedder,
    store: Arc<dyn ArticleStore>,
    dedupe_by_content: bool,
}

impl IngestionRunner {
    /// Create a runner over already-initialized clients
    pub fn new(
        sources: Vec<FeedSource>,
        harvester: Arc<dyn DocumentSource>,
        embedder: BatchedEmbedder,
        store: Arc<dyn ArticleStore>,
        dedupe_by_content: bool,
    ) -> Self {
        Self {
            sources,
            harvester,
            embedder,
            store,
            dedupe_by_content,
        }
    }

    /// Run harvest, embed, and persist to completion.
    ///
    /// Always returns a report; embedding-stage and per-document persistence
    /// failures are logged and tallied rather than propagated.
    pub async fn run(&self) -> Result<RunReport> {
        tracing::info!("starting news ingestion");

        let mut documents: Vec<Document> = Vec::new();
        for source in &self.sources {
            let harvested = self.harvester.harvest_source(source).await;
            if harvested.is_empty() {
                tracing::warn!(source = %source.name, "source yielded no documents");
            } else {
                tracing::info!(source = %source.name, count = harvested.len(), "source harvested");
            }
            documents.extend(harvested);
        }

        let mut report = RunReport {
            collected: documents.len(),
            ..RunReport::default()
        };

        tracing::info!(total = report.collected, "collection complete");
        if documents.is_empty() {
            tracing::info!("no documents to process");
            return Ok(report);
        }

        let texts: Vec<String> = documents.iter().map(Document::embedding_text).collect();
        let embeddings = match self.embedder.embed_all(&texts).await {
            Ok(embeddings) => embeddings,
            Err(err) => {
                // An authorization rejection kills this run's embedding
                // stage, not the process: everything is reported skipped.
                tracing::error!("embedding stage failed: {err}");
                report.skipped = report.collected;
                return Ok(report);
            }
        };

        for (document, embedding) in documents.iter().zip(embeddings) {
            let Some(vector) = embedding else {
                report.skipped += 1;
                tracing::warn!(title = %document.title, "skipping document without embedding");
                continue;
            };

            let natural_id = if self.dedupe_by_content {
                content_hash_id(&document.content)
            } else {
                document.id.clone()
            };

            match self
                .store
                .upsert(&natural_id, vector, ArticlePayload::from(document))
                .await
            {
                Ok(()) => {
                    report.stored += 1;
                    tracing::debug!(title = %document.title, "stored");
                }
                Err(err) => {
                    // Durability of earlier writes is independent of this one.
                    tracing::error!(id = %document.id, "failed to store document: {err}");
                }
            }
        }

        tracing::info!(
            stored = report.stored,
            skipped = report.skipped,
            "ingestion complete"
        );
        Ok(report)
    }
}

/// Numeric natural id derived from content, so re-ingesting identical
/// content lands on the same point and overwrites in place
fn content_hash_id(content: &str) -> String {
    let mut hasher = DefaultHasher::new();
    content.hash(&mut hasher);
    hasher.finish().to_string()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Utc;
    use newswire_core::NewswireError;
    use newswire_embed::{BatchPolicy, EmbeddingProvider, RetryPolicy};
    use std::collections::{HashMap, HashSet, VecDeque};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    fn doc(source: &str, index: usize) -> Document {
        Document {
            id: format!("{}_1700000000000_{}", source.to_lowercase(), index),
            title: format!("{source} article {index}"),
            content: format!("Body of {source} article {index}. ").repeat(8),
            url: format!("https://example.com/{source}/{index}"),
            source: source.to_string(),
            published_at: Utc::now(),
            summary: "summary".to_string(),
        }
    }

    /// Harvester fixture: yields a fixed document list per source name.
    struct FixtureSource {
        per_source: HashMap<String, Vec<Document>>,
    }

    #[async_trait]
    impl DocumentSource for FixtureSource {
        async fn harvest_source(&self, source: &FeedSource) -> Vec<Document> {
            self.per_source.get(&source.name).cloned().unwrap_or_default()
        }
    }

    /// Provider replaying scripted outcomes; successful calls return
    /// one-element vectors.
    enum Step {
        Pass,
        Transient,
        Auth,
    }

    struct ScriptedProvider {
        script: Mutex<VecDeque<Step>>,
        calls: AtomicUsize,
    }

    impl ScriptedProvider {
        fn new(steps: Vec<Step>) -> Arc<Self> {
            Arc::new(Self {
                script: Mutex::new(steps.into_iter().collect()),
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl EmbeddingProvider for ScriptedProvider {
        async fn embed(&self, texts: &[String], _timeout: Duration) -> Result<Vec<Vec<f32>>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.script.lock().unwrap().pop_front().unwrap_or(Step::Pass) {
                Step::Pass => Ok(texts.iter().map(|_| vec![0.1; 4]).collect()),
                Step::Transient => Err(NewswireError::Provider("simulated 503".to_string())),
                Step::Auth => Err(NewswireError::ProviderAuth("simulated 401".to_string())),
            }
        }

        fn dimension(&self) -> usize {
            4
        }
    }

    /// Store recording upserts; configured ids fail.
    #[derive(Default)]
    struct RecordingStore {
        upserts: Mutex<Vec<(String, ArticlePayload)>>,
        fail_titles: HashSet<String>,
    }

    #[async_trait]
    impl ArticleStore for RecordingStore {
        async fn upsert(
            &self,
            natural_id: &str,
            _vector: Vec<f32>,
            payload: ArticlePayload,
        ) -> Result<()> {
            if self.fail_titles.contains(&payload.title) {
                return Err(NewswireError::Database("simulated upsert failure".to_string()));
            }
            self.upserts
                .lock()
                .unwrap()
                .push((natural_id.to_string(), payload));
            Ok(())
        }

        async fn search(&self, _query: &[f32], _limit: usize) -> Result<Vec<newswire_core::RetrievedArticle>> {
            Ok(Vec::new())
        }

        async fn scroll(&self, _limit: usize) -> Result<Vec<newswire_core::RetrievedArticle>> {
            Ok(Vec::new())
        }
    }

    fn fast_policy(batch_size: usize) -> BatchPolicy {
        BatchPolicy {
            batch_size,
            inter_batch_delay: Duration::ZERO,
            retry: RetryPolicy {
                max_attempts: 3,
                request_timeout: Duration::from_secs(1),
                backoff_base: Duration::ZERO,
                backoff_jitter: Duration::ZERO,
            },
        }
    }

    fn runner(
        sources: Vec<FeedSource>,
        per_source: HashMap<String, Vec<Document>>,
        provider: Arc<ScriptedProvider>,
        store: Arc<RecordingStore>,
        batch_size: usize,
        dedupe: bool,
    ) -> IngestionRunner {
        IngestionRunner::new(
            sources,
            Arc::new(FixtureSource { per_source }),
            BatchedEmbedder::new(provider, fast_policy(batch_size)),
            store,
            dedupe,
        )
    }

    #[tokio::test]
    async fn test_failed_source_does_not_abort_run() {
        // First source yields 5 documents, second yields none (parse error
        // upstream); the run proceeds and reports 5 candidates.
        let docs: Vec<Document> = (0..5).map(|i| doc("BBC", i)).collect();
        let per_source = HashMap::from([("BBC".to_string(), docs)]);
        let sources = vec![
            FeedSource::new("BBC", "http://example.com/bbc.xml"),
            FeedSource::new("CNN", "http://example.com/cnn.xml"),
        ];
        let store = Arc::new(RecordingStore::default());

        let report = runner(
            sources,
            per_source,
            ScriptedProvider::new(vec![]),
            store.clone(),
            3,
            false,
        )
        .run()
        .await
        .expect("run completes");

        assert_eq!(report.collected, 5);
        assert_eq!(report.stored, 5);
        assert_eq!(report.skipped, 0);
    }

    #[tokio::test]
    async fn test_middle_batch_failure_stores_rest() {
        // 7 documents, batch size 3; the second batch exhausts its retries.
        let docs: Vec<Document> = (0..7).map(|i| doc("BBC", i)).collect();
        let per_source = HashMap::from([("BBC".to_string(), docs)]);
        let store = Arc::new(RecordingStore::default());

        let provider = ScriptedProvider::new(vec![
            Step::Pass,
            Step::Transient,
            Step::Transient,
            Step::Transient,
            Step::Pass,
        ]);

        let report = runner(
            vec![FeedSource::new("BBC", "http://example.com/bbc.xml")],
            per_source,
            provider,
            store.clone(),
            3,
            false,
        )
        .run()
        .await
        .expect("run completes");

        assert_eq!(report.stored, 4);
        assert_eq!(report.skipped, 3);

        let stored_titles: Vec<String> = store
            .upserts
            .lock()
            .unwrap()
            .iter()
            .map(|(_, p)| p.title.clone())
            .collect();
        assert_eq!(
            stored_titles,
            vec![
                "BBC article 0",
                "BBC article 1",
                "BBC article 2",
                "BBC article 6"
            ]
        );
    }

    #[tokio::test]
    async fn test_empty_collection_ends_early() {
        let provider = ScriptedProvider::new(vec![]);
        let store = Arc::new(RecordingStore::default());

        let report = runner(
            vec![FeedSource::new("BBC", "http://example.com/bbc.xml")],
            HashMap::new(),
            provider.clone(),
            store.clone(),
            3,
            false,
        )
        .run()
        .await
        .expect("run completes");

        assert_eq!(report, RunReport::default());
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
        assert!(store.upserts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_single_upsert_failure_spares_siblings() {
        let docs: Vec<Document> = (0..3).map(|i| doc("BBC", i)).collect();
        let per_source = HashMap::from([("BBC".to_string(), docs)]);

        let store = Arc::new(RecordingStore {
            fail_titles: HashSet::from(["BBC article 1".to_string()]),
            ..RecordingStore::default()
        });

        let report = runner(
            vec![FeedSource::new("BBC", "http://example.com/bbc.xml")],
            per_source,
            ScriptedProvider::new(vec![]),
            store.clone(),
            3,
            false,
        )
        .run()
        .await
        .expect("run completes");

        assert_eq!(report.stored, 2);
        assert_eq!(report.skipped, 0);
        assert_eq!(store.upserts.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_auth_failure_is_caught_at_run_boundary() {
        let docs: Vec<Document> = (0..4).map(|i| doc("BBC", i)).collect();
        let per_source = HashMap::from([("BBC".to_string(), docs)]);
        let store = Arc::new(RecordingStore::default());

        let report = runner(
            vec![FeedSource::new("BBC", "http://example.com/bbc.xml")],
            per_source,
            ScriptedProvider::new(vec![Step::Auth]),
            store.clone(),
            3,
            false,
        )
        .run()
        .await
        .expect("auth is caught, run still reports");

        assert_eq!(report.collected, 4);
        assert_eq!(report.stored, 0);
        assert_eq!(report.skipped, 4);
        assert!(store.upserts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_dedupe_by_content_uses_stable_numeric_ids() {
        let docs: Vec<Document> = (0..2).map(|i| doc("BBC", i)).collect();
        let per_source = HashMap::from([("BBC".to_string(), docs.clone())]);
        let store = Arc::new(RecordingStore::default());

        let make_runner = |store: Arc<RecordingStore>| {
            runner(
                vec![FeedSource::new("BBC", "http://example.com/bbc.xml")],
                per_source.clone(),
                ScriptedProvider::new(vec![]),
                store,
                3,
                true,
            )
        };

        make_runner(store.clone()).run().await.expect("first run");
        make_runner(store.clone()).run().await.expect("second run");

        let upserts = store.upserts.lock().unwrap();
        assert_eq!(upserts.len(), 4);
        // Same content, same id across runs; ids are purely numeric so the
        // store overwrites instead of accumulating duplicates.
        assert_eq!(upserts[0].0, upserts[2].0);
        assert_eq!(upserts[1].0, upserts[3].0);
        assert!(upserts[0].0.chars().all(|c| c.is_ascii_digit()));
    }
}
