//! Newswire Harvest - Feed ingestion
//!
//! Turns configured syndication sources into embeddable [`Document`]s:
//! fetch and parse the feed, fetch each linked page with a bounded timeout,
//! extract body text through the selector fallback in [`extract`], and fall
//! back to the entry's own snippet when the page yields nothing usable.
//! Entries are processed strictly in feed order with a politeness pause
//! between them; one bad page is skipped, one bad feed empties only its own
//! source.

pub mod extract;

use async_trait::async_trait;
use chrono::Utc;
use feed_rs::model::{Entry, Feed};
use newswire_core::{Document, FeedSource, HarvestConfig, NewswireError, Result};
use std::time::Duration;

/// Feed entry summaries are kept short for citation display
const MAX_SUMMARY_CHARS: usize = 300;

/// Trait seam over harvesting, so the ingestion run can be driven from
/// fixtures in tests
#[async_trait]
pub trait DocumentSource: Send + Sync {
    /// Produce at most `max_articles_per_source` documents for one source.
    /// Never fails: a broken feed yields an empty harvest for that source
    /// only.
    async fn harvest_source(&self, source: &FeedSource) -> Vec<Document>;
}

/// Harvester over HTTP feeds and article pages
pub struct FeedHarvester {
    client: reqwest::Client,
    config: HarvestConfig,
}

impl FeedHarvester {
    /// Create a harvester with its own HTTP client
    pub fn new(config: HarvestConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(Duration::from_secs(config.fetch_timeout_secs))
            .build()
            .map_err(|e| NewswireError::Feed(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client, config })
    }

    async fn fetch_feed(&self, url: &str) -> Result<Feed> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| NewswireError::Feed(format!("feed fetch failed: {e}")))?
            .error_for_status()
            .map_err(|e| NewswireError::Feed(format!("feed fetch rejected: {e}")))?;

        let bytes = response
            .bytes()
            .await
            .map_err(|e| NewswireError::Feed(format!("feed read failed: {e}")))?;

        feed_rs::parser::parse(bytes.as_ref())
            .map_err(|e| NewswireError::Feed(format!("feed parse failed: {e}")))
    }

    /// Fetch a linked article page and extract its body text. Any failure
    /// is logged and reported as "no usable text" so the entry falls back
    /// to its feed snippet.
    async fn fetch_article_text(&self, url: &str) -> String {
        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(err) => {
                tracing::warn!(url, "error fetching article content: {err}");
                return String::new();
            }
        };

        if !response.status().is_success() {
            tracing::warn!(url, status = %response.status(), "article fetch rejected");
            return String::new();
        }

        match response.text().await {
            Ok(html) => extract::extract_body_text(&html, self.config.max_content_chars),
            Err(err) => {
                tracing::warn!(url, "error reading article body: {err}");
                String::new()
            }
        }
    }

    /// Build a document from one feed entry, or discard it when the final
    /// cleaned content falls below the minimum length
    fn document_from_entry(
        &self,
        source: &FeedSource,
        index: usize,
        entry: &Entry,
        page_text: String,
    ) -> Option<Document> {
        let snippet = entry
            .summary
            .as_ref()
            .map(|t| t.content.clone())
            .or_else(|| entry.content.as_ref().and_then(|c| c.body.clone()))
            .unwrap_or_default();

        let content = if page_text.is_empty() {
            extract::truncate_chars(&extract::clean_text(&snippet), self.config.max_content_chars)
        } else {
            page_text
        };

        if content.chars().count() < self.config.min_content_chars {
            tracing::debug!(entry = index + 1, "entry content too short; discarding");
            return None;
        }

        Some(Document {
            id: format!(
                "{}_{}_{}",
                source.name.to_lowercase(),
                Utc::now().timestamp_millis(),
                index
            ),
            title: entry
                .title
                .as_ref()
                .map(|t| extract::clean_text(&t.content))
                .unwrap_or_default(),
            content,
            url: entry
                .links
                .first()
                .map(|l| l.href.clone())
                .unwrap_or_default(),
            source: source.name.clone(),
            published_at: entry.published.or(entry.updated).unwrap_or_else(Utc::now),
            summary: extract::truncate_chars(&extract::clean_text(&snippet), MAX_SUMMARY_CHARS),
        })
    }
}

#[async_trait]
impl DocumentSource for FeedHarvester {
    async fn harvest_source(&self, source: &FeedSource) -> Vec<Document> {
        tracing::info!(source = %source.name, "fetching feed");

        let feed = match self.fetch_feed(&source.feed_url).await {
            Ok(feed) => feed,
            Err(err) => {
                // One bad feed never aborts sibling sources.
                tracing::warn!(source = %source.name, "feed harvest aborted: {err}");
                return Vec::new();
            }
        };

        let mut documents = Vec::new();
        for (index, entry) in feed
            .entries
            .iter()
            .take(self.config.max_articles_per_source)
            .enumerate()
        {
            let title = entry
                .title
                .as_ref()
                .map(|t| t.content.as_str())
                .unwrap_or_default();
            tracing::debug!(entry = index + 1, title, "processing feed entry");

            let page_text = match entry.links.first() {
                Some(link) => self.fetch_article_text(&link.href).await,
                None => String::new(),
            };

            if let Some(document) = self.document_from_entry(source, index, entry, page_text) {
                documents.push(document);
            }

            // Politeness pause before hitting the same site again.
            tokio::time::sleep(Duration::from_millis(self.config.entry_delay_ms)).await;
        }

        tracing::info!(
            source = %source.name,
            count = documents.len(),
            "harvest complete"
        );
        documents
    }
}

// ============================================================================
// Tests
// ============================================================================
