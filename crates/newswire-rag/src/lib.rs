//! Newswire RAG - Retrieval-augmented answering
//!
//! Serves one chat question: embed the query through the cache-aside
//! accessor, retrieve context from the vector store (similarity search when
//! an embedding is available, arbitrary recent articles otherwise), and
//! generate an answer over that context. Every degradation has an explicit
//! fallback; this path never fails because a provider is down.

pub mod llm;

pub use llm::{create_llm_client, GeminiClient};

use newswire_core::{ChatAnswer, ChatMessage, LlmClient, Result, RetrievedArticle, SourceRef};
use newswire_embed::QueryEmbedder;
use newswire_vector::ArticleStore;
use std::sync::Arc;

// ============================================================================
// Configuration
// ============================================================================

/// Answer engine configuration
#[derive(Debug, Clone)]
pub struct AnswerConfig {
    /// Articles retrieved as context
    pub top_k: usize,

    /// Conversation turns included in the prompt
    pub max_history_turns: usize,
}

impl Default for AnswerConfig {
    fn default() -> Self {
        Self {
            top_k: 5,
            max_history_turns: 6,
        }
    }
}

// ============================================================================
// Answer Engine
// ============================================================================

/// Retrieval-augmented answer engine
pub struct AnswerEngine {
    embedder: QueryEmbedder,
    store: Arc<dyn ArticleStore>,
    llm: Option<Box<dyn LlmClient>>,
    config: AnswerConfig,
}

impl AnswerEngine {
    /// Create a new engine over already-initialized clients
    pub fn new(
        embedder: QueryEmbedder,
        store: Arc<dyn ArticleStore>,
        llm: Option<Box<dyn LlmClient>>,
        config: AnswerConfig,
    ) -> Self {
        Self {
            embedder,
            store,
            llm,
            config,
        }
    }

    /// Answer one question over retrieved context.
    ///
    /// Retrieval strategies, in order: similarity search over the query
    /// embedding; arbitrary stored articles when no embedding is available.
    /// Answer strategies, in order: the configured LLM; a deterministic
    /// listing of the top retrieved articles.
    pub async fn answer(&self, question: &str, history: &[ChatMessage]) -> Result<ChatAnswer> {
        let context = match self.embedder.embed_one(question).await? {
            Some(vector) => self.store.search(&vector, self.config.top_k).await?,
            None => {
                tracing::debug!("no query embedding; retrieving arbitrary recent articles");
                self.store.scroll(self.config.top_k).await?
            }
        };
        tracing::debug!(articles = context.len(), "context retrieved");

        let answer = match &self.llm {
            Some(llm) => {
                let messages = self.build_messages(question, &context, history);
                match llm.generate(&messages).await {
                    Ok(text) if !text.trim().is_empty() => text,
                    Ok(_) => fallback_answer(&context),
                    Err(err) => {
                        tracing::error!("answer generation failed: {err}");
                        fallback_answer(&context)
                    }
                }
            }
            None => fallback_answer(&context),
        };

        Ok(ChatAnswer {
            answer,
            sources: context.iter().map(SourceRef::from).collect(),
        })
    }

    /// Compose the conversation sent to the LLM: context-bearing system
    /// instruction, the last `max_history_turns` turns, then the question
    fn build_messages(
        &self,
        question: &str,
        context: &[RetrievedArticle],
        history: &[ChatMessage],
    ) -> Vec<ChatMessage> {
        let mut messages = vec![ChatMessage::user(system_prompt(context))];

        let tail = history.len().saturating_sub(self.config.max_history_turns);
        messages.extend_from_slice(&history[tail..]);

        messages.push(ChatMessage::user(question));
        messages
    }
}

fn system_prompt(context: &[RetrievedArticle]) -> String {
    let mut prompt = String::new();
    prompt.push_str(
        "You are a helpful news assistant. Answer questions based on the provided news context.\n",
    );
    prompt.push_str(
        "If the context doesn't contain relevant information, say so politely and suggest \
         what kind of information you can help with.\n\n",
    );
    prompt.push_str("Context from news articles:\n");

    for article in context {
        prompt.push_str(&format!(
            "Title: {}\nContent: {}\nSource: {}\n",
            article.title, article.content, article.source
        ));
        prompt.push_str("---\n");
    }

    prompt
}

/// Deterministic answer used when no LLM is configured or the call failed
fn fallback_answer(context: &[RetrievedArticle]) -> String {
    let top: Vec<&RetrievedArticle> = context.iter().take(3).collect();
    if top.is_empty() {
        return "I couldn't find relevant context in the knowledge base for that query. \
                Try asking about recently ingested news topics."
            .to_string();
    }

    let bullets = top
        .iter()
        .enumerate()
        .map(|(i, article)| {
            let mut line = format!("({}) {} — {}", i + 1, article.title, article.source);
            if !article.summary.is_empty() {
                line.push_str(&format!(": {}", article.summary));
            }
            line
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "Here's what I found related to your query based on recent articles:\n{bullets}\n\n\
         Ask a follow-up for more details on any of the above."
    )
}

// ============================================================================
// Tests
// ============================================================================
