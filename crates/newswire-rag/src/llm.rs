//! LLM client implementation
//!
//! Gemini `generateContent` client behind the [`LlmClient`] trait.
//! Request and response shapes are typed and decoded at this boundary.

use async_trait::async_trait;
use newswire_core::{ChatMessage, ChatRole, LlmClient, LlmConfig, NewswireError, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Gemini API client
pub struct GeminiClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    timeout: Duration,
}

#[derive(Debug, Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize)]
struct Content {
    role: String,
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    text: String,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    parts: Vec<Part>,
}

impl GeminiClient {
    /// Create a new Gemini client
    pub fn new(api_key: impl Into<String>, model: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: model.into(),
            timeout,
        }
    }

    /// Create from config; requires an API key
    pub fn from_config(config: &LlmConfig) -> Result<Self> {
        let api_key = config
            .gemini_api_key
            .as_ref()
            .ok_or_else(|| NewswireError::Config("Gemini API key required".to_string()))?;

        Ok(Self::new(
            api_key.clone(),
            config.model.clone(),
            Duration::from_secs(config.timeout_secs),
        ))
    }

    /// Set a custom base URL (for compatible endpoints and tests)
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }
}

#[async_trait]
impl LlmClient for GeminiClient {
    async fn generate(&self, messages: &[ChatMessage]) -> Result<String> {
        let request = GenerateRequest {
            contents: messages
                .iter()
                .map(|m| Content {
                    role: match m.role {
                        ChatRole::Assistant => "model".to_string(),
                        ChatRole::User => "user".to_string(),
                    },
                    parts: vec![Part {
                        text: m.content.clone(),
                    }],
                })
                .collect(),
        };

        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, self.model, self.api_key
        );

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .timeout(self.timeout)
            .json(&request)
            .send()
            .await
            .map_err(|e| NewswireError::Llm(format!("request failed: {e}")))?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(NewswireError::Llm(format!("Gemini error: {error_text}")));
        }

        let result: GenerateResponse = response
            .json()
            .await
            .map_err(|e| NewswireError::Llm(format!("failed to parse response: {e}")))?;

        result
            .candidates
            .first()
            .and_then(|c| c.content.parts.first())
            .map(|p| p.text.clone())
            .ok_or_else(|| NewswireError::Llm("no response generated".to_string()))
    }
}

/// Create an LLM client from config, or `None` when no key is configured
/// and answers should degrade to the non-LLM fallback
pub fn create_llm_client(config: &LlmConfig) -> Option<Box<dyn LlmClient>> {
    match GeminiClient::from_config(config) {
        Ok(client) => Some(Box::new(client)),
        Err(_) => {
            tracing::warn!("no LLM credential configured; answers fall back to source listings");
            None
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    fn client_for(server: &MockServer) -> GeminiClient {
        GeminiClient::new("test-key", "gemini-1.5-flash", Duration::from_secs(5))
            .with_base_url(server.url("/v1beta"))
    }

    #[tokio::test]
    async fn test_generate_returns_first_candidate_text() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/v1beta/models/gemini-1.5-flash:generateContent")
                    .query_param("key", "test-key")
                    .json_body_partial(
                        json!({
                            "contents": [
                                { "role": "user", "parts": [{ "text": "hello" }] }
                            ]
                        })
                        .to_string(),
                    );
                then.status(200).json_body(json!({
                    "candidates": [
                        { "content": { "role": "model", "parts": [{ "text": "hi there" }] } }
                    ]
                }));
            })
            .await;

        let client = client_for(&server);
        let answer = client
            .generate(&[ChatMessage::user("hello")])
            .await
            .expect("successful generation");

        mock.assert_async().await;
        assert_eq!(answer, "hi there");
    }

    #[tokio::test]
    async fn test_assistant_turns_map_to_model_role() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/v1beta/models/gemini-1.5-flash:generateContent")
                    .json_body_partial(
                        json!({
                            "contents": [
                                { "role": "user", "parts": [{ "text": "q1" }] },
                                { "role": "model", "parts": [{ "text": "a1" }] },
                                { "role": "user", "parts": [{ "text": "q2" }] }
                            ]
                        })
                        .to_string(),
                    );
                then.status(200).json_body(json!({
                    "candidates": [
                        { "content": { "role": "model", "parts": [{ "text": "a2" }] } }
                    ]
                }));
            })
            .await;

        let client = client_for(&server);
        let messages = vec![
            ChatMessage::user("q1"),
            ChatMessage::assistant("a1"),
            ChatMessage::user("q2"),
        ];
        client.generate(&messages).await.expect("success");

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_server_error_maps_to_llm_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path_contains("generateContent");
                then.status(500).body("boom");
            })
            .await;

        let client = client_for(&server);
        let err = client
            .generate(&[ChatMessage::user("hello")])
            .await
            .expect_err("500 must fail");

        assert!(matches!(err, NewswireError::Llm(_)));
    }

    #[tokio::test]
    async fn test_empty_candidates_is_an_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path_contains("generateContent");
                then.status(200).json_body(json!({ "candidates": [] }));
            })
            .await;

        let client = client_for(&server);
        let err = client
            .generate(&[ChatMessage::user("hello")])
            .await
            .expect_err("no candidates");

        assert!(matches!(err, NewswireError::Llm(_)));
    }

    #[test]
    fn test_factory_without_key_returns_none() {
        assert!(create_llm_client(&LlmConfig::default()).is_none());

        let config = LlmConfig {
            gemini_api_key: Some("key".to_string()),
            ..LlmConfig::default()
        };
        assert!(create_llm_client(&config).is_some());
    }
}
