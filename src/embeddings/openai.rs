use crate::cache::EmbeddingCache;
use crate::config::EmbeddingsConfig;
use crate::embeddings::Embedder;
use crate::error::{Result, WikipathError};
use crate::fetch::visible_text;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Request structure for the embeddings API
#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: Vec<&'a str>,
}

/// Response structure from the embeddings API
#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

/// Client for OpenAI-compatible `/embeddings` endpoints
///
/// Pages are reduced to their visible text and truncated before embedding.
/// Failed calls are not retried; the search decides what a failure means.
pub struct OpenAIEmbedder {
    client: Client,
    api_key: String,
    model: String,
    endpoint: String,
    max_input_chars: usize,
    cache: Option<Arc<EmbeddingCache>>,
}

impl OpenAIEmbedder {
    pub fn new(api_key: String, config: &EmbeddingsConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            api_key,
            model: config.model.clone(),
            endpoint: format!("{}/embeddings", config.api_base.trim_end_matches('/')),
            max_input_chars: config.max_input_chars,
            cache: None,
        })
    }

    /// Attach a shared LRU cache
    pub fn with_cache(mut self, cache: Arc<EmbeddingCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Visible text of the page, cut to `max_input_chars` on a char boundary
    fn prepare_input(&self, page_text: &str) -> String {
        let text = visible_text(page_text);
        match text.char_indices().nth(self.max_input_chars) {
            Some((idx, _)) => text[..idx].to_string(),
            None => text,
        }
    }

    async fn request_embedding(&self, input: &str) -> Result<Vec<f32>> {
        let start = std::time::Instant::now();
        let request = EmbeddingRequest {
            model: &self.model,
            input: vec![input],
        };

        let response = self
            .client
            .post(&self.endpoint)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await
            .map_err(|e| WikipathError::Embedding(format!("Network error: {}", e)))?;

        let status = response.status();

        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error response".to_string());

            return Err(WikipathError::Embedding(format!(
                "Embeddings API error {}: {}",
                status, body
            )));
        }

        let result: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| WikipathError::Embedding(format!("Failed to parse response: {}", e)))?;

        let embedding = result
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .filter(|e| !e.is_empty())
            .ok_or_else(|| WikipathError::Embedding("Empty response from embeddings API".to_string()))?;

        log::debug!("Embedding API call took {:?}", start.elapsed());
        Ok(embedding)
    }
}

#[async_trait]
impl Embedder for OpenAIEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let input = self.prepare_input(text);
        if input.is_empty() {
            return Err(WikipathError::Embedding("Page has no text to embed".to_string()));
        }

        if let Some(cache) = &self.cache {
            if let Some(cached) = cache.get(&input) {
                log::debug!("Embedding cache hit ({} chars)", input.len());
                return Ok(cached);
            }
        }

        let embedding = self.request_embedding(&input).await?;

        if let Some(cache) = &self.cache {
            cache.put(&input, embedding.clone());
        }

        Ok(embedding)
    }
}
