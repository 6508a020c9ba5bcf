//! Google Gemini embedding provider implementation

use async_trait::async_trait;
use serde::Deserialize;

use super::HttpClientTrait;
use crate::domain::embedding::{
    Embedding, EmbeddingProvider, EmbeddingRequest, EmbeddingResponse,
};
use crate::domain::DomainError;

const PROVIDER_NAME: &str = "gemini";

/// Gemini `embedContent` / `batchEmbedContents` client
#[derive(Debug)]
pub struct GeminiEmbeddingProvider<C: HttpClientTrait> {
    client: C,
    api_key: String,
    base_url: String,
    model: String,
    dimensions: usize,
}

impl<C: HttpClientTrait> GeminiEmbeddingProvider<C> {
    pub fn new(
        client: C,
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        model: impl Into<String>,
        dimensions: usize,
    ) -> Self {
        Self {
            client,
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into().trim_start_matches("models/").to_string(),
            dimensions,
        }
    }

    fn url(&self, method: &str) -> String {
        format!("{}/v1beta/models/{}:{}", self.base_url, self.model, method)
    }

    fn headers(&self) -> Vec<(&str, &str)> {
        vec![
            ("x-goog-api-key", self.api_key.as_str()),
            ("Content-Type", "application/json"),
        ]
    }

    fn content_request(&self, text: &str) -> serde_json::Value {
        serde_json::json!({
            "model": format!("models/{}", self.model),
            "content": { "parts": [{ "text": text }] },
        })
    }

    fn check_dimensions(&self, values: Vec<f32>) -> Result<Vec<f32>, DomainError> {
        if values.len() != self.dimensions {
            return Err(DomainError::provider(
                PROVIDER_NAME,
                format!(
                    "Expected {} dimensions, got {}",
                    self.dimensions,
                    values.len()
                ),
            ));
        }

        Ok(values)
    }

    async fn embed_single(&self, text: &str) -> Result<Vec<Vec<f32>>, DomainError> {
        let body = self.content_request(text);
        let json = self
            .client
            .send_json(reqwest::Method::POST, &self.url("embedContent"), self.headers(), Some(&body))
            .await?
            .into_success(PROVIDER_NAME)?;

        let response: GeminiEmbedResponse = serde_json::from_value(json).map_err(|e| {
            DomainError::provider(PROVIDER_NAME, format!("Failed to parse embedding response: {}", e))
        })?;

        Ok(vec![self.check_dimensions(response.embedding.values)?])
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, DomainError> {
        let requests: Vec<serde_json::Value> =
            texts.iter().map(|text| self.content_request(text)).collect();
        let body = serde_json::json!({ "requests": requests });

        let json = self
            .client
            .send_json(
                reqwest::Method::POST,
                &self.url("batchEmbedContents"),
                self.headers(),
                Some(&body),
            )
            .await?
            .into_success(PROVIDER_NAME)?;

        let response: GeminiBatchResponse = serde_json::from_value(json).map_err(|e| {
            DomainError::provider(PROVIDER_NAME, format!("Failed to parse batch response: {}", e))
        })?;

        if response.embeddings.len() != texts.len() {
            return Err(DomainError::provider(
                PROVIDER_NAME,
                format!(
                    "Expected {} embeddings, got {}",
                    texts.len(),
                    response.embeddings.len()
                ),
            ));
        }

        response
            .embeddings
            .into_iter()
            .map(|e| self.check_dimensions(e.values))
            .collect()
    }
}

#[async_trait]
impl<C: HttpClientTrait> EmbeddingProvider for GeminiEmbeddingProvider<C> {
    async fn embed(&self, request: EmbeddingRequest) -> Result<EmbeddingResponse, DomainError> {
        let vectors = match request {
            EmbeddingRequest::Single(ref text) => self.embed_single(text).await?,
            EmbeddingRequest::Batch(ref texts) if texts.is_empty() => Vec::new(),
            EmbeddingRequest::Batch(ref texts) => self.embed_batch(texts).await?,
        };

        let embeddings = vectors
            .into_iter()
            .enumerate()
            .map(|(idx, vector)| Embedding::new(idx, vector))
            .collect();

        Ok(EmbeddingResponse::new(self.model.clone(), embeddings))
    }

    fn provider_name(&self) -> &'static str {
        PROVIDER_NAME
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

// Gemini API types

#[derive(Debug, Deserialize)]
struct GeminiEmbedResponse {
    embedding: GeminiValues,
}

#[derive(Debug, Deserialize)]
struct GeminiBatchResponse {
    #[serde(default)]
    embeddings: Vec<GeminiValues>,
}

#[derive(Debug, Deserialize)]
struct GeminiValues {
    values: Vec<f32>,
}
