//! Embedding provider
//!
//! `/embeddings` client against the same OpenAI-compatible API family as
//! [`crate::ChatApiProvider`], sharing its error classification. The vector
//! dimension is fixed at construction; a response with a different dimension
//! is a shape-validation failure, not something to retry.

use crate::chat::{build_client, classify_status, classify_transport, DEFAULT_TIMEOUT_SECS};
use async_trait::async_trait;
use covenant_domain::{CallError, EmbeddingProvider};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default embedding model
pub const DEFAULT_EMBED_MODEL: &str = "mistral-embed";

/// Default embedding dimension for [`DEFAULT_EMBED_MODEL`]
pub const DEFAULT_EMBED_DIMENSION: usize = 1024;

/// Embedding client for an OpenAI-compatible API
pub struct EmbeddingApiProvider {
    endpoint: String,
    model: String,
    api_key: String,
    dimension: usize,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: [&'a str; 1],
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

impl EmbeddingApiProvider {
    /// Create a provider against the given endpoint, model and dimension.
    ///
    /// Fails when the HTTP client cannot be constructed, typically because
    /// no TLS backend is available.
    pub fn new(
        endpoint: impl Into<String>,
        model: impl Into<String>,
        api_key: impl Into<String>,
        dimension: usize,
    ) -> Result<Self, CallError> {
        Ok(Self {
            endpoint: endpoint.into(),
            model: model.into(),
            api_key: api_key.into(),
            dimension,
            client: build_client(Duration::from_secs(DEFAULT_TIMEOUT_SECS))?,
        })
    }
}

#[async_trait]
impl EmbeddingProvider for EmbeddingApiProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, CallError> {
        let url = format!("{}/embeddings", self.endpoint);
        let body = EmbeddingRequest {
            model: &self.model,
            input: [text],
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(classify_transport)?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(classify_status(status, &text));
        }

        let parsed: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| CallError::InvalidResponse(format!("body parse failed: {e}")))?;

        let vector = parsed
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| CallError::InvalidResponse("no embedding in response".to_string()))?;

        if vector.len() != self.dimension {
            return Err(CallError::InvalidResponse(format!(
                "embedding dimension mismatch: expected {}, got {}",
                self.dimension,
                vector.len()
            )));
        }

        Ok(vector)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_dimension() {
        let provider = EmbeddingApiProvider::new(
            "https://api.mistral.ai/v1",
            DEFAULT_EMBED_MODEL,
            "key",
            DEFAULT_EMBED_DIMENSION,
        )
        .unwrap();
        assert_eq!(provider.dimension(), 1024);
    }
}
