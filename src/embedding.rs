//! Embedding capability.
//!
//! The engine only depends on the [`EmbeddingClient`] trait; the shipped
//! implementation talks to an Ollama-compatible `/api/embeddings` endpoint.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

use crate::errors::RagError;

/// Turns text into a fixed-dimension vector via a remote model.
///
/// Implementations perform no retries; retrying is the caller's decision.
#[async_trait]
pub trait EmbeddingClient: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, RagError>;

    /// Identifier of the model producing the vectors.
    fn model(&self) -> &str;
}

/// Ollama-backed embedding client.
pub struct OllamaEmbedder {
    host: String,
    model: String,
    client: Client,
}

impl OllamaEmbedder {
    pub fn new(host: &str, model: &str, timeout: Duration) -> Result<Self, RagError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(RagError::embedding)?;

        Ok(Self {
            host: host.trim_end_matches('/').to_string(),
            model: model.to_string(),
            client,
        })
    }
}

#[async_trait]
impl EmbeddingClient for OllamaEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, RagError> {
        let url = format!("{}/api/embeddings", self.host);
        let body = serde_json::json!({
            "model": self.model,
            "prompt": text,
        });

        let response = self
            .client
            .post(url)
            .json(&body)
            .send()
            .await
            .map_err(RagError::embedding)?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(RagError::EmbeddingService(format!(
                "embedding request failed: {} {}",
                status, text
            )));
        }

        let payload: Value = response.json().await.map_err(RagError::embedding)?;
        parse_embedding_payload(&payload)
    }

    fn model(&self) -> &str {
        &self.model
    }
}

/// Extracts the `"embedding"` array from a response payload. Any other
/// shape is a service error.
fn parse_embedding_payload(payload: &Value) -> Result<Vec<f32>, RagError> {
    let Some(values) = payload.get("embedding").and_then(|v| v.as_array()) else {
        return Err(RagError::EmbeddingService(
            "embedding response missing embedding array".to_string(),
        ));
    };

    let mut embedding = Vec::with_capacity(values.len());
    for value in values {
        let Some(float_value) = value.as_f64() else {
            return Err(RagError::EmbeddingService(
                "embedding contains non-numeric value".to_string(),
            ));
        };
        embedding.push(float_value as f32);
    }
    Ok(embedding)
}
