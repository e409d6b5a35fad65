//! OpenAI-compatible embedding client.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::EmbeddingConfig;

use super::{EmbeddingError, EmbeddingProvider};

#[derive(Serialize)]
struct EmbeddingsRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingObject>,
}

#[derive(Deserialize)]
struct EmbeddingObject {
    index: usize,
    embedding: Vec<f32>,
}

/// [`EmbeddingProvider`] over the OpenAI `/embeddings` wire format.
///
/// Works against api.openai.com or any compatible gateway; the base URL
/// and model name come from [`EmbeddingConfig`]. One HTTPS round trip
/// per call, no caching, no retries.
pub struct OpenAiEmbedder {
    client: Client,
    config: EmbeddingConfig,
}

impl OpenAiEmbedder {
    /// Build a client from explicit configuration. Fails fast when the
    /// key is absent rather than on the first query.
    pub fn new(config: EmbeddingConfig) -> Result<Self, EmbeddingError> {
        if config.api_key.is_none() {
            return Err(EmbeddingError::MissingApiKey);
        }
        Ok(Self {
            client: Client::new(),
            config,
        })
    }

    /// Build a client from `OPENAI_API_KEY` and the `AUDITGRAPH_*`
    /// environment, via [`EmbeddingConfig::from_env`].
    pub fn from_env() -> Result<Self, EmbeddingError> {
        Self::new(EmbeddingConfig::from_env())
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    fn endpoint(&self) -> String {
        format!("{}/embeddings", self.config.api_base.trim_end_matches('/'))
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAiEmbedder {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let key = self
            .config
            .api_key
            .as_deref()
            .ok_or(EmbeddingError::MissingApiKey)?;

        debug!(model = %self.config.model, batch = texts.len(), "embedding request");

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(key)
            .json(&EmbeddingsRequest {
                model: &self.config.model,
                input: texts,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(EmbeddingError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let payload: EmbeddingsResponse = response.json().await?;
        if payload.data.len() != texts.len() {
            return Err(EmbeddingError::EmptyResponse);
        }

        // The service reports an index per vector; order by it rather
        // than trusting response order.
        let mut data = payload.data;
        data.sort_by_key(|object| object.index);
        Ok(data.into_iter().map(|object| object.embedding).collect())
    }
}
