//! Text-to-vector providers.
//!
//! [`EmbeddingProvider`] is the seam between the retrieval engine and
//! whatever embedding service a deployment points at. Two providers ship
//! here: [`OpenAiEmbedder`] for OpenAI-compatible HTTP services and
//! [`MockEmbeddingProvider`] for deterministic offline tests.
//!
//! Providers make one outbound call per invocation and never cache;
//! failures are propagated unchanged so the caller owns retry policy.

pub mod mock;
pub mod openai;

use async_trait::async_trait;
use miette::Diagnostic;
use thiserror::Error;

pub use mock::MockEmbeddingProvider;
pub use openai::OpenAiEmbedder;

/// Errors from an embedding provider.
#[derive(Debug, Error, Diagnostic)]
pub enum EmbeddingError {
    /// No API key was configured for a provider that needs one.
    #[error("embedding service api key missing")]
    #[diagnostic(
        code(auditgraph::embeddings::missing_api_key),
        help("Set OPENAI_API_KEY or pass a key via EmbeddingConfig.")
    )]
    MissingApiKey,

    /// Transport-level failure reaching the service.
    #[error("embedding request failed: {0}")]
    #[diagnostic(code(auditgraph::embeddings::http))]
    Http(#[from] reqwest::Error),

    /// The service answered with a non-success status.
    #[error("embedding service error (status {status}): {message}")]
    #[diagnostic(code(auditgraph::embeddings::api))]
    Api { status: u16, message: String },

    /// The service answered success but returned no vectors.
    #[error("embedding service returned an empty response")]
    #[diagnostic(code(auditgraph::embeddings::empty_response))]
    EmptyResponse,
}

/// Turns text into fixed-length vectors.
///
/// The dimensionality is determined by the configured model and must be
/// consistent across calls within one deployment; the vector index
/// rejects ragged input.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a batch of documents, one vector per input, input order
    /// preserved.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError>;

    /// Embed a single query string.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let mut vectors = self.embed_batch(&[text.to_string()]).await?;
        vectors.pop().ok_or(EmbeddingError::EmptyResponse)
    }
}
