//! Configuration for the store, the embedding service, and the engine.
//!
//! Everything is constructible in code; the `from_env` constructors
//! layer `.env` files (via dotenvy) under real environment variables for
//! deployments that configure out-of-band, the same pattern the rest of
//! the process bootstrap uses.

use std::env;
use std::path::PathBuf;

/// Fast, inexpensive embedding model; the default.
pub const FAST_EMBEDDING_MODEL: &str = "text-embedding-ada-002";
/// Larger, higher-quality embedding model.
pub const LARGE_EMBEDDING_MODEL: &str = "text-embedding-3-large";

/// Default base URL for the embedding API.
pub const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";

/// Default nearest-neighbor count per query.
pub const DEFAULT_TOP_K: usize = 2;
/// Default squared-distance cutoff below which a seed counts as
/// evidence.
pub const DEFAULT_DISTANCE_CUTOFF: f32 = 0.4;

/// Connection descriptor for the graph store.
#[derive(Clone, Debug)]
pub struct StoreConfig {
    /// Store URL, e.g. `sqlite://auditgraph.db?mode=rwc`. Credentials,
    /// when a backend needs them, ride in the URL.
    pub url: String,
}

impl StoreConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    /// Read `AUDITGRAPH_STORE_URL`, defaulting to a local database file
    /// in the working directory.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        let url = env::var("AUDITGRAPH_STORE_URL")
            .unwrap_or_else(|_| "sqlite://auditgraph.db?mode=rwc".to_string());
        Self { url }
    }
}

/// Embedding service settings.
///
/// The model is chosen by configuration, not hardcoded: recognized
/// values include [`FAST_EMBEDDING_MODEL`] and [`LARGE_EMBEDDING_MODEL`],
/// and any other model name the configured endpoint accepts passes
/// through unchanged.
#[derive(Clone, Debug)]
pub struct EmbeddingConfig {
    pub model: String,
    pub api_base: String,
    pub api_key: Option<String>,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: FAST_EMBEDDING_MODEL.to_string(),
            api_base: DEFAULT_API_BASE.to_string(),
            api_key: None,
        }
    }
}

impl EmbeddingConfig {
    /// The fast default model.
    pub fn fast() -> Self {
        Self::default()
    }

    /// The larger, higher-quality model.
    pub fn large() -> Self {
        Self {
            model: LARGE_EMBEDDING_MODEL.to_string(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    #[must_use]
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    #[must_use]
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Read `OPENAI_API_KEY`, `AUDITGRAPH_EMBEDDING_MODEL`, and
    /// `AUDITGRAPH_EMBEDDING_API_BASE`.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        let mut config = Self::default();
        if let Ok(model) = env::var("AUDITGRAPH_EMBEDDING_MODEL") {
            config.model = model;
        }
        if let Ok(base) = env::var("AUDITGRAPH_EMBEDDING_API_BASE") {
            config.api_base = base;
        }
        config.api_key = env::var("OPENAI_API_KEY").ok();
        config
    }
}

/// Engine-level knobs.
#[derive(Clone, Debug)]
pub struct EngineConfig {
    /// Directory evidence diagrams are written into, one
    /// `<seed_node_id>.png` per record. The caller owns cleanup.
    pub artifact_dir: PathBuf,
    /// Nearest neighbors considered per query.
    pub top_k: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            artifact_dir: PathBuf::from("evidence"),
            top_k: DEFAULT_TOP_K,
        }
    }
}

impl EngineConfig {
    #[must_use]
    pub fn with_artifact_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.artifact_dir = dir.into();
        self
    }

    #[must_use]
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    /// Read `AUDITGRAPH_ARTIFACT_DIR`, keeping defaults otherwise.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        let mut config = Self::default();
        if let Ok(dir) = env::var("AUDITGRAPH_ARTIFACT_DIR") {
            config.artifact_dir = PathBuf::from(dir);
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_presets() {
        assert_eq!(EmbeddingConfig::fast().model, FAST_EMBEDDING_MODEL);
        assert_eq!(EmbeddingConfig::large().model, LARGE_EMBEDDING_MODEL);
        let custom = EmbeddingConfig::default().with_model("text-embedding-3-small");
        assert_eq!(custom.model, "text-embedding-3-small");
    }

    #[test]
    fn engine_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.top_k, 2);
        assert_eq!(config.artifact_dir, PathBuf::from("evidence"));
    }
}
