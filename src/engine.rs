//! Retrieval orchestration: query text in, evidence records out.
//!
//! [`RetrievalEngine`] composes the embedding provider, the vector
//! index, and the evidence builder:
//!
//! ```text
//! query ──► EmbeddingProvider::embed
//!       ──► IndexSlot (built lazily from GraphStore::all_embedded_nodes)
//!       ──► top-2 nearest seeds, distance cutoff applied
//!       ──► EvidenceBuilder::build_record per surviving seed
//!       ──► Vec<EvidenceRecord>, ascending distance
//! ```
//!
//! One query resolves completely before the caller issues the next; the
//! only cross-query state is the index snapshot, which is read through
//! an `Arc` clone and replaced wholesale on rebuild. An empty result is
//! the ordinary "no evidence" answer, never an error.
//!
//! ```no_run
//! use std::sync::Arc;
//! use auditgraph::config::EngineConfig;
//! use auditgraph::embeddings::OpenAiEmbedder;
//! use auditgraph::engine::RetrievalEngine;
//! use auditgraph::store::SqliteGraphStore;
//!
//! # async fn run() -> miette::Result<()> {
//! let store = Arc::new(SqliteGraphStore::connect("sqlite://audit.db?mode=rwc").await?);
//! let embedder = Arc::new(OpenAiEmbedder::from_env()?);
//! let engine = RetrievalEngine::new(store, embedder, EngineConfig::default());
//!
//! for record in engine.handle_query("audit findings for Alexanders Inc", 0.4).await? {
//!     println!("{:?} -> {:?}", record.company_name, record.graph);
//! }
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use miette::Diagnostic;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::config::EngineConfig;
use crate::embeddings::{EmbeddingError, EmbeddingProvider};
use crate::evidence::{EvidenceBuilder, EvidenceRecord};
use crate::index::{IndexError, IndexSlot, VectorIndex};
use crate::store::{GraphStore, NameMatch, NodeLabel, StoreError};

/// Failures a query can surface. "No evidence" is not among them: that
/// is an empty `Ok`, so callers can always tell an empty answer from a
/// broken upstream.
#[derive(Debug, Error, Diagnostic)]
pub enum RetrievalError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Embedding(#[from] EmbeddingError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Index(#[from] IndexError),
}

/// Top-level entry point over one graph store and one embedding
/// provider.
pub struct RetrievalEngine<S> {
    store: Arc<S>,
    embedder: Arc<dyn EmbeddingProvider>,
    index: IndexSlot,
    builder: EvidenceBuilder<S>,
    top_k: usize,
}

impl<S: GraphStore> RetrievalEngine<S> {
    pub fn new(store: Arc<S>, embedder: Arc<dyn EmbeddingProvider>, config: EngineConfig) -> Self {
        let builder = EvidenceBuilder::new(store.clone(), config.artifact_dir);
        Self {
            store,
            embedder,
            index: IndexSlot::new(),
            builder,
            top_k: config.top_k,
        }
    }

    /// Answer a query with evidence records, nearest seed first.
    ///
    /// Seeds whose squared-L2 distance exceeds `distance_cutoff` are
    /// dropped; when none survive (or no embedded nodes exist yet) the
    /// result is an empty vector.
    #[instrument(skip(self, query), err)]
    pub async fn handle_query(
        &self,
        query: &str,
        distance_cutoff: f32,
    ) -> Result<Vec<EvidenceRecord>, RetrievalError> {
        let query_vector = self.embedder.embed(query).await?;

        let Some(index) = self.ensure_index().await? else {
            return Ok(Vec::new());
        };

        let hits = index.search(&query_vector, self.top_k)?;
        debug!(hits = hits.len(), "nearest neighbors");

        let mut records = Vec::new();
        for (seed, distance) in hits {
            if distance > distance_cutoff {
                debug!(%seed, distance, distance_cutoff, "seed beyond cutoff, dropped");
                continue;
            }
            debug!(%seed, distance, "expanding seed");
            records.push(self.builder.build_record(&seed).await?);
        }

        info!(records = records.len(), "query resolved");
        Ok(records)
    }

    /// Build the index if this process has not built one yet.
    ///
    /// `None` means the store holds no embedded nodes: the caller
    /// reports "no evidence available" rather than crashing, and the
    /// next query retries the build.
    async fn ensure_index(&self) -> Result<Option<Arc<VectorIndex>>, RetrievalError> {
        if let Some(snapshot) = self.index.snapshot() {
            return Ok(Some(snapshot));
        }

        let pairs = self.store.all_embedded_nodes().await?;
        if pairs.is_empty() {
            warn!("no embedded nodes in store; index not built");
            return Ok(None);
        }

        let count = pairs.len();
        let built = VectorIndex::build(pairs)?;
        info!(nodes = count, dimension = built.dimension(), "vector index built");
        Ok(Some(self.index.install(built)))
    }

    /// Rebuild the index from the store's current contents.
    ///
    /// The engine never observes graph mutations on its own; callers
    /// needing freshness invoke this explicitly. The new snapshot is
    /// swapped in whole; in-flight searches finish on the old one.
    /// Fails with [`IndexError::EmptyIndex`] when the store has no
    /// embedded nodes.
    #[instrument(skip(self), err)]
    pub async fn rebuild_index(&self) -> Result<(), RetrievalError> {
        let pairs = self.store.all_embedded_nodes().await?;
        let built = VectorIndex::build(pairs)?;
        info!(nodes = built.len(), "vector index rebuilt");
        self.index.install(built);
        Ok(())
    }

    /// Whether a snapshot is currently installed.
    pub fn index_built(&self) -> bool {
        self.index.is_built()
    }

    /// Disambiguation lookup, passed through to the store.
    pub async fn find_by_name_like(
        &self,
        label: NodeLabel,
        pattern: &str,
    ) -> Result<Vec<NameMatch>, RetrievalError> {
        Ok(self.store.find_by_name_like(label, pattern).await?)
    }
}
