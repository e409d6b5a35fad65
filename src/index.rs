//! Flat nearest-neighbor index over embedded graph nodes.
//!
//! [`VectorIndex`] is an exhaustive squared-L2 index: an ordered list of
//! node ids kept positionally aligned with a row-major embedding matrix.
//! Search is O(n) per query, which is the right trade for this crate's
//! corpus shape (one small graph per deployment); an approximate index
//! may replace it only if it preserves the ordering contract for equal
//! inputs.
//!
//! [`IndexSlot`] is the process-wide holder the engine reads through:
//! built lazily on first use, kept for the life of the process, and
//! rebuilt on demand by swapping in a freshly built snapshot. Readers
//! clone the `Arc` and are never exposed to a partially built index.
//!
//! ```
//! use auditgraph::index::VectorIndex;
//! use auditgraph::store::NodeId;
//!
//! let index = VectorIndex::build(vec![
//!     (NodeId::from("a"), vec![0.0, 0.0]),
//!     (NodeId::from("b"), vec![3.0, 4.0]),
//! ])
//! .unwrap();
//!
//! let hits = index.search(&[0.0, 0.0], 2).unwrap();
//! assert_eq!(hits[0].0, NodeId::from("a"));
//! assert_eq!(hits[1].1, 25.0); // squared euclidean distance
//! ```

use std::sync::Arc;

use miette::Diagnostic;
use parking_lot::RwLock;
use thiserror::Error;

use crate::store::NodeId;

/// Errors from index construction and search.
#[derive(Debug, Error, Diagnostic)]
pub enum IndexError {
    /// No embeddable nodes exist yet; there is nothing to index.
    #[error("no embedded nodes to index")]
    #[diagnostic(
        code(auditgraph::index::empty),
        help("Ingest at least one report, opinion, or audit before querying.")
    )]
    EmptyIndex,

    /// Search was attempted before any index was built.
    #[error("vector index not built")]
    #[diagnostic(
        code(auditgraph::index::not_built),
        help("Build the index (the engine does this lazily) before searching.")
    )]
    NotBuilt,

    /// A vector's length disagrees with the index dimensionality.
    #[error("embedding dimension mismatch: expected {expected}, got {actual}")]
    #[diagnostic(code(auditgraph::index::dimension))]
    DimensionMismatch { expected: usize, actual: usize },
}

/// Immutable flat L2 index: ids parallel to a row-major matrix.
#[derive(Debug, Clone)]
pub struct VectorIndex {
    ids: Vec<NodeId>,
    matrix: Vec<f32>,
    dimension: usize,
}

impl VectorIndex {
    /// Build an index from `(node_id, vector)` pairs.
    ///
    /// The pair order is significant: search ties are broken in favor of
    /// earlier pairs. Fails with [`IndexError::EmptyIndex`] when `pairs`
    /// is empty and [`IndexError::DimensionMismatch`] when the vectors
    /// are ragged.
    pub fn build(
        pairs: impl IntoIterator<Item = (NodeId, Vec<f32>)>,
    ) -> Result<Self, IndexError> {
        let mut ids = Vec::new();
        let mut matrix = Vec::new();
        let mut dimension = 0usize;

        for (id, vector) in pairs {
            if ids.is_empty() {
                dimension = vector.len();
            } else if vector.len() != dimension {
                return Err(IndexError::DimensionMismatch {
                    expected: dimension,
                    actual: vector.len(),
                });
            }
            ids.push(id);
            matrix.extend_from_slice(&vector);
        }

        if ids.is_empty() {
            return Err(IndexError::EmptyIndex);
        }

        Ok(Self {
            ids,
            matrix,
            dimension,
        })
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Up to `k` nearest neighbors by squared euclidean distance,
    /// ascending, ties broken by insertion order.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<(NodeId, f32)>, IndexError> {
        if query.len() != self.dimension {
            return Err(IndexError::DimensionMismatch {
                expected: self.dimension,
                actual: query.len(),
            });
        }

        let mut scored: Vec<(usize, f32)> = self
            .matrix
            .chunks_exact(self.dimension)
            .enumerate()
            .map(|(row, vector)| {
                let distance = vector
                    .iter()
                    .zip(query)
                    .map(|(a, b)| {
                        let d = a - b;
                        d * d
                    })
                    .sum::<f32>();
                (row, distance)
            })
            .collect();

        // Stable sort: equal distances keep their insertion order.
        scored.sort_by(|a, b| a.1.total_cmp(&b.1));
        scored.truncate(k);

        Ok(scored
            .into_iter()
            .map(|(row, distance)| (self.ids[row].clone(), distance))
            .collect())
    }
}

/// Process-wide, swappable index snapshot.
///
/// Reads hand out `Arc` clones, so an in-flight search keeps working on
/// the snapshot it started with while [`IndexSlot::install`] swaps in a
/// replacement (copy-then-swap, never mutate-in-place).
#[derive(Default)]
pub struct IndexSlot {
    current: RwLock<Option<Arc<VectorIndex>>>,
}

impl IndexSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// The current snapshot, if one has been built.
    pub fn snapshot(&self) -> Option<Arc<VectorIndex>> {
        self.current.read().clone()
    }

    pub fn is_built(&self) -> bool {
        self.current.read().is_some()
    }

    /// Atomically replace the snapshot, returning the installed handle.
    pub fn install(&self, index: VectorIndex) -> Arc<VectorIndex> {
        let index = Arc::new(index);
        *self.current.write() = Some(index.clone());
        index
    }

    /// Drop the snapshot; the next ensure-built path will rebuild.
    pub fn clear(&self) {
        *self.current.write() = None;
    }

    /// Search through the current snapshot.
    ///
    /// Fails with [`IndexError::NotBuilt`] when nothing has been
    /// installed; the engine's lazy build prevents that on its own path.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<(NodeId, f32)>, IndexError> {
        match self.snapshot() {
            Some(index) => index.search(query, k),
            None => Err(IndexError::NotBuilt),
        }
    }
}
