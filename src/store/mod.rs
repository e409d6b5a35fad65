//! Graph domain model and the persistence seam.
//!
//! The knowledge graph holds one node per audit-domain entity and one
//! directed, typed edge per relation. The forward chain is always:
//!
//! ```text
//! Auditor ─AUDITS─► Company ─HAS_REPORT─► Report
//!         ─CONTAINS_OPINION─► Opinion ─HAS_AUDIT─► Audit
//! ```
//!
//! [`GraphStore`] abstracts over where that graph lives. Two
//! implementations ship with the crate:
//!
//! - [`MemoryGraphStore`](memory::MemoryGraphStore) — in-process maps,
//!   used by tests and demos.
//! - [`SqliteGraphStore`](sqlite::SqliteGraphStore) — sqlx-backed
//!   persistent store (behind the default `sqlite` feature).
//!
//! Stores are read through exactly three operations: enumerate embedded
//! nodes (to build the vector index), expand the connected chain around a
//! seed node (to assemble evidence), and look up nodes by approximate
//! name (disambiguation). Writes are inherent methods on the concrete
//! stores; ingestion pipelines live outside this crate.

pub mod memory;
#[cfg(feature = "sqlite")]
pub mod sqlite;

use std::fmt;

use async_trait::async_trait;
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use memory::MemoryGraphStore;
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteGraphStore;

/// Opaque node identity, unique within one store.
///
/// Ids are treated as plain strings end to end: the sqlite store keys its
/// rows by them, the vector index carries them alongside embeddings, and
/// the evidence artifact for a seed is named `<id>.png`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Mint a fresh random id for a newly inserted node.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for NodeId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// The five entity labels of the audit domain. Mutually exclusive: every
/// node carries exactly one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeLabel {
    Company,
    Auditor,
    Report,
    Opinion,
    Audit,
}

impl NodeLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeLabel::Company => "Company",
            NodeLabel::Auditor => "Auditor",
            NodeLabel::Report => "Report",
            NodeLabel::Opinion => "Opinion",
            NodeLabel::Audit => "Audit",
        }
    }

    /// Decode a persisted label. Unknown strings are a data defect, so
    /// this returns `None` rather than inventing a fallback variant.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Company" => Some(NodeLabel::Company),
            "Auditor" => Some(NodeLabel::Auditor),
            "Report" => Some(NodeLabel::Report),
            "Opinion" => Some(NodeLabel::Opinion),
            "Audit" => Some(NodeLabel::Audit),
            _ => None,
        }
    }
}

impl fmt::Display for NodeLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-label payload: one variant per label, each carrying only the
/// fields that label has.
///
/// Companies and auditors are never embedded; reports, opinions, and
/// audits optionally carry the embedding computed from their text at
/// ingestion time. A node without an embedding is invisible to vector
/// search but still participates in expansion.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum NodeData {
    Company {
        name: String,
    },
    Auditor {
        name: String,
    },
    Report {
        name: String,
        text: String,
        embedding: Option<Vec<f32>>,
    },
    Opinion {
        text: String,
        embedding: Option<Vec<f32>>,
    },
    Audit {
        name: String,
        opinion: String,
        embedding: Option<Vec<f32>>,
    },
}

impl NodeData {
    pub fn label(&self) -> NodeLabel {
        match self {
            NodeData::Company { .. } => NodeLabel::Company,
            NodeData::Auditor { .. } => NodeLabel::Auditor,
            NodeData::Report { .. } => NodeLabel::Report,
            NodeData::Opinion { .. } => NodeLabel::Opinion,
            NodeData::Audit { .. } => NodeLabel::Audit,
        }
    }

    /// Display name, when the label has one. Opinions are identified by
    /// their text alone and have no name.
    pub fn name(&self) -> Option<&str> {
        match self {
            NodeData::Company { name }
            | NodeData::Auditor { name }
            | NodeData::Report { name, .. }
            | NodeData::Audit { name, .. } => Some(name),
            NodeData::Opinion { .. } => None,
        }
    }

    pub fn embedding(&self) -> Option<&[f32]> {
        match self {
            NodeData::Report { embedding, .. }
            | NodeData::Opinion { embedding, .. }
            | NodeData::Audit { embedding, .. } => embedding.as_deref(),
            NodeData::Company { .. } | NodeData::Auditor { .. } => None,
        }
    }
}

/// A labeled node with its identity.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: NodeId,
    pub data: NodeData,
}

impl GraphNode {
    pub fn new(id: impl Into<NodeId>, data: NodeData) -> Self {
        Self {
            id: id.into(),
            data,
        }
    }

    pub fn label(&self) -> NodeLabel {
        self.data.label()
    }

    pub fn embedding(&self) -> Option<&[f32]> {
        self.data.embedding()
    }
}

/// The four relation types, in forward-chain order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EdgeKind {
    Audits,
    HasReport,
    ContainsOpinion,
    HasAudit,
}

impl EdgeKind {
    /// Wire name as stored in the graph (`AUDITS`, `HAS_REPORT`, ...).
    pub fn as_str(&self) -> &'static str {
        match self {
            EdgeKind::Audits => "AUDITS",
            EdgeKind::HasReport => "HAS_REPORT",
            EdgeKind::ContainsOpinion => "CONTAINS_OPINION",
            EdgeKind::HasAudit => "HAS_AUDIT",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "AUDITS" => Some(EdgeKind::Audits),
            "HAS_REPORT" => Some(EdgeKind::HasReport),
            "CONTAINS_OPINION" => Some(EdgeKind::ContainsOpinion),
            "HAS_AUDIT" => Some(EdgeKind::HasAudit),
            _ => None,
        }
    }
}

impl fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A directed, typed edge between two node ids.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GraphEdge {
    pub kind: EdgeKind,
    pub src: NodeId,
    pub dst: NodeId,
}

impl GraphEdge {
    pub fn new(kind: EdgeKind, src: impl Into<NodeId>, dst: impl Into<NodeId>) -> Self {
        Self {
            kind,
            src: src.into(),
            dst: dst.into(),
        }
    }
}

/// The connected chain around a seed node.
///
/// `nodes` is in deterministic visit order: the seed first, then the
/// forward transitive closure in breadth-first order, then the backward
/// closure likewise. Evidence classification depends on this order (the
/// last visited node of a label wins a record slot), so implementations
/// must not reorder it. `edges` follows the same discovery order, with
/// duplicates removed.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Expansion {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

impl Expansion {
    /// The seed node, when the seed id matched anything at all.
    pub fn seed(&self) -> Option<&GraphNode> {
        self.nodes.first()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Look up a node of this expansion by id.
    pub fn node(&self, id: &NodeId) -> Option<&GraphNode> {
        self.nodes.iter().find(|n| &n.id == id)
    }
}

/// A disambiguation hit from [`GraphStore::find_by_name_like`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameMatch {
    pub id: NodeId,
    pub name: String,
}

/// Errors from graph store operations.
///
/// A missing node or an empty match is never an error: those come back
/// as empty collections. Errors mean the store itself misbehaved.
#[derive(Debug, Error, Diagnostic)]
pub enum StoreError {
    /// The underlying connection could not be established or was lost.
    #[error("graph store unavailable: {message}")]
    #[diagnostic(
        code(auditgraph::store::unavailable),
        help("Check the store URL and credentials, and that the database is reachable.")
    )]
    Unavailable { message: String },

    /// The backend accepted the connection but an operation failed.
    #[error("graph store backend error: {message}")]
    #[diagnostic(code(auditgraph::store::backend))]
    Backend { message: String },

    /// A persisted row could not be decoded into a domain value.
    #[error("corrupt graph data: {message}")]
    #[diagnostic(
        code(auditgraph::store::corrupt),
        help("The stored row violates the node/edge schema; re-ingest the offending entity.")
    )]
    Corrupt { message: String },
}

/// Read seam over the knowledge graph.
///
/// All operations surface [`StoreError::Unavailable`] when the
/// connection cannot be established, and return empty collections (not
/// errors) when nothing matches.
#[async_trait]
pub trait GraphStore: Send + Sync {
    /// Every node carrying an embedding, paired with that embedding.
    /// Feed for [`VectorIndex::build`](crate::index::VectorIndex::build).
    async fn all_embedded_nodes(&self) -> Result<Vec<(NodeId, Vec<f32>)>, StoreError>;

    /// Forward plus backward transitive closure around `id`, to any
    /// depth. Expanding an unknown id yields an empty expansion.
    async fn expand(&self, id: &NodeId) -> Result<Expansion, StoreError>;

    /// Case-insensitive substring match on node name within one label.
    async fn find_by_name_like(
        &self,
        label: NodeLabel,
        pattern: &str,
    ) -> Result<Vec<NameMatch>, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edge_kind_wire_names_round_trip() {
        for kind in [
            EdgeKind::Audits,
            EdgeKind::HasReport,
            EdgeKind::ContainsOpinion,
            EdgeKind::HasAudit,
        ] {
            assert_eq!(EdgeKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(EdgeKind::parse("KNOWS"), None);
    }

    #[test]
    fn label_parse_rejects_unknown() {
        assert_eq!(NodeLabel::parse("Report"), Some(NodeLabel::Report));
        assert_eq!(NodeLabel::parse("report"), None);
    }

    #[test]
    fn node_data_accessors_follow_label() {
        let report = NodeData::Report {
            name: "FY2023 10-K".into(),
            text: "Annual report".into(),
            embedding: Some(vec![0.1, 0.2]),
        };
        assert_eq!(report.label(), NodeLabel::Report);
        assert_eq!(report.name(), Some("FY2023 10-K"));
        assert_eq!(report.embedding(), Some(&[0.1f32, 0.2][..]));

        let opinion = NodeData::Opinion {
            text: "Unqualified".into(),
            embedding: None,
        };
        assert_eq!(opinion.name(), None);
        assert_eq!(opinion.embedding(), None);

        let company = NodeData::Company {
            name: "Acme Corp".into(),
        };
        assert_eq!(company.embedding(), None, "companies are never embedded");
    }

    #[test]
    fn expansion_seed_is_first_visited() {
        let seed = GraphNode::new(
            "n1",
            NodeData::Company {
                name: "Acme".into(),
            },
        );
        let expansion = Expansion {
            nodes: vec![seed.clone()],
            edges: vec![],
        };
        assert_eq!(expansion.seed(), Some(&seed));
        assert!(Expansion::default().seed().is_none());
    }
}
