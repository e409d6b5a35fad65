//! In-process graph store backed by insertion-ordered maps.
//!
//! Used by tests and demos, and as the reference implementation of the
//! [`GraphStore`] contract: the sqlite store must be observationally
//! identical to this one for the same graph.

use std::collections::VecDeque;

use async_trait::async_trait;
use parking_lot::RwLock;
use rustc_hash::{FxHashMap, FxHashSet};

use super::{
    EdgeKind, Expansion, GraphEdge, GraphNode, GraphStore, NameMatch, NodeData, NodeId, NodeLabel,
    StoreError,
};

#[derive(Default)]
struct Inner {
    nodes: FxHashMap<NodeId, GraphNode>,
    /// Node ids in insertion order; keeps `all_embedded_nodes` and name
    /// lookups deterministic across runs.
    order: Vec<NodeId>,
    out_edges: FxHashMap<NodeId, Vec<GraphEdge>>,
    in_edges: FxHashMap<NodeId, Vec<GraphEdge>>,
}

/// In-memory [`GraphStore`].
///
/// Interior mutability via a `parking_lot::RwLock`; no lock is ever held
/// across an await point.
#[derive(Default)]
pub struct MemoryGraphStore {
    inner: RwLock<Inner>,
}

impl MemoryGraphStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a node under a freshly generated id and return that id.
    pub fn insert_node(&self, data: NodeData) -> NodeId {
        let id = NodeId::generate();
        self.insert_node_with_id(id.clone(), data);
        id
    }

    /// Insert (or replace) a node under a caller-chosen id.
    pub fn insert_node_with_id(&self, id: impl Into<NodeId>, data: NodeData) -> NodeId {
        let id = id.into();
        let mut inner = self.inner.write();
        if !inner.nodes.contains_key(&id) {
            inner.order.push(id.clone());
        }
        inner.nodes.insert(id.clone(), GraphNode::new(id.clone(), data));
        id
    }

    /// Record a directed edge. Repeating an identical edge is a no-op.
    pub fn insert_edge(&self, kind: EdgeKind, src: &NodeId, dst: &NodeId) {
        let edge = GraphEdge::new(kind, src.clone(), dst.clone());
        let mut inner = self.inner.write();
        let out = inner.out_edges.entry(src.clone()).or_default();
        if out.contains(&edge) {
            return;
        }
        out.push(edge.clone());
        inner.in_edges.entry(dst.clone()).or_default().push(edge);
    }

    pub fn node_count(&self) -> usize {
        self.inner.read().nodes.len()
    }
}

/// Breadth-first walk in one direction, appending discoveries to the
/// shared node/edge lists.
fn walk(
    inner: &Inner,
    start: &NodeId,
    forward: bool,
    node_seen: &mut FxHashSet<NodeId>,
    edge_seen: &mut FxHashSet<GraphEdge>,
    nodes: &mut Vec<GraphNode>,
    edges: &mut Vec<GraphEdge>,
) {
    let adjacency = if forward {
        &inner.out_edges
    } else {
        &inner.in_edges
    };

    let mut visited: FxHashSet<NodeId> = FxHashSet::default();
    visited.insert(start.clone());
    let mut queue: VecDeque<NodeId> = VecDeque::from([start.clone()]);

    while let Some(current) = queue.pop_front() {
        let Some(adjacent) = adjacency.get(&current) else {
            continue;
        };
        for edge in adjacent {
            if edge_seen.insert(edge.clone()) {
                edges.push(edge.clone());
            }
            let next = if forward { &edge.dst } else { &edge.src };
            if node_seen.insert(next.clone()) {
                if let Some(node) = inner.nodes.get(next) {
                    nodes.push(node.clone());
                }
            }
            if visited.insert(next.clone()) {
                queue.push_back(next.clone());
            }
        }
    }
}

#[async_trait]
impl GraphStore for MemoryGraphStore {
    async fn all_embedded_nodes(&self) -> Result<Vec<(NodeId, Vec<f32>)>, StoreError> {
        let inner = self.inner.read();
        let mut pairs = Vec::new();
        for id in &inner.order {
            let node = &inner.nodes[id];
            if let Some(embedding) = node.embedding() {
                pairs.push((id.clone(), embedding.to_vec()));
            }
        }
        Ok(pairs)
    }

    async fn expand(&self, id: &NodeId) -> Result<Expansion, StoreError> {
        let inner = self.inner.read();
        let Some(seed) = inner.nodes.get(id) else {
            return Ok(Expansion::default());
        };

        let mut node_seen: FxHashSet<NodeId> = FxHashSet::default();
        let mut edge_seen: FxHashSet<GraphEdge> = FxHashSet::default();
        let mut nodes = vec![seed.clone()];
        node_seen.insert(id.clone());
        let mut edges = Vec::new();

        walk(
            &inner, id, true, &mut node_seen, &mut edge_seen, &mut nodes, &mut edges,
        );
        walk(
            &inner, id, false, &mut node_seen, &mut edge_seen, &mut nodes, &mut edges,
        );

        Ok(Expansion { nodes, edges })
    }

    async fn find_by_name_like(
        &self,
        label: NodeLabel,
        pattern: &str,
    ) -> Result<Vec<NameMatch>, StoreError> {
        let needle = pattern.to_lowercase();
        let inner = self.inner.read();
        let mut matches = Vec::new();
        for id in &inner.order {
            let node = &inner.nodes[id];
            if node.label() != label {
                continue;
            }
            if let Some(name) = node.data.name() {
                if name.to_lowercase().contains(&needle) {
                    matches.push(NameMatch {
                        id: id.clone(),
                        name: name.to_string(),
                    });
                }
            }
        }
        Ok(matches)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Auditor -> Company -> Report -> Opinion -> Audit, returning the
    /// ids in that order.
    fn chain(store: &MemoryGraphStore) -> [NodeId; 5] {
        let auditor = store.insert_node_with_id(
            "auditor-1",
            NodeData::Auditor {
                name: "Deloitte".into(),
            },
        );
        let company = store.insert_node_with_id(
            "company-1",
            NodeData::Company {
                name: "Alexanders Inc".into(),
            },
        );
        let report = store.insert_node_with_id(
            "report-1",
            NodeData::Report {
                name: "FY2023 10-K".into(),
                text: "Annual audit report for Alexanders Inc".into(),
                embedding: Some(vec![1.0, 0.0]),
            },
        );
        let opinion = store.insert_node_with_id(
            "opinion-1",
            NodeData::Opinion {
                text: "Unqualified opinion".into(),
                embedding: Some(vec![0.0, 1.0]),
            },
        );
        let audit = store.insert_node_with_id(
            "audit-1",
            NodeData::Audit {
                name: "Revenue recognition".into(),
                opinion: "No material misstatement".into(),
                embedding: Some(vec![1.0, 1.0]),
            },
        );
        store.insert_edge(EdgeKind::Audits, &auditor, &company);
        store.insert_edge(EdgeKind::HasReport, &company, &report);
        store.insert_edge(EdgeKind::ContainsOpinion, &report, &opinion);
        store.insert_edge(EdgeKind::HasAudit, &opinion, &audit);
        [auditor, company, report, opinion, audit]
    }

    #[tokio::test]
    async fn expand_from_middle_covers_whole_chain() {
        let store = MemoryGraphStore::new();
        let [_, _, report, ..] = chain(&store);

        let expansion = store.expand(&report).await.unwrap();
        assert_eq!(expansion.nodes.len(), 5);
        assert_eq!(expansion.edges.len(), 4);
        assert_eq!(expansion.seed().unwrap().id, report);

        // Forward discoveries precede backward ones.
        let labels: Vec<NodeLabel> = expansion.nodes.iter().map(|n| n.label()).collect();
        assert_eq!(
            labels,
            vec![
                NodeLabel::Report,
                NodeLabel::Opinion,
                NodeLabel::Audit,
                NodeLabel::Company,
                NodeLabel::Auditor,
            ]
        );
    }

    #[tokio::test]
    async fn expansion_is_symmetric_along_the_chain() {
        let store = MemoryGraphStore::new();
        let [auditor, _, report, _, audit] = chain(&store);

        let mut from_report: Vec<NodeId> = store
            .expand(&report)
            .await
            .unwrap()
            .nodes
            .into_iter()
            .map(|n| n.id)
            .collect();
        let mut from_auditor: Vec<NodeId> = store
            .expand(&auditor)
            .await
            .unwrap()
            .nodes
            .into_iter()
            .map(|n| n.id)
            .collect();
        let mut from_audit: Vec<NodeId> = store
            .expand(&audit)
            .await
            .unwrap()
            .nodes
            .into_iter()
            .map(|n| n.id)
            .collect();
        from_report.sort();
        from_auditor.sort();
        from_audit.sort();
        assert_eq!(from_report, from_auditor);
        assert_eq!(from_report, from_audit);
    }

    #[tokio::test]
    async fn isolated_node_expands_to_itself() {
        let store = MemoryGraphStore::new();
        let lone = store.insert_node(NodeData::Company {
            name: "Orphan Holdings".into(),
        });

        let expansion = store.expand(&lone).await.unwrap();
        assert_eq!(expansion.nodes.len(), 1);
        assert!(expansion.edges.is_empty());
    }

    #[tokio::test]
    async fn unknown_seed_yields_empty_expansion() {
        let store = MemoryGraphStore::new();
        chain(&store);
        let expansion = store.expand(&NodeId::from("no-such-node")).await.unwrap();
        assert!(expansion.is_empty());
    }

    #[tokio::test]
    async fn embedded_nodes_keep_insertion_order() {
        let store = MemoryGraphStore::new();
        let [_, _, report, opinion, audit] = chain(&store);

        let pairs = store.all_embedded_nodes().await.unwrap();
        let ids: Vec<NodeId> = pairs.iter().map(|(id, _)| id.clone()).collect();
        assert_eq!(ids, vec![report, opinion, audit]);
    }

    #[tokio::test]
    async fn name_lookup_is_case_insensitive_substring() {
        let store = MemoryGraphStore::new();
        chain(&store);

        let hits = store
            .find_by_name_like(NodeLabel::Auditor, "deLLo")
            .await
            .unwrap();
        assert!(hits.is_empty());

        let hits = store
            .find_by_name_like(NodeLabel::Auditor, "delo")
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name, "Deloitte");

        // Label scoping: the pattern matches a company name, not auditors.
        let hits = store
            .find_by_name_like(NodeLabel::Auditor, "alexanders")
            .await
            .unwrap();
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn duplicate_edges_collapse() {
        let store = MemoryGraphStore::new();
        let a = store.insert_node(NodeData::Auditor { name: "KPMG".into() });
        let c = store.insert_node(NodeData::Company { name: "Acme".into() });
        store.insert_edge(EdgeKind::Audits, &a, &c);
        store.insert_edge(EdgeKind::Audits, &a, &c);

        let expansion = store.expand(&a).await.unwrap();
        assert_eq!(expansion.edges.len(), 1);
    }
}
