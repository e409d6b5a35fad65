//! Shared fixtures for integration tests.

use std::sync::Arc;

use auditgraph::embeddings::MockEmbeddingProvider;
use auditgraph::store::{EdgeKind, MemoryGraphStore, NodeData, NodeId};

pub const REPORT_TEXT: &str = "Annual audit report for Alexanders Inc covering fiscal year 2023";
pub const OPINION_TEXT: &str = "Unqualified opinion on the consolidated financial statements";
pub const AUDIT_NAME: &str = "Revenue recognition audit";
pub const AUDIT_OPINION: &str = "No material misstatement identified";

pub struct ChainIds {
    pub auditor: NodeId,
    pub company: NodeId,
    pub report: NodeId,
    pub opinion: NodeId,
    pub audit: NodeId,
}

/// Populate `store` with one full Auditor → Company → Report → Opinion
/// → Audit chain whose embeddings come from `embedder`, so a query for
/// the exact node text lands at distance zero.
pub fn seed_chain(store: &Arc<MemoryGraphStore>, embedder: &MockEmbeddingProvider) -> ChainIds {
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
            text: REPORT_TEXT.into(),
            embedding: Some(embedder.vector_for(REPORT_TEXT)),
        },
    );
    let opinion = store.insert_node_with_id(
        "opinion-1",
        NodeData::Opinion {
            text: OPINION_TEXT.into(),
            embedding: Some(embedder.vector_for(OPINION_TEXT)),
        },
    );
    let audit = store.insert_node_with_id(
        "audit-1",
        NodeData::Audit {
            name: AUDIT_NAME.into(),
            opinion: AUDIT_OPINION.into(),
            embedding: Some(embedder.vector_for(&format!("{AUDIT_NAME}{AUDIT_OPINION}"))),
        },
    );

    store.insert_edge(EdgeKind::Audits, &auditor, &company);
    store.insert_edge(EdgeKind::HasReport, &company, &report);
    store.insert_edge(EdgeKind::ContainsOpinion, &report, &opinion);
    store.insert_edge(EdgeKind::HasAudit, &opinion, &audit);

    ChainIds {
        auditor,
        company,
        report,
        opinion,
        audit,
    }
}
