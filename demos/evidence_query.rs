//! End-to-end demo: seed a small audit graph, ask questions, inspect
//! the evidence.
//!
//! Run with:
//! ```bash
//! cargo run --example evidence_query
//! ```
//!
//! Uses the in-memory store and the deterministic mock embedder, so it
//! needs no database or API key. Swap in `SqliteGraphStore::connect`
//! and `OpenAiEmbedder::from_env` for the real thing.

use std::sync::Arc;

use auditgraph::config::{DEFAULT_DISTANCE_CUTOFF, EngineConfig};
use auditgraph::embeddings::MockEmbeddingProvider;
use auditgraph::engine::RetrievalEngine;
use auditgraph::store::{EdgeKind, MemoryGraphStore, NodeData, NodeLabel};

fn seed(store: &MemoryGraphStore, embedder: &MockEmbeddingProvider) {
    let filings = [
        (
            "Deloitte",
            "Alexanders Inc",
            "FY2023 10-K",
            "Annual audit report for Alexanders Inc covering revenue and leases",
            "Unqualified opinion on the consolidated financial statements",
            "Revenue recognition audit",
            "No material misstatement identified",
        ),
        (
            "Ernst & Young",
            "Microsoft Corporation",
            "FY2023 10-K",
            "Annual audit report for Microsoft Corporation covering cloud revenue",
            "Unqualified opinion with emphasis on deferred revenue",
            "Cloud revenue audit",
            "Controls operating effectively",
        ),
    ];

    for (auditor, company, report_name, report_text, opinion, audit_name, audit_opinion) in filings
    {
        let auditor = store.insert_node(NodeData::Auditor {
            name: auditor.into(),
        });
        let company = store.insert_node(NodeData::Company {
            name: company.into(),
        });
        let report = store.insert_node(NodeData::Report {
            name: report_name.into(),
            text: report_text.into(),
            embedding: Some(embedder.vector_for(report_text)),
        });
        let opinion_node = store.insert_node(NodeData::Opinion {
            text: opinion.into(),
            embedding: Some(embedder.vector_for(opinion)),
        });
        let audit = store.insert_node(NodeData::Audit {
            name: audit_name.into(),
            opinion: audit_opinion.into(),
            embedding: Some(embedder.vector_for(&format!("{audit_name}{audit_opinion}"))),
        });

        store.insert_edge(EdgeKind::Audits, &auditor, &company);
        store.insert_edge(EdgeKind::HasReport, &company, &report);
        store.insert_edge(EdgeKind::ContainsOpinion, &report, &opinion_node);
        store.insert_edge(EdgeKind::HasAudit, &opinion_node, &audit);
    }
}

#[tokio::main]
async fn main() -> miette::Result<()> {
    dotenvy::dotenv().ok();
    auditgraph::telemetry::init();

    let store = Arc::new(MemoryGraphStore::new());
    let embedder = Arc::new(MockEmbeddingProvider::new());
    seed(&store, &embedder);

    let engine = RetrievalEngine::new(
        store,
        embedder,
        EngineConfig::default().with_artifact_dir("evidence"),
    );

    // The mock embedder has no semantics, so query with the exact
    // report text; a real provider makes this a paraphrase match.
    let query = "Annual audit report for Alexanders Inc covering revenue and leases";
    println!("query: {query}\n");

    let records = engine.handle_query(query, DEFAULT_DISTANCE_CUTOFF).await?;
    if records.is_empty() {
        println!("no evidence found");
    }
    for (rank, record) in records.iter().enumerate() {
        println!("evidence #{}", rank + 1);
        println!("  company : {:?}", record.company_name);
        println!("  auditor : {:?}", record.auditor_name);
        println!("  report  : {:?}", record.report_name);
        println!("  opinion : {:?}", record.opinion);
        println!("  audit   : {:?} / {:?}", record.audit_name, record.audit_opinion);
        println!("  diagram : {:?}\n", record.graph);
    }

    let companies = engine
        .find_by_name_like(NodeLabel::Company, "micro")
        .await?;
    println!("companies matching 'micro': {companies:?}");

    Ok(())
}
