//! # Auditgraph: Graph-backed Audit Evidence Retrieval
//!
//! Auditgraph answers natural-language questions about corporate audit
//! reports by retrieving facts from a knowledge graph: the query is
//! embedded, matched against semantically indexed graph nodes, and every
//! hit is expanded into the full connected chain of related entities
//! (company, auditor, report, opinion, audit) with a rendered diagram of
//! that chain.
//!
//! ## Core Concepts
//!
//! - **Nodes and edges**: labeled audit entities linked by typed,
//!   directed relations (`AUDITS`, `HAS_REPORT`, `CONTAINS_OPINION`,
//!   `HAS_AUDIT`)
//! - **Seed**: a node surfaced by nearest-neighbor search over
//!   embeddings
//! - **Expansion**: the forward plus backward transitive closure of
//!   edges around a seed
//! - **Evidence record**: the per-seed structured summary of an
//!   expansion plus its diagram artifact
//!
//! ## Quick Start
//!
//! ```
//! use std::sync::Arc;
//! use auditgraph::config::EngineConfig;
//! use auditgraph::embeddings::MockEmbeddingProvider;
//! use auditgraph::engine::RetrievalEngine;
//! use auditgraph::store::{EdgeKind, MemoryGraphStore, NodeData};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> miette::Result<()> {
//! let store = Arc::new(MemoryGraphStore::new());
//! let embedder = Arc::new(MockEmbeddingProvider::new());
//!
//! let company = store.insert_node(NodeData::Company { name: "Acme".into() });
//! let report = store.insert_node(NodeData::Report {
//!     name: "FY2023 10-K".into(),
//!     text: "Annual audit report".into(),
//!     embedding: Some(embedder.vector_for("Annual audit report")),
//! });
//! store.insert_edge(EdgeKind::HasReport, &company, &report);
//!
//! let engine = RetrievalEngine::new(
//!     store,
//!     embedder,
//!     EngineConfig::default().with_artifact_dir(std::env::temp_dir()),
//! );
//! let records = engine.handle_query("Annual audit report", 0.5).await?;
//! assert_eq!(records[0].company_name.as_deref(), Some("Acme"));
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Guide
//!
//! - [`store`] - graph domain types and the persistence seam
//! - [`index`] - flat L2 vector index and its swappable snapshot
//! - [`embeddings`] - text-to-vector providers
//! - [`evidence`] - record assembly, display graph, layout, rendering
//! - [`engine`] - the `handle_query` entry point
//! - [`config`] - store/embedding/engine configuration
//! - [`telemetry`] - tracing bootstrap

pub mod config;
pub mod embeddings;
pub mod engine;
pub mod evidence;
pub mod index;
pub mod store;
pub mod telemetry;
