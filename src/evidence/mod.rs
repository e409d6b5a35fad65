//! Evidence assembly: expansion → record → diagram.
//!
//! An [`EvidenceRecord`] is the per-seed unit the caller receives from a
//! query: the entity names and texts found along the seed's connected
//! chain, plus the path of a rendered diagram of that chain. Records are
//! recomputed per query and never persisted; the calling layer may hold
//! one across a follow-up turn, the engine does not.

pub mod display;
pub mod layout;
pub mod render;

use std::path::PathBuf;
use std::sync::Arc;

use miette::Diagnostic;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::store::{Expansion, GraphStore, NodeData, NodeId, StoreError};

pub use display::{Color, DisplayGraph, DisplayVertex, PALETTE, wrap_label};

/// Internal evidence errors. Store failures pass through untouched;
/// rendering failures never leave the builder (the record's diagram
/// degrades to absent instead).
#[derive(Debug, Error, Diagnostic)]
pub enum EvidenceError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Store(#[from] StoreError),

    #[error("diagram rendering failed: {message}")]
    #[diagnostic(code(auditgraph::evidence::render))]
    Render { message: String },
}

/// Structured evidence for one seed node.
///
/// Every field is nullable: a slot is populated only when a node of the
/// matching label was visited while expanding the chain around the
/// seed. Serialized field names match the evidence contract consumed by
/// the chat layer (`CompanyName`, `ReportText`, `Graph`, ...).
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct EvidenceRecord {
    pub company_name: Option<String>,
    pub auditor_name: Option<String>,
    pub report_name: Option<String>,
    pub report_text: Option<String>,
    pub opinion: Option<String>,
    pub audit_name: Option<String>,
    pub audit_opinion: Option<String>,
    /// Path of the rendered subgraph diagram, absent when rendering
    /// failed or the seed matched nothing.
    pub graph: Option<PathBuf>,
}

impl EvidenceRecord {
    /// Fill record slots from the nodes of an expansion, in visit
    /// order. When several nodes share a label the last visited wins;
    /// a deliberate simplification, kept deterministic by the
    /// expansion's ordering contract.
    fn classify(expansion: &Expansion) -> Self {
        let mut record = EvidenceRecord::default();
        for node in &expansion.nodes {
            match &node.data {
                NodeData::Company { name } => {
                    record.company_name = Some(name.clone());
                }
                NodeData::Auditor { name } => {
                    record.auditor_name = Some(name.clone());
                }
                NodeData::Report { name, text, .. } => {
                    record.report_name = Some(name.clone());
                    record.report_text = Some(text.clone());
                }
                NodeData::Opinion { text, .. } => {
                    record.opinion = Some(text.clone());
                }
                NodeData::Audit { name, opinion, .. } => {
                    record.audit_name = Some(name.clone());
                    record.audit_opinion = Some(opinion.clone());
                }
            }
        }
        record
    }
}

/// Turns ranked seed ids into evidence records with diagrams.
pub struct EvidenceBuilder<S> {
    store: Arc<S>,
    artifact_dir: PathBuf,
}

impl<S: GraphStore> EvidenceBuilder<S> {
    pub fn new(store: Arc<S>, artifact_dir: impl Into<PathBuf>) -> Self {
        Self {
            store,
            artifact_dir: artifact_dir.into(),
        }
    }

    pub fn artifact_dir(&self) -> &std::path::Path {
        &self.artifact_dir
    }

    /// Expand `seed` and assemble its record.
    ///
    /// Store failures abort the record (and the query); a diagram
    /// failure only costs the `graph` field and is logged.
    pub async fn build_record(&self, seed: &NodeId) -> Result<EvidenceRecord, StoreError> {
        let expansion = self.store.expand(seed).await?;
        let mut record = EvidenceRecord::classify(&expansion);

        if expansion.is_empty() {
            debug!(%seed, "seed matched no node; empty evidence record");
            return Ok(record);
        }

        let display = DisplayGraph::from_expansion(&expansion);
        let path = self.artifact_dir.join(format!("{seed}.png"));
        match render::render_png(&display, &path) {
            Ok(()) => record.graph = Some(path),
            Err(error) => {
                warn!(%seed, %error, "diagram rendering failed; evidence degraded");
            }
        }

        Ok(record)
    }
}
