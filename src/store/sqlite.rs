/*!
SQLite graph store

sqlx-backed implementation of [`GraphStore`]. Nodes and edges live in two
tables; insertion order is the implicit `rowid`, which keeps index feeds
and traversal deterministic across runs.

## Behavior

- `connect` creates the database when the URL allows it
  (`sqlite://path?mode=rwc`) and bootstraps the schema idempotently.
- Sessions are scoped per operation: every query checks a connection out
  of the pool and returns it on every exit path, including errors.
- Connection-level failures surface as [`StoreError::Unavailable`];
  query-level failures as [`StoreError::Backend`]; undecodable rows as
  [`StoreError::Corrupt`].

## Schema

- `nodes(id, label, name, body, opinion, embedding)` — `name`/`body`/
  `opinion` are nullable and label-dependent; `embedding` is a JSON
  float array, null for nodes that were never embedded.
- `edges(kind, src, dst)` — unique per triple; `rowid` preserves first
  insertion order.
*/

use std::collections::VecDeque;

use async_trait::async_trait;
use rustc_hash::FxHashSet;
use sqlx::{Row, SqlitePool, sqlite::SqliteRow};
use tracing::instrument;

use crate::config::StoreConfig;

use super::{
    EdgeKind, Expansion, GraphEdge, GraphNode, GraphStore, NameMatch, NodeData, NodeId, NodeLabel,
    StoreError,
};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS nodes (
    id        TEXT PRIMARY KEY,
    label     TEXT NOT NULL,
    name      TEXT,
    body      TEXT,
    opinion   TEXT,
    embedding TEXT
);
CREATE TABLE IF NOT EXISTS edges (
    kind TEXT NOT NULL,
    src  TEXT NOT NULL,
    dst  TEXT NOT NULL,
    UNIQUE (kind, src, dst)
);
CREATE INDEX IF NOT EXISTS idx_edges_src ON edges (src);
CREATE INDEX IF NOT EXISTS idx_edges_dst ON edges (dst);
"#;

/// Persistent [`GraphStore`] over a shared `sqlx` SQLite pool.
pub struct SqliteGraphStore {
    pool: SqlitePool,
}

impl std::fmt::Debug for SqliteGraphStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteGraphStore").finish()
    }
}

fn map_sqlx(err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
            StoreError::Unavailable {
                message: err.to_string(),
            }
        }
        other => StoreError::Backend {
            message: other.to_string(),
        },
    }
}

fn decode_node(row: &SqliteRow) -> Result<GraphNode, StoreError> {
    let id: String = row.get("id");
    let label: String = row.get("label");
    let name: Option<String> = row.get("name");
    let body: Option<String> = row.get("body");
    let opinion: Option<String> = row.get("opinion");
    let embedding_json: Option<String> = row.get("embedding");

    let embedding = match embedding_json {
        Some(json) => Some(serde_json::from_str::<Vec<f32>>(&json).map_err(|e| {
            StoreError::Corrupt {
                message: format!("node {id}: bad embedding payload: {e}"),
            }
        })?),
        None => None,
    };

    let missing = |field: &str| StoreError::Corrupt {
        message: format!("node {id}: label {label} requires {field}"),
    };

    let label = NodeLabel::parse(&label).ok_or_else(|| StoreError::Corrupt {
        message: format!("node {id}: unknown label {label}"),
    })?;

    let data = match label {
        NodeLabel::Company => NodeData::Company {
            name: name.ok_or_else(|| missing("name"))?,
        },
        NodeLabel::Auditor => NodeData::Auditor {
            name: name.ok_or_else(|| missing("name"))?,
        },
        NodeLabel::Report => NodeData::Report {
            name: name.ok_or_else(|| missing("name"))?,
            text: body.ok_or_else(|| missing("body"))?,
            embedding,
        },
        NodeLabel::Opinion => NodeData::Opinion {
            text: body.ok_or_else(|| missing("body"))?,
            embedding,
        },
        NodeLabel::Audit => NodeData::Audit {
            name: name.ok_or_else(|| missing("name"))?,
            opinion: opinion.ok_or_else(|| missing("opinion"))?,
            embedding,
        },
    };

    Ok(GraphNode { id: id.into(), data })
}

fn decode_edge(row: &SqliteRow) -> Result<GraphEdge, StoreError> {
    let kind: String = row.get("kind");
    let src: String = row.get("src");
    let dst: String = row.get("dst");
    let kind = EdgeKind::parse(&kind).ok_or_else(|| StoreError::Corrupt {
        message: format!("edge {src} -> {dst}: unknown kind {kind}"),
    })?;
    Ok(GraphEdge::new(kind, src, dst))
}

impl SqliteGraphStore {
    /// Connect (or create) a SQLite database at `database_url` and
    /// bootstrap the schema. Example URL: `sqlite://auditgraph.db?mode=rwc`.
    #[instrument(skip(database_url))]
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let pool = SqlitePool::connect(database_url)
            .await
            .map_err(|e| StoreError::Unavailable {
                message: format!("connect error: {e}"),
            })?;
        sqlx::raw_sql(SCHEMA)
            .execute(&pool)
            .await
            .map_err(|e| StoreError::Backend {
                message: format!("schema bootstrap: {e}"),
            })?;
        Ok(Self { pool })
    }

    /// Connect using a [`StoreConfig`] descriptor.
    pub async fn connect_with(config: &StoreConfig) -> Result<Self, StoreError> {
        Self::connect(&config.url).await
    }

    /// Insert a node under a freshly generated id and return that id.
    pub async fn insert_node(&self, data: NodeData) -> Result<NodeId, StoreError> {
        self.insert_node_with_id(NodeId::generate(), data).await
    }

    /// Insert (or replace) a node under a caller-chosen id.
    pub async fn insert_node_with_id(
        &self,
        id: impl Into<NodeId>,
        data: NodeData,
    ) -> Result<NodeId, StoreError> {
        let id = id.into();
        let label = data.label().as_str();
        let (name, body, opinion, embedding) = match &data {
            NodeData::Company { name } => (Some(name.clone()), None, None, None),
            NodeData::Auditor { name } => (Some(name.clone()), None, None, None),
            NodeData::Report {
                name,
                text,
                embedding,
            } => (
                Some(name.clone()),
                Some(text.clone()),
                None,
                embedding.clone(),
            ),
            NodeData::Opinion { text, embedding } => {
                (None, Some(text.clone()), None, embedding.clone())
            }
            NodeData::Audit {
                name,
                opinion,
                embedding,
            } => (
                Some(name.clone()),
                None,
                Some(opinion.clone()),
                embedding.clone(),
            ),
        };
        let embedding_json = match embedding {
            Some(vector) => {
                Some(
                    serde_json::to_string(&vector).map_err(|e| StoreError::Backend {
                        message: format!("encode embedding: {e}"),
                    })?,
                )
            }
            None => None,
        };

        sqlx::query(
            r#"
            INSERT OR REPLACE INTO nodes (id, label, name, body, opinion, embedding)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(id.as_str())
        .bind(label)
        .bind(&name)
        .bind(&body)
        .bind(&opinion)
        .bind(&embedding_json)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx)?;

        Ok(id)
    }

    /// Record a directed edge. Repeating an identical edge is a no-op.
    pub async fn insert_edge(
        &self,
        kind: EdgeKind,
        src: &NodeId,
        dst: &NodeId,
    ) -> Result<(), StoreError> {
        sqlx::query("INSERT OR IGNORE INTO edges (kind, src, dst) VALUES (?1, ?2, ?3)")
            .bind(kind.as_str())
            .bind(src.as_str())
            .bind(dst.as_str())
            .execute(&self.pool)
            .await
            .map_err(map_sqlx)?;
        Ok(())
    }

    async fn fetch_node(&self, id: &NodeId) -> Result<Option<GraphNode>, StoreError> {
        let row = sqlx::query(
            "SELECT id, label, name, body, opinion, embedding FROM nodes WHERE id = ?1",
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx)?;
        row.as_ref().map(decode_node).transpose()
    }

    async fn adjacent_edges(
        &self,
        id: &NodeId,
        forward: bool,
    ) -> Result<Vec<GraphEdge>, StoreError> {
        let sql = if forward {
            "SELECT kind, src, dst FROM edges WHERE src = ?1 ORDER BY rowid"
        } else {
            "SELECT kind, src, dst FROM edges WHERE dst = ?1 ORDER BY rowid"
        };
        let rows = sqlx::query(sql)
            .bind(id.as_str())
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx)?;
        rows.iter().map(decode_edge).collect()
    }

    /// One breadth-first direction of the expansion.
    async fn walk(
        &self,
        start: &NodeId,
        forward: bool,
        node_seen: &mut FxHashSet<NodeId>,
        edge_seen: &mut FxHashSet<GraphEdge>,
        nodes: &mut Vec<GraphNode>,
        edges: &mut Vec<GraphEdge>,
    ) -> Result<(), StoreError> {
        let mut visited: FxHashSet<NodeId> = FxHashSet::default();
        visited.insert(start.clone());
        let mut queue: VecDeque<NodeId> = VecDeque::from([start.clone()]);

        while let Some(current) = queue.pop_front() {
            for edge in self.adjacent_edges(&current, forward).await? {
                let next = if forward {
                    edge.dst.clone()
                } else {
                    edge.src.clone()
                };
                if edge_seen.insert(edge.clone()) {
                    edges.push(edge);
                }
                if node_seen.insert(next.clone()) {
                    if let Some(node) = self.fetch_node(&next).await? {
                        nodes.push(node);
                    }
                }
                if visited.insert(next.clone()) {
                    queue.push_back(next);
                }
            }
        }
        Ok(())
    }
}

#[async_trait]
impl GraphStore for SqliteGraphStore {
    #[instrument(skip(self), err)]
    async fn all_embedded_nodes(&self) -> Result<Vec<(NodeId, Vec<f32>)>, StoreError> {
        let rows = sqlx::query(
            "SELECT id, embedding FROM nodes WHERE embedding IS NOT NULL ORDER BY rowid",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx)?;

        let mut pairs = Vec::with_capacity(rows.len());
        for row in &rows {
            let id: String = row.get("id");
            let json: String = row.get("embedding");
            let vector: Vec<f32> =
                serde_json::from_str(&json).map_err(|e| StoreError::Corrupt {
                    message: format!("node {id}: bad embedding payload: {e}"),
                })?;
            pairs.push((NodeId::from(id), vector));
        }
        Ok(pairs)
    }

    #[instrument(skip(self), err)]
    async fn expand(&self, id: &NodeId) -> Result<Expansion, StoreError> {
        let Some(seed) = self.fetch_node(id).await? else {
            return Ok(Expansion::default());
        };

        let mut node_seen: FxHashSet<NodeId> = FxHashSet::default();
        let mut edge_seen: FxHashSet<GraphEdge> = FxHashSet::default();
        let mut nodes = vec![seed];
        node_seen.insert(id.clone());
        let mut edges = Vec::new();

        self.walk(id, true, &mut node_seen, &mut edge_seen, &mut nodes, &mut edges)
            .await?;
        self.walk(id, false, &mut node_seen, &mut edge_seen, &mut nodes, &mut edges)
            .await?;

        Ok(Expansion { nodes, edges })
    }

    #[instrument(skip(self), err)]
    async fn find_by_name_like(
        &self,
        label: NodeLabel,
        pattern: &str,
    ) -> Result<Vec<NameMatch>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT id, name FROM nodes
            WHERE label = ?1
              AND name IS NOT NULL
              AND instr(lower(name), lower(?2)) > 0
            ORDER BY rowid
            "#,
        )
        .bind(label.as_str())
        .bind(pattern)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx)?;

        Ok(rows
            .iter()
            .map(|row| NameMatch {
                id: NodeId::from(row.get::<String, _>("id")),
                name: row.get("name"),
            })
            .collect())
    }
}
