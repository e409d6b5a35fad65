//! Display-graph construction for evidence diagrams.
//!
//! The display graph is a cosmetic projection of an expansion: one
//! vertex per distinct `(label, name)` pair seen among edge endpoints,
//! so same-label/same-name nodes merge, and the edge weight carries the
//! relation type for labeling. Construction order follows the
//! expansion's edge order, which makes vertex indices — and therefore
//! palette assignment — deterministic for a given input.

use petgraph::graph::{DiGraph, NodeIndex};
use rustc_hash::FxHashMap;

use crate::store::{EdgeKind, Expansion, NodeLabel};

/// RGB display color.
pub type Color = [u8; 3];

/// Fixed vertex palette, cycled by insertion order (not by label).
///
/// LightSkyBlue, LightGreen, LightCoral, PeachPuff, Thistle,
/// LightSalmon, LightPink, PaleGoldenrod, LightYellow, Lavender.
pub const PALETTE: [Color; 10] = [
    [135, 206, 250],
    [144, 238, 144],
    [240, 128, 128],
    [255, 218, 185],
    [216, 191, 216],
    [255, 160, 122],
    [255, 182, 193],
    [238, 232, 170],
    [255, 255, 224],
    [230, 230, 250],
];

/// A renderable vertex: identity, wrapped caption, palette color.
#[derive(Clone, Debug, PartialEq)]
pub struct DisplayVertex {
    pub label: NodeLabel,
    pub name: Option<String>,
    /// Caption with line breaks, two words per line.
    pub caption: String,
    pub color: Color,
}

/// Wrap a caption onto multiple lines, `per_line` words each.
pub fn wrap_label(text: &str, per_line: usize) -> String {
    let words: Vec<&str> = text.split(' ').collect();
    words
        .chunks(per_line.max(1))
        .map(|chunk| chunk.join(" "))
        .collect::<Vec<_>>()
        .join("\n")
}

/// The directed graph drawn into an evidence diagram.
pub struct DisplayGraph {
    graph: DiGraph<DisplayVertex, EdgeKind>,
}

impl DisplayGraph {
    /// Project an expansion into display form.
    ///
    /// Every edge contributes its two endpoints; an expansion with no
    /// edges at all still yields a single vertex for the seed so the
    /// diagram is never blank for a real node.
    pub fn from_expansion(expansion: &Expansion) -> Self {
        let mut graph: DiGraph<DisplayVertex, EdgeKind> = DiGraph::new();
        let mut by_key: FxHashMap<(NodeLabel, Option<String>), NodeIndex> = FxHashMap::default();

        let mut vertex = |graph: &mut DiGraph<DisplayVertex, EdgeKind>,
                          label: NodeLabel,
                          name: Option<&str>| {
            let key = (label, name.map(str::to_string));
            *by_key.entry(key).or_insert_with(|| {
                let caption = match name {
                    Some(name) => format!("{label} : {name}"),
                    None => label.to_string(),
                };
                let color = PALETTE[graph.node_count() % PALETTE.len()];
                graph.add_node(DisplayVertex {
                    label,
                    name: name.map(str::to_string),
                    caption: wrap_label(&caption, 2),
                    color,
                })
            })
        };

        for edge in &expansion.edges {
            let (Some(src), Some(dst)) = (expansion.node(&edge.src), expansion.node(&edge.dst))
            else {
                continue;
            };
            let a = vertex(&mut graph, src.label(), src.data.name());
            let b = vertex(&mut graph, dst.label(), dst.data.name());
            // One display edge per vertex pair, like the record slots:
            // a repeated relation overwrites rather than stacking.
            graph.update_edge(a, b, edge.kind);
        }

        if graph.node_count() == 0 {
            if let Some(seed) = expansion.seed() {
                vertex(&mut graph, seed.label(), seed.data.name());
            }
        }

        Self { graph }
    }

    pub fn graph(&self) -> &DiGraph<DisplayVertex, EdgeKind> {
        &self.graph
    }

    pub fn vertex_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Undirected edge list as index pairs, for the layout pass.
    pub fn edge_indices(&self) -> Vec<(usize, usize)> {
        self.graph
            .edge_indices()
            .filter_map(|edge| self.graph.edge_endpoints(edge))
            .map(|(a, b)| (a.index(), b.index()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{GraphEdge, GraphNode, NodeData};

    fn expansion_chain() -> Expansion {
        let auditor = GraphNode::new(
            "a1",
            NodeData::Auditor {
                name: "Ernst & Young".into(),
            },
        );
        let company = GraphNode::new(
            "c1",
            NodeData::Company {
                name: "Alexanders Inc".into(),
            },
        );
        let report = GraphNode::new(
            "r1",
            NodeData::Report {
                name: "FY2023 10-K Filing".into(),
                text: "text".into(),
                embedding: None,
            },
        );
        let opinion = GraphNode::new(
            "o1",
            NodeData::Opinion {
                text: "Unqualified".into(),
                embedding: None,
            },
        );
        Expansion {
            nodes: vec![report.clone(), opinion, company, auditor],
            edges: vec![
                GraphEdge::new(EdgeKind::ContainsOpinion, "r1", "o1"),
                GraphEdge::new(EdgeKind::HasReport, "c1", "r1"),
                GraphEdge::new(EdgeKind::Audits, "a1", "c1"),
            ],
        }
    }

    #[test]
    fn wrap_breaks_every_two_words() {
        assert_eq!(
            wrap_label("Report : Annual Audit 2023", 2),
            "Report :\nAnnual Audit\n2023"
        );
        assert_eq!(wrap_label("Opinion", 2), "Opinion");
    }

    #[test]
    fn vertices_follow_edge_endpoints() {
        let display = DisplayGraph::from_expansion(&expansion_chain());
        assert_eq!(display.vertex_count(), 4);
        assert_eq!(display.edge_count(), 3);

        // Nameless labels caption as the bare label.
        let captions: Vec<&str> = display
            .graph()
            .node_weights()
            .map(|v| v.caption.as_str())
            .collect();
        assert!(captions.contains(&"Opinion"));
        assert!(captions.contains(&"Report :\nFY2023 10-K\nFiling"));
    }

    #[test]
    fn palette_cycles_by_insertion_order() {
        let display = DisplayGraph::from_expansion(&expansion_chain());
        let colors: Vec<Color> = display.graph().node_weights().map(|v| v.color).collect();
        for (position, color) in colors.iter().enumerate() {
            assert_eq!(*color, PALETTE[position % PALETTE.len()]);
        }
    }

    #[test]
    fn same_label_same_name_nodes_merge() {
        // Two distinct Report nodes sharing a name collapse to one vertex.
        let report_a = GraphNode::new(
            "r1",
            NodeData::Report {
                name: "10-K".into(),
                text: "first".into(),
                embedding: None,
            },
        );
        let report_b = GraphNode::new(
            "r2",
            NodeData::Report {
                name: "10-K".into(),
                text: "second".into(),
                embedding: None,
            },
        );
        let company = GraphNode::new(
            "c1",
            NodeData::Company {
                name: "Acme".into(),
            },
        );
        let expansion = Expansion {
            nodes: vec![company.clone(), report_a, report_b],
            edges: vec![
                GraphEdge::new(EdgeKind::HasReport, "c1", "r1"),
                GraphEdge::new(EdgeKind::HasReport, "c1", "r2"),
            ],
        };

        let display = DisplayGraph::from_expansion(&expansion);
        assert_eq!(display.vertex_count(), 2);
        assert_eq!(display.edge_count(), 1);
    }

    #[test]
    fn isolated_seed_yields_single_vertex() {
        let lone = GraphNode::new(
            "c9",
            NodeData::Company {
                name: "Orphan Holdings".into(),
            },
        );
        let expansion = Expansion {
            nodes: vec![lone],
            edges: vec![],
        };
        let display = DisplayGraph::from_expansion(&expansion);
        assert_eq!(display.vertex_count(), 1);
        assert_eq!(display.edge_count(), 0);
    }

    #[test]
    fn empty_expansion_yields_empty_display() {
        let display = DisplayGraph::from_expansion(&Expansion::default());
        assert_eq!(display.vertex_count(), 0);
    }

    #[test]
    fn construction_is_deterministic() {
        let expansion = expansion_chain();
        let first = DisplayGraph::from_expansion(&expansion);
        let second = DisplayGraph::from_expansion(&expansion);
        let captions = |d: &DisplayGraph| -> Vec<String> {
            d.graph().node_weights().map(|v| v.caption.clone()).collect()
        };
        assert_eq!(captions(&first), captions(&second));
        assert_eq!(first.edge_indices(), second.edge_indices());
    }
}
