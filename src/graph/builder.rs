use petgraph::Direction;
use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};

use crate::pipeline::{PipelineConfig, PluginType, SectionKind};

/// A section as seen by the wiring graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionNode {
    pub name: String,
    pub plugin: PluginType,
    pub kind: SectionKind,
}

/// How sections of a pipeline reference each other, backed by petgraph.
///
/// Edges run from the referencing section to its target and carry the
/// parameter key (`decoder`, `encoder`, `subs`, ...).
pub struct PipelineGraph {
    pub name: String,
    pub graph: DiGraph<SectionNode, String>,
    /// One index per section, in document order.
    pub node_indices: Vec<NodeIndex>,
}

/// Build the wiring graph of a resolved pipeline config.
pub fn build(config: &PipelineConfig) -> PipelineGraph {
    let mut graph = DiGraph::new();
    let node_indices: Vec<NodeIndex> = config
        .sections
        .iter()
        .map(|s| {
            graph.add_node(SectionNode {
                name: s.name.clone(),
                plugin: s.plugin,
                kind: s.kind,
            })
        })
        .collect();

    for (from, section) in config.sections.iter().enumerate() {
        for link in &section.links {
            graph.add_edge(node_indices[from], node_indices[link.id.0], link.key.clone());
        }
    }

    PipelineGraph {
        name: "pipeline".to_owned(),
        graph,
        node_indices,
    }
}

impl PipelineGraph {
    /// Sections of `kind` that no other section references, in document order.
    pub fn unreferenced(&self, kind: SectionKind) -> Vec<&str> {
        self.node_indices
            .iter()
            .filter(|&&idx| self.graph[idx].kind == kind)
            .filter(|&&idx| {
                self.graph
                    .neighbors_directed(idx, Direction::Incoming)
                    .next()
                    .is_none()
            })
            .map(|&idx| self.graph[idx].name.as_str())
            .collect()
    }

    /// Names of the sections in the first reference cycle, if any, in
    /// document order. Only multi-decoders can form one.
    pub fn find_cycle(&self) -> Option<Vec<&str>> {
        let mut cycle: Vec<NodeIndex> = tarjan_scc(&self.graph)
            .into_iter()
            .filter(|scc| scc.len() > 1)
            .min_by_key(|scc| scc.iter().min().copied())?;
        cycle.sort_unstable();
        Some(
            cycle
                .into_iter()
                .map(|idx| self.graph[idx].name.as_str())
                .collect(),
        )
    }
}
