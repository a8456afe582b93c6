use std::fmt::Write as _;

use crate::graph::builder::PipelineGraph;
use crate::pipeline::SectionKind;

fn shape(kind: SectionKind) -> &'static str {
    match kind {
        SectionKind::Input | SectionKind::Accumulator => "invhouse",
        SectionKind::Decoder | SectionKind::Encoder => "ellipse",
        SectionKind::Filter => "box",
        SectionKind::Output => "house",
    }
}

/// Escape text for a double-quoted DOT ID.
fn quote(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            c => out.push(c),
        }
    }
    out
}

/// Emit a pipeline's wiring graph as a DOT (Graphviz) diagram.
pub fn emit_dot(pg: &PipelineGraph) -> String {
    let mut out = format!("digraph \"{}\" {{\n", quote(&pg.name));

    for &idx in &pg.node_indices {
        let node = &pg.graph[idx];
        let name = quote(&node.name);
        let _ = writeln!(
            out,
            "  \"{name}\" [label=\"{name}\\n{}\", shape={}];",
            node.plugin,
            shape(node.kind)
        );
    }

    for edge in pg.graph.edge_indices() {
        let Some((src, dst)) = pg.graph.edge_endpoints(edge) else {
            continue;
        };
        let _ = writeln!(
            out,
            "  \"{}\" -> \"{}\" [label=\"{}\"];",
            quote(&pg.graph[src].name),
            quote(&pg.graph[dst].name),
            quote(&pg.graph[edge])
        );
    }

    out.push_str("}\n");
    out
}
