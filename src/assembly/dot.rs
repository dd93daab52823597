//! Graphviz dumps of graph components.
//!
//! Active only when `out_graphs_dir` is configured: one file per
//! component per stage, plus one with the enumerated path edges
//! highlighted. The dumps are a debugging aid; failures to write are
//! logged and otherwise ignored.

use std::fmt::Write as _;
use std::path::PathBuf;

use tracing::warn;

use crate::assembly::edge::EdgeHandle;
use crate::assembly::graph::Graph;
use crate::core::kmer::{MOCK_SINK_ID, MOCK_SOURCE_ID};

const PATH_COLORS: &[&str] = &["crimson", "darkgreen", "darkorange", "purple", "steelblue"];

pub struct DotSerializer<'g> {
    graph: &'g Graph,
}

impl<'g> DotSerializer<'g> {
    pub fn new(graph: &'g Graph) -> DotSerializer<'g> {
        DotSerializer { graph }
    }

    /// Write one component at a named pipeline stage.
    pub fn write_component(&self, comp_id: u64, suffix: &str) {
        let Some(path) = self.out_path(comp_id, suffix) else { return };
        let body = self.render(comp_id, &[]);
        if let Err(err) = std::fs::write(&path, body) {
            warn!("failed to write graph dump {}: {err}", path.display());
        }
    }

    /// Write one component with every enumerated path's edges colored.
    pub fn write_component_paths(&self, comp_id: u64, per_path_touches: &[Vec<EdgeHandle>]) {
        let Some(path) = self.out_path(comp_id, "path_flow") else { return };
        let body = self.render(comp_id, per_path_touches);
        if let Err(err) = std::fs::write(&path, body) {
            warn!("failed to write graph dump {}: {err}", path.display());
        }
    }

    fn out_path(&self, comp_id: u64, suffix: &str) -> Option<PathBuf> {
        let dir = self.graph.window().region_string().replace(':', "_");
        let out_dir = self.graph_params_dir()?.join(dir);
        if let Err(err) = std::fs::create_dir_all(&out_dir) {
            warn!("failed to create graph dump dir {}: {err}", out_dir.display());
            return None;
        }
        Some(out_dir.join(format!("c{}_k{}_{}.dot", comp_id, self.graph.k(), suffix)))
    }

    fn graph_params_dir(&self) -> Option<PathBuf> {
        self.graph.params_out_graphs_dir()
    }

    fn render(&self, comp_id: u64, per_path_touches: &[Vec<EdgeHandle>]) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "digraph component{comp_id} {{");
        let _ = writeln!(out, "  node [style=filled fontname=monospace];");

        for (id, node) in self.graph.nodes().iter() {
            if node.component_id != comp_id {
                continue;
            }

            if node.is_mock() {
                let name = if *id == MOCK_SOURCE_ID { "SOURCE" } else { "SINK" };
                let _ = writeln!(out, "  n{id} [label=\"{name}\" shape=diamond fillcolor=gray];");
                continue;
            }

            let _ = writeln!(
                out,
                "  n{id} [label=\"len={} cov={}\" fillcolor={}];",
                node.len(),
                node.total_sample_count(),
                node.labels().fill_color()
            );
        }

        for (id, node) in self.graph.nodes().iter() {
            if node.component_id != comp_id {
                continue;
            }
            for edge in node.edges() {
                let color = per_path_touches
                    .iter()
                    .position(|touches| {
                        touches.iter().any(|h| h.src_id == *id && h.dst_id == edge.dst_id && h.kind == edge.kind)
                    })
                    .map(|i| PATH_COLORS[i % PATH_COLORS.len()]);

                match color {
                    Some(c) => {
                        let _ = writeln!(
                            out,
                            "  n{id} -> n{} [label=\"{}\" color={c} penwidth=2];",
                            edge.dst_id, edge.kind
                        );
                    }
                    None => {
                        let _ = writeln!(out, "  n{id} -> n{} [label=\"{}\"];", edge.dst_id, edge.kind);
                    }
                }
            }
        }

        let _ = writeln!(out, "}}");
        out
    }
}
