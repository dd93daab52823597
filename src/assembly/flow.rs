//! Bounded max-flow-style path enumeration.
//!
//! Each call to [`MaxFlowEnumerator::next_path`] runs a FIFO search over
//! partial path builders rooted at the mock source. A builder's score is
//! the number of its edges not seen in any previously yielded path, so the
//! enumeration naturally dries up once every edge has been covered. The
//! search is bounded both by a total visit budget and by a maximum path
//! length derived from the reference anchor plus the configured indel
//! slack.

use std::collections::VecDeque;

use ahash::AHashSet;
use tracing::trace;

use crate::assembly::edge::EdgeHandle;
use crate::assembly::graph::NodeMap;
use crate::assembly::path::{Path, PathBuilder};
use crate::core::kmer::{MOCK_SINK_ID, MOCK_SOURCE_ID};

pub struct MaxFlowEnumerator<'g> {
    nodes: &'g NodeMap,
    k: usize,
    max_path_len: usize,
    bfs_limit: u32,
    tenx_mode: bool,
    marked_edges: AHashSet<EdgeHandle>,
}

impl<'g> MaxFlowEnumerator<'g> {
    pub fn new(nodes: &'g NodeMap, k: usize, max_path_len: usize, bfs_limit: u32, tenx_mode: bool) -> Self {
        debug_assert!(nodes.contains_key(&MOCK_SOURCE_ID));
        debug_assert!(nodes.contains_key(&MOCK_SINK_ID));

        MaxFlowEnumerator { nodes, k, max_path_len, bfs_limit, tenx_mode, marked_edges: AHashSet::new() }
    }

    /// Yield the next best source-to-sink path, or `None` once no path
    /// with a positive unique-edge score remains within the visit budget.
    pub fn next_path(&mut self) -> Option<Path> {
        let mut num_visits: u32 = 0;
        let mut best: Option<PathBuilder> = None;

        let mut candidates: VecDeque<PathBuilder> = VecDeque::new();
        candidates.push_back(PathBuilder::new(self.k, self.tenx_mode));

        while let Some(curr) = candidates.pop_front() {
            num_visits += 1;
            if num_visits > self.bfs_limit {
                break;
            }

            if curr.path_length() > self.max_path_len {
                // extended too far past the anchor; nothing down here can be reported
                continue;
            }

            if curr.touched_sink() && curr.score() > 0 {
                best = Some(curr);
                break;
            }

            let last_id = curr.last_node_id().unwrap_or(MOCK_SOURCE_ID);
            let Some(last_node) = self.nodes.get(&last_id) else { continue };
            let best_score = best.as_ref().map_or(0, PathBuilder::score);

            for edge in last_node.edges() {
                if edge.dst_id == MOCK_SINK_ID {
                    if curr.score() <= best_score {
                        continue;
                    }
                    let mut src_to_sink = curr.clone();
                    src_to_sink.mark_sink_touch();
                    candidates.push_back(src_to_sink);
                    continue;
                }

                // no return to the source, no zig-zag onto the opposite strand
                if edge.dst_id == MOCK_SOURCE_ID || edge.kind.src_strand() != curr.direction() {
                    continue;
                }

                let Some(neighbour) = self.nodes.get(&edge.dst_id) else { continue };

                let handle = EdgeHandle::new(last_id, *edge);
                let mut extension = curr.clone();
                if !self.marked_edges.contains(&handle) {
                    extension.increment_score();
                }
                extension.extend(handle, neighbour);
                candidates.push_back(extension);
            }
        }

        trace!("path search finished after {num_visits} visits");

        let best = best?;
        self.marked_edges.extend(best.edges().copied());
        best.build(self.nodes)
    }
}
