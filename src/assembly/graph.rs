//! Graph Processing Pipeline
//! =========================
//!
//! Owns the node map for one (window, k) attempt and drives it from raw
//! k-mer graph to variant transcripts: connected components, reference
//! anchoring, cycle checks, pruning and compression, bounded path
//! enumeration, and path-to-reference transcript extraction.
//!
//! Cycles and near-repeat k-mers are not errors: they set
//! `should_increment_k` and the window is retried at a larger k.

use std::sync::Arc;

use ahash::AHashSet;
use anyhow::Result;
use tracing::debug;

use crate::alignment::{align, trim_end_gaps, AlignedPair};
use crate::assembly::builder::RefInfos;
use crate::assembly::dot::DotSerializer;
use crate::assembly::edge::{Edge, EdgeHandle, EdgeKind};
use crate::assembly::flow::MaxFlowEnumerator;
use crate::assembly::node::{Node, NodeNeighbour};
use crate::assembly::path::Path;
use crate::core::kmer::{canonical_kmer_ids, MOCK_SINK_ID, MOCK_SOURCE_ID};
use crate::core::sequence::{has_almost_repeat_kmer, hamming_within};
use crate::core::tandem::find_tandem_repeat;
use crate::core::{Allele, MergeSide, SampleLabel, Strand};
use crate::errors::CallerError;
use crate::pipeline::window::RefWindow;
use crate::utils::configuration::CallerConfig;
use crate::variant::transcript::{Transcript, TranscriptCode, TranscriptOffsets, VariantState};
use crate::variant::Variant;

pub type NodeMap = ahash::AHashMap<u64, Node>;

/// One connected component of real nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComponentInfo {
    pub id: u64,
    pub num_nodes: usize,
}

/// Where a component attaches to the reference window, if it does.
#[derive(Debug, Clone, Copy, Default)]
pub struct SrcSnkResult {
    pub found: bool,
    pub start_offset: usize,
    pub end_offset: usize,
}

#[derive(Debug, Clone, Copy, Default)]
struct RefEndResult {
    node_id: u64,
    ref_mer_idx: usize,
    found: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GraphEnd {
    Source,
    Sink,
}

pub struct Graph {
    nodes: NodeMap,
    window: Arc<RefWindow>,
    avg_cov: f64,
    k: usize,
    params: Arc<CallerConfig>,
    pub should_increment_k: bool,
}

impl Graph {
    pub fn new(nodes: NodeMap, window: Arc<RefWindow>, avg_cov: f64, k: usize, params: Arc<CallerConfig>) -> Graph {
        Graph { nodes, window, avg_cov, k, params, should_increment_k: false }
    }

    #[inline]
    pub fn nodes(&self) -> &NodeMap {
        &self.nodes
    }

    #[inline]
    pub fn k(&self) -> usize {
        self.k
    }

    #[inline]
    pub fn window(&self) -> &RefWindow {
        &self.window
    }

    #[inline]
    pub fn avg_coverage(&self) -> f64 {
        self.avg_cov
    }

    pub(crate) fn params_out_graphs_dir(&self) -> Option<std::path::PathBuf> {
        self.params.out_graphs_dir.clone()
    }

    /// Run the full per-window pipeline, appending emitted variants.
    pub fn process(&mut self, ref_infos: &RefInfos, results: &mut Vec<Variant>) -> Result<()> {
        self.check_invariants().map_err(|err| {
            debug_assert!(false, "{err}");
            err
        })?;

        let window_id = self.window.region_string();
        debug!("processing graph for {} with {} nodes", window_id, self.nodes.len());

        self.remove_low_cov_nodes(0);
        let components = self.mark_components();

        for comp in components {
            let mark = self.mark_source_sink(comp.id);
            if !mark.found {
                debug!("no source/sink anchors in component{} for {}", comp.id, window_id);
                continue;
            }
            debug!("marked source and sink in component{} ({} nodes) for {}", comp.id, comp.num_nodes, window_id);

            if self.has_cycle() {
                self.should_increment_k = true;
                debug!("found graph cycle in component{} for {} with k={}", comp.id, window_id, self.k);
                return Ok(());
            }

            if self.params.out_graphs_dir.is_some() {
                self.write_dot(comp.id, "before_pruning");
            }

            self.remove_low_cov_nodes(comp.id);
            self.compress(comp.id);
            self.remove_low_cov_nodes(comp.id);
            self.compress(comp.id);
            self.remove_tips(comp.id);
            self.remove_short_links(comp.id);

            if self.params.out_graphs_dir.is_some() {
                self.write_dot(comp.id, "after_pruning");
            }

            if self.has_cycle() {
                self.should_increment_k = true;
                debug!("found graph cycle in component{} for {} with k={}", comp.id, window_id, self.k);
                return Ok(());
            }

            let anchor_len = mark.end_offset - mark.start_offset;
            let max_path_len = anchor_len + self.params.max_indel_length as usize;

            let mut num_paths = 0usize;
            let mut repeat_found = false;
            let mut per_path_touches: Vec<Vec<EdgeHandle>> = Vec::new();

            let mut flow = MaxFlowEnumerator::new(
                &self.nodes,
                self.k,
                max_path_len,
                self.params.graph_traversal_limit,
                self.params.tenx_mode,
            );

            while let Some(path) = flow.next_path() {
                num_paths += 1;
                if self.params.out_graphs_dir.is_some() {
                    per_path_touches.push(path.touched_edges().to_vec());
                }

                if has_almost_repeat_kmer(path.seq(), self.k, self.params.max_rpt_mismatch) {
                    debug!(
                        "found repeat {}-mer in path{} of component{} for {}",
                        self.k, num_paths, comp.id, window_id
                    );
                    repeat_found = true;
                    break;
                }

                self.process_path(&path, ref_infos, &mark, results)?;
            }
            drop(flow);

            if repeat_found {
                self.should_increment_k = true;
                return Ok(());
            }

            if num_paths == 0 {
                debug!("no path found in component{} for {} with k={}", comp.id, window_id, self.k);
            }
            if self.params.out_graphs_dir.is_some() && !per_path_touches.is_empty() {
                self.write_dot_paths(comp.id, &per_path_touches);
            }
        }

        debug!("done processing graph for {}", window_id);
        Ok(())
    }

    /// Data-model sanity: mock endpoints present and every real node's
    /// per-base arrays in sync with its sequence. Violations abort the
    /// process in debug builds and drop the window in release builds.
    fn check_invariants(&self) -> std::result::Result<(), CallerError> {
        if !self.nodes.contains_key(&MOCK_SOURCE_ID) || !self.nodes.contains_key(&MOCK_SINK_ID) {
            return Err(CallerError::GraphInvariant("mock endpoints missing".to_string()));
        }

        for node in self.nodes.values() {
            if node.is_mock() {
                continue;
            }
            if node.len() < self.k || node.cov().len() != node.len() || node.labels().len() != node.len() {
                return Err(CallerError::GraphInvariant(format!("node {} arrays out of sync", node.id())));
            }
        }
        Ok(())
    }

    /* ------------------------- component marking ------------------------ */

    /// Assign component ids to every real node via BFS over the undirected
    /// edge relation. Node ids are visited in sorted order so component
    /// numbering is stable across runs.
    pub fn mark_components(&mut self) -> Vec<ComponentInfo> {
        let mut infos: Vec<ComponentInfo> = Vec::new();
        let mut current: u64 = 0;

        let mut ids: Vec<u64> = self.nodes.keys().copied().collect();
        ids.sort_unstable();

        for seed in ids {
            let Some(node) = self.nodes.get(&seed) else { continue };
            if node.is_mock() || node.component_id != 0 {
                continue;
            }

            current += 1;
            infos.push(ComponentInfo { id: current, num_nodes: 0 });

            let mut queue = std::collections::VecDeque::new();
            queue.push_back(seed);

            while let Some(id) = queue.pop_front() {
                let Some(curr) = self.nodes.get_mut(&id) else { continue };
                if curr.is_mock() || curr.component_id != 0 {
                    continue;
                }

                curr.component_id = current;
                infos.last_mut().expect("component pushed").num_nodes += 1;

                let neighbours: Vec<u64> = curr.edges().map(|e| e.dst_id).collect();
                queue.extend(neighbours);
            }
        }

        debug!("marked {} components in graph for {}", infos.len(), self.window.region_string());
        infos
    }

    /* -------------------------- source and sink ------------------------- */

    /// Anchor one component on the reference: the first sufficiently
    /// covered reference k-mer becomes the data source, the last the data
    /// sink, and the mock endpoints are rewired to them.
    pub fn mark_source_sink(&mut self, comp_id: u64) -> SrcSnkResult {
        let ref_mer_ids = canonical_kmer_ids(self.window.seq(), self.k);
        if ref_mer_ids.is_empty() {
            return SrcSnkResult::default();
        }

        let src = self.find_ref_end(GraphEnd::Source, comp_id, &ref_mer_ids);
        if !src.found {
            return SrcSnkResult::default();
        }

        let snk = self.find_ref_end(GraphEnd::Sink, comp_id, &ref_mer_ids);
        if !snk.found || src.node_id == snk.node_id {
            return SrcSnkResult::default();
        }

        for mock_id in [MOCK_SOURCE_ID, MOCK_SINK_ID] {
            self.disconnect_edges_to(mock_id);
            if let Some(mock) = self.nodes.get_mut(&mock_id) {
                mock.clear_edges();
                mock.component_id = comp_id;
            }
        }

        let src_orientation = self.nodes[&src.node_id].orientation();
        let src_kind = EdgeKind::new(Strand::Fwd, src_orientation);
        self.nodes.get_mut(&MOCK_SOURCE_ID).expect("mock source").add_edge(src.node_id, src_kind);
        self.nodes.get_mut(&src.node_id).expect("data source").add_edge(MOCK_SOURCE_ID, src_kind.reversed());

        let snk_is_rev = self.nodes[&snk.node_id].orientation() == Strand::Rev;
        let snk_kind = if snk_is_rev { EdgeKind::FF } else { EdgeKind::RR };
        self.nodes.get_mut(&MOCK_SINK_ID).expect("mock sink").add_edge(snk.node_id, snk_kind);
        self.nodes.get_mut(&snk.node_id).expect("data sink").add_edge(MOCK_SINK_ID, snk_kind.reversed());

        debug_assert_eq!(self.nodes[&MOCK_SOURCE_ID].num_edges(), 1);
        debug_assert_eq!(self.nodes[&MOCK_SINK_ID].num_edges(), 1);

        let start_offset = src.ref_mer_idx;
        let end_offset = snk.ref_mer_idx + self.nodes[&snk.node_id].len();
        SrcSnkResult { found: true, start_offset, end_offset }
    }

    fn find_ref_end(&self, end: GraphEnd, comp_id: u64, ref_mer_ids: &[Option<u64>]) -> RefEndResult {
        let min_anchor_cov = self.params.min_anchor_cov;
        let n = ref_mer_ids.len();

        let indices: Box<dyn Iterator<Item = usize>> = match end {
            GraphEnd::Source => Box::new(0..n),
            GraphEnd::Sink => Box::new((0..n).rev()),
        };

        for idx in indices {
            let Some(id) = ref_mer_ids[idx] else { continue };
            let Some(node) = self.nodes.get(&id) else { continue };
            debug_assert!(!node.is_mock());

            if node.component_id != comp_id || node.total_sample_count() < min_anchor_cov {
                continue;
            }
            return RefEndResult { node_id: id, ref_mer_idx: idx, found: true };
        }

        RefEndResult::default()
    }

    fn disconnect_edges_to(&mut self, id: u64) {
        let Some(node) = self.nodes.get(&id) else { return };
        let neighbours: Vec<u64> = node.edges().map(|e| e.dst_id).collect();
        for nid in neighbours {
            if let Some(neighbour) = self.nodes.get_mut(&nid) {
                neighbour.erase_edges_to(id);
            }
        }
    }

    /* ------------------------------ pruning ----------------------------- */

    /// Drop nodes that are singletons in both samples or fall below the
    /// coverage floor. `comp_id` 0 targets the whole unassigned graph.
    pub fn remove_low_cov_nodes(&mut self, comp_id: u64) -> bool {
        let min_window_cov = (self.params.min_cov_ratio * self.avg_cov).ceil() as u16;
        let min_req_cov = self.params.min_node_cov.max(min_window_cov);

        let mut to_remove: Vec<u64> = self
            .nodes
            .values()
            .filter(|n| !n.is_mock() && n.component_id == comp_id)
            .filter(|n| {
                let normal_singleton = n.sample_count(SampleLabel::Normal) == 1;
                let tumor_singleton = n.sample_count(SampleLabel::Tumor) == 1;
                (normal_singleton && tumor_singleton) || n.min_sample_base_cov() <= min_req_cov
            })
            .map(Node::id)
            .collect();
        to_remove.sort_unstable();

        if !to_remove.is_empty() {
            debug!(
                "removing {} ({:.2}%) low cov nodes in component{} for {}",
                to_remove.len(),
                100.0 * to_remove.len() as f64 / self.nodes.len() as f64,
                comp_id,
                self.window.region_string()
            );
            for id in &to_remove {
                self.erase_node(*id);
            }
        }

        !to_remove.is_empty()
    }

    /// Merge every chain of mutually unique extensions in the component.
    pub fn compress(&mut self, comp_id: u64) -> bool {
        let mut compressed: AHashSet<u64> = AHashSet::new();

        let mut ids: Vec<u64> = self.nodes.keys().copied().collect();
        ids.sort_unstable();

        for id in ids {
            if compressed.contains(&id) {
                continue;
            }
            let Some(node) = self.nodes.get(&id) else { continue };
            if node.is_mock() || node.component_id != comp_id {
                continue;
            }

            let buddies = self.find_compressible_neighbours(id);
            self.compress_node(id, &buddies, &mut compressed);
        }

        if !compressed.is_empty() {
            let count = compressed.len();
            let mut removed: Vec<u64> = compressed.into_iter().collect();
            removed.sort_unstable();
            for id in removed {
                self.erase_node(id);
            }
            debug!("compressed {} nodes in component{} for {}", count, comp_id, self.window.region_string());
            return true;
        }

        false
    }

    /// Remove short dead-end stubs, re-compressing until none remain;
    /// compression after tip removal can expose new tips.
    pub fn remove_tips(&mut self, comp_id: u64) -> bool {
        let mut total_tips = 0usize;
        let min_tip_len = self.params.min_graph_tip_length;

        loop {
            let mut tips: Vec<u64> = self
                .nodes
                .values()
                .filter(|n| !n.is_mock() && n.component_id == comp_id)
                .filter(|n| n.num_edges() <= 1 && (n.len() - self.k + 1) < min_tip_len)
                .map(Node::id)
                .collect();
            tips.sort_unstable();

            if tips.is_empty() {
                break;
            }

            total_tips += tips.len();
            for id in &tips {
                self.erase_node(*id);
            }
            self.compress(comp_id);
        }

        if total_tips > 0 {
            debug!("removed {} tips in component{} for {}", total_tips, comp_id, self.window.region_string());
        }
        total_tips > 0
    }

    /// Remove short, weakly covered branch nodes, except inside short
    /// tandem repeats where small bubbles are expected.
    pub fn remove_short_links(&mut self, comp_id: u64) -> bool {
        let min_link_len = (self.k as f64 / 2.0).floor() as usize;
        let min_req_cov = self.avg_cov.sqrt().floor();
        let tandem_params = self.params.tandem_params();

        let mut to_remove: Vec<u64> = self
            .nodes
            .values()
            .filter(|n| !n.is_mock() && n.component_id == comp_id)
            .filter(|n| {
                let degree = n.num_edges();
                let uniq_seq_len = n.len() - self.k + 1;
                if degree < 2 || uniq_seq_len >= min_link_len || f64::from(n.min_sample_base_cov()) > min_req_cov {
                    return false;
                }
                // bubbles inside STRs are real; keep them
                !find_tandem_repeat(n.seq(), self.k - 1, &tandem_params).found
            })
            .map(Node::id)
            .collect();
        to_remove.sort_unstable();

        if !to_remove.is_empty() {
            for id in &to_remove {
                self.erase_node(*id);
            }
            debug!(
                "removed {} short links in component{} for {}",
                to_remove.len(),
                comp_id,
                self.window.region_string()
            );
            self.compress(comp_id);
        }

        !to_remove.is_empty()
    }

    /* --------------------------- cycle check ---------------------------- */

    /// DFS from the mock source along both launch strands with a shared
    /// visited state; a back-edge to a still-open ancestor is a cycle.
    pub fn has_cycle(&self) -> bool {
        let mut open: AHashSet<u64> = AHashSet::new();
        let mut done: AHashSet<(u64, Strand)> = AHashSet::new();

        self.cycle_from(MOCK_SOURCE_ID, Strand::Fwd, &mut open, &mut done)
            || self.cycle_from(MOCK_SOURCE_ID, Strand::Rev, &mut open, &mut done)
    }

    fn cycle_from(
        &self,
        node_id: u64,
        direction: Strand,
        open: &mut AHashSet<u64>,
        done: &mut AHashSet<(u64, Strand)>,
    ) -> bool {
        let Some(node) = self.nodes.get(&node_id) else { return false };
        if !done.insert((node_id, direction)) {
            return false;
        }
        open.insert(node_id);

        for edge in node.edges() {
            if edge.dst_id == MOCK_SOURCE_ID || edge.dst_id == MOCK_SINK_ID {
                continue;
            }
            if edge.kind.src_strand() != direction {
                continue;
            }
            if open.contains(&edge.dst_id) {
                return true;
            }
            if self.cycle_from(edge.dst_id, edge.kind.dst_strand(), open, done) {
                return true;
            }
        }

        open.remove(&node_id);
        false
    }

    /* ---------------------------- compression --------------------------- */

    /// Mutually mergeable neighbours of a node whose sequences admit the
    /// (k-1) overlap under the edge-derived direction and reversal.
    pub fn find_compressible_neighbours(&self, src_id: u64) -> Vec<NodeNeighbour> {
        if src_id == MOCK_SOURCE_ID || src_id == MOCK_SINK_ID {
            return Vec::new();
        }

        let Some(src) = self.nodes.get(&src_id) else { return Vec::new() };
        let src_neighbours = src.find_mergeable_neighbours();
        if src_neighbours.is_empty() {
            return Vec::new();
        }

        let mut results = Vec::with_capacity(src_neighbours.len());
        for candidate in src_neighbours {
            let Some(buddy) = self.nodes.get(&candidate.id) else { continue };

            let mutual = buddy.find_mergeable_neighbours().iter().any(|n| n.id == src_id);
            if !mutual {
                continue;
            }

            let dir = MergeSide::from_source_strand(candidate.kind.src_strand());
            let reverse_buddy = candidate.kind.src_strand() != candidate.kind.dst_strand();
            if src.can_merge(buddy, dir, reverse_buddy, self.k) {
                results.push(candidate);
            }
        }

        results
    }

    /// Fold a chain of buddies into `src_id`, rewiring the buddies' other
    /// edges onto the merged node with strand-corrected kinds.
    fn compress_node(&mut self, src_id: u64, buddies: &[NodeNeighbour], compressed: &mut AHashSet<u64>) {
        if buddies.is_empty() || buddies.len() > 2 {
            return;
        }

        let mut remaining: std::collections::BTreeSet<NodeNeighbour> =
            buddies.iter().filter(|n| !compressed.contains(&n.id)).copied().collect();

        while !remaining.is_empty() && remaining.len() <= 2 {
            let candidate = *remaining.iter().next().expect("non-empty set");
            remaining.remove(&candidate);

            // a two-node loop lists the same buddy once per direction
            if compressed.contains(&candidate.id) {
                continue;
            }

            let Some(buddy) = self.nodes.get(&candidate.id).cloned() else { continue };

            let dir = MergeSide::from_source_strand(candidate.kind.src_strand());
            let reverse_buddy = candidate.kind.src_strand() != candidate.kind.dst_strand();

            let can_merge = self
                .nodes
                .get(&src_id)
                .map_or(false, |src| src.can_merge(&buddy, dir, reverse_buddy, self.k));
            if !can_merge {
                continue;
            }

            {
                let src = self.nodes.get_mut(&src_id).expect("merge source present");
                src.merge_buddy(&buddy, dir, reverse_buddy, self.k);
                src.erase_edges_to(candidate.id);
            }
            compressed.insert(candidate.id);

            for buddy_edge in buddy.edges() {
                let neighbour_id = buddy_edge.dst_id;
                if neighbour_id == src_id || !self.nodes.contains_key(&neighbour_id) {
                    continue;
                }

                let src_link_strand = if reverse_buddy {
                    buddy_edge.kind.src_strand().reversed()
                } else {
                    buddy_edge.kind.src_strand()
                };
                let result_kind = EdgeKind::new(src_link_strand, buddy_edge.kind.dst_strand());

                if neighbour_id == candidate.id {
                    // self-loop on the buddy lands on the merged node
                    self.nodes.get_mut(&src_id).expect("merge source").add_edge(src_id, result_kind);
                    continue;
                }

                self.nodes.get_mut(&src_id).expect("merge source").add_edge(neighbour_id, result_kind);
                let neighbour = self.nodes.get_mut(&neighbour_id).expect("buddy neighbour present");
                neighbour.erase_edges_to(candidate.id);
                neighbour.add_edge(src_id, result_kind.reversed());
            }

            for next in self.find_compressible_neighbours(src_id) {
                if !compressed.contains(&next.id) {
                    remaining.insert(next);
                }
            }
        }
    }

    /// Remove a real node together with every reciprocal edge pointing at
    /// it. Mock nodes are never removed.
    pub fn erase_node(&mut self, id: u64) {
        let Some(node) = self.nodes.get(&id) else { return };
        if node.is_mock() {
            return;
        }

        let edges: Vec<Edge> = node.edges().copied().collect();
        for edge in edges {
            if let Some(neighbour) = self.nodes.get_mut(&edge.dst_id) {
                neighbour.erase_edge(id, edge.kind.reversed());
            }
        }
        self.nodes.remove(&id);
    }

    /* ----------------------- transcript extraction ---------------------- */

    /// Align one enumerated path against the reference anchor and convert
    /// the differing alignment columns into variant transcripts.
    fn process_path(
        &self,
        path: &Path,
        ref_infos: &RefInfos,
        mark: &SrcSnkResult,
        results: &mut Vec<Variant>,
    ) -> Result<()> {
        let path_seq = path.seq();
        let ref_anchor = &self.window.seq()[mark.start_offset..mark.end_offset];
        if path_seq == ref_anchor {
            return Ok(());
        }

        let (nml_infos, tmr_infos) = ref_infos.slice(mark.start_offset, mark.end_offset);

        let mut aligned = if hamming_within(ref_anchor, path_seq, 5) {
            AlignedPair::from_equal_lengths(ref_anchor, path_seq)
        } else {
            align(ref_anchor, path_seq).map_err(|_| CallerError::AlignmentFailure {
                window: self.window.region_string(),
                ref_seq: ref_anchor.to_owned(),
                qry_seq: path_seq.to_owned(),
            })?
        };

        let ref_start_trim = trim_end_gaps(&mut aligned);
        let anchor_genome_start = self.window.start() + (mark.start_offset + ref_start_trim) as u64;

        let ref_aln = aligned.ref_aln.as_bytes();
        let qry_aln = aligned.qry_aln.as_bytes();
        debug_assert_eq!(ref_aln.len(), qry_aln.len());

        let mut ref_pos = 0usize; // bases of ref consumed so far
        let mut path_pos = 0usize; // bases of path consumed so far
        let mut code = TranscriptCode::RefMatch;
        let mut transcripts: Vec<Transcript> = Vec::new();

        let is_base = |b: u8| matches!(b, b'A' | b'C' | b'G' | b'T');

        for idx in 0..ref_aln.len() {
            let prev_code = code;
            let ref_idx;

            if ref_aln[idx] == b'-' {
                code = TranscriptCode::Insertion;
                ref_idx = ref_pos;
                path_pos += 1;
            } else if qry_aln[idx] == b'-' {
                code = TranscriptCode::Deletion;
                ref_idx = ref_pos;
                ref_pos += 1;
            } else {
                code = if ref_aln[idx] == qry_aln[idx] { TranscriptCode::RefMatch } else { TranscriptCode::Snv };
                ref_idx = ref_pos;
                ref_pos += 1;
                path_pos += 1;
            }

            if code == TranscriptCode::RefMatch {
                continue;
            }

            debug_assert!(path_pos > 0, "end-gap trimming anchors the first column");
            let path_idx = path_pos.saturating_sub(1);
            let genome_ref_pos = anchor_genome_start + ref_idx as u64 + 1;

            let within_tumor_node = path.spanning_tumor_ratio(path_pos).map_or(false, |r| r >= 0.8);

            // previous non-gap base on each side, for VCF-style anchoring
            let mut prev_ref_idx = idx.saturating_sub(1);
            while prev_ref_idx > 0 && !is_base(ref_aln[prev_ref_idx]) {
                prev_ref_idx -= 1;
            }
            let mut prev_alt_idx = idx.saturating_sub(1);
            while prev_alt_idx > 0 && !is_base(qry_aln[prev_alt_idx]) {
                prev_alt_idx -= 1;
            }

            // start a new transcript when the previous column matched
            if transcripts.is_empty() || prev_code == TranscriptCode::RefMatch {
                let offsets = TranscriptOffsets {
                    ref_start: ref_idx,
                    alt_start: path_idx,
                    ref_end: ref_idx + 1,
                    alt_end: path_idx + 1,
                };

                let mut transcript = Transcript::new(
                    self.window.chromosome(),
                    genome_ref_pos,
                    code,
                    offsets,
                    ref_aln[prev_ref_idx] as char,
                    qry_aln[prev_alt_idx] as char,
                    within_tumor_node,
                );

                if is_base(ref_aln[idx]) {
                    transcript.push_ref_base(ref_aln[idx] as char);
                }
                if is_base(qry_aln[idx]) {
                    transcript.push_alt_base(qry_aln[idx] as char);
                }

                transcript.add_cov(SampleLabel::Normal, Allele::Ref, ref_base_cov(nml_infos, ref_idx));
                transcript.add_cov(SampleLabel::Normal, Allele::Alt, path.hp_cov_at(SampleLabel::Normal, path_idx));
                transcript.add_cov(SampleLabel::Tumor, Allele::Ref, ref_base_cov(tmr_infos, ref_idx));
                transcript.add_cov(SampleLabel::Tumor, Allele::Alt, path.hp_cov_at(SampleLabel::Tumor, path_idx));

                transcripts.push(transcript);
                continue;
            }

            // otherwise extend the open transcript
            let transcript = transcripts.last_mut().expect("open transcript");
            let same_code = transcript.code() == code;

            if within_tumor_node && !transcript.is_somatic() {
                transcript.set_somatic(true);
            }
            if matches!(code, TranscriptCode::Insertion | TranscriptCode::Snv) {
                transcript.set_alt_end(path_idx + 1);
                transcript.push_alt_base(qry_aln[idx] as char);
            }
            if matches!(code, TranscriptCode::Deletion | TranscriptCode::Snv) {
                transcript.set_ref_end(ref_idx + 1);
                transcript.push_ref_base(ref_aln[idx] as char);
            }

            // a run of inserted bases shares one genome position
            if same_code && code == TranscriptCode::Insertion && transcript.position() == genome_ref_pos {
                transcript.add_cov(SampleLabel::Tumor, Allele::Alt, path.hp_cov_at(SampleLabel::Tumor, path_idx));
                transcript.add_cov(SampleLabel::Normal, Allele::Alt, path.hp_cov_at(SampleLabel::Normal, path_idx));
                continue;
            }

            // a run of deleted bases stays contiguous on the reference
            let deleted_len = transcript.ref_seq().len() as u64;
            if same_code
                && code == TranscriptCode::Deletion
                && transcript.position() + deleted_len - 1 == genome_ref_pos
            {
                transcript.add_cov(SampleLabel::Normal, Allele::Ref, ref_base_cov(nml_infos, ref_idx));
                transcript.add_cov(SampleLabel::Tumor, Allele::Ref, ref_base_cov(tmr_infos, ref_idx));
                continue;
            }

            // mixed event: promote to a complex record and track both sides
            transcript.set_code(TranscriptCode::Complex);
            transcript.add_cov(SampleLabel::Normal, Allele::Ref, ref_base_cov(nml_infos, ref_idx));
            transcript.add_cov(SampleLabel::Tumor, Allele::Ref, ref_base_cov(tmr_infos, ref_idx));
            transcript.add_cov(SampleLabel::Tumor, Allele::Alt, path.hp_cov_at(SampleLabel::Tumor, path_idx));
            transcript.add_cov(SampleLabel::Normal, Allele::Alt, path.hp_cov_at(SampleLabel::Normal, path_idx));
        }

        // Left-shifted indels can desynchronize reference and path
        // coverage; account for k+1 extra positions past each indel end
        // and attach the repeat context at the variant start.
        let tandem_params = self.params.tandem_params();
        for transcript in &mut transcripts {
            transcript.set_str_result(find_tandem_repeat(path_seq, transcript.alt_start(), &tandem_params));

            if matches!(transcript.code(), TranscriptCode::RefMatch | TranscriptCode::Snv) {
                continue;
            }

            for pos in 0..=self.k {
                let curr_path_idx = transcript.alt_end() + pos;
                let curr_ref_idx = transcript.ref_end() + pos;

                if let Some(ratio) = path.spanning_tumor_ratio(curr_path_idx) {
                    if ratio >= 0.8 {
                        transcript.set_somatic(true);
                    }
                }

                if curr_ref_idx < nml_infos.len() && curr_ref_idx < tmr_infos.len() {
                    transcript.add_cov(SampleLabel::Normal, Allele::Ref, nml_infos[curr_ref_idx]);
                    transcript.add_cov(SampleLabel::Tumor, Allele::Ref, tmr_infos[curr_ref_idx]);
                }

                if curr_path_idx >= path.len() {
                    continue;
                }
                transcript.add_cov(SampleLabel::Tumor, Allele::Alt, path.hp_cov_at(SampleLabel::Tumor, curr_path_idx));
                transcript.add_cov(SampleLabel::Normal, Allele::Alt, path.hp_cov_at(SampleLabel::Normal, curr_path_idx));
            }
        }

        for transcript in transcripts {
            if !transcript.has_alt_cov() || transcript.compute_state() == VariantState::None {
                continue;
            }
            results.push(Variant::from_transcript(&transcript, self.k));
        }

        Ok(())
    }

    /* ------------------------------- dumps ------------------------------ */

    fn write_dot(&self, comp_id: u64, suffix: &str) {
        DotSerializer::new(self).write_component(comp_id, suffix);
    }

    fn write_dot_paths(&self, comp_id: u64, per_path_touches: &[Vec<EdgeHandle>]) {
        DotSerializer::new(self).write_component_paths(comp_id, per_path_touches);
    }
}

/// Reference coverage at an anchored index; all-zero when the alignment
/// walks past the clamped range.
fn ref_base_cov(infos: &[crate::core::BaseHpCov], idx: usize) -> crate::core::BaseHpCov {
    infos.get(idx).copied().unwrap_or_default()
}
