//! Candidate haplotype paths and the builders that grow them during
//! enumeration.
//!
//! A builder is a cheap, cloneable record of (edge, node) steps from the
//! mock source; the full sequence and per-base coverage are only assembled
//! once a builder is chosen as the best path of an enumeration round.

use ahash::AHashMap;

use crate::assembly::edge::EdgeHandle;
use crate::assembly::node::Node;
use crate::core::sequence::rev_comp;
use crate::core::{BaseHpCov, KmerLabel, SampleLabel, Strand};

/// Span of one node inside the assembled path sequence, with the only
/// per-node detail transcript extraction needs: the tumor label ratio.
#[derive(Debug, Clone)]
struct PathSpan {
    end: usize,
    tumor_ratio: f64,
}

/// A partial source-to-sink walk under construction.
#[derive(Debug, Clone)]
pub struct PathBuilder {
    steps: Vec<(EdgeHandle, u64)>,
    score: u32,
    touched_sink: bool,
    direction: Strand,
    seq_len: usize,
    k: usize,
    tenx_mode: bool,
}

impl PathBuilder {
    pub fn new(k: usize, tenx_mode: bool) -> PathBuilder {
        PathBuilder {
            steps: Vec::new(),
            score: 0,
            touched_sink: false,
            direction: Strand::Fwd,
            seq_len: 0,
            k,
            tenx_mode,
        }
    }

    #[inline]
    pub fn num_nodes(&self) -> usize {
        self.steps.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    #[inline]
    pub fn last_node_id(&self) -> Option<u64> {
        self.steps.last().map(|(_, id)| *id)
    }

    /// Assembled sequence length so far.
    #[inline]
    pub fn path_length(&self) -> usize {
        self.seq_len
    }

    #[inline]
    pub fn score(&self) -> u32 {
        self.score.saturating_add(self.linked_read_bonus())
    }

    #[inline]
    pub fn increment_score(&mut self) {
        self.score += 1;
    }

    #[inline]
    pub fn touched_sink(&self) -> bool {
        self.touched_sink
    }

    #[inline]
    pub fn mark_sink_touch(&mut self) {
        self.touched_sink = true;
    }

    /// Traversal direction for the next extension: the destination strand
    /// of the last traversed edge, forward before any step is taken.
    #[inline]
    pub fn direction(&self) -> Strand {
        self.direction
    }

    /// Linked-read barcode consistency does not contribute to the score
    /// yet; this is the seam where a 10x-aware scorer plugs in.
    #[inline]
    fn linked_read_bonus(&self) -> u32 {
        let _ = self.tenx_mode;
        0
    }

    /// Append one traversed edge and its destination node.
    pub fn extend(&mut self, edge: EdgeHandle, node: &Node) {
        self.seq_len += if self.steps.is_empty() { node.len() } else { node.len() - (self.k - 1) };
        self.direction = edge.kind.dst_strand();
        self.steps.push((edge, node.id()));
    }

    pub fn edges(&self) -> impl Iterator<Item = &EdgeHandle> {
        self.steps.iter().map(|(e, _)| e)
    }

    /// Assemble the finished path: node sequences oriented by the edge
    /// destination strands, (k-1) overlaps collapsed, and per-base
    /// coverage summaries stitched the same way.
    pub fn build(&self, nodes: &AHashMap<u64, Node>) -> Option<Path> {
        if self.steps.is_empty() {
            return None;
        }

        let overlap = self.k - 1;
        let mut seq = String::with_capacity(self.seq_len);
        let mut nml_cov: Vec<BaseHpCov> = Vec::with_capacity(self.seq_len);
        let mut tmr_cov: Vec<BaseHpCov> = Vec::with_capacity(self.seq_len);
        let mut spans: Vec<PathSpan> = Vec::with_capacity(self.steps.len());
        let mut node_ids: Vec<u64> = Vec::with_capacity(self.steps.len());

        for (idx, (edge, node_id)) in self.steps.iter().enumerate() {
            let node = nodes.get(node_id)?;
            node_ids.push(*node_id);

            let reversed = edge.kind.dst_strand() == Strand::Rev;
            let oriented_seq = if reversed { rev_comp(node.seq()) } else { node.seq().to_owned() };

            let oriented_cov = |label: SampleLabel| -> Vec<BaseHpCov> {
                let mut covs: Vec<BaseHpCov> = node
                    .cov()
                    .base_covs(label)
                    .iter()
                    .zip(node.hp().base_hps(label).iter())
                    .map(|(c, h)| BaseHpCov::from_parts(c, h))
                    .collect();
                if reversed {
                    covs.reverse();
                }
                covs
            };

            let nml = oriented_cov(SampleLabel::Normal);
            let tmr = oriented_cov(SampleLabel::Tumor);

            let skip = if idx == 0 { 0 } else { overlap };
            seq.push_str(&oriented_seq[skip..]);
            nml_cov.extend_from_slice(&nml[skip..]);
            tmr_cov.extend_from_slice(&tmr[skip..]);

            spans.push(PathSpan { end: seq.len(), tumor_ratio: node.label_ratio(KmerLabel::Tumor) });
        }

        debug_assert_eq!(seq.len(), self.seq_len);
        debug_assert_eq!(seq.len(), nml_cov.len());

        Some(Path {
            nodes: node_ids,
            edges: self.steps.iter().map(|(e, _)| *e).collect(),
            seq,
            nml_cov,
            tmr_cov,
            spans,
        })
    }
}

/// A complete mock-source to mock-sink walk with its assembled sequence
/// and per-base coverage. Valid only for the graph it was built from.
#[derive(Debug, Clone)]
pub struct Path {
    nodes: Vec<u64>,
    edges: Vec<EdgeHandle>,
    seq: String,
    nml_cov: Vec<BaseHpCov>,
    tmr_cov: Vec<BaseHpCov>,
    spans: Vec<PathSpan>,
}

impl Path {
    #[inline]
    pub fn len(&self) -> usize {
        self.seq.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.seq.is_empty()
    }

    #[inline]
    pub fn seq(&self) -> &str {
        &self.seq
    }

    pub fn node_ids(&self) -> &[u64] {
        &self.nodes
    }

    pub fn touched_edges(&self) -> &[EdgeHandle] {
        &self.edges
    }

    /// Coverage summary of one path base; all-zero past the path end so
    /// indel resynchronization can walk off the edge harmlessly.
    pub fn hp_cov_at(&self, label: SampleLabel, idx: usize) -> BaseHpCov {
        let covs = match label {
            SampleLabel::Normal => &self.nml_cov,
            SampleLabel::Tumor => &self.tmr_cov,
        };
        covs.get(idx).copied().unwrap_or_default()
    }

    /// Tumor label ratio of the node spanning the given 1-based path
    /// position, if any node covers it.
    pub fn spanning_tumor_ratio(&self, path_pos: usize) -> Option<f64> {
        self.spans.iter().find(|s| s.end >= path_pos).map(|s| s.tumor_ratio)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembly::edge::{Edge, EdgeKind};
    use crate::core::kmer::{Kmer, MOCK_SOURCE_ID};
    use crate::core::Haplotype;

    fn node_with_cov(seq: &str, label: SampleLabel) -> Node {
        let mut node = Node::new(Kmer::new(seq).unwrap());
        let len = node.len();
        node.update_coverage(label, Strand::Fwd, Haplotype::Unassigned, &vec![true; len]);
        node
    }

    #[test]
    fn builder_tracks_length_and_direction() {
        let mut builder = PathBuilder::new(5, false);
        assert_eq!(builder.direction(), Strand::Fwd);
        assert_eq!(builder.path_length(), 0);

        let first = node_with_cov("AACGT", SampleLabel::Normal);
        let second = node_with_cov("ACGTC", SampleLabel::Normal);

        builder.extend(
            EdgeHandle::new(MOCK_SOURCE_ID, Edge::new(first.id(), EdgeKind::FF)),
            &first,
        );
        assert_eq!(builder.path_length(), 5);

        builder.extend(
            EdgeHandle::new(first.id(), Edge::new(second.id(), EdgeKind::FF)),
            &second,
        );
        assert_eq!(builder.path_length(), 6);
        assert_eq!(builder.last_node_id(), Some(second.id()));
    }

    #[test]
    fn build_collapses_overlaps() {
        let first = node_with_cov("AACGT", SampleLabel::Normal);
        let second = node_with_cov("ACGTC", SampleLabel::Tumor);

        let mut nodes = AHashMap::new();
        nodes.insert(first.id(), first.clone());
        nodes.insert(second.id(), second.clone());

        let mut builder = PathBuilder::new(5, false);
        builder.extend(EdgeHandle::new(MOCK_SOURCE_ID, Edge::new(first.id(), EdgeKind::FF)), &first);
        builder.extend(EdgeHandle::new(first.id(), Edge::new(second.id(), EdgeKind::FF)), &second);

        let path = builder.build(&nodes).expect("path builds");
        assert_eq!(path.seq(), "AACGTC");
        assert_eq!(path.len(), 6);

        // the appended base carries the tumor node's coverage
        assert_eq!(path.hp_cov_at(SampleLabel::Tumor, 5).raw.total(), 1);
        assert_eq!(path.hp_cov_at(SampleLabel::Normal, 5).raw.total(), 0);
        // positions past the end read as empty coverage
        assert_eq!(path.hp_cov_at(SampleLabel::Tumor, 99).raw.total(), 0);
    }

    #[test]
    fn spanning_node_resolves_by_position() {
        let first = node_with_cov("AACGT", SampleLabel::Normal);
        let second = node_with_cov("ACGTC", SampleLabel::Tumor);

        let mut nodes = AHashMap::new();
        nodes.insert(first.id(), first.clone());
        nodes.insert(second.id(), second.clone());

        let mut builder = PathBuilder::new(5, false);
        builder.extend(EdgeHandle::new(MOCK_SOURCE_ID, Edge::new(first.id(), EdgeKind::FF)), &first);
        builder.extend(EdgeHandle::new(first.id(), Edge::new(second.id(), EdgeKind::FF)), &second);
        let path = builder.build(&nodes).unwrap();

        // the first five bases resolve to the normal-only node
        assert_eq!(path.spanning_tumor_ratio(3), Some(0.0));
        // the final base resolves to the tumor-only node
        assert_eq!(path.spanning_tumor_ratio(6), Some(1.0));
        assert_eq!(path.spanning_tumor_ratio(7), None);
    }
}
