//! Graph vertices: a canonical sequence plus per-base coverage, haplotype
//! and label arrays, and an ordered set of strand-annotated edges.

use std::collections::BTreeSet;

use crate::assembly::edge::{Edge, EdgeKind};
use crate::core::kmer::{Kmer, MOCK_SINK_ID, MOCK_SOURCE_ID};
use crate::core::{Haplotype, KmerLabel, MergeSide, NodeCov, NodeHp, NodeLabel, SampleLabel, Strand};

/// A mergeable neighbour of a node: the unique extension in one strand
/// direction, carrying the edge kind that reaches it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct NodeNeighbour {
    pub id: u64,
    pub kind: EdgeKind,
}

/// A vertex of the colored k-mer graph.
#[derive(Debug, Clone)]
pub struct Node {
    id: u64,
    kmer: Kmer,
    cov: NodeCov,
    hp: NodeHp,
    labels: NodeLabel,
    pub component_id: u64,
    edges: BTreeSet<Edge>,
}

impl Node {
    /// A real node seeded from one canonical k-mer.
    pub fn new(kmer: Kmer) -> Node {
        let len = kmer.len();
        Node {
            id: kmer.id(),
            kmer,
            cov: NodeCov::new(len),
            hp: NodeHp::new(len),
            labels: NodeLabel::new(len),
            component_id: 0,
            edges: BTreeSet::new(),
        }
    }

    /// One of the two reserved synthetic endpoints. Mock nodes carry no
    /// sequence, coverage or labels.
    pub fn mock(id: u64) -> Node {
        debug_assert!(id == MOCK_SOURCE_ID || id == MOCK_SINK_ID);
        Node {
            id,
            kmer: Kmer::empty(),
            cov: NodeCov::default(),
            hp: NodeHp::default(),
            labels: NodeLabel::default(),
            component_id: 0,
            edges: BTreeSet::new(),
        }
    }

    #[inline]
    pub fn id(&self) -> u64 {
        self.id
    }

    #[inline]
    pub fn is_mock(&self) -> bool {
        self.id == MOCK_SOURCE_ID || self.id == MOCK_SINK_ID
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.kmer.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.kmer.is_empty()
    }

    #[inline]
    pub fn seq(&self) -> &str {
        self.kmer.seq()
    }

    /// Canonical strand assignment of the node's initial k-mer.
    #[inline]
    pub fn orientation(&self) -> Strand {
        self.kmer.strand()
    }

    /* ------------------------------ edges ------------------------------ */

    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.iter()
    }

    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }

    pub fn num_edges_on(&self, src: Strand) -> usize {
        self.edges.iter().filter(|e| e.kind.src_strand() == src).count()
    }

    /// Insert an outgoing edge; duplicates are collapsed by the set.
    pub fn add_edge(&mut self, dst_id: u64, kind: EdgeKind) {
        self.edges.insert(Edge::new(dst_id, kind));
    }

    /// Remove every edge pointing at `dst_id`, of any kind.
    pub fn erase_edges_to(&mut self, dst_id: u64) {
        self.edges.retain(|e| e.dst_id != dst_id);
    }

    /// Remove one specific edge.
    pub fn erase_edge(&mut self, dst_id: u64, kind: EdgeKind) {
        self.edges.remove(&Edge::new(dst_id, kind));
    }

    pub fn clear_edges(&mut self) {
        self.edges.clear();
    }

    /* ---------------------------- coverage ----------------------------- */

    /// Record one k-mer observation over every base of the node.
    pub fn update_coverage(
        &mut self,
        label: SampleLabel,
        strand: Strand,
        hp: Haplotype,
        bq_pass: &[bool],
    ) {
        self.cov.update(label, strand, bq_pass);
        self.hp.update(hp, label, bq_pass);
        self.labels.push(match label {
            SampleLabel::Tumor => KmerLabel::Tumor,
            SampleLabel::Normal => KmerLabel::Normal,
        });
    }

    /// Mark the node as part of the reference backbone.
    pub fn push_label(&mut self, label: KmerLabel) {
        self.labels.push(label);
    }

    #[inline]
    pub fn cov(&self) -> &NodeCov {
        &self.cov
    }

    #[inline]
    pub fn hp(&self) -> &NodeHp {
        &self.hp
    }

    #[inline]
    pub fn labels(&self) -> &NodeLabel {
        &self.labels
    }

    pub fn sample_count(&self, label: SampleLabel) -> u16 {
        self.cov.sample_count(label)
    }

    pub fn total_sample_count(&self) -> u16 {
        self.cov.total_sample_count()
    }

    pub fn min_sample_base_cov(&self) -> u16 {
        self.cov.min_sample_base_cov()
    }

    pub fn label_ratio(&self, label: KmerLabel) -> f64 {
        self.labels.label_ratio(label)
    }

    /* --------------------------- compression ---------------------------- */

    /// Mergeable neighbours of this node: for each strand direction the
    /// node must have exactly one real outgoing edge (mock edges are
    /// anchors, not extensions) and that edge must not be a self-loop.
    pub fn find_mergeable_neighbours(&self) -> Vec<NodeNeighbour> {
        if self.is_mock() || self.edges.is_empty() {
            return Vec::new();
        }

        let mut results = Vec::with_capacity(2);
        for src in [Strand::Fwd, Strand::Rev] {
            let mut real = self
                .edges
                .iter()
                .filter(|e| e.kind.src_strand() == src)
                .filter(|e| e.dst_id != MOCK_SOURCE_ID && e.dst_id != MOCK_SINK_ID);

            match (real.next(), real.next()) {
                (Some(edge), None) if edge.dst_id != self.id => {
                    results.push(NodeNeighbour { id: edge.dst_id, kind: edge.kind });
                }
                _ => {}
            }
        }

        results
    }

    /// Check the (k-1) sequence overlap against a buddy for the merge
    /// direction and reversal derived from the connecting edge kind.
    pub fn can_merge(&self, buddy: &Node, dir: MergeSide, reverse_buddy: bool, k: usize) -> bool {
        if self.is_mock() || buddy.is_mock() {
            return false;
        }
        self.kmer.can_merge_with(&buddy.kmer, dir, reverse_buddy, k)
    }

    /// Absorb a buddy node: sequence, coverage, haplotype and label arrays
    /// are merged in the same direction with the same reversal, and the
    /// buddy's observation counts are added to ours.
    pub fn merge_buddy(&mut self, buddy: &Node, dir: MergeSide, reverse_buddy: bool, k: usize) {
        self.kmer.merge_buddy(&buddy.kmer, dir, reverse_buddy, k);
        self.cov.merge_buddy(&buddy.cov, dir, reverse_buddy, k);
        self.hp.merge_buddy(&buddy.hp, dir, reverse_buddy, k);
        self.labels.merge_buddy(&buddy.labels, dir, reverse_buddy, k);

        debug_assert_eq!(self.kmer.len(), self.cov.len());
        debug_assert_eq!(self.kmer.len(), self.labels.len());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn real_node(seq: &str) -> Node {
        Node::new(Kmer::new(seq).unwrap())
    }

    #[test]
    fn mock_nodes_carry_nothing() {
        let mock = Node::mock(MOCK_SOURCE_ID);
        assert!(mock.is_mock());
        assert!(mock.is_empty());
        assert_eq!(mock.total_sample_count(), 0);
    }

    #[test]
    fn edge_set_deduplicates() {
        let mut node = real_node("ACGTA");
        node.add_edge(42, EdgeKind::FF);
        node.add_edge(42, EdgeKind::FF);
        node.add_edge(42, EdgeKind::FR);
        assert_eq!(node.num_edges(), 2);

        node.erase_edge(42, EdgeKind::FF);
        assert_eq!(node.num_edges(), 1);
        node.erase_edges_to(42);
        assert_eq!(node.num_edges(), 0);
    }

    #[test]
    fn unique_extension_is_mergeable() {
        let mut node = real_node("ACGTA");
        node.add_edge(7, EdgeKind::FF);
        node.add_edge(9, EdgeKind::RF);

        let buddies = node.find_mergeable_neighbours();
        assert_eq!(buddies.len(), 2);
        assert!(buddies.contains(&NodeNeighbour { id: 7, kind: EdgeKind::FF }));
        assert!(buddies.contains(&NodeNeighbour { id: 9, kind: EdgeKind::RF }));
    }

    #[test]
    fn branching_direction_is_not_mergeable() {
        let mut node = real_node("ACGTA");
        node.add_edge(7, EdgeKind::FF);
        node.add_edge(8, EdgeKind::FR);
        node.add_edge(9, EdgeKind::RF);

        let buddies = node.find_mergeable_neighbours();
        assert_eq!(buddies.len(), 1);
        assert_eq!(buddies[0].id, 9);
    }

    #[test]
    fn mock_edges_do_not_count_as_extensions() {
        let mut node = real_node("ACGTA");
        node.add_edge(MOCK_SOURCE_ID, EdgeKind::FF);
        node.add_edge(9, EdgeKind::RF);

        let buddies = node.find_mergeable_neighbours();
        assert_eq!(buddies.len(), 1);
        assert_eq!(buddies[0].id, 9);
    }

    #[test]
    fn self_loop_blocks_merging() {
        let mut node = real_node("ACGTA");
        let self_id = node.id();
        node.add_edge(self_id, EdgeKind::FF);
        assert!(node.find_mergeable_neighbours().is_empty());
    }

    #[test]
    fn merge_grows_sequence_and_arrays() {
        let mut a = real_node("AACGT");
        let b = real_node("ACGTC");
        // AACGT -> ACGTC shares the 4-base overlap ACGT
        assert!(a.can_merge(&b, MergeSide::Back, false, 5));
        a.merge_buddy(&b, MergeSide::Back, false, 5);
        assert_eq!(a.seq(), "AACGTC");
        assert_eq!(a.cov().len(), 6);
        // one node of length 6 at k=5 spans exactly two source k-mers
        assert_eq!(a.len() - 5 + 1, 2);
    }
}
