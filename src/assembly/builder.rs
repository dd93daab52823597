//! Read-To-Graph Construction
//! ==========================
//!
//! Builds the colored k-mer graph for one (window, k) attempt from
//! in-memory reads, and the per-base reference coverage summaries the
//! transcript extractor consumes. Read extraction itself (BAM access,
//! quality filtering, haplotype tags) happens upstream; this module only
//! assumes reads aligned near the window with a window-relative offset.
//!
//! The reference backbone is inserted before any read so that anchor
//! nodes record the canonical strand of the reference k-mer, which keeps
//! enumerated paths oriented with the window.

use std::sync::Arc;

use crate::assembly::edge::EdgeKind;
use crate::assembly::graph::{Graph, NodeMap};
use crate::assembly::node::Node;
use crate::core::kmer::{Kmer, MOCK_SINK_ID, MOCK_SOURCE_ID};
use crate::core::{BaseHpCov, Haplotype, KmerLabel, SampleLabel, Strand};
use crate::pipeline::window::RefWindow;
use crate::utils::configuration::CallerConfig;

/// One aligned read handed to graph construction.
#[derive(Debug, Clone)]
pub struct SequencedRead {
    pub seq: String,
    pub sample: SampleLabel,
    pub strand: Strand,
    pub haplotype: Haplotype,
    /// 0-based alignment start relative to the window start; may be
    /// negative for reads hanging off the left edge.
    pub window_offset: i64,
    /// Per-base quality pass flags, same length as `seq`.
    pub bq_pass: Vec<bool>,
}

impl SequencedRead {
    pub fn new(seq: &str, sample: SampleLabel, window_offset: i64) -> Self {
        SequencedRead {
            seq: seq.to_owned(),
            sample,
            strand: Strand::Fwd,
            haplotype: Haplotype::Unassigned,
            window_offset,
            bq_pass: vec![true; seq.len()],
        }
    }

    /// Build the pass mask from raw base qualities and a quality floor.
    pub fn from_quals(seq: &str, sample: SampleLabel, window_offset: i64, quals: &[u8], min_bq: u8) -> Self {
        debug_assert_eq!(seq.len(), quals.len());
        SequencedRead {
            bq_pass: quals.iter().map(|&q| q >= min_bq).collect(),
            ..Self::new(seq, sample, window_offset)
        }
    }

    pub fn with_strand(mut self, strand: Strand) -> Self {
        self.strand = strand;
        self
    }

    pub fn with_haplotype(mut self, haplotype: Haplotype) -> Self {
        self.haplotype = haplotype;
        self
    }
}

/// Per-base reference coverage summaries over the window, one array per
/// sample. Index 0 of each array is the first window base.
#[derive(Debug, Clone, Default)]
pub struct RefInfos {
    nml: Vec<BaseHpCov>,
    tmr: Vec<BaseHpCov>,
}

impl RefInfos {
    pub fn len(&self) -> usize {
        self.nml.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nml.is_empty()
    }

    pub fn sample(&self, label: SampleLabel) -> &[BaseHpCov] {
        match label {
            SampleLabel::Normal => &self.nml,
            SampleLabel::Tumor => &self.tmr,
        }
    }

    /// Clamp both arrays to the anchored sub-range of the window.
    pub fn slice(&self, start: usize, end: usize) -> (&[BaseHpCov], &[BaseHpCov]) {
        let end = end.min(self.nml.len());
        let start = start.min(end);
        (&self.nml[start..end], &self.tmr[start..end])
    }
}

pub struct GraphBuilder;

impl GraphBuilder {
    /// Construct the graph for one (window, k) attempt.
    pub fn build(
        window: &Arc<RefWindow>,
        reads: &[SequencedRead],
        k: usize,
        params: &Arc<CallerConfig>,
    ) -> Graph {
        let mut nodes = NodeMap::default();
        nodes.insert(MOCK_SOURCE_ID, Node::mock(MOCK_SOURCE_ID));
        nodes.insert(MOCK_SINK_ID, Node::mock(MOCK_SINK_ID));

        Self::add_sequence(&mut nodes, window.seq(), k, None);
        for read in reads {
            Self::add_sequence(&mut nodes, &read.seq, k, Some(read));
        }

        let avg_cov = Self::average_coverage(window, reads);
        Graph::new(nodes, Arc::clone(window), avg_cov, k, Arc::clone(params))
    }

    /// Per-base reference coverage for both samples, built once per window
    /// from the read alignments.
    pub fn reference_infos(window: &RefWindow, reads: &[SequencedRead]) -> RefInfos {
        let len = window.len();
        let mut infos = RefInfos { nml: vec![BaseHpCov::default(); len], tmr: vec![BaseHpCov::default(); len] };

        for read in reads {
            let arr = match read.sample {
                SampleLabel::Normal => &mut infos.nml,
                SampleLabel::Tumor => &mut infos.tmr,
            };

            for (j, &pass) in read.bq_pass.iter().enumerate() {
                let ref_pos = read.window_offset + j as i64;
                if ref_pos < 0 || ref_pos >= len as i64 {
                    continue;
                }
                arr[ref_pos as usize].increment(read.strand, read.haplotype, pass);
            }
        }

        infos
    }

    /// Mean read depth over the window, across both samples.
    pub fn average_coverage(window: &RefWindow, reads: &[SequencedRead]) -> f64 {
        if window.len() == 0 {
            return 0.0;
        }

        let covered: i64 = reads
            .iter()
            .map(|r| {
                let start = r.window_offset.max(0);
                let end = (r.window_offset + r.seq.len() as i64).min(window.len() as i64);
                (end - start).max(0)
            })
            .sum();

        covered as f64 / window.len() as f64
    }

    /// Walk one sequence, inserting or updating one node per k-mer and a
    /// symmetric edge pair between every pair of adjacent k-mers. Windows
    /// holding non-ACGT bases break the chain.
    fn add_sequence(nodes: &mut NodeMap, seq: &str, k: usize, read: Option<&SequencedRead>) {
        if seq.len() < k {
            return;
        }

        let mut prev: Option<(u64, Strand)> = None;
        for (i, window) in seq.as_bytes().windows(k).enumerate() {
            let Ok(sub) = std::str::from_utf8(window) else {
                prev = None;
                continue;
            };
            let Ok(kmer) = Kmer::new(sub) else {
                prev = None;
                continue;
            };

            let id = kmer.id();
            let observed = kmer.strand();

            let node = nodes.entry(id).or_insert_with(|| Node::new(kmer));
            match read {
                Some(r) => {
                    let mut bq: Vec<bool> = r.bq_pass[i..i + k].to_vec();
                    if observed == Strand::Rev {
                        bq.reverse();
                    }
                    node.update_coverage(r.sample, r.strand, r.haplotype, &bq);
                }
                None => node.push_label(KmerLabel::Reference),
            }

            if let Some((prev_id, prev_obs)) = prev {
                let kind = EdgeKind::new(prev_obs, observed);
                if let Some(prev_node) = nodes.get_mut(&prev_id) {
                    prev_node.add_edge(id, kind);
                }
                if let Some(curr_node) = nodes.get_mut(&id) {
                    curr_node.add_edge(prev_id, kind.reversed());
                }
            }
            prev = Some((id, observed));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::kmer::sequence_id;

    fn test_window(seq: &str) -> Arc<RefWindow> {
        Arc::new(RefWindow::new("chr1", 1000, seq))
    }

    #[test]
    fn reference_backbone_is_labelled_not_covered() {
        let window = test_window("AACGTCTGAT");
        let params = Arc::new(CallerConfig::default());
        let graph = GraphBuilder::build(&window, &[], 5, &params);

        // 6 reference k-mers plus the two mocks
        assert_eq!(graph.nodes().len(), 8);
        let first = graph.nodes().get(&sequence_id("AACGT")).expect("ref node");
        assert!(first.labels().is_label_only(KmerLabel::Reference));
        assert_eq!(first.total_sample_count(), 0);
    }

    #[test]
    fn reads_add_coverage_and_edges() {
        let window = test_window("AACGTCTGAT");
        let params = Arc::new(CallerConfig::default());
        let reads = vec![
            SequencedRead::new("AACGTCTGAT", SampleLabel::Tumor, 0),
            SequencedRead::new("AACGTCTGAT", SampleLabel::Normal, 0).with_strand(Strand::Rev),
        ];
        let graph = GraphBuilder::build(&window, &reads, 5, &params);

        let first = graph.nodes().get(&sequence_id("AACGT")).expect("node");
        assert_eq!(first.sample_count(SampleLabel::Tumor), 1);
        assert_eq!(first.sample_count(SampleLabel::Normal), 1);
        assert!(first.labels().has_label(KmerLabel::Reference));
        assert!(first.labels().has_label(KmerLabel::Tumor));
        // one edge onward plus the symmetric edge back is held by the neighbour
        assert!(first.num_edges() >= 1);
    }

    #[test]
    fn ambiguous_bases_break_the_chain() {
        let window = test_window("AACGTNCTGAT");
        let params = Arc::new(CallerConfig::default());
        let graph = GraphBuilder::build(&window, &[], 5, &params);

        // only AACGT and CTGAT are clean windows, and they are unlinked
        assert_eq!(graph.nodes().len(), 4);
        let left = graph.nodes().get(&sequence_id("AACGT")).unwrap();
        assert_eq!(left.num_edges(), 0);
    }

    #[test]
    fn reference_infos_follow_offsets() {
        let window = test_window("AACGTCTGAT");
        let reads = vec![
            SequencedRead::new("GTCTG", SampleLabel::Tumor, 2),
            SequencedRead::new("AACG", SampleLabel::Normal, -2),
        ];

        let infos = GraphBuilder::reference_infos(&window, &reads);
        assert_eq!(infos.len(), 10);
        assert_eq!(infos.sample(SampleLabel::Tumor)[2].raw.total(), 1);
        assert_eq!(infos.sample(SampleLabel::Tumor)[7].raw.total(), 0);
        // the hanging read only covers its in-window suffix
        assert_eq!(infos.sample(SampleLabel::Normal)[0].raw.total(), 1);
        assert_eq!(infos.sample(SampleLabel::Normal)[2].raw.total(), 0);
    }

    #[test]
    fn average_coverage_counts_overlap_only() {
        let window = test_window("AACGTCTGAT");
        let reads = vec![
            SequencedRead::new("AACGTCTGAT", SampleLabel::Tumor, 0),
            SequencedRead::new("AACGTCTGAT", SampleLabel::Normal, 5),
        ];
        let cov = GraphBuilder::average_coverage(&window, &reads);
        assert!((cov - 1.5).abs() < 1e-9);
    }
}
