//! Shared fixtures for the integration tests: a synthetic reference
//! window, tumor/normal read sets, and graph assertions.
//!
//! The sequences are fixed and were chosen so that every 11-mer is
//! canonically unique, no two 11-mers are within two mismatches of each
//! other, and no short tandem repeat spans seven bases - except where a
//! scenario deliberately needs one.

#![allow(dead_code)]

use std::sync::Arc;

use variant_forge::assembly::builder::{GraphBuilder, SequencedRead};
use variant_forge::assembly::graph::Graph;
use variant_forge::core::SampleLabel;
use variant_forge::pipeline::window::RefWindow;
use variant_forge::utils::configuration::CallerConfig;
use variant_forge::variant::Variant;

/// 60 bp reference, repeat-free at k=11.
pub const REF: &str = "GTTGGTTCTAGAGTCTTTGGAAGTCCACACGGTCTGCTGCAGGGCCCCAGCATAGGATAG";

/// A 40 bp off-target block sharing no canonical 11-mer with `REF`.
pub const OFF_TARGET: &str = "GTGCAGTAACTCGGGAGTGTGATCCCCGTTCTCGGTATTC";

/// Reference with a 10xA homopolymer run at offsets 20..30.
pub const STR_REF: &str = "TTGGACCTGTGACAATGAGTAAAAAAAAAACTGACGATGTCGGTGACCTG";

/// `REF` with the SNV G>T at offset 30.
pub fn snv_alt() -> String {
    let mut alt = REF.to_owned();
    alt.replace_range(30..31, "T");
    alt
}

/// `REF` with TTG inserted between offsets 29 and 30.
pub fn insertion_alt() -> String {
    format!("{}TTG{}", &REF[..30], &REF[30..])
}

/// `STR_REF` with one A of the homopolymer run removed.
pub fn deletion_alt() -> String {
    format!("{}{}", &STR_REF[..20], &STR_REF[21..])
}

/// `REF` with a tandem duplication of offsets 18..42.
pub fn duplication_alt() -> String {
    format!("{}{}{}", &REF[..42], &REF[18..42], &REF[42..])
}

pub fn test_config() -> CallerConfig {
    CallerConfig { min_k: 11, max_k: 41, k_step: 10, num_workers: 2, ..CallerConfig::default() }
}

pub fn window(start: u64, seq: &str) -> Arc<RefWindow> {
    Arc::new(RefWindow::new("chr1", start, seq))
}

/// `count` full-length reads of `seq` aligned at the window start.
pub fn reads_of(seq: &str, sample: SampleLabel, count: usize) -> Vec<SequencedRead> {
    (0..count).map(|_| SequencedRead::new(seq, sample, 0)).collect()
}

pub fn build_graph(window: &Arc<RefWindow>, reads: &[SequencedRead], k: usize) -> Graph {
    let config = Arc::new(test_config());
    GraphBuilder::build(window, reads, k, &config)
}

/// Every edge must have its strand-reversed reciprocal on the destination
/// node.
pub fn assert_edge_symmetry(graph: &Graph) {
    for (id, node) in graph.nodes().iter() {
        for edge in node.edges() {
            let dst = graph
                .nodes()
                .get(&edge.dst_id)
                .unwrap_or_else(|| panic!("edge from {id} points at missing node {}", edge.dst_id));
            let reciprocal = dst.edges().any(|e| e.dst_id == *id && e.kind == edge.kind.reversed());
            assert!(
                reciprocal,
                "edge {id} -> {} ({}) has no reciprocal",
                edge.dst_id, edge.kind
            );
        }
    }
}

/// Every real node belongs to a component, and edges never cross
/// component boundaries.
pub fn assert_component_partition(graph: &Graph) {
    for node in graph.nodes().values() {
        if node.is_mock() {
            continue;
        }
        assert_ne!(node.component_id, 0, "real node without component");
        for edge in node.edges() {
            let dst = &graph.nodes()[&edge.dst_id];
            if dst.is_mock() {
                continue;
            }
            assert_eq!(node.component_id, dst.component_id, "edge crosses components");
        }
    }
}

/// Apply sorted variant calls to the window's reference sequence.
pub fn apply_variants(window_start: u64, ref_seq: &str, variants: &[Variant]) -> String {
    let mut sorted: Vec<&Variant> = variants.iter().collect();
    sorted.sort_by_key(|v| v.pos);

    let mut result = String::new();
    let mut cursor = 0usize;
    for v in sorted {
        let ref_off = (v.pos - 1 - window_start) as usize;
        assert!(ref_off >= cursor, "overlapping variants in round-trip check");
        result.push_str(&ref_seq[cursor..ref_off]);
        result.push_str(&v.alt_allele);
        cursor = ref_off + v.ref_allele.len();
    }
    result.push_str(&ref_seq[cursor..]);
    result
}
