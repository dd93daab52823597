//! Global pairwise alignment of a candidate path against its reference
//! anchor.
//!
//! Thin wrapper over rust-bio's Needleman-Wunsch implementation with
//! affine scoring (match +1, mismatch -1, gap open -4, gap extend -1).
//! Near-identical pairs skip alignment entirely: when both sequences have
//! the same length and a Hamming distance within 5, the unaligned strings
//! already line up column for column.

use anyhow::{bail, Result};
use bio::alignment::pairwise::Aligner;
use bio::alignment::AlignmentOperation;

use crate::core::sequence::is_canonical_dna;

pub const GAP: u8 = b'-';

const MATCH_SCORE: i32 = 1;
const MISMATCH_SCORE: i32 = -1;
const GAP_OPEN: i32 = -4;
const GAP_EXTEND: i32 = -1;

/// Two gap-padded strings of equal length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlignedPair {
    pub ref_aln: String,
    pub qry_aln: String,
}

impl AlignedPair {
    /// View two equal-length sequences as already aligned, column for
    /// column. Used when the Hamming distance makes alignment redundant.
    pub fn from_equal_lengths(ref_seq: &str, qry_seq: &str) -> AlignedPair {
        debug_assert_eq!(ref_seq.len(), qry_seq.len());
        AlignedPair { ref_aln: ref_seq.to_owned(), qry_aln: qry_seq.to_owned() }
    }
}

/// Globally align a query against a reference.
pub fn align(ref_seq: &str, qry_seq: &str) -> Result<AlignedPair> {
    if !is_canonical_dna(ref_seq) || !is_canonical_dna(qry_seq) {
        bail!("cannot align non-ACGT sequences: ref={ref_seq} qry={qry_seq}");
    }

    let score = |a: u8, b: u8| if a == b { MATCH_SCORE } else { MISMATCH_SCORE };
    let mut aligner = Aligner::with_capacity(qry_seq.len(), ref_seq.len(), GAP_OPEN, GAP_EXTEND, &score);
    let alignment = aligner.global(qry_seq.as_bytes(), ref_seq.as_bytes());

    let mut ref_aln = String::with_capacity(alignment.operations.len());
    let mut qry_aln = String::with_capacity(alignment.operations.len());
    let (ref_bytes, qry_bytes) = (ref_seq.as_bytes(), qry_seq.as_bytes());
    let (mut ref_idx, mut qry_idx) = (0usize, 0usize);

    for op in &alignment.operations {
        match op {
            AlignmentOperation::Match | AlignmentOperation::Subst => {
                ref_aln.push(ref_bytes[ref_idx] as char);
                qry_aln.push(qry_bytes[qry_idx] as char);
                ref_idx += 1;
                qry_idx += 1;
            }
            // consumes the query only: the reference shows a gap
            AlignmentOperation::Ins => {
                ref_aln.push(GAP as char);
                qry_aln.push(qry_bytes[qry_idx] as char);
                qry_idx += 1;
            }
            // consumes the reference only: the query shows a gap
            AlignmentOperation::Del => {
                ref_aln.push(ref_bytes[ref_idx] as char);
                qry_aln.push(GAP as char);
                ref_idx += 1;
            }
            AlignmentOperation::Xclip(_) | AlignmentOperation::Yclip(_) => {
                bail!("unexpected clip in global alignment of ref={ref_seq} qry={qry_seq}");
            }
        }
    }

    if ref_idx != ref_bytes.len() || qry_idx != qry_bytes.len() {
        bail!("incomplete global alignment of ref={ref_seq} qry={qry_seq}");
    }

    Ok(AlignedPair { ref_aln, qry_aln })
}

/// Trim leading and trailing alignment columns in which either string has
/// a gap. Returns the number of non-gap reference characters consumed by
/// the leading trim, which shifts the genome position of the anchor.
pub fn trim_end_gaps(aln: &mut AlignedPair) -> usize {
    let ref_bytes = aln.ref_aln.as_bytes();
    let qry_bytes = aln.qry_aln.as_bytes();
    debug_assert_eq!(ref_bytes.len(), qry_bytes.len());

    if ref_bytes.is_empty() {
        return 0;
    }

    let has_gap = |i: usize| ref_bytes[i] == GAP || qry_bytes[i] == GAP;

    let mut start = 0usize;
    let mut ref_start_trim = 0usize;
    while start < ref_bytes.len() && has_gap(start) {
        if ref_bytes[start] != GAP {
            ref_start_trim += 1;
        }
        start += 1;
    }

    if start == ref_bytes.len() {
        aln.ref_aln.clear();
        aln.qry_aln.clear();
        return ref_start_trim;
    }

    let mut end = ref_bytes.len() - 1;
    while end > start && has_gap(end) {
        end -= 1;
    }

    if start > 0 || end + 1 < aln.ref_aln.len() {
        aln.ref_aln = aln.ref_aln[start..=end].to_owned();
        aln.qry_aln = aln.qry_aln[start..=end].to_owned();
    }

    ref_start_trim
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_sequences_align_without_gaps() {
        let aln = align("ACGTACGT", "ACGTACGT").unwrap();
        assert_eq!(aln.ref_aln, "ACGTACGT");
        assert_eq!(aln.qry_aln, "ACGTACGT");
    }

    #[test]
    fn substitution_keeps_columns() {
        let aln = align("ACGTACGT", "ACGAACGT").unwrap();
        assert_eq!(aln.ref_aln, "ACGTACGT");
        assert_eq!(aln.qry_aln, "ACGAACGT");
    }

    #[test]
    fn insertion_gaps_the_reference() {
        let aln = align("ACGTACGT", "ACGTTTTACGT").unwrap();
        assert_eq!(aln.ref_aln.len(), aln.qry_aln.len());
        assert_eq!(aln.ref_aln.matches('-').count(), 3);
        assert_eq!(aln.qry_aln.matches('-').count(), 0);
        // stripping the gaps recovers both inputs
        assert_eq!(aln.ref_aln.replace('-', ""), "ACGTACGT");
        assert_eq!(aln.qry_aln.replace('-', ""), "ACGTTTTACGT");
    }

    #[test]
    fn deletion_gaps_the_query() {
        let aln = align("ACGTTTTACGT", "ACGTACGT").unwrap();
        assert_eq!(aln.qry_aln.matches('-').count(), 3);
        assert_eq!(aln.ref_aln.replace('-', ""), "ACGTTTTACGT");
        assert_eq!(aln.qry_aln.replace('-', ""), "ACGTACGT");
    }

    #[test]
    fn rejects_ambiguous_input() {
        assert!(align("ACGN", "ACGT").is_err());
    }

    #[test]
    fn trim_removes_end_gap_columns() {
        let mut aln = AlignedPair { ref_aln: "--ACGT-".to_owned(), qry_aln: "GGACGTT".to_owned() };
        let trimmed = trim_end_gaps(&mut aln);
        assert_eq!(aln.ref_aln, "ACGT");
        assert_eq!(aln.qry_aln, "ACGT");
        assert_eq!(trimmed, 0);
    }

    #[test]
    fn trim_counts_consumed_reference_bases() {
        let mut aln = AlignedPair { ref_aln: "AC-GTAC".to_owned(), qry_aln: "--TGTAC".to_owned() };
        let trimmed = trim_end_gaps(&mut aln);
        // the two leading columns consumed A and C from the reference
        assert_eq!(trimmed, 2);
        assert_eq!(aln.ref_aln, "GTAC");
        assert_eq!(aln.qry_aln, "GTAC");
    }

    #[test]
    fn trim_without_gaps_is_a_no_op() {
        let mut aln = AlignedPair::from_equal_lengths("ACGT", "ACTT");
        assert_eq!(trim_end_gaps(&mut aln), 0);
        assert_eq!(aln.ref_aln, "ACGT");
    }
}
