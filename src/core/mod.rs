//! Core Sequence And Coverage Primitives
//! =====================================
//!
//! Canonical k-mers, per-base coverage/haplotype bookkeeping, per-base
//! color labels, tandem-repeat detection, and the shared positional merge
//! used when adjacent graph nodes are compressed across a (k-1) overlap.

pub mod coverage;
pub mod kmer;
pub mod labels;
pub mod sequence;
pub mod tandem;

pub use coverage::{BaseCov, BaseHp, BaseHpCov, CovBucket, HpCov, NodeCov, NodeHp};
pub use kmer::{Kmer, MOCK_SINK_ID, MOCK_SOURCE_ID};
pub use labels::{KmerLabel, NodeLabel};
pub use tandem::{find_tandem_repeat, TandemRepeatParams, TandemRepeatResult};

/// Strand of a k-mer relative to its canonical form, or of a sequenced read
/// relative to the reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Strand {
    Fwd,
    Rev,
}

impl Strand {
    #[inline]
    pub fn reversed(self) -> Strand {
        match self {
            Strand::Fwd => Strand::Rev,
            Strand::Rev => Strand::Fwd,
        }
    }
}

/// Which sample a read (or a coverage slot) belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SampleLabel {
    Normal,
    Tumor,
}

/// Read-phase annotation: unassigned, first or second haplotype.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Haplotype {
    Unassigned,
    First,
    Second,
}

impl Haplotype {
    /// Bucket index into per-base haplotype arrays.
    #[inline]
    pub fn bucket(self) -> usize {
        match self {
            Haplotype::Unassigned => 0,
            Haplotype::First => 1,
            Haplotype::Second => 2,
        }
    }
}

/// Reference or alternate allele slot of a coverage statistic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Allele {
    Ref,
    Alt,
}

/// Placement of a merge buddy relative to the node that absorbs it.
/// An edge whose source strand is forward extends the node past its last
/// base, so the buddy lands at the back; a reverse source strand extends
/// past the first base and the buddy lands at the front.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeSide {
    Front,
    Back,
}

impl MergeSide {
    #[inline]
    pub fn from_source_strand(src: Strand) -> MergeSide {
        match src {
            Strand::Fwd => MergeSide::Back,
            Strand::Rev => MergeSide::Front,
        }
    }
}

/// Merge two per-base info arrays across a (k-1) overlap.
///
/// Coverage and label arrays are position-indexed, not base-indexed: on
/// reversal the buddy array is reversed but never complemented. The overlap
/// is discarded from the buddy side only.
pub fn merge_positional<T: Clone>(ours: &mut Vec<T>, buddy: &[T], dir: MergeSide, reverse_buddy: bool, k: usize) {
    let overlap = k - 1;
    debug_assert!(buddy.len() >= overlap);

    let mut other: Vec<T> = buddy.to_vec();
    if reverse_buddy {
        other.reverse();
    }

    match dir {
        MergeSide::Back => ours.extend_from_slice(&other[overlap..]),
        MergeSide::Front => {
            let keep = other.len() - overlap;
            let mut merged = Vec::with_capacity(keep + ours.len());
            merged.extend_from_slice(&other[..keep]);
            merged.append(ours);
            *ours = merged;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_back_drops_buddy_overlap() {
        let mut ours = vec![1, 2, 3, 4, 5];
        merge_positional(&mut ours, &[40, 50, 60, 70, 80], MergeSide::Back, false, 5);
        assert_eq!(ours, vec![1, 2, 3, 4, 5, 80]);
    }

    #[test]
    fn merge_front_keeps_buddy_prefix() {
        let mut ours = vec![1, 2, 3, 4, 5];
        merge_positional(&mut ours, &[40, 50, 60, 70, 80], MergeSide::Front, false, 5);
        assert_eq!(ours, vec![40, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn merge_reversal_flips_positions_only() {
        let mut ours = vec![1, 2, 3];
        merge_positional(&mut ours, &[7, 8, 9], MergeSide::Back, true, 3);
        // reversed buddy is [9, 8, 7]; the first k-1 = 2 entries overlap
        assert_eq!(ours, vec![1, 2, 3, 7]);
    }

    #[test]
    fn merge_side_follows_source_strand() {
        assert_eq!(MergeSide::from_source_strand(Strand::Fwd), MergeSide::Back);
        assert_eq!(MergeSide::from_source_strand(Strand::Rev), MergeSide::Front);
    }
}
