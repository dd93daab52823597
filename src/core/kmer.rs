//! Canonical k-mer representation and identity hashing.
//!
//! A canonical k-mer is the lexicographically smaller of a sequence and its
//! reverse complement; the strand flag records which one was observed.
//! Node identity is a 64-bit hash of the canonical sequence computed with a
//! fixed seed pair, so ids are stable across runs for a pinned hasher
//! version. The two seeds are the largest primes below 2^64.

use ahash::RandomState;
use anyhow::{bail, Result};
use once_cell::sync::Lazy;

use crate::core::sequence::{is_canonical_dna, rev_comp};
use crate::core::{MergeSide, Strand};

/// First fixed seed of the k-mer identity hash.
pub const HASH_SEED_0: u64 = 18_446_744_073_709_551_557;
/// Second fixed seed of the k-mer identity hash.
pub const HASH_SEED_1: u64 = 18_446_744_073_709_551_533;

/// Reserved id of the synthetic traversal source node.
pub const MOCK_SOURCE_ID: u64 = 0;
/// Reserved id of the synthetic traversal sink node.
pub const MOCK_SINK_ID: u64 = u64::MAX;

static ID_HASHER: Lazy<RandomState> =
    Lazy::new(|| RandomState::with_seeds(HASH_SEED_0, HASH_SEED_1, HASH_SEED_0, HASH_SEED_1));

/// Identity hash of an already-canonical sequence.
#[inline]
pub fn sequence_id(canonical_seq: &str) -> u64 {
    ID_HASHER.hash_one(canonical_seq.as_bytes())
}

/// Canonical-k-mer ids for every k-mer of `seq`, in order. Windows holding
/// non-ACGT bases yield `None` so callers keep positional alignment with
/// the reference.
pub fn canonical_kmer_ids(seq: &str, k: usize) -> Vec<Option<u64>> {
    if seq.len() < k {
        return Vec::new();
    }

    seq.as_bytes()
        .windows(k)
        .map(|w| {
            let sub = std::str::from_utf8(w).ok()?;
            Kmer::new(sub).ok().map(|m| m.id())
        })
        .collect()
}

/// A canonical k-mer with the strand of its original observation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Kmer {
    seq: String,
    strand: Strand,
}

impl Kmer {
    /// Canonicalize a DNA sequence. Fails on empty input or non-ACGT bases.
    pub fn new(seq: &str) -> Result<Self> {
        if !is_canonical_dna(seq) {
            bail!("invalid DNA sequence for k-mer: {seq}");
        }

        let rc = rev_comp(seq);
        if seq <= rc.as_str() {
            Ok(Kmer { seq: seq.to_owned(), strand: Strand::Fwd })
        } else {
            Ok(Kmer { seq: rc, strand: Strand::Rev })
        }
    }

    /// An empty placeholder for mock nodes; carries no sequence.
    pub(crate) fn empty() -> Self {
        Kmer { seq: String::new(), strand: Strand::Fwd }
    }

    #[inline]
    pub fn id(&self) -> u64 {
        sequence_id(&self.seq)
    }

    #[inline]
    pub fn seq(&self) -> &str {
        &self.seq
    }

    /// Strand of the observed k-mer relative to the canonical form.
    #[inline]
    pub fn strand(&self) -> Strand {
        self.strand
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.seq.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.seq.is_empty()
    }

    /// The k-mer as it was observed (reverse complement of the canonical
    /// sequence when the observation was on the reverse strand).
    pub fn fwd_seq(&self) -> String {
        match self.strand {
            Strand::Fwd => self.seq.clone(),
            Strand::Rev => rev_comp(&self.seq),
        }
    }

    /// Check the (k-1) overlap constraint against a merge buddy.
    pub fn can_merge_with(&self, buddy: &Kmer, dir: MergeSide, reverse_buddy: bool, k: usize) -> bool {
        if self.len() < k || buddy.len() < k {
            return false;
        }

        let overlap = k - 1;
        let buddy_seq = if reverse_buddy { rev_comp(&buddy.seq) } else { buddy.seq.clone() };

        match dir {
            MergeSide::Back => self.seq[self.len() - overlap..] == buddy_seq[..overlap],
            MergeSide::Front => buddy_seq[buddy_seq.len() - overlap..] == self.seq[..overlap],
        }
    }

    /// Merge a buddy sequence across the shared (k-1) overlap. Callers must
    /// have verified `can_merge_with` for the same direction and reversal.
    pub fn merge_buddy(&mut self, buddy: &Kmer, dir: MergeSide, reverse_buddy: bool, k: usize) {
        let overlap = k - 1;
        let buddy_seq = if reverse_buddy { rev_comp(&buddy.seq) } else { buddy.seq.clone() };

        match dir {
            MergeSide::Back => self.seq.push_str(&buddy_seq[overlap..]),
            MergeSide::Front => {
                let mut merged = buddy_seq[..buddy_seq.len() - overlap].to_owned();
                merged.push_str(&self.seq);
                self.seq = merged;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonicalization_picks_lex_min() {
        let fwd = Kmer::new("AACGT").unwrap();
        assert_eq!(fwd.seq(), "AACGT");
        assert_eq!(fwd.strand(), Strand::Fwd);

        // revcomp of TTTGG is CCAAA which sorts first
        let rev = Kmer::new("TTTGG").unwrap();
        assert_eq!(rev.seq(), "CCAAA");
        assert_eq!(rev.strand(), Strand::Rev);
        assert_eq!(rev.fwd_seq(), "TTTGG");
    }

    #[test]
    fn canonicalization_is_idempotent() {
        let once = Kmer::new("GGTTT").unwrap();
        let twice = Kmer::new(once.seq()).unwrap();
        assert_eq!(once.seq(), twice.seq());
        assert_eq!(twice.strand(), Strand::Fwd);
    }

    #[test]
    fn id_is_strand_stable() {
        let a = Kmer::new("ACGGTTA").unwrap();
        let b = Kmer::new(&rev_comp("ACGGTTA")).unwrap();
        assert_eq!(a.id(), b.id());
        assert_eq!(a.seq(), b.seq());
    }

    #[test]
    fn ids_differ_for_distinct_kmers() {
        assert_ne!(Kmer::new("ACGTA").unwrap().id(), Kmer::new("ACGTC").unwrap().id());
    }

    #[test]
    fn rejects_ambiguous_bases() {
        assert!(Kmer::new("ACGNT").is_err());
        assert!(Kmer::new("").is_err());
    }

    #[test]
    fn reference_scan_skips_ambiguous_windows() {
        let ids = canonical_kmer_ids("ACGTNACGTA", 5);
        assert_eq!(ids.len(), 6);
        assert!(ids[0].is_none()); // window contains the N
        assert!(ids[5].is_some());
    }

    #[test]
    fn merge_back_with_reversal() {
        // ATTTG followed by TTTGG (canonical CCAAA, observed on REV strand)
        let mut node = Kmer::new("ATTTG").unwrap();
        let buddy = Kmer::new("TTTGG").unwrap();
        assert!(node.can_merge_with(&buddy, MergeSide::Back, true, 5));
        node.merge_buddy(&buddy, MergeSide::Back, true, 5);
        assert_eq!(node.seq(), "ATTTGG");
    }

    #[test]
    fn merge_front_prepends_buddy() {
        // CGTA precedes ACGG when ACGG is read reverse-complemented
        let mut node = Kmer::new("ACGG").unwrap();
        let buddy = Kmer::new("CGTA").unwrap();
        assert!(node.can_merge_with(&buddy, MergeSide::Front, true, 4));
        node.merge_buddy(&buddy, MergeSide::Front, true, 4);
        assert_eq!(node.seq(), "TACGG");
    }
}
