//! Per-Base Coverage And Haplotype Bookkeeping
//! ===========================================
//!
//! Every graph node tracks, for each base of its (possibly compressed)
//! sequence and for each sample, strand-split raw and quality-passing
//! counts plus three haplotype buckets. The arrays are position-indexed:
//! when a merge reverses a buddy node they are reversed, never
//! complemented.

use serde::{Deserialize, Serialize};

use crate::core::{merge_positional, Haplotype, MergeSide, SampleLabel, Strand};

/// Strand-split coverage of a single base: raw counts and counts from
/// observations whose base quality passed the configured floor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaseCov {
    pub fwd_raw: u16,
    pub rev_raw: u16,
    pub fwd_bq_pass: u16,
    pub rev_bq_pass: u16,
}

impl BaseCov {
    #[inline]
    pub fn total_raw(&self) -> u16 {
        self.fwd_raw.saturating_add(self.rev_raw)
    }

    #[inline]
    pub fn total_bq_pass(&self) -> u16 {
        self.fwd_bq_pass.saturating_add(self.rev_bq_pass)
    }

    fn bump(&mut self, strand: Strand, bq_pass: bool) {
        match strand {
            Strand::Fwd => {
                self.fwd_raw = self.fwd_raw.saturating_add(1);
                if bq_pass {
                    self.fwd_bq_pass = self.fwd_bq_pass.saturating_add(1);
                }
            }
            Strand::Rev => {
                self.rev_raw = self.rev_raw.saturating_add(1);
                if bq_pass {
                    self.rev_bq_pass = self.rev_bq_pass.saturating_add(1);
                }
            }
        }
    }
}

/// Raw and quality-passing counts of one haplotype bucket at one base.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HpCov {
    pub raw: u16,
    pub bq_pass: u16,
}

/// The three haplotype buckets (unassigned, first, second) of one base.
pub type BaseHp = [HpCov; 3];

/// Per-sample, per-base strand coverage of a node, plus per-sample k-mer
/// observation counts split by read strand.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeCov {
    tmr_bases: Vec<BaseCov>,
    nml_bases: Vec<BaseCov>,
    cnt_tmr_fwd: u16,
    cnt_tmr_rev: u16,
    cnt_nml_fwd: u16,
    cnt_nml_rev: u16,
}

impl NodeCov {
    pub fn new(node_len: usize) -> Self {
        NodeCov {
            tmr_bases: vec![BaseCov::default(); node_len],
            nml_bases: vec![BaseCov::default(); node_len],
            ..NodeCov::default()
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.tmr_bases.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tmr_bases.is_empty()
    }

    pub fn base_covs(&self, label: SampleLabel) -> &[BaseCov] {
        match label {
            SampleLabel::Tumor => &self.tmr_bases,
            SampleLabel::Normal => &self.nml_bases,
        }
    }

    /// Record one observation of the node's k-mer: every base gains a raw
    /// count on the read strand and a quality-passing count where the
    /// per-base mask passes. The mask is indexed in canonical orientation.
    pub fn update(&mut self, label: SampleLabel, strand: Strand, bq_pass: &[bool]) {
        let bases = match label {
            SampleLabel::Tumor => &mut self.tmr_bases,
            SampleLabel::Normal => &mut self.nml_bases,
        };
        debug_assert_eq!(bases.len(), bq_pass.len());

        for (base, &pass) in bases.iter_mut().zip(bq_pass.iter()) {
            base.bump(strand, pass);
        }

        match (label, strand) {
            (SampleLabel::Tumor, Strand::Fwd) => self.cnt_tmr_fwd = self.cnt_tmr_fwd.saturating_add(1),
            (SampleLabel::Tumor, Strand::Rev) => self.cnt_tmr_rev = self.cnt_tmr_rev.saturating_add(1),
            (SampleLabel::Normal, Strand::Fwd) => self.cnt_nml_fwd = self.cnt_nml_fwd.saturating_add(1),
            (SampleLabel::Normal, Strand::Rev) => self.cnt_nml_rev = self.cnt_nml_rev.saturating_add(1),
        }
    }

    /// Number of k-mer observations from one sample.
    pub fn sample_count(&self, label: SampleLabel) -> u16 {
        match label {
            SampleLabel::Tumor => self.cnt_tmr_fwd.saturating_add(self.cnt_tmr_rev),
            SampleLabel::Normal => self.cnt_nml_fwd.saturating_add(self.cnt_nml_rev),
        }
    }

    pub fn total_sample_count(&self) -> u16 {
        self.sample_count(SampleLabel::Tumor)
            .saturating_add(self.sample_count(SampleLabel::Normal))
    }

    /// Minimum over bases of the raw coverage summed across both samples.
    /// A per-sample minimum would zero out on every somatic-only node, so
    /// the floor is applied to the combined depth.
    pub fn min_sample_base_cov(&self) -> u16 {
        self.tmr_bases
            .iter()
            .zip(self.nml_bases.iter())
            .map(|(t, n)| t.total_raw().saturating_add(n.total_raw()))
            .min()
            .unwrap_or(0)
    }

    pub fn merge_buddy(&mut self, buddy: &NodeCov, dir: MergeSide, reverse_buddy: bool, k: usize) {
        merge_positional(&mut self.tmr_bases, &buddy.tmr_bases, dir, reverse_buddy, k);
        merge_positional(&mut self.nml_bases, &buddy.nml_bases, dir, reverse_buddy, k);
        self.cnt_tmr_fwd = self.cnt_tmr_fwd.saturating_add(buddy.cnt_tmr_fwd);
        self.cnt_tmr_rev = self.cnt_tmr_rev.saturating_add(buddy.cnt_tmr_rev);
        self.cnt_nml_fwd = self.cnt_nml_fwd.saturating_add(buddy.cnt_nml_fwd);
        self.cnt_nml_rev = self.cnt_nml_rev.saturating_add(buddy.cnt_nml_rev);
    }

    pub fn reverse(&mut self) {
        self.tmr_bases.reverse();
        self.nml_bases.reverse();
    }
}

/// Per-sample, per-base haplotype buckets of a node.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeHp {
    tmr_bases: Vec<BaseHp>,
    nml_bases: Vec<BaseHp>,
}

impl NodeHp {
    pub fn new(node_len: usize) -> Self {
        NodeHp {
            tmr_bases: vec![BaseHp::default(); node_len],
            nml_bases: vec![BaseHp::default(); node_len],
        }
    }

    pub fn base_hps(&self, label: SampleLabel) -> &[BaseHp] {
        match label {
            SampleLabel::Tumor => &self.tmr_bases,
            SampleLabel::Normal => &self.nml_bases,
        }
    }

    /// Record one observation in the read's haplotype bucket across every
    /// base, with quality-passing counts gated by the per-base mask.
    pub fn update(&mut self, hp: Haplotype, label: SampleLabel, bq_pass: &[bool]) {
        let bases = match label {
            SampleLabel::Tumor => &mut self.tmr_bases,
            SampleLabel::Normal => &mut self.nml_bases,
        };
        debug_assert_eq!(bases.len(), bq_pass.len());

        let bucket = hp.bucket();
        for (base, &pass) in bases.iter_mut().zip(bq_pass.iter()) {
            base[bucket].raw = base[bucket].raw.saturating_add(1);
            if pass {
                base[bucket].bq_pass = base[bucket].bq_pass.saturating_add(1);
            }
        }
    }

    pub fn merge_buddy(&mut self, buddy: &NodeHp, dir: MergeSide, reverse_buddy: bool, k: usize) {
        merge_positional(&mut self.tmr_bases, &buddy.tmr_bases, dir, reverse_buddy, k);
        merge_positional(&mut self.nml_bases, &buddy.nml_bases, dir, reverse_buddy, k);
    }

    pub fn reverse(&mut self) {
        self.tmr_bases.reverse();
        self.nml_bases.reverse();
    }
}

/// One raw-or-bqpass slice of a per-base coverage summary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CovBucket {
    pub fwd: u16,
    pub rev: u16,
    pub hp0: u16,
    pub hp1: u16,
    pub hp2: u16,
}

impl CovBucket {
    #[inline]
    pub fn total(&self) -> u16 {
        self.fwd.saturating_add(self.rev)
    }
}

/// Combined strand + haplotype coverage summary for a single base. This is
/// the shape handed to transcript extraction, both for reference positions
/// and for path positions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaseHpCov {
    pub raw: CovBucket,
    pub bq_pass: CovBucket,
}

impl BaseHpCov {
    pub fn from_parts(cov: &BaseCov, hp: &BaseHp) -> Self {
        BaseHpCov {
            raw: CovBucket {
                fwd: cov.fwd_raw,
                rev: cov.rev_raw,
                hp0: hp[0].raw,
                hp1: hp[1].raw,
                hp2: hp[2].raw,
            },
            bq_pass: CovBucket {
                fwd: cov.fwd_bq_pass,
                rev: cov.rev_bq_pass,
                hp0: hp[0].bq_pass,
                hp1: hp[1].bq_pass,
                hp2: hp[2].bq_pass,
            },
        }
    }

    pub fn increment(&mut self, strand: Strand, hp: Haplotype, bq_pass: bool) {
        match strand {
            Strand::Fwd => self.raw.fwd = self.raw.fwd.saturating_add(1),
            Strand::Rev => self.raw.rev = self.raw.rev.saturating_add(1),
        }
        match hp {
            Haplotype::Unassigned => self.raw.hp0 = self.raw.hp0.saturating_add(1),
            Haplotype::First => self.raw.hp1 = self.raw.hp1.saturating_add(1),
            Haplotype::Second => self.raw.hp2 = self.raw.hp2.saturating_add(1),
        }
        if bq_pass {
            match strand {
                Strand::Fwd => self.bq_pass.fwd = self.bq_pass.fwd.saturating_add(1),
                Strand::Rev => self.bq_pass.rev = self.bq_pass.rev.saturating_add(1),
            }
            match hp {
                Haplotype::Unassigned => self.bq_pass.hp0 = self.bq_pass.hp0.saturating_add(1),
                Haplotype::First => self.bq_pass.hp1 = self.bq_pass.hp1.saturating_add(1),
                Haplotype::Second => self.bq_pass.hp2 = self.bq_pass.hp2.saturating_add(1),
            }
        }
    }
}
