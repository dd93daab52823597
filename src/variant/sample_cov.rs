//! Running per-sample coverage statistics attached to a transcript.
//!
//! Twenty slots per sample: {ref, alt} x {fwd, rev, hp0, hp1, hp2} x
//! {raw, bq-pass}. Each slot is a small online accumulator exposing mean,
//! minimum and their nonzero-only variants, which is all downstream
//! filtering needs.

use crate::core::{Allele, BaseHpCov, Haplotype, Strand};

/// Online accumulator over pushed u16 counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CovStat {
    count: u32,
    sum: u64,
    min: u16,
    nz_count: u32,
    nz_sum: u64,
    nz_min: u16,
}

impl CovStat {
    pub fn push(&mut self, value: u16) {
        if self.count == 0 || value < self.min {
            self.min = value;
        }
        self.count += 1;
        self.sum += u64::from(value);

        if value > 0 {
            if self.nz_count == 0 || value < self.nz_min {
                self.nz_min = value;
            }
            self.nz_count += 1;
            self.nz_sum += u64::from(value);
        }
    }

    pub fn mean(&self) -> f32 {
        if self.count == 0 {
            return 0.0;
        }
        self.sum as f32 / self.count as f32
    }

    pub fn non_zero_mean(&self) -> f32 {
        if self.nz_count == 0 {
            return 0.0;
        }
        self.nz_sum as f32 / self.nz_count as f32
    }

    pub fn minimum(&self) -> u16 {
        if self.count == 0 {
            0
        } else {
            self.min
        }
    }

    pub fn non_zero_minimum(&self) -> u16 {
        if self.nz_count == 0 {
            0
        } else {
            self.nz_min
        }
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn any_nonzero(&self) -> bool {
        self.nz_count > 0
    }
}

const NUM_SLOTS: usize = 20;

/// Coverage statistics of one sample for one transcript.
#[derive(Debug, Clone, Default)]
pub struct SampleCov {
    data: [CovStat; NUM_SLOTS],
    /// Strand-combined raw depth per allele, tracked separately so allele
    /// support can use the minimum across pushed positions. An indel's
    /// first pushed position sits on shared flank sequence; only the
    /// minimum over the whole event distinguishes carrier samples.
    totals: [CovStat; 2],
}

impl SampleCov {
    /// Seed with one reference-allele and one alternate-allele position.
    pub fn new(ref_cov: BaseHpCov, alt_cov: BaseHpCov) -> SampleCov {
        let mut cov = SampleCov::default();
        cov.push(Allele::Ref, ref_cov);
        cov.push(Allele::Alt, alt_cov);
        cov
    }

    /// Fold one per-base coverage summary into the allele's slots.
    pub fn push(&mut self, allele: Allele, cov: BaseHpCov) {
        self.totals[if allele == Allele::Ref { 0 } else { 1 }].push(cov.raw.total());

        self.data[Self::strand_idx(allele, Strand::Fwd, false)].push(cov.raw.fwd);
        self.data[Self::strand_idx(allele, Strand::Rev, false)].push(cov.raw.rev);
        self.data[Self::strand_idx(allele, Strand::Fwd, true)].push(cov.bq_pass.fwd);
        self.data[Self::strand_idx(allele, Strand::Rev, true)].push(cov.bq_pass.rev);

        self.data[Self::hp_idx(allele, Haplotype::Unassigned, false)].push(cov.raw.hp0);
        self.data[Self::hp_idx(allele, Haplotype::First, false)].push(cov.raw.hp1);
        self.data[Self::hp_idx(allele, Haplotype::Second, false)].push(cov.raw.hp2);

        self.data[Self::hp_idx(allele, Haplotype::Unassigned, true)].push(cov.bq_pass.hp0);
        self.data[Self::hp_idx(allele, Haplotype::First, true)].push(cov.bq_pass.hp1);
        self.data[Self::hp_idx(allele, Haplotype::Second, true)].push(cov.bq_pass.hp2);
    }

    pub fn mean(&self, allele: Allele, strand: Strand, bq_pass: bool) -> f32 {
        self.data[Self::strand_idx(allele, strand, bq_pass)].mean()
    }

    pub fn mean_hp(&self, allele: Allele, hp: Haplotype, bq_pass: bool) -> f32 {
        self.data[Self::hp_idx(allele, hp, bq_pass)].mean()
    }

    pub fn non_zero_mean(&self, allele: Allele, strand: Strand, bq_pass: bool) -> f32 {
        self.data[Self::strand_idx(allele, strand, bq_pass)].non_zero_mean()
    }

    pub fn minimum(&self, allele: Allele, strand: Strand, bq_pass: bool) -> u16 {
        self.data[Self::strand_idx(allele, strand, bq_pass)].minimum()
    }

    pub fn non_zero_minimum(&self, allele: Allele, strand: Strand, bq_pass: bool) -> u16 {
        self.data[Self::strand_idx(allele, strand, bq_pass)].non_zero_minimum()
    }

    /// Mean raw depth of an allele, both strands combined.
    pub fn total_mean(&self, allele: Allele) -> f32 {
        self.mean(allele, Strand::Fwd, false) + self.mean(allele, Strand::Rev, false)
    }

    /// True iff any raw strand slot of the allele ever saw support.
    pub fn has_support(&self, allele: Allele) -> bool {
        self.data[Self::strand_idx(allele, Strand::Fwd, false)].any_nonzero()
            || self.data[Self::strand_idx(allele, Strand::Rev, false)].any_nonzero()
    }

    /// Minimum strand-combined raw depth of the allele over every pushed
    /// position. Zero whenever any tracked position lacked the allele,
    /// so shared flank bases do not count as carrier evidence.
    pub fn minimum_total(&self, allele: Allele) -> u16 {
        self.totals[if allele == Allele::Ref { 0 } else { 1 }].minimum()
    }

    #[inline]
    fn strand_idx(allele: Allele, strand: Strand, bq_pass: bool) -> usize {
        let base = if allele == Allele::Ref { 0 } else { 10 };
        let strand_off = if strand == Strand::Fwd { 0 } else { 1 };
        let bq_off = if bq_pass { 2 } else { 0 };
        base + strand_off + bq_off
    }

    #[inline]
    fn hp_idx(allele: Allele, hp: Haplotype, bq_pass: bool) -> usize {
        let base = if allele == Allele::Ref { 4 } else { 14 };
        let bq_off = if bq_pass { 3 } else { 0 };
        base + hp.bucket() + bq_off
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::CovBucket;

    fn cov(fwd: u16, rev: u16) -> BaseHpCov {
        BaseHpCov {
            raw: CovBucket { fwd, rev, hp0: fwd + rev, hp1: 0, hp2: 0 },
            bq_pass: CovBucket { fwd, rev, hp0: fwd + rev, hp1: 0, hp2: 0 },
        }
    }

    #[test]
    fn online_stat_tracks_mean_and_min() {
        let mut stat = CovStat::default();
        assert_eq!(stat.mean(), 0.0);
        assert_eq!(stat.minimum(), 0);

        stat.push(4);
        stat.push(0);
        stat.push(8);
        assert_eq!(stat.mean(), 4.0);
        assert_eq!(stat.minimum(), 0);
        assert_eq!(stat.non_zero_mean(), 6.0);
        assert_eq!(stat.non_zero_minimum(), 4);
    }

    #[test]
    fn slots_keep_alleles_apart() {
        let mut sample = SampleCov::new(cov(5, 5), cov(2, 1));
        sample.push(Allele::Alt, cov(4, 3));

        assert_eq!(sample.mean(Allele::Ref, Strand::Fwd, false), 5.0);
        assert_eq!(sample.mean(Allele::Alt, Strand::Fwd, false), 3.0);
        assert_eq!(sample.mean(Allele::Alt, Strand::Rev, false), 2.0);
        assert!((sample.total_mean(Allele::Alt) - 5.0).abs() < 1e-6);
    }

    #[test]
    fn support_requires_nonzero_counts() {
        let sample = SampleCov::new(cov(3, 0), cov(0, 0));
        assert!(sample.has_support(Allele::Ref));
        assert!(!sample.has_support(Allele::Alt));
    }

    #[test]
    fn haplotype_buckets_are_recorded() {
        let sample = SampleCov::new(cov(1, 1), cov(2, 0));
        assert_eq!(sample.mean_hp(Allele::Alt, Haplotype::Unassigned, false), 2.0);
        assert_eq!(sample.mean_hp(Allele::Alt, Haplotype::First, false), 0.0);
    }
}
