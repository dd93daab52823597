//! Variant transcripts: the typed record produced for each run of
//! non-matching alignment columns, before VCF-style normalization.

use crate::core::tandem::TandemRepeatResult;
use crate::core::{Allele, BaseHpCov, SampleLabel};
use crate::variant::sample_cov::SampleCov;

/// Event class of a transcript, as read off the alignment walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TranscriptCode {
    RefMatch,
    Snv,
    Insertion,
    Deletion,
    Complex,
}

/// Joint tumor/normal support classification of a finished transcript.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VariantState {
    /// No alternate support in either sample.
    None,
    /// Alternate support in the tumor only.
    Somatic,
    /// Alternate support in the normal only.
    Normal,
    /// Alternate support in both samples.
    Shared,
}

/// Half-open offsets of the event within the trimmed reference anchor and
/// the path sequence.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TranscriptOffsets {
    pub ref_start: usize,
    pub alt_start: usize,
    pub ref_end: usize,
    pub alt_end: usize,
}

#[derive(Debug, Clone)]
pub struct Transcript {
    chrom: String,
    pos: u64,
    code: TranscriptCode,
    offsets: TranscriptOffsets,
    ref_seq: String,
    alt_seq: String,
    prev_ref_base: char,
    prev_alt_base: char,
    nml_cov: SampleCov,
    tmr_cov: SampleCov,
    is_somatic: bool,
    str_result: TandemRepeatResult,
}

impl Transcript {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        chrom: &str,
        pos: u64,
        code: TranscriptCode,
        offsets: TranscriptOffsets,
        prev_ref_base: char,
        prev_alt_base: char,
        is_somatic: bool,
    ) -> Transcript {
        Transcript {
            chrom: chrom.to_owned(),
            pos,
            code,
            offsets,
            ref_seq: String::new(),
            alt_seq: String::new(),
            prev_ref_base,
            prev_alt_base,
            nml_cov: SampleCov::default(),
            tmr_cov: SampleCov::default(),
            is_somatic,
            str_result: TandemRepeatResult::default(),
        }
    }

    #[inline]
    pub fn chrom(&self) -> &str {
        &self.chrom
    }

    /// 1-based genome position of the first event column.
    #[inline]
    pub fn position(&self) -> u64 {
        self.pos
    }

    #[inline]
    pub fn code(&self) -> TranscriptCode {
        self.code
    }

    pub fn set_code(&mut self, code: TranscriptCode) {
        self.code = code;
    }

    #[inline]
    pub fn ref_seq(&self) -> &str {
        &self.ref_seq
    }

    #[inline]
    pub fn alt_seq(&self) -> &str {
        &self.alt_seq
    }

    #[inline]
    pub fn prev_ref_base(&self) -> char {
        self.prev_ref_base
    }

    #[inline]
    pub fn prev_alt_base(&self) -> char {
        self.prev_alt_base
    }

    pub fn push_ref_base(&mut self, base: char) {
        self.ref_seq.push(base);
    }

    pub fn push_alt_base(&mut self, base: char) {
        self.alt_seq.push(base);
    }

    #[inline]
    pub fn ref_start(&self) -> usize {
        self.offsets.ref_start
    }

    #[inline]
    pub fn alt_start(&self) -> usize {
        self.offsets.alt_start
    }

    #[inline]
    pub fn ref_end(&self) -> usize {
        self.offsets.ref_end
    }

    #[inline]
    pub fn alt_end(&self) -> usize {
        self.offsets.alt_end
    }

    pub fn set_ref_end(&mut self, end: usize) {
        self.offsets.ref_end = end;
    }

    pub fn set_alt_end(&mut self, end: usize) {
        self.offsets.alt_end = end;
    }

    #[inline]
    pub fn is_somatic(&self) -> bool {
        self.is_somatic
    }

    pub fn set_somatic(&mut self, somatic: bool) {
        self.is_somatic = somatic;
    }

    pub fn str_result(&self) -> &TandemRepeatResult {
        &self.str_result
    }

    pub fn set_str_result(&mut self, result: TandemRepeatResult) {
        self.str_result = result;
    }

    pub fn sample_cov(&self, label: SampleLabel) -> &SampleCov {
        match label {
            SampleLabel::Normal => &self.nml_cov,
            SampleLabel::Tumor => &self.tmr_cov,
        }
    }

    /// Fold one per-base coverage summary into a sample/allele slot.
    pub fn add_cov(&mut self, label: SampleLabel, allele: Allele, cov: BaseHpCov) {
        match label {
            SampleLabel::Normal => self.nml_cov.push(allele, cov),
            SampleLabel::Tumor => self.tmr_cov.push(allele, cov),
        }
    }

    /// True iff either sample ever showed alternate-allele support.
    pub fn has_alt_cov(&self) -> bool {
        self.nml_cov.has_support(Allele::Alt) || self.tmr_cov.has_support(Allele::Alt)
    }

    /// Classify the transcript by which samples carry the alternate. A
    /// sample counts as a carrier only when every pushed alternate
    /// position saw depth, so shared flank bases next to an indel do not
    /// masquerade as support.
    pub fn compute_state(&self) -> VariantState {
        let tumor = self.tmr_cov.minimum_total(Allele::Alt) > 0;
        let normal = self.nml_cov.minimum_total(Allele::Alt) > 0;
        match (tumor, normal) {
            (false, false) => VariantState::None,
            (true, false) => VariantState::Somatic,
            (false, true) => VariantState::Normal,
            (true, true) => VariantState::Shared,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::CovBucket;

    fn alt_cov(total: u16) -> BaseHpCov {
        BaseHpCov { raw: CovBucket { fwd: total, rev: 0, hp0: total, hp1: 0, hp2: 0 }, ..Default::default() }
    }

    fn transcript(code: TranscriptCode) -> Transcript {
        Transcript::new("chr1", 100, code, TranscriptOffsets::default(), 'A', 'A', false)
    }

    #[test]
    fn state_follows_sample_support() {
        let mut t = transcript(TranscriptCode::Snv);
        assert_eq!(t.compute_state(), VariantState::None);
        assert!(!t.has_alt_cov());

        t.add_cov(SampleLabel::Tumor, Allele::Alt, alt_cov(7));
        assert_eq!(t.compute_state(), VariantState::Somatic);
        assert!(t.has_alt_cov());

        t.add_cov(SampleLabel::Normal, Allele::Alt, alt_cov(3));
        assert_eq!(t.compute_state(), VariantState::Shared);
    }

    #[test]
    fn zero_coverage_is_not_support() {
        let mut t = transcript(TranscriptCode::Snv);
        t.add_cov(SampleLabel::Tumor, Allele::Alt, BaseHpCov::default());
        assert_eq!(t.compute_state(), VariantState::None);
    }

    #[test]
    fn bases_accumulate_per_side() {
        let mut t = transcript(TranscriptCode::Deletion);
        t.push_ref_base('A');
        t.push_ref_base('C');
        assert_eq!(t.ref_seq(), "AC");
        assert_eq!(t.alt_seq(), "");
    }
}
