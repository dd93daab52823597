//! Variant Records And The Shared Store
//! ====================================
//!
//! Transcripts from the alignment walk are normalized into VCF-style
//! variant records (indels anchored on the previous reference base) and
//! published to a process-wide idempotent store.

pub mod sample_cov;
pub mod store;
pub mod transcript;

pub use sample_cov::{CovStat, SampleCov};
pub use store::{ProducerToken, VariantStore};
pub use transcript::{Transcript, TranscriptCode, VariantState};

use crate::core::tandem::TandemRepeatResult;
use crate::core::SampleLabel;

/// Identity of a variant for deduplication across paths and windows.
pub type VariantKey = (String, u64, String, String, TranscriptCode);

/// A normalized variant call.
#[derive(Debug, Clone)]
pub struct Variant {
    pub chrom: String,
    /// 1-based genome position of the first REF base.
    pub pos: u64,
    pub ref_allele: String,
    pub alt_allele: String,
    pub kind: TranscriptCode,
    pub state: VariantState,
    pub is_somatic: bool,
    /// k used by the assembly that produced this call.
    pub kmer_size: usize,
    pub str_result: TandemRepeatResult,
    pub nml_cov: SampleCov,
    pub tmr_cov: SampleCov,
}

impl Variant {
    /// Normalize a transcript into VCF-style alleles. Insertions and
    /// deletions are anchored on the previous reference base, the way a
    /// VCF record expects them.
    pub fn from_transcript(transcript: &Transcript, kmer_size: usize) -> Variant {
        let prev = transcript.prev_ref_base();

        let (pos, ref_allele, alt_allele) = match transcript.code() {
            TranscriptCode::Insertion => (
                transcript.position() - 1,
                prev.to_string(),
                format!("{prev}{}", transcript.alt_seq()),
            ),
            TranscriptCode::Deletion => (
                transcript.position() - 1,
                format!("{prev}{}", transcript.ref_seq()),
                prev.to_string(),
            ),
            _ => (
                transcript.position(),
                transcript.ref_seq().to_owned(),
                transcript.alt_seq().to_owned(),
            ),
        };

        Variant {
            chrom: transcript.chrom().to_owned(),
            pos,
            ref_allele,
            alt_allele,
            kind: transcript.code(),
            state: transcript.compute_state(),
            is_somatic: transcript.is_somatic(),
            kmer_size,
            str_result: transcript.str_result().clone(),
            nml_cov: transcript.sample_cov(SampleLabel::Normal).clone(),
            tmr_cov: transcript.sample_cov(SampleLabel::Tumor).clone(),
        }
    }

    /// Length of the event: 0 for SNVs, inserted/deleted bases for indels,
    /// the longer side for complex events.
    pub fn length(&self) -> usize {
        match self.kind {
            TranscriptCode::Snv => 0,
            TranscriptCode::Insertion => self.alt_allele.len() - self.ref_allele.len(),
            TranscriptCode::Deletion => self.ref_allele.len() - self.alt_allele.len(),
            _ => self.ref_allele.len().max(self.alt_allele.len()),
        }
    }

    pub fn key(&self) -> VariantKey {
        (self.chrom.clone(), self.pos, self.ref_allele.clone(), self.alt_allele.clone(), self.kind)
    }
}

impl std::fmt::Display for Variant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}:{} {}>{} ({:?}, {:?})",
            self.chrom, self.pos, self.ref_allele, self.alt_allele, self.kind, self.state
        )
    }
}
