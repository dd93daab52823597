//! Shared variant store.
//!
//! All workers publish into one store. Writes are serialized by a mutex
//! but never ordered by window; identical calls (same chromosome,
//! position, alleles and kind) merge idempotently, so re-publishing after
//! a retried flush is harmless.

use ahash::AHashMap;
use parking_lot::Mutex;

use crate::variant::{Variant, VariantKey};

/// Identifies the worker publishing a batch; useful for tracing store
/// contention and required by the push interfaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProducerToken(pub usize);

#[derive(Debug, Default)]
pub struct VariantStore {
    inner: Mutex<AHashMap<VariantKey, Variant>>,
}

impl VariantStore {
    pub fn new() -> VariantStore {
        VariantStore::default()
    }

    /// Non-blocking publish. On contention the buffer is handed back to
    /// the caller untouched so it can be retried later.
    pub fn try_push(&self, _token: ProducerToken, variants: Vec<Variant>) -> Result<(), Vec<Variant>> {
        match self.inner.try_lock() {
            Some(mut guard) => {
                for variant in variants {
                    guard.entry(variant.key()).or_insert(variant);
                }
                Ok(())
            }
            None => Err(variants),
        }
    }

    /// Blocking publish; waits for any other writer to finish.
    pub fn push(&self, _token: ProducerToken, variants: Vec<Variant>) {
        let mut guard = self.inner.lock();
        for variant in variants {
            guard.entry(variant.key()).or_insert(variant);
        }
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    /// Snapshot of every stored variant sorted by genomic coordinate,
    /// for deterministic downstream consumption.
    pub fn sorted_variants(&self) -> Vec<Variant> {
        let mut variants: Vec<Variant> = self.inner.lock().values().cloned().collect();
        variants.sort_by(|a, b| {
            (a.chrom.as_str(), a.pos, a.ref_allele.as_str(), a.alt_allele.as_str()).cmp(&(
                b.chrom.as_str(),
                b.pos,
                b.ref_allele.as_str(),
                b.alt_allele.as_str(),
            ))
        });
        variants
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::variant::transcript::{Transcript, TranscriptCode, TranscriptOffsets};
    use crate::core::{Allele, BaseHpCov, CovBucket, SampleLabel};

    fn variant(pos: u64, alt: &str) -> Variant {
        let mut t = Transcript::new(
            "chr1",
            pos,
            TranscriptCode::Snv,
            TranscriptOffsets::default(),
            'A',
            'A',
            true,
        );
        t.push_ref_base('C');
        for b in alt.chars() {
            t.push_alt_base(b);
        }
        let cov = BaseHpCov { raw: CovBucket { fwd: 5, rev: 0, hp0: 5, hp1: 0, hp2: 0 }, ..Default::default() };
        t.add_cov(SampleLabel::Tumor, Allele::Alt, cov);
        Variant::from_transcript(&t, 11)
    }

    #[test]
    fn identical_pushes_are_idempotent() {
        let store = VariantStore::new();
        let token = ProducerToken(0);

        store.push(token, vec![variant(100, "T"), variant(200, "G")]);
        store.push(token, vec![variant(100, "T")]);

        assert_eq!(store.len(), 2);
        let sorted = store.sorted_variants();
        assert_eq!(sorted[0].pos, 100);
        assert_eq!(sorted[1].pos, 200);
    }

    #[test]
    fn try_push_returns_buffer_under_contention() {
        let store = VariantStore::new();
        let guard = store.inner.lock();

        let rejected = store.try_push(ProducerToken(1), vec![variant(100, "T")]);
        assert!(rejected.is_err());
        assert_eq!(rejected.unwrap_err().len(), 1);

        drop(guard);
        assert!(store.try_push(ProducerToken(1), vec![variant(100, "T")]).is_ok());
        assert_eq!(store.len(), 1);
    }
}
