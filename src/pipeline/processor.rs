//! Per-Window Driver
//! =================
//!
//! Glue between the scheduler and the graph layer: pulls the reads for a
//! window, iterates the k ladder until the graph is repeat-free, and
//! buffers emitted variants for publication to the shared store.

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use tracing::{debug, warn};

use crate::assembly::builder::{GraphBuilder, SequencedRead};
use crate::pipeline::window::RefWindow;
use crate::utils::configuration::CallerConfig;
use crate::variant::store::{ProducerToken, VariantStore};
use crate::variant::Variant;

/// Source of reads for a window. BAM access, duplicate marking and
/// haplotype tags live behind this seam; tests and demos use the static
/// in-memory implementation.
pub trait ReadProvider: Send + Sync {
    fn reads_for(&self, window: &RefWindow) -> Result<Vec<SequencedRead>>;
}

/// A fixed read set served to every window, keyed by nothing. Suits unit
/// tests and single-window demos.
pub struct StaticReadProvider {
    reads: Vec<SequencedRead>,
}

impl StaticReadProvider {
    pub fn new(reads: Vec<SequencedRead>) -> StaticReadProvider {
        StaticReadProvider { reads }
    }
}

impl ReadProvider for StaticReadProvider {
    fn reads_for(&self, _window: &RefWindow) -> Result<Vec<SequencedRead>> {
        Ok(self.reads.clone())
    }
}

/// Drives single windows through graph construction, pruning and
/// transcript extraction, retrying with larger k on cycles and repeats.
pub struct WindowProcessor {
    config: Arc<CallerConfig>,
    provider: Arc<dyn ReadProvider>,
    variants: Vec<Variant>,
}

impl WindowProcessor {
    pub fn new(config: Arc<CallerConfig>, provider: Arc<dyn ReadProvider>) -> WindowProcessor {
        WindowProcessor { config, provider, variants: Vec::new() }
    }

    /// Number of variants currently buffered and not yet flushed.
    pub fn buffered(&self) -> usize {
        self.variants.len()
    }

    /// Process one window fully on the calling thread. Failures are
    /// confined to the window; callers log and move on.
    pub fn process_window(&mut self, window: &Arc<RefWindow>) -> Result<Duration> {
        let started = Instant::now();
        let region = window.region_string();

        if self.should_skip_window(window) {
            debug!("skipping window {} (too short or ambiguous)", region);
            return Ok(started.elapsed());
        }

        let reads = self.provider.reads_for(window)?;
        let ref_infos = GraphBuilder::reference_infos(window, &reads);

        let mut k = self.config.min_k;
        while k <= self.config.max_k {
            if window.len() <= k {
                debug!("window {} shorter than k={}, giving up", region, k);
                break;
            }

            let mut graph = GraphBuilder::build(window, &reads, k, &self.config);
            let mut attempt_calls = Vec::new();
            graph.process(&ref_infos, &mut attempt_calls)?;

            // a cycle or near-repeat discards the whole attempt, calls included
            if !graph.should_increment_k {
                self.variants.extend(attempt_calls);
                return Ok(started.elapsed());
            }

            debug!("retrying window {} with larger k (from k={})", region, k);
            k += self.config.k_step;
        }

        warn!("window {} still cyclic or repetitive at k={}, dropped", region, self.config.max_k);
        Ok(started.elapsed())
    }

    /// Windows dominated by ambiguous bases cannot anchor a graph.
    fn should_skip_window(&self, window: &RefWindow) -> bool {
        if window.len() <= self.config.min_k {
            return true;
        }
        let n_count = window.seq().bytes().filter(|b| !matches!(b, b'A' | b'C' | b'G' | b'T')).count();
        n_count * 2 > window.len()
    }

    /// Publish buffered variants if the store is free; keep them for the
    /// next attempt otherwise.
    pub fn try_flush(&mut self, store: &VariantStore, token: ProducerToken) {
        if self.variants.is_empty() {
            return;
        }
        match store.try_push(token, std::mem::take(&mut self.variants)) {
            Ok(()) => {}
            Err(returned) => self.variants = returned,
        }
    }

    /// Publish buffered variants, waiting for the store if needed.
    pub fn force_flush(&mut self, store: &VariantStore, token: ProducerToken) {
        if self.variants.is_empty() {
            return;
        }
        store.push(token, std::mem::take(&mut self.variants));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::SampleLabel;

    fn processor_with(reads: Vec<SequencedRead>, config: CallerConfig) -> WindowProcessor {
        WindowProcessor::new(Arc::new(config), Arc::new(StaticReadProvider::new(reads)))
    }

    #[test]
    fn short_windows_are_skipped() {
        let mut processor = processor_with(Vec::new(), CallerConfig::default());
        let window = Arc::new(RefWindow::new("chr1", 0, "ACGT"));
        assert!(processor.process_window(&window).is_ok());
        assert_eq!(processor.buffered(), 0);
    }

    #[test]
    fn ambiguous_windows_are_skipped() {
        let mut processor = processor_with(Vec::new(), CallerConfig::default());
        let window = Arc::new(RefWindow::new("chr1", 0, &"N".repeat(200)));
        assert!(processor.process_window(&window).is_ok());
        assert_eq!(processor.buffered(), 0);
    }

    #[test]
    fn flush_drains_the_buffer() {
        let config = CallerConfig::default();
        let mut processor = processor_with(
            vec![SequencedRead::new("ACGTACGTACGTACGT", SampleLabel::Normal, 0)],
            config,
        );

        let store = VariantStore::new();
        processor.force_flush(&store, ProducerToken(0));
        assert!(store.is_empty());
        assert_eq!(processor.buffered(), 0);
    }
}
