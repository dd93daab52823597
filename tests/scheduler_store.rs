//! Scheduler and store behavior: parallel window draining, result
//! reporting, store idempotence across workers.

mod common;

use std::sync::Arc;

use common::*;
use variant_forge::core::SampleLabel;
use variant_forge::pipeline::processor::StaticReadProvider;
use variant_forge::pipeline::scheduler::WindowScheduler;
use variant_forge::variant::store::VariantStore;
use variant_forge::variant::TranscriptCode;
use variant_forge::RefWindow;

fn snv_provider() -> Arc<StaticReadProvider> {
    let mut reads = reads_of(REF, SampleLabel::Normal, 10);
    reads.extend(reads_of(&snv_alt(), SampleLabel::Tumor, 10));
    Arc::new(StaticReadProvider::new(reads))
}

#[test]
fn workers_drain_every_window() {
    let config = Arc::new(test_config());
    let scheduler = WindowScheduler::new(config, snv_provider());
    let store = Arc::new(VariantStore::new());

    let windows: Vec<RefWindow> = (0..8).map(|i| RefWindow::new("chr1", 1000 + i * 10_000, REF)).collect();
    let results = scheduler.run(windows, &store).expect("scheduler runs");

    assert_eq!(results.len(), 8);
    let mut indices: Vec<usize> = results.iter().map(|r| r.window_idx).collect();
    indices.sort_unstable();
    assert_eq!(indices, (0..8).collect::<Vec<_>>());

    // one SNV per window, each at its own genome coordinate
    let variants = store.sorted_variants();
    assert_eq!(variants.len(), 8);
    assert!(variants.iter().all(|v| v.kind == TranscriptCode::Snv));
}

#[test]
fn identical_windows_deduplicate_in_the_store() {
    let config = Arc::new(test_config());
    let scheduler = WindowScheduler::new(config, snv_provider());
    let store = Arc::new(VariantStore::new());

    // four copies of the same window: every worker calls the same SNV
    let windows: Vec<RefWindow> = (0..4).map(|_| RefWindow::new("chr1", 1000, REF)).collect();
    let results = scheduler.run(windows, &store).expect("scheduler runs");

    assert_eq!(results.len(), 4);
    let variants = store.sorted_variants();
    assert_eq!(variants.len(), 1);
    assert_eq!(variants[0].pos, 1031);
}

#[test]
fn store_survives_repeated_runs() {
    let config = Arc::new(test_config());
    let store = Arc::new(VariantStore::new());

    for _ in 0..2 {
        let scheduler = WindowScheduler::new(Arc::clone(&config), snv_provider());
        let windows = vec![RefWindow::new("chr1", 1000, REF)];
        scheduler.run(windows, &store).expect("scheduler runs");
    }

    assert_eq!(store.sorted_variants().len(), 1);
}
