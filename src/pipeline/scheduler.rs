//! Window Scheduler
//! ================
//!
//! Fixed pool of OS worker threads draining a lock-free window queue.
//! Each worker owns its graphs outright and processes a window end to
//! end; the shared variant store and the blocking result channel are the
//! only cross-thread objects. Windows are independent and no ordering is
//! guaranteed across them.

use std::sync::Arc;

use anyhow::Result;
use crossbeam_channel::{bounded, Receiver, Sender};
use tracing::{debug, info, warn};

use crate::errors::CallerError;
use crate::pipeline::processor::{ReadProvider, WindowProcessor};
use crate::pipeline::window::{RefWindow, WindowQueue, WindowResult};
use crate::utils::configuration::CallerConfig;
use crate::variant::store::{ProducerToken, VariantStore};

pub struct WindowScheduler {
    config: Arc<CallerConfig>,
    provider: Arc<dyn ReadProvider>,
}

impl WindowScheduler {
    pub fn new(config: Arc<CallerConfig>, provider: Arc<dyn ReadProvider>) -> WindowScheduler {
        WindowScheduler { config, provider }
    }

    /// Assemble every window on the worker pool. Returns per-window
    /// completion records; called variants land in `store`.
    pub fn run(&self, windows: Vec<RefWindow>, store: &Arc<VariantStore>) -> Result<Vec<WindowResult>> {
        let num_windows = windows.len();
        let num_workers = self.config.num_workers.max(1).min(num_windows.max(1));

        let queue = Arc::new(WindowQueue::new());
        for (idx, window) in windows.into_iter().enumerate() {
            queue.push(idx, Arc::new(window));
        }
        queue.close();

        let (result_tx, result_rx): (Sender<WindowResult>, Receiver<WindowResult>) = bounded(num_windows.max(1));

        info!("assembling {} windows on {} workers", num_windows, num_workers);

        std::thread::scope(|scope| {
            for worker_idx in 0..num_workers {
                let queue = Arc::clone(&queue);
                let store = Arc::clone(store);
                let config = Arc::clone(&self.config);
                let provider = Arc::clone(&self.provider);
                let result_tx = result_tx.clone();

                scope.spawn(move || {
                    worker_loop(worker_idx, &queue, &store, config, provider, &result_tx);
                });
            }
            drop(result_tx);
        });

        let mut results: Vec<WindowResult> = result_rx.try_iter().collect();
        results.sort_by_key(|r| r.window_idx);
        Ok(results)
    }
}

fn worker_loop(
    worker_idx: usize,
    queue: &WindowQueue,
    store: &VariantStore,
    config: Arc<CallerConfig>,
    provider: Arc<dyn ReadProvider>,
    result_tx: &Sender<WindowResult>,
) {
    let token = ProducerToken(worker_idx);
    let mut processor = WindowProcessor::new(config, provider);

    loop {
        match queue.try_pop() {
            Some((window_idx, window)) => {
                match processor.process_window(&window) {
                    Ok(runtime) => {
                        processor.try_flush(store, token);
                        // the result channel blocks when the reporter lags
                        if result_tx.send(WindowResult { window_idx, runtime }).is_err() {
                            warn!("worker{} stopping: {}", worker_idx, CallerError::QueueClosed);
                            break;
                        }
                    }
                    Err(err) => {
                        // a failed window never takes its peers down
                        warn!("worker{} failed window {}: {err:#}", worker_idx, window.region_string());
                    }
                }
            }
            None if queue.is_closed() => break,
            None => std::thread::yield_now(),
        }
    }

    processor.force_flush(store, token);
    debug!("worker{} drained and exiting", worker_idx);
}
