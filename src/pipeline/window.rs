//! Reference windows and the cross-thread queues that carry them.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crossbeam::queue::SegQueue;
use serde::{Deserialize, Serialize};

/// One reference region handed to a worker: half-open 0-based coordinates
/// and the reference bases covering them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefWindow {
    chromosome: String,
    start: u64,
    end: u64,
    seq: String,
}

impl RefWindow {
    pub fn new(chromosome: &str, start: u64, seq: &str) -> RefWindow {
        RefWindow {
            chromosome: chromosome.to_owned(),
            start,
            end: start + seq.len() as u64,
            seq: seq.to_owned(),
        }
    }

    #[inline]
    pub fn chromosome(&self) -> &str {
        &self.chromosome
    }

    /// 0-based inclusive start.
    #[inline]
    pub fn start(&self) -> u64 {
        self.start
    }

    /// 0-based exclusive end.
    #[inline]
    pub fn end(&self) -> u64 {
        self.end
    }

    #[inline]
    pub fn seq(&self) -> &str {
        &self.seq
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.seq.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.seq.is_empty()
    }

    pub fn region_string(&self) -> String {
        format!("{}:{}-{}", self.chromosome, self.start, self.end)
    }
}

/// Completion record for one processed window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowResult {
    pub window_idx: usize,
    pub runtime: Duration,
}

/// Lock-free multi-producer/multi-consumer queue of windows awaiting
/// assembly. Consumers spin on `try_pop` and exit once the queue is both
/// empty and closed.
#[derive(Debug, Default)]
pub struct WindowQueue {
    queue: SegQueue<(usize, Arc<RefWindow>)>,
    closed: AtomicBool,
}

impl WindowQueue {
    pub fn new() -> WindowQueue {
        WindowQueue::default()
    }

    pub fn push(&self, window_idx: usize, window: Arc<RefWindow>) {
        self.queue.push((window_idx, window));
    }

    /// Non-blocking dequeue.
    pub fn try_pop(&self) -> Option<(usize, Arc<RefWindow>)> {
        self.queue.pop()
    }

    /// Signal that no further windows will be produced.
    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}
