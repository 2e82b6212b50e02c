//! Completion barrier: counts finished jobs down to zero.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

/// Counting barrier initialized to the number of jobs. Every job signals
/// exactly once (usually through a [`BarrierGuard`]); [`wait`](Self::wait)
/// returns once the count reaches zero.
#[derive(Debug)]
pub struct CompletionBarrier {
    remaining: AtomicUsize,
    signals: AtomicUsize,
    /// Woken when `remaining` reaches zero.
    done: Notify,
    expected: usize,
}

/// Signals its barrier once when dropped, on every exit path including panics.
#[derive(Debug)]
pub struct BarrierGuard {
    barrier: Arc<CompletionBarrier>,
}

impl CompletionBarrier {
    pub fn new(count: usize) -> Arc<Self> {
        Arc::new(Self {
            remaining: AtomicUsize::new(count),
            signals: AtomicUsize::new(0),
            done: Notify::new(),
            expected: count,
        })
    }

    /// Record one finished job.
    pub fn signal(&self) {
        let total = self.signals.fetch_add(1, Ordering::AcqRel) + 1;
        if total > self.expected {
            tracing::warn!(
                "completion barrier signalled {} times for {} jobs",
                total,
                self.expected
            );
        }
        let previous = self
            .remaining
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| Some(n.saturating_sub(1)))
            .unwrap_or(0);
        if previous <= 1 {
            self.done.notify_waiters();
        }
    }

    /// Guard that calls [`signal`](Self::signal) on drop.
    pub fn guard(self: &Arc<Self>) -> BarrierGuard {
        BarrierGuard {
            barrier: Arc::clone(self),
        }
    }

    pub fn remaining(&self) -> usize {
        self.remaining.load(Ordering::Acquire)
    }

    /// Total signals received so far.
    pub fn signals(&self) -> usize {
        self.signals.load(Ordering::Acquire)
    }

    /// Blocks until every job has signalled.
    pub async fn wait(&self) {
        loop {
            // Register before checking so a final signal in between is not missed.
            let notified = self.done.notified();
            if self.remaining() == 0 {
                return;
            }
            notified.await;
        }
    }
}

impl Drop for BarrierGuard {
    fn drop(&mut self) {
        self.barrier.signal();
    }
}
