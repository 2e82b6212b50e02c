//! Bounded task pool: admission gate + completion barrier, generic over job type.
//!
//! The dispatcher is a single loop that reserves a gate slot before spawning
//! each job, so a saturated gate blocks dispatch rather than queueing work.
//! Each spawned task owns its slot and a barrier guard; both are released
//! when the task ends, whatever the outcome.

mod barrier;
mod gate;

pub use barrier::{BarrierGuard, CompletionBarrier};
pub use gate::{AdmissionGate, GateSlot};

use std::future::Future;
use tokio_util::sync::CancellationToken;

/// What happened to the jobs handed to [`TaskPool::run`].
#[derive(Debug)]
pub struct PoolRun<J> {
    /// Jobs that were admitted and spawned.
    pub dispatched: usize,
    /// Jobs never admitted because cancellation fired first.
    pub rejected: Vec<J>,
    /// Barrier signals observed; equals the number of jobs handed in.
    pub signals: usize,
}

#[derive(Debug, Clone)]
pub struct TaskPool {
    gate: AdmissionGate,
}

impl TaskPool {
    pub fn new(capacity: usize) -> Self {
        Self {
            gate: AdmissionGate::new(capacity),
        }
    }

    #[cfg(test)]
    pub fn gate(&self) -> &AdmissionGate {
        &self.gate
    }

    /// Runs `work` for every job with at most `capacity` running at once and
    /// returns once all of them have finished.
    ///
    /// After `cancel` fires no further job is admitted; those jobs come back
    /// in [`PoolRun::rejected`] and are counted off the barrier here.
    pub async fn run<J, I, F, Fut>(
        &self,
        jobs: I,
        cancel: &CancellationToken,
        mut work: F,
    ) -> PoolRun<J>
    where
        I: IntoIterator<Item = J>,
        F: FnMut(J) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let jobs: Vec<J> = jobs.into_iter().collect();
        tracing::debug!(
            "dispatching {} job(s) through {} slot(s)",
            jobs.len(),
            self.gate.capacity()
        );
        let barrier = CompletionBarrier::new(jobs.len());
        let mut dispatched = 0usize;
        let mut rejected = Vec::new();

        let mut jobs = jobs.into_iter();
        while let Some(job) = jobs.next() {
            let slot = tokio::select! {
                biased;
                _ = cancel.cancelled() => None,
                slot = self.gate.acquire() => slot.ok(),
            };
            let Some(slot) = slot else {
                tracing::debug!("admission stopped; {} job(s) not dispatched", jobs.len() + 1);
                barrier.signal();
                rejected.push(job);
                for job in jobs.by_ref() {
                    barrier.signal();
                    rejected.push(job);
                }
                break;
            };

            let guard = barrier.guard();
            let task = work(job);
            dispatched += 1;
            tokio::spawn(async move {
                let _guard = guard;
                let _slot = slot;
                task.await;
            });
        }

        barrier.wait().await;

        PoolRun {
            dispatched,
            rejected,
            signals: barrier.signals(),
        }
    }
}
