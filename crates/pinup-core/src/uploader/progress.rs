//! Per-job events and run counters.

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};

use super::JobFailure;
use crate::gateway::Cid;

/// Emitted by workers as jobs finish (completion order, not index order).
#[derive(Debug)]
pub enum UploadEvent {
    /// `count` is the running number of successful uploads, including this one.
    Uploaded {
        count: u64,
        index: u64,
        cid: Cid,
        path: PathBuf,
    },
    Failed {
        path: PathBuf,
        index: Option<u64>,
        error: JobFailure,
    },
    /// Upload succeeded but its metadata file could not be written.
    MetadataFailed {
        path: PathBuf,
        index: u64,
        error: std::io::Error,
    },
}

/// Monotonic counters; each finished job bumps exactly one of them.
#[derive(Debug, Default)]
pub struct UploadCounters {
    succeeded: AtomicU64,
    failed: AtomicU64,
    cancelled: AtomicU64,
}

impl UploadCounters {
    /// Returns the new success count.
    pub fn record_success(&self) -> u64 {
        self.succeeded.fetch_add(1, Ordering::AcqRel) + 1
    }

    pub fn record_failure(&self, cancelled: bool) {
        let counter = if cancelled {
            &self.cancelled
        } else {
            &self.failed
        };
        counter.fetch_add(1, Ordering::AcqRel);
    }

    pub fn succeeded(&self) -> u64 {
        self.succeeded.load(Ordering::Acquire)
    }

    pub fn failed(&self) -> u64 {
        self.failed.load(Ordering::Acquire)
    }

    pub fn cancelled(&self) -> u64 {
        self.cancelled.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_count_is_sequential() {
        let counters = UploadCounters::default();
        assert_eq!(counters.record_success(), 1);
        assert_eq!(counters.record_success(), 2);
        counters.record_failure(false);
        counters.record_failure(true);
        counters.record_failure(true);
        assert_eq!(counters.succeeded(), 2);
        assert_eq!(counters.failed(), 1);
        assert_eq!(counters.cancelled(), 2);
    }
}
