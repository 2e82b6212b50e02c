//! Upload pipeline: job source -> bounded pool -> workers -> result table.
//!
//! Per-job failures never escape a worker; the driver only learns that all
//! jobs finished and reads the counters and table afterwards.

mod progress;
mod worker;

pub use progress::{UploadCounters, UploadEvent};

use anyhow::Result;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::gateway::{Cid, ContentAdder, UploadError};
use crate::metadata::MetadataWriter;
use crate::pool::TaskPool;
use crate::results::ResultTable;
use crate::source::{self, Candidate, JobError};

use worker::WorkerContext;

/// Why one job produced no CID.
#[derive(Debug, thiserror::Error)]
pub enum JobFailure {
    #[error(transparent)]
    Invalid(#[from] JobError),
    #[error(transparent)]
    Upload(#[from] UploadError),
}

impl JobFailure {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, JobFailure::Upload(UploadError::Cancelled))
    }
}

#[derive(Debug, Clone)]
pub struct UploadSettings {
    pub pin: bool,
    pub concurrency: usize,
    /// Write `<stem>.json` descriptors for successful uploads.
    pub metadata: Option<MetadataWriter>,
}

impl Default for UploadSettings {
    fn default() -> Self {
        Self {
            pin: true,
            concurrency: 8,
            metadata: None,
        }
    }
}

/// Final state of a run, read after every job has finished.
#[derive(Debug, Clone, Default)]
pub struct UploadReport {
    /// Non-directory entries found.
    pub total: usize,
    /// Jobs admitted through the gate.
    pub dispatched: usize,
    pub succeeded: u64,
    pub failed: u64,
    pub cancelled: u64,
    /// Completion barrier signals; always equals `total`.
    pub barrier_signals: usize,
    /// Index -> CID for every successful upload.
    pub table: BTreeMap<u64, Cid>,
}

impl UploadReport {
    /// True when no job failed or was cancelled.
    pub fn is_clean(&self) -> bool {
        self.failed == 0 && self.cancelled == 0
    }
}

/// Scan `dir` and upload every eligible entry. Only an unreadable directory
/// is an error; per-file problems are counted in the report.
pub async fn upload_dir(
    dir: &Path,
    adder: Arc<dyn ContentAdder>,
    settings: &UploadSettings,
    cancel: CancellationToken,
    events: Option<mpsc::Sender<UploadEvent>>,
) -> Result<UploadReport> {
    let candidates = source::scan_dir(dir)?;
    tracing::info!("found {} candidate file(s) in {}", candidates.len(), dir.display());
    Ok(upload_candidates(candidates, adder, settings, cancel, events).await)
}

/// Upload already-scanned candidates with at most `settings.concurrency` in flight.
pub async fn upload_candidates(
    candidates: Vec<Candidate>,
    adder: Arc<dyn ContentAdder>,
    settings: &UploadSettings,
    cancel: CancellationToken,
    events: Option<mpsc::Sender<UploadEvent>>,
) -> UploadReport {
    let total = candidates.len();
    let ctx = Arc::new(WorkerContext {
        adder,
        pin: settings.pin,
        table: ResultTable::new(),
        metadata: settings.metadata.clone(),
        events,
        cancel: cancel.clone(),
        counters: UploadCounters::default(),
        publish: tokio::sync::Mutex::new(()),
    });

    let pool = TaskPool::new(settings.concurrency);
    let run = pool
        .run(candidates, &cancel, |candidate| {
            worker::run(Arc::clone(&ctx), candidate)
        })
        .await;

    for candidate in run.rejected {
        ctx.fail(candidate.path, None, UploadError::Cancelled.into())
            .await;
    }

    let report = UploadReport {
        total,
        dispatched: run.dispatched,
        succeeded: ctx.counters.succeeded(),
        failed: ctx.counters.failed(),
        cancelled: ctx.counters.cancelled(),
        barrier_signals: run.signals,
        table: ctx.table.snapshot(),
    };
    tracing::info!(
        "run finished: {} uploaded, {} failed, {} cancelled of {}",
        report.succeeded,
        report.failed,
        report.cancelled,
        report.total
    );
    report
}
