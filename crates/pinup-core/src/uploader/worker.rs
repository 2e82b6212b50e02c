//! One upload job: validate, add, record, report.

use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;

use super::progress::{UploadCounters, UploadEvent};
use super::JobFailure;
use crate::gateway::{Cid, ContentAdder, UploadError};
use crate::metadata::MetadataWriter;
use crate::results::ResultTable;
use crate::source::{Candidate, Job};

/// State shared by all workers of one run.
pub(super) struct WorkerContext {
    pub(super) adder: Arc<dyn ContentAdder>,
    pub(super) pin: bool,
    pub(super) table: ResultTable,
    pub(super) metadata: Option<MetadataWriter>,
    pub(super) events: Option<mpsc::Sender<UploadEvent>>,
    pub(super) cancel: CancellationToken,
    pub(super) counters: UploadCounters,
    /// Serializes table writes with their metadata writes so a duplicate
    /// index leaves the same CID in both.
    pub(super) publish: Mutex<()>,
}

impl WorkerContext {
    async fn emit(&self, event: UploadEvent) {
        if let Some(tx) = &self.events {
            // A dropped receiver only loses console output.
            let _ = tx.send(event).await;
        }
    }

    /// Record a failed job: no table write, no metadata.
    pub(super) async fn fail(&self, path: PathBuf, index: Option<u64>, error: JobFailure) {
        let cancelled = error.is_cancelled();
        self.counters.record_failure(cancelled);
        if cancelled {
            tracing::debug!("{}: {}", path.display(), error);
        } else {
            tracing::warn!("{}: {}", path.display(), error);
        }
        self.emit(UploadEvent::Failed { path, index, error }).await;
    }

    async fn succeed(&self, job: Job, cid: Cid) {
        let metadata_error = {
            let _publish = self.publish.lock().await;
            self.table.record(job.index, cid.clone());
            match &self.metadata {
                Some(writer) => writer
                    .write(&job.stem, &cid)
                    .await
                    .err()
                    .map(|error| (writer.path_for(&job.stem), error)),
                None => None,
            }
        };

        if let Some((meta_path, error)) = metadata_error {
            tracing::warn!(
                "{}: metadata write to {} failed: {}",
                job.path.display(),
                meta_path.display(),
                error
            );
            self.emit(UploadEvent::MetadataFailed {
                path: job.path.clone(),
                index: job.index,
                error,
            })
            .await;
        }

        let count = self.counters.record_success();
        tracing::info!(index = job.index, "uploaded {} as {}", job.path.display(), cid);
        self.emit(UploadEvent::Uploaded {
            count,
            index: job.index,
            cid,
            path: job.path,
        })
        .await;
    }
}

/// Runs one job to completion. Never panics on job errors and never
/// returns an error: every outcome is recorded on `ctx`.
pub(super) async fn run(ctx: Arc<WorkerContext>, candidate: Candidate) {
    let path = candidate.path.clone();
    let job = match candidate.resolve() {
        Ok(job) => job,
        Err(e) => return ctx.fail(path, None, e.into()).await,
    };

    if ctx.cancel.is_cancelled() {
        return ctx
            .fail(job.path, Some(job.index), UploadError::Cancelled.into())
            .await;
    }

    tracing::debug!(index = job.index, size = job.size(), "uploading {}", job.path.display());
    let added = ctx.adder.add(&job, ctx.pin, &ctx.cancel).await;
    match added {
        Ok(cid) => ctx.succeed(job, cid).await,
        Err(e) => ctx.fail(job.path, Some(job.index), e.into()).await,
    }
}
