//! Upload a directory: validate startup inputs, run the pipeline, print results.

use anyhow::{Context, Result};
use pinup_core::cancel;
use pinup_core::config::PinupConfig;
use pinup_core::gateway::{Credentials, GatewayClient, GatewayOptions};
use pinup_core::metadata::MetadataWriter;
use pinup_core::source;
use pinup_core::uploader::{self, UploadEvent, UploadReport, UploadSettings};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::cli::Cli;

/// Exit code for `--fail-on-error` when any file did not upload.
const EXIT_PARTIAL_FAILURE: i32 = 2;

pub async fn run_upload(cli: &Cli, cfg: &PinupConfig) -> Result<i32> {
    let credentials = credentials(cli)?;
    let gateway_url = cli.url.as_deref().unwrap_or(&cfg.gateway_url);
    let client = GatewayClient::new(gateway_url, &credentials, GatewayOptions::from(cfg))
        .context("create gateway client")?;

    let metadata = match &cli.out {
        Some(out) => {
            std::fs::create_dir_all(out)
                .with_context(|| format!("create output directory {}", out.display()))?;
            Some(MetadataWriter::new(out, cli.prefix.clone()))
        }
        None => None,
    };
    let settings = UploadSettings {
        pin: cli.pin.unwrap_or(cfg.pin),
        concurrency: cli.jobs.map_or_else(|| cfg.concurrency(), |n| n.max(1)),
        metadata,
    };
    tracing::info!(
        "uploading {} to {} (pin={}, jobs={})",
        cli.dir.display(),
        client.base_url(),
        settings.pin,
        settings.concurrency
    );

    let listener = cancel::cancel_on_interrupt(CancellationToken::new());
    let start = Instant::now();

    let candidates = source::scan_dir(&cli.dir)?;

    let (tx, rx) = mpsc::channel::<UploadEvent>(64);
    let printer = tokio::spawn(print_events(rx));
    let report = uploader::upload_candidates(
        candidates,
        Arc::new(client),
        &settings,
        listener.token().clone(),
        Some(tx),
    )
    .await;
    let _ = printer.await;

    let interrupted = listener.token().is_cancelled();
    listener.shutdown().await;

    let mut code = if cli.fail_on_error && !report.is_clean() {
        EXIT_PARTIAL_FAILURE
    } else {
        0
    };
    if let Some(path) = &cli.manifest {
        if let Err(err) = write_manifest(path, &report) {
            eprintln!("pinup error: {:#}", err);
            code = 1;
        }
    }

    eprintln!("{}", summary_line(&report));
    if interrupted {
        eprintln!("interrupted");
    }
    eprintln!("{:?}", start.elapsed());
    Ok(code)
}

/// Both credentials are required; empty strings count as missing.
fn credentials(cli: &Cli) -> Result<Credentials> {
    let id = cli.id.as_deref().filter(|s| !s.is_empty());
    let secret = cli.secret.as_deref().filter(|s| !s.is_empty());
    let Some(id) = id else {
        anyhow::bail!("parameter --id is required");
    };
    let Some(secret) = secret else {
        anyhow::bail!("parameter --secret is required");
    };
    Ok(Credentials::new(id, secret))
}

/// Prints each job's outcome as it arrives: successes to stdout, errors to stderr.
async fn print_events(mut rx: mpsc::Receiver<UploadEvent>) {
    while let Some(event) = rx.recv().await {
        match event {
            UploadEvent::Uploaded {
                count, index, cid, ..
            } => println!("{} {} {}", count, index, cid),
            UploadEvent::Failed { path, error, .. } => {
                eprintln!("{}: {}", path.display(), error)
            }
            UploadEvent::MetadataFailed { path, error, .. } => {
                eprintln!("{}: writing metadata: {}", path.display(), error)
            }
        }
    }
}

fn summary_line(report: &UploadReport) -> String {
    format!(
        "uploaded {} of {} ({} failed, {} cancelled)",
        report.succeeded, report.total, report.failed, report.cancelled
    )
}

fn write_manifest(path: &Path, report: &UploadReport) -> Result<()> {
    let json = serde_json::to_string_pretty(&report.table).context("serialize manifest")?;
    std::fs::write(path, json).with_context(|| format!("write manifest {}", path.display()))?;
    tracing::info!("wrote manifest with {} entries to {}", report.table.len(), path.display());
    Ok(())
}
