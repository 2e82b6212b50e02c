//! Job source: enumerate a flat directory of numbered files.
//!
//! Scanning only lists entries and drops sub-directories. Each remaining
//! entry becomes a [`Candidate`]; per-entry validation (stat, index parse)
//! happens later in [`Candidate::resolve`] so a bad entry fails its own job
//! and never the scan.

use anyhow::{Context, Result};
use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Per-entry validation failure. Isolated to the entry that caused it;
/// the reporter prefixes the entry path.
#[derive(Debug, thiserror::Error)]
pub enum JobError {
    #[error("stat failed: {0}")]
    Stat(#[source] io::Error),
    #[error("file name is not valid UTF-8")]
    InvalidName,
    #[error("base name {stem:?} is not a positive integer")]
    InvalidIndex { stem: String },
    #[error("not a regular file")]
    NotAFile,
}

/// A non-directory entry found by [`scan_dir`]; not yet validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub path: PathBuf,
    pub file_name: OsString,
}

/// A validated upload job. Immutable; consumed by exactly one worker.
#[derive(Debug, Clone)]
pub struct Job {
    pub path: PathBuf,
    /// Entry name, e.g. `7.png`.
    pub file_name: String,
    /// Name without its last extension, e.g. `7`. Keys the metadata file.
    pub stem: String,
    /// 1-based logical index parsed from `stem`.
    pub index: u64,
    pub metadata: fs::Metadata,
}

impl Job {
    pub fn size(&self) -> u64 {
        self.metadata.len()
    }
}

/// Lists `dir` in name order, skipping sub-directories.
///
/// Failing to open or read the directory is fatal for the run; everything
/// about individual entries is deferred to [`Candidate::resolve`].
pub fn scan_dir(dir: &Path) -> Result<Vec<Candidate>> {
    let entries = fs::read_dir(dir).with_context(|| format!("read directory {}", dir.display()))?;

    let mut candidates = Vec::new();
    for entry in entries {
        let entry = entry.with_context(|| format!("read directory {}", dir.display()))?;
        // file_type() does not follow symlinks; a link to a directory is
        // kept here and rejected by resolve().
        if let Ok(ft) = entry.file_type() {
            if ft.is_dir() {
                tracing::debug!("skipping sub-directory {}", entry.path().display());
                continue;
            }
        }
        candidates.push(Candidate {
            path: entry.path(),
            file_name: entry.file_name(),
        });
    }
    candidates.sort_by(|a, b| a.file_name.cmp(&b.file_name));
    Ok(candidates)
}

impl Candidate {
    /// Stat the entry and derive its index, producing a [`Job`].
    pub fn resolve(self) -> Result<Job, JobError> {
        let Candidate { path, file_name } = self;

        let mut metadata = fs::symlink_metadata(&path).map_err(JobError::Stat)?;
        if metadata.file_type().is_symlink() {
            metadata = fs::metadata(&path).map_err(JobError::Stat)?;
        }
        if !metadata.is_file() {
            return Err(JobError::NotAFile);
        }

        let name = file_name.to_str().ok_or(JobError::InvalidName)?;
        let stem = strip_extension(name);
        let index = parse_index(stem).ok_or_else(|| JobError::InvalidIndex {
            stem: stem.to_string(),
        })?;

        Ok(Job {
            file_name: name.to_string(),
            stem: stem.to_string(),
            index,
            metadata,
            path,
        })
    }
}

/// Name without its last extension: `7.png` -> `7`, `a.tar.gz` -> `a.tar`.
/// A leading dot does not start an extension (`.png` stays `.png`).
pub fn strip_extension(name: &str) -> &str {
    match name.rfind('.') {
        Some(0) | None => name,
        Some(dot) => &name[..dot],
    }
}

/// Parses a 1-based index; zero and anything non-numeric are rejected.
pub fn parse_index(stem: &str) -> Option<u64> {
    stem.parse::<u64>().ok().filter(|&n| n > 0)
}
