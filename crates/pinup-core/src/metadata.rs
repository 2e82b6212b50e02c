//! Per-file metadata descriptors: `<out>/<stem>.json` = `{"image": "<prefix><cid>"}`.

use serde::{Deserialize, Serialize};
use std::io;
use std::path::{Path, PathBuf};

use crate::gateway::Cid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageMetadata {
    pub image: String,
}

/// Writes one metadata file per uploaded entry.
#[derive(Debug, Clone)]
pub struct MetadataWriter {
    out_dir: PathBuf,
    url_prefix: String,
}

impl MetadataWriter {
    pub fn new(out_dir: impl Into<PathBuf>, url_prefix: impl Into<String>) -> Self {
        Self {
            out_dir: out_dir.into(),
            url_prefix: url_prefix.into(),
        }
    }

    pub fn out_dir(&self) -> &Path {
        &self.out_dir
    }

    pub fn path_for(&self, stem: &str) -> PathBuf {
        self.out_dir.join(format!("{}.json", stem))
    }

    pub fn describe(&self, cid: &Cid) -> ImageMetadata {
        ImageMetadata {
            image: format!("{}{}", self.url_prefix, cid),
        }
    }

    /// Write the descriptor for `stem`, returning the file path.
    pub async fn write(&self, stem: &str, cid: &Cid) -> io::Result<PathBuf> {
        let path = self.path_for(stem);
        let json = serde_json::to_vec_pretty(&self.describe(cid))?;
        tokio::fs::write(&path, json).await?;
        Ok(path)
    }
}
