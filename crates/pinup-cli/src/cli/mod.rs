//! CLI for pinup.

mod commands;

use anyhow::Result;
use clap::Parser;
use pinup_core::config::{self, PinupConfig};
use std::path::PathBuf;

use commands::run_upload;

/// Upload a directory of numbered files (`1.png`, `2.png`, ...) to a pinning
/// gateway, printing `<count> <index> <cid>` for each file as it completes.
#[derive(Debug, Parser)]
#[command(name = "pinup", version)]
#[command(about = "pinup: upload numbered files to a pinning gateway", long_about = None)]
pub struct Cli {
    /// Gateway project id.
    #[arg(long, env = "PINUP_PROJECT_ID", hide_env_values = true)]
    pub id: Option<String>,

    /// Gateway project secret.
    #[arg(long, env = "PINUP_PROJECT_SECRET", hide_env_values = true)]
    pub secret: Option<String>,

    /// Gateway API URL (overrides config; default https://ipfs.infura.io:5001).
    #[arg(long = "url", value_name = "URL")]
    pub url: Option<String>,

    /// Pin uploaded content. `--pin` alone means true; use `--pin=false` to disable.
    #[arg(
        long,
        value_name = "BOOL",
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true"
    )]
    pub pin: Option<bool>,

    /// String prepended to each CID in metadata `image` fields.
    #[arg(long, default_value = "", value_name = "PREFIX")]
    pub prefix: String,

    /// Directory for `<index>.json` metadata files (created if missing).
    #[arg(long, value_name = "DIR")]
    pub out: Option<PathBuf>,

    /// Write the final index -> CID table as JSON to this path.
    #[arg(long, value_name = "PATH")]
    pub manifest: Option<PathBuf>,

    /// Maximum concurrent uploads (overrides config; default 8).
    #[arg(long, value_name = "N")]
    pub jobs: Option<usize>,

    /// Exit with status 2 if any file failed or was cancelled.
    #[arg(long)]
    pub fail_on_error: bool,

    /// Read configuration from this file instead of the XDG config path.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Directory of numbered files to upload.
    pub dir: PathBuf,
}

impl Cli {
    /// Parse arguments, run, and return the process exit code.
    /// Usage errors print clap's message and map to exit code 1.
    pub async fn run_from_args() -> Result<i32> {
        let cli = match Cli::try_parse() {
            Ok(cli) => cli,
            Err(err) => {
                let code = if err.use_stderr() { 1 } else { 0 };
                let _ = err.print();
                return Ok(code);
            }
        };
        let cfg = cli.load_config()?;
        tracing::debug!("loaded config: {:?}", cfg);

        run_upload(&cli, &cfg).await
    }

    fn load_config(&self) -> Result<PinupConfig> {
        match &self.config {
            Some(path) => config::load_from_path(path),
            None => config::load_or_init(),
        }
    }
}

#[cfg(test)]
mod tests;
