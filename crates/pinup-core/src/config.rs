use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Public gateway used when neither config nor CLI names one.
pub const DEFAULT_GATEWAY_URL: &str = "https://ipfs.infura.io:5001";

/// Global configuration loaded from `~/.config/pinup/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PinupConfig {
    /// Base URL of the pinning gateway's HTTP API.
    #[serde(default = "default_gateway_url")]
    pub gateway_url: String,
    /// Whether uploaded content is pinned by default.
    #[serde(default = "default_pin")]
    pub pin: bool,
    /// Maximum number of uploads in flight at once.
    #[serde(default = "default_max_concurrent_uploads")]
    pub max_concurrent_uploads: usize,
    /// TCP/TLS connect timeout in seconds.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    /// Abort a transfer whose throughput stays below 1 byte/s for this many seconds.
    #[serde(default = "default_low_speed_time")]
    pub low_speed_time_secs: u64,
    /// Hard wall-clock limit for a single upload request.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_gateway_url() -> String {
    DEFAULT_GATEWAY_URL.to_string()
}

fn default_pin() -> bool {
    true
}

fn default_max_concurrent_uploads() -> usize {
    8
}

fn default_connect_timeout() -> u64 {
    30
}

fn default_low_speed_time() -> u64 {
    60
}

fn default_request_timeout() -> u64 {
    3600
}

impl Default for PinupConfig {
    fn default() -> Self {
        Self {
            gateway_url: default_gateway_url(),
            pin: default_pin(),
            max_concurrent_uploads: default_max_concurrent_uploads(),
            connect_timeout_secs: default_connect_timeout(),
            low_speed_time_secs: default_low_speed_time(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl PinupConfig {
    /// Upload concurrency, never below one.
    pub fn concurrency(&self) -> usize {
        self.max_concurrent_uploads.max(1)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn low_speed_time(&self) -> Duration {
        Duration::from_secs(self.low_speed_time_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("pinup")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<PinupConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = PinupConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    load_from_path(&path)
}

/// Load configuration from an explicit path. Does not create the file.
pub fn load_from_path(path: &Path) -> Result<PinupConfig> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("read config {}", path.display()))?;
    let cfg: PinupConfig =
        toml::from_str(&data).with_context(|| format!("parse config {}", path.display()))?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_values() {
        let cfg = PinupConfig::default();
        assert_eq!(cfg.gateway_url, DEFAULT_GATEWAY_URL);
        assert!(cfg.pin);
        assert_eq!(cfg.max_concurrent_uploads, 8);
        assert_eq!(cfg.request_timeout(), Duration::from_secs(3600));
    }

    #[test]
    fn config_toml_roundtrip() {
        let cfg = PinupConfig::default();
        let toml = toml::to_string_pretty(&cfg).unwrap();
        let parsed: PinupConfig = toml::from_str(&toml).unwrap();
        assert_eq!(parsed.gateway_url, cfg.gateway_url);
        assert_eq!(parsed.pin, cfg.pin);
        assert_eq!(parsed.max_concurrent_uploads, cfg.max_concurrent_uploads);
        assert_eq!(parsed.low_speed_time_secs, cfg.low_speed_time_secs);
    }

    #[test]
    fn config_toml_custom_values_fill_timeouts() {
        let toml = r#"
            gateway_url = "http://127.0.0.1:5001"
            pin = false
            max_concurrent_uploads = 2
        "#;
        let cfg: PinupConfig = toml::from_str(toml).unwrap();
        assert_eq!(cfg.gateway_url, "http://127.0.0.1:5001");
        assert!(!cfg.pin);
        assert_eq!(cfg.concurrency(), 2);
        assert_eq!(cfg.connect_timeout_secs, 30);
        assert_eq!(cfg.low_speed_time_secs, 60);
    }

    #[test]
    fn partial_config_fills_every_default() {
        let cfg: PinupConfig = toml::from_str("pin = false\n").unwrap();
        assert!(!cfg.pin);
        assert_eq!(cfg.gateway_url, DEFAULT_GATEWAY_URL);
        assert_eq!(cfg.max_concurrent_uploads, 8);
        assert_eq!(cfg.request_timeout_secs, 3600);

        let empty: PinupConfig = toml::from_str("").unwrap();
        assert!(empty.pin);
        assert_eq!(empty.gateway_url, DEFAULT_GATEWAY_URL);
    }

    #[test]
    fn load_from_path_accepts_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "max_concurrent_uploads = 2\n").unwrap();
        let cfg = load_from_path(&path).unwrap();
        assert_eq!(cfg.concurrency(), 2);
        assert!(cfg.pin);
    }

    #[test]
    fn zero_concurrency_clamps_to_one() {
        let cfg = PinupConfig {
            max_concurrent_uploads: 0,
            ..PinupConfig::default()
        };
        assert_eq!(cfg.concurrency(), 1);
    }

    #[test]
    fn load_from_path_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "gateway_url = \"https://gw.example\"\npin = true\nmax_concurrent_uploads = 3\n",
        )
        .unwrap();
        let cfg = load_from_path(&path).unwrap();
        assert_eq!(cfg.gateway_url, "https://gw.example");
        assert_eq!(cfg.max_concurrent_uploads, 3);
    }

    #[test]
    fn load_from_path_missing_file_errors() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_from_path(&dir.path().join("nope.toml")).unwrap_err();
        assert!(format!("{:#}", err).contains("read config"));
    }
}
