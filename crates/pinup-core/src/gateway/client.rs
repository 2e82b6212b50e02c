//! curl-backed gateway client for `POST /api/v0/add`.

use std::path::PathBuf;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use url::Url;

use super::response::{error_message, parse_add_response};
use super::{AddFuture, Cid, ContentAdder, Credentials, UploadError};
use crate::config::PinupConfig;
use crate::source::Job;

/// Client construction failure; fatal at startup.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("invalid gateway URL {url:?}: {source}")]
    InvalidUrl { url: String, source: url::ParseError },
    #[error("unsupported gateway URL scheme {scheme:?} (expected http or https)")]
    UnsupportedScheme { scheme: String },
}

/// Transfer timeouts applied to every add request.
#[derive(Debug, Clone, Copy)]
pub struct GatewayOptions {
    pub connect_timeout: Duration,
    pub low_speed_time: Duration,
    pub request_timeout: Duration,
}

impl Default for GatewayOptions {
    fn default() -> Self {
        Self::from(&PinupConfig::default())
    }
}

impl From<&PinupConfig> for GatewayOptions {
    fn from(cfg: &PinupConfig) -> Self {
        Self {
            connect_timeout: cfg.connect_timeout(),
            low_speed_time: cfg.low_speed_time(),
            request_timeout: cfg.request_timeout(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct GatewayClient {
    base: Url,
    auth_header: String,
    options: GatewayOptions,
}

/// `{base}/api/v0/add?pin=<pin>`, keeping any path prefix on `base`.
pub fn add_endpoint(base: &Url, pin: bool) -> Url {
    let mut base = base.clone();
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    let mut url = base.join("api/v0/add").unwrap_or(base);
    url.query_pairs_mut()
        .clear()
        .append_pair("pin", if pin { "true" } else { "false" });
    url
}

impl GatewayClient {
    pub fn new(
        gateway_url: &str,
        credentials: &Credentials,
        options: GatewayOptions,
    ) -> Result<Self, GatewayError> {
        let base = Url::parse(gateway_url).map_err(|source| GatewayError::InvalidUrl {
            url: gateway_url.to_string(),
            source,
        })?;
        match base.scheme() {
            "http" | "https" => {}
            other => {
                return Err(GatewayError::UnsupportedScheme {
                    scheme: other.to_string(),
                })
            }
        }
        tracing::debug!("gateway client for {} as {}", base, credentials.id());
        Ok(Self {
            base,
            auth_header: credentials.authorization_header(),
            options,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }
}

impl ContentAdder for GatewayClient {
    fn add<'a>(&'a self, job: &'a Job, pin: bool, cancel: &'a CancellationToken) -> AddFuture<'a> {
        let request = AddRequest {
            url: add_endpoint(&self.base, pin),
            auth_header: self.auth_header.clone(),
            path: job.path.clone(),
            file_name: job.file_name.clone(),
            options: self.options,
        };
        let cancel = cancel.clone();
        Box::pin(async move {
            if cancel.is_cancelled() {
                return Err(UploadError::Cancelled);
            }
            tokio::task::spawn_blocking(move || request.perform(&cancel))
                .await
                .map_err(|e| UploadError::Task(e.to_string()))?
        })
    }
}

/// Everything one blocking transfer needs, owned so it can move to a blocking thread.
struct AddRequest {
    url: Url,
    auth_header: String,
    path: PathBuf,
    file_name: String,
    options: GatewayOptions,
}

impl AddRequest {
    /// Streams the file as a multipart `file` part. The progress callback
    /// aborts the transfer once `cancel` fires.
    fn perform(self, cancel: &CancellationToken) -> Result<Cid, UploadError> {
        let mut body: Vec<u8> = Vec::new();

        let mut easy = curl::easy::Easy::new();
        easy.url(self.url.as_str())?;
        easy.connect_timeout(self.options.connect_timeout)?;
        easy.low_speed_limit(1)?;
        easy.low_speed_time(self.options.low_speed_time)?;
        easy.timeout(self.options.request_timeout)?;
        easy.progress(true)?;

        let mut list = curl::easy::List::new();
        list.append(&self.auth_header)?;
        // No 100-continue round trip before the body.
        list.append("Expect:")?;
        easy.http_headers(list)?;

        let mut form = curl::easy::Form::new();
        form.part("file")
            .file(&self.path)
            .filename(&self.file_name)
            .add()?;
        easy.httppost(form)?;

        {
            let mut transfer = easy.transfer();
            transfer.progress_function(|_, _, _, _| !cancel.is_cancelled())?;
            transfer.write_function(|data| {
                body.extend_from_slice(data);
                Ok(data.len())
            })?;
            if let Err(e) = transfer.perform() {
                if e.is_aborted_by_callback() || cancel.is_cancelled() {
                    return Err(UploadError::Cancelled);
                }
                return Err(UploadError::Transport(e));
            }
        }

        let status = easy.response_code()?;
        let text = String::from_utf8_lossy(&body);
        if !(200..300).contains(&status) {
            return Err(UploadError::Http {
                status,
                message: error_message(status, &text),
            });
        }
        parse_add_response(&text)
    }
}
