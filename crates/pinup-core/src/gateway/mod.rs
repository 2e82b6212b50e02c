//! Pinning gateway: the remote add-and-pin call behind the [`ContentAdder`] seam.
//!
//! The pipeline only needs "give me a CID for this file or fail"; the HTTP
//! details (multipart body, Basic auth, NDJSON reply) live in [`client`].

mod auth;
mod client;
mod response;

pub use auth::Credentials;
pub use client::{add_endpoint, GatewayClient, GatewayError, GatewayOptions};
pub use response::{error_message, parse_add_response};

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use tokio_util::sync::CancellationToken;

use crate::source::Job;

/// Content identifier returned by the gateway.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct Cid(String);

impl Cid {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Cid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Failure of one remote add call.
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("upload cancelled")]
    Cancelled,
    #[error("transport error: {0}")]
    Transport(#[from] curl::Error),
    #[error("building multipart body: {0}")]
    Form(#[from] curl::FormError),
    #[error("gateway returned HTTP {status}: {message}")]
    Http { status: u32, message: String },
    #[error("malformed gateway response: {0}")]
    Response(String),
    #[error("upload task failed: {0}")]
    Task(String),
}

pub type AddFuture<'a> = Pin<Box<dyn Future<Output = Result<Cid, UploadError>> + Send + 'a>>;

/// Adds one file to the storage network, optionally pinning it.
///
/// Implementations must observe `cancel` and return [`UploadError::Cancelled`]
/// promptly once it fires.
pub trait ContentAdder: Send + Sync {
    fn add<'a>(&'a self, job: &'a Job, pin: bool, cancel: &'a CancellationToken) -> AddFuture<'a>;
}
