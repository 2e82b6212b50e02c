//! Gateway credentials and the Basic authorization header.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use std::fmt;

/// Project id/secret pair. `Debug` never shows the secret.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    id: String,
    secret: String,
}

impl Credentials {
    pub fn new(id: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            secret: secret.into(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// `base64(id:secret)`.
    pub fn basic_token(&self) -> String {
        STANDARD.encode(format!("{}:{}", self.id, self.secret))
    }

    /// Full header line for curl's header list.
    pub fn authorization_header(&self) -> String {
        format!("Authorization: Basic {}", self.basic_token())
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("id", &self.id)
            .field("secret", &"<redacted>")
            .finish()
    }
}
