//! Parsing of gateway `add` responses.

use serde::Deserialize;

use super::{Cid, UploadError};

/// One line of the newline-delimited JSON the add endpoint streams back.
#[derive(Debug, Deserialize)]
struct AddEntry {
    #[serde(rename = "Name", default)]
    name: Option<String>,
    #[serde(rename = "Hash", default)]
    hash: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(rename = "Message")]
    message: String,
}

/// CID from a 2xx add response: the `Hash` of the last entry that has one.
/// Progress-only lines (no `Hash`) are skipped.
pub fn parse_add_response(body: &str) -> Result<Cid, UploadError> {
    let mut found: Option<AddEntry> = None;
    for line in body.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let entry: AddEntry = serde_json::from_str(line)
            .map_err(|e| UploadError::Response(format!("invalid JSON line {:?}: {}", line, e)))?;
        if entry.hash.is_some() {
            found = Some(entry);
        }
    }
    match found {
        Some(AddEntry {
            hash: Some(hash),
            name,
        }) => {
            tracing::trace!("gateway added {:?} as {}", name, hash);
            Ok(Cid::new(hash))
        }
        _ => Err(UploadError::Response("no Hash in add response".to_string())),
    }
}

/// Human-readable message for a non-2xx response.
pub fn error_message(status: u32, body: &str) -> String {
    if let Ok(err) = serde_json::from_str::<ErrorBody>(body.trim()) {
        if !err.message.is_empty() {
            return err.message;
        }
    }
    let text = body.trim();
    if text.is_empty() {
        format!("HTTP {}", status)
    } else {
        text.to_string()
    }
}
