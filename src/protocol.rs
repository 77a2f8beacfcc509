//! Wire format of the gateway exchange.
//!
//! The request is a JSON object whose binary members (template, media) are
//! standard base64 with padding. The response mirrors that: a JSON object with
//! an `error` flag, optional `message`, the base64 `pdf`, and whatever the
//! remote renderer printed on stdout/stderr.
//!
//! ```text
//! POST <gateway>
//! Content-Type:     application/json
//! Authorization:    <auth key, verbatim>
//! X-Correlation-ID: <id>
//!
//! {"content": "...", "template": "<b64>", "options": [...], "media": {"name": "<b64>"}}
//! ```

use crate::error::MAX_ERROR_BODY_CHARS;
use crate::output::MediaFile;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::header::HeaderMap;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

pub const CORRELATION_ID_HEADER: &str = "X-Correlation-ID";
pub const REQUEST_ID_HEADER: &str = "X-Request-ID";

/// Request body sent to the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub content: String,
    /// Base64 of the template source.
    pub template: String,
    /// Renderer arguments, forwarded in order.
    pub options: Vec<String>,
    /// Logical file name → base64 contents.
    pub media: BTreeMap<String, String>,
}

impl GenerationRequest {
    /// Encode the template and every media entry independently.
    ///
    /// Media entries sharing a name collapse to the last one given.
    pub fn encode(content: &str, template: &[u8], options: &[String], media: &[MediaFile]) -> Self {
        let media = media
            .iter()
            .map(|m| (m.name.clone(), STANDARD.encode(&m.data)))
            .collect();

        Self {
            content: content.to_string(),
            template: STANDARD.encode(template),
            options: options.to_vec(),
            media,
        }
    }
}

/// Response body returned by the gateway.
///
/// Every field is optional: absent and `null` members both read as empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationResponse {
    #[serde(deserialize_with = "null_as_default")]
    pub error: bool,
    #[serde(deserialize_with = "null_as_default", skip_serializing_if = "String::is_empty")]
    pub message: String,
    /// Base64 of the generated PDF.
    #[serde(deserialize_with = "null_as_default", skip_serializing_if = "String::is_empty")]
    pub pdf: String,
    #[serde(deserialize_with = "null_as_default", skip_serializing_if = "String::is_empty")]
    pub stdout: String,
    #[serde(deserialize_with = "null_as_default", skip_serializing_if = "String::is_empty")]
    pub stderr: String,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl GenerationResponse {
    /// Parse a body, tolerating any failure. Used to recover diagnostics
    /// before the status code has been judged.
    pub fn parse_lenient(body: &[u8]) -> Self {
        if body.is_empty() {
            return Self::default();
        }
        serde_json::from_slice(body).unwrap_or_default()
    }

    pub fn parse(body: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(body)
    }

    /// Decode the `pdf` member. Line breaks are skipped so MIME-wrapped
    /// payloads decode the same as single-line ones.
    pub fn decode_pdf(&self) -> Result<Vec<u8>, base64::DecodeError> {
        if !self.pdf.contains(['\r', '\n']) {
            return STANDARD.decode(&self.pdf);
        }
        let unwrapped: String = self.pdf.chars().filter(|c| !matches!(c, '\r' | '\n')).collect();
        STANDARD.decode(unwrapped)
    }
}

/// Server-assigned correlation id: `X-Correlation-ID` first, then
/// `X-Request-ID`. Values are trimmed; the first non-empty one wins.
pub fn server_correlation_id(headers: &HeaderMap) -> Option<String> {
    [CORRELATION_ID_HEADER, REQUEST_ID_HEADER]
        .iter()
        .filter_map(|name| headers.get(*name))
        .filter_map(|value| value.to_str().ok())
        .map(str::trim)
        .find(|value| !value.is_empty())
        .map(str::to_string)
}

/// Pick the text reported for a rejected request: the server's `message`,
/// else the raw body, capped at [`MAX_ERROR_BODY_CHARS`] characters.
pub fn rejection_body(parsed: &GenerationResponse, raw: &[u8]) -> Option<String> {
    let mut msg = parsed.message.trim().to_string();
    if msg.is_empty() {
        msg = String::from_utf8_lossy(raw).trim().to_string();
    }
    if msg.is_empty() {
        return None;
    }
    Some(truncate_chars(&msg, MAX_ERROR_BODY_CHARS))
}

/// Cut `s` to `max` characters, appending `...` when anything was dropped.
pub fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((cut, _)) => format!("{}...", &s[..cut]),
        None => s.to_string(),
    }
}
