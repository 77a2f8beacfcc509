//! Error types for the typst-pdf-client library.
//!
//! Two types reflect two layers of failure reporting:
//!
//! * [`TypstPdfError`]: the classified failure itself. Four variants are the
//!   taxonomy callers branch on ([`ErrorKind::InvalidConfiguration`],
//!   [`ErrorKind::Connection`], [`ErrorKind::Http`],
//!   [`ErrorKind::NotGenerated`]); the rest are local I/O and decoding faults
//!   that fall under [`ErrorKind::Other`].
//!
//! * [`ConversionError`]: what the conversion entry points return. It pairs
//!   the classified error with the partially populated
//!   [`crate::output::ResponseInfo`], so the correlation id and any remote
//!   stdout/stderr survive the failure.

use crate::output::ResponseInfo;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Upper bound, in characters, on the response body kept in [`TypstPdfError::Http`].
pub const MAX_ERROR_BODY_CHARS: usize = 1024;

/// Boxed cause carried by [`TypstPdfError::Connection`].
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// All errors produced by the typst-pdf-client library.
#[derive(Debug, Error)]
pub enum TypstPdfError {
    // ── Classified ────────────────────────────────────────────────────────
    /// Client construction rejected its inputs or one of its options.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Network-level failure: transport, timeout, body read, (de)serialisation.
    #[error("{}", connection_display(.message, .source.as_deref()))]
    Connection {
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    /// The gateway answered with a non-success HTTP status.
    #[error("{}", http_display(.status, .status_text, .body.as_deref(), .correlation_id))]
    Http {
        status: u16,
        status_text: String,
        /// Server message or raw body, capped at [`MAX_ERROR_BODY_CHARS`].
        body: Option<String>,
        correlation_id: String,
    },

    /// HTTP success, but the renderer reported a failure or returned no PDF.
    #[error("{}", not_generated_display(.message, .correlation_id))]
    NotGenerated {
        message: String,
        correlation_id: String,
    },

    // ── Unclassified ──────────────────────────────────────────────────────
    /// The `pdf` payload was not valid base64.
    #[error("failed to decode PDF data: {0}")]
    Decode(#[from] base64::DecodeError),

    /// The caller's sink rejected the PDF bytes.
    #[error("failed to write PDF data: {0}")]
    Write(#[source] std::io::Error),

    /// Template file does not exist.
    #[error("template file not found: {}", .path.display())]
    TemplateNotFound { path: PathBuf },

    /// Template file exists but could not be read.
    #[error("failed to read template file '{}': {source}", .path.display())]
    TemplateRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Media file could not be loaded from disk.
    #[error("failed to read media file '{}': {source}", .path.display())]
    MediaRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Output file could not be created.
    #[error("failed to create output file '{}': {source}", .path.display())]
    OutputCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Output file could not be flushed and closed.
    #[error("failed to close output file '{}': {source}", .path.display())]
    OutputClose {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Discriminant of [`TypstPdfError`], for branching without matching on payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidConfiguration,
    Connection,
    Http,
    NotGenerated,
    /// Local I/O or decoding fault outside the four classified kinds.
    Other,
}

impl TypstPdfError {
    /// Connection failure wrapping an underlying cause.
    pub fn connection(message: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::Connection {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Connection failure with no underlying cause.
    pub fn connection_msg(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
            source: None,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidConfiguration(_) => ErrorKind::InvalidConfiguration,
            Self::Connection { .. } => ErrorKind::Connection,
            Self::Http { .. } => ErrorKind::Http,
            Self::NotGenerated { .. } => ErrorKind::NotGenerated,
            _ => ErrorKind::Other,
        }
    }

    /// Correlation id attached to gateway-level failures, if any.
    pub fn correlation_id(&self) -> Option<&str> {
        match self {
            Self::Http { correlation_id, .. } | Self::NotGenerated { correlation_id, .. }
                if !correlation_id.is_empty() =>
            {
                Some(correlation_id.as_str())
            }
            _ => None,
        }
    }

    /// HTTP status of an [`TypstPdfError::Http`] failure.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

fn connection_display(
    message: &str,
    source: Option<&(dyn std::error::Error + Send + Sync + 'static)>,
) -> String {
    match (message.is_empty(), source) {
        (false, Some(src)) => format!("connection error: {message}: {src}"),
        (false, None) => format!("connection error: {message}"),
        (true, Some(src)) => format!("connection error: {src}"),
        (true, None) => "connection error".to_string(),
    }
}

fn http_display(
    status: &u16,
    status_text: &str,
    body: Option<&str>,
    correlation_id: &str,
) -> String {
    let mut out = format!("HTTP {status}: {status_text}");
    if let Some(body) = body.filter(|b| !b.is_empty()) {
        out.push_str(": ");
        out.push_str(body);
    }
    if !correlation_id.is_empty() {
        out.push_str(&format!(" (correlation_id={correlation_id})"));
    }
    out
}

fn not_generated_display(message: &str, correlation_id: &str) -> String {
    if correlation_id.is_empty() {
        format!("PDF not generated: '{message}'")
    } else {
        format!("PDF not generated: '{message}' (correlation_id={correlation_id})")
    }
}

/// A failed conversion: the classified error plus the result record built so far.
///
/// The record always carries the correlation id used for the exchange, and
/// carries the remote stdout/stderr whenever the gateway returned a body.
#[derive(Debug)]
pub struct ConversionError {
    info: ResponseInfo,
    error: TypstPdfError,
}

impl ConversionError {
    pub fn new(info: ResponseInfo, error: TypstPdfError) -> Self {
        Self { info, error }
    }

    pub fn kind(&self) -> ErrorKind {
        self.error.kind()
    }

    pub fn error(&self) -> &TypstPdfError {
        &self.error
    }

    pub fn info(&self) -> &ResponseInfo {
        &self.info
    }

    /// Correlation id of the exchange, falling back to the record when the
    /// error itself does not carry one.
    pub fn correlation_id(&self) -> Option<&str> {
        self.error.correlation_id().or_else(|| {
            let id = self.info.correlation_id.as_str();
            (!id.is_empty()).then_some(id)
        })
    }

    pub fn into_parts(self) -> (ResponseInfo, TypstPdfError) {
        (self.info, self.error)
    }
}

impl fmt::Display for ConversionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.error, f)
    }
}

impl std::error::Error for ConversionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

impl From<ConversionError> for TypstPdfError {
    fn from(value: ConversionError) -> Self {
        value.error
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_display_with_body_and_correlation() {
        let e = TypstPdfError::Http {
            status: 500,
            status_text: "Internal Server Error".into(),
            body: Some("boom".into()),
            correlation_id: "abc".into(),
        };
        assert_eq!(
            e.to_string(),
            "HTTP 500: Internal Server Error: boom (correlation_id=abc)"
        );
    }

    #[test]
    fn http_display_without_body() {
        let e = TypstPdfError::Http {
            status: 502,
            status_text: "Bad Gateway".into(),
            body: None,
            correlation_id: String::new(),
        };
        assert_eq!(e.to_string(), "HTTP 502: Bad Gateway");
        assert_eq!(e.correlation_id(), None);
        assert_eq!(e.status(), Some(502));
    }

    #[test]
    fn not_generated_display_with_id() {
        let e = TypstPdfError::NotGenerated {
            message: "bad template".into(),
            correlation_id: "id-1".into(),
        };
        assert_eq!(
            e.to_string(),
            "PDF not generated: 'bad template' (correlation_id=id-1)"
        );
        assert_eq!(e.kind(), ErrorKind::NotGenerated);
    }

    #[test]
    fn connection_display_variants() {
        let io = std::io::Error::other("reset");
        assert_eq!(
            TypstPdfError::connection("send failed", io).to_string(),
            "connection error: send failed: reset"
        );
        assert_eq!(
            TypstPdfError::connection_msg("invalid endpoint scheme").to_string(),
            "connection error: invalid endpoint scheme"
        );
        assert_eq!(
            TypstPdfError::connection_msg("").to_string(),
            "connection error"
        );
    }

    #[test]
    fn connection_exposes_source() {
        use std::error::Error as _;
        let io = std::io::Error::new(std::io::ErrorKind::TimedOut, "timed out");
        let e = TypstPdfError::connection("request failed", io);
        assert!(e.source().is_some());
        assert!(TypstPdfError::connection_msg("x").source().is_none());
    }

    #[test]
    fn unclassified_errors_are_other() {
        let e = TypstPdfError::TemplateNotFound {
            path: PathBuf::from("missing.typ"),
        };
        assert_eq!(e.kind(), ErrorKind::Other);
        assert!(e.to_string().contains("missing.typ"));
    }

    #[test]
    fn conversion_error_falls_back_to_record_id() {
        let info = ResponseInfo {
            correlation_id: "rec-id".into(),
            ..Default::default()
        };
        let err = ConversionError::new(info, TypstPdfError::connection_msg("timeout"));
        assert_eq!(err.kind(), ErrorKind::Connection);
        assert_eq!(err.correlation_id(), Some("rec-id"));
        assert_eq!(err.to_string(), "connection error: timeout");

        let (info, inner) = err.into_parts();
        assert_eq!(info.correlation_id, "rec-id");
        assert_eq!(inner.kind(), ErrorKind::Connection);
    }
}
