//! # typst-pdf-client
//!
//! Generate PDFs from Typst templates through a remote function-as-a-service
//! gateway.
//!
//! The gateway does the rendering; this crate owns the exchange around it:
//! encoding the template and media, propagating a correlation id, classifying
//! every way the call can fail, and streaming the decoded PDF to a sink.
//!
//! ## Exchange Overview
//!
//! ```text
//! template + media + options
//!  │
//!  ├─ 1. Context   correlation id from RequestContext, or a fresh UUID
//!  ├─ 2. Encode    base64 template and media, JSON body
//!  ├─ 3. POST      Authorization + X-Correlation-ID, one attempt
//!  ├─ 4. Headers   server X-Correlation-ID / X-Request-ID takes over
//!  ├─ 5. Classify  Http / NotGenerated / Connection
//!  └─ 6. Output    base64 PDF decoded into the caller's sink
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use typst_pdf_client::{Client, RequestContext};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = Client::new("secret", "https://gateway.example.com/function/typst", [])?;
//!     let ctx = RequestContext::new().with_correlation_id("invoice-42");
//!
//!     let info = client
//!         .save_pdf(&ctx, "", "invoice.typ", "invoice.pdf", &[], &[])
//!         .await?;
//!     eprintln!("correlation id: {}", info.correlation_id);
//!     Ok(())
//! }
//! ```
//!
//! ## Branching on failures
//!
//! ```rust,no_run
//! # use typst_pdf_client::{Client, ErrorKind, RequestContext};
//! # async fn run(client: Client) {
//! let mut pdf = Vec::new();
//! match client
//!     .generate_pdf_from_string(&RequestContext::new(), &mut pdf, "", "= Hi", &[], &[])
//!     .await
//! {
//!     Ok(info) => eprintln!("{} bytes ({})", pdf.len(), info.correlation_id),
//!     Err(e) if e.kind() == ErrorKind::NotGenerated => {
//!         eprintln!("template error: {e}\n{}", e.info().stderr)
//!     }
//!     Err(e) => eprintln!("gateway unavailable: {e}"),
//! }
//! # }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `typst-pdf` binary (clap + anyhow + tracing-subscriber + indicatif) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod client;
pub mod config;
pub mod context;
pub mod convert;
pub mod error;
pub mod output;
pub mod protocol;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use client::Client;
pub use config::{ClientBuilder, ClientConfig, ClientOption, Transport, TransportSettings};
pub use context::{correlation_id, with_correlation_id, RequestContext};
pub use error::{ConversionError, ErrorKind, TypstPdfError};
pub use output::{MediaFile, ResponseInfo};
