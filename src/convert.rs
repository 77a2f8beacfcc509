//! The conversion engine and its entry points.
//!
//! Every entry point funnels into [`Client::convert`], which performs exactly
//! one `POST` to the gateway and streams the decoded PDF into a caller-supplied
//! sink. On failure the returned [`ConversionError`] still carries the
//! [`ResponseInfo`] gathered so far: the correlation id is known before any
//! network activity, and remote stdout/stderr are captured whenever the
//! gateway sent a body back, whatever its status.
//!
//! ## Classification
//!
//! ```text
//! serialise / send / read body ──✗──▶ Connection
//! status not 2xx ────────────────────▶ Http { status, body ≤ 1024 chars }
//! 2xx, body not JSON ────────────────▶ Connection
//! 2xx, error = true ─────────────────▶ NotGenerated { message | "Unknown error" }
//! 2xx, no pdf ───────────────────────▶ NotGenerated { "No PDF data in response" }
//! pdf not base64 ────────────────────▶ Decode
//! sink write fails ──────────────────▶ Write
//! ```

use crate::client::Client;
use crate::context::RequestContext;
use crate::error::{ConversionError, TypstPdfError};
use crate::output::{MediaFile, ResponseInfo};
use crate::protocol::{self, GenerationRequest, GenerationResponse, CORRELATION_ID_HEADER};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use std::path::Path;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::{debug, info, warn};
use uuid::Uuid;

impl Client {
    /// Generate a PDF from raw template bytes and write it to `sink`.
    ///
    /// # Arguments
    /// * `ctx`     : request context; supplies the correlation id and an
    ///   optional deadline
    /// * `sink`    : receives the decoded PDF bytes
    /// * `content` : inline content forwarded to the renderer (may be empty)
    /// * `template`: template source, sent base64-encoded
    /// * `options` : renderer arguments, forwarded verbatim and in order
    /// * `media`   : auxiliary files bundled with the request
    ///
    /// # Errors
    /// See the module documentation for how each failure is classified.
    pub async fn convert<W>(
        &self,
        ctx: &RequestContext,
        sink: &mut W,
        content: &str,
        template: &[u8],
        options: &[String],
        media: &[MediaFile],
    ) -> Result<ResponseInfo, ConversionError>
    where
        W: AsyncWrite + Unpin + ?Sized,
    {
        let correlation_id = match ctx.correlation_id() {
            "" => Uuid::new_v4().to_string(),
            id => id.to_string(),
        };
        let mut info = ResponseInfo {
            correlation_id,
            ..Default::default()
        };

        info!(
            "Generating PDF via {} (correlation_id={})",
            self.gateway, info.correlation_id
        );

        match self
            .exchange(ctx, sink, content, template, options, media, &mut info)
            .await
        {
            Ok(()) => {
                info!("PDF generated (correlation_id={})", info.correlation_id);
                Ok(info)
            }
            Err(e) => {
                warn!("PDF generation failed: {}", e);
                Err(ConversionError::new(info, e))
            }
        }
    }

    /// Read the template at `template_path` and generate a PDF into `sink`.
    ///
    /// # Errors
    /// [`TypstPdfError::TemplateNotFound`] when the file does not exist,
    /// [`TypstPdfError::TemplateRead`] for any other read failure, otherwise
    /// whatever [`Client::convert`] returns.
    pub async fn generate_pdf_from_file<W>(
        &self,
        ctx: &RequestContext,
        sink: &mut W,
        content: &str,
        template_path: impl AsRef<Path>,
        options: &[String],
        media: &[MediaFile],
    ) -> Result<ResponseInfo, ConversionError>
    where
        W: AsyncWrite + Unpin + ?Sized,
    {
        let template = read_template(template_path.as_ref())
            .await
            .map_err(|e| ConversionError::new(ResponseInfo::default(), e))?;
        self.convert(ctx, sink, content, &template, options, media)
            .await
    }

    /// Generate a PDF from in-memory template source.
    pub async fn generate_pdf_from_string<W>(
        &self,
        ctx: &RequestContext,
        sink: &mut W,
        content: &str,
        template: &str,
        options: &[String],
        media: &[MediaFile],
    ) -> Result<ResponseInfo, ConversionError>
    where
        W: AsyncWrite + Unpin + ?Sized,
    {
        self.convert(ctx, sink, content, template.as_bytes(), options, media)
            .await
    }

    /// Read the template at `template_path` and save the PDF to `output_path`.
    ///
    /// The output file is created (or truncated) before the gateway is called.
    /// If the conversion fails, or the file cannot be flushed and closed, the
    /// file is removed before the error is returned, so no partial PDF is left
    /// behind.
    pub async fn save_pdf(
        &self,
        ctx: &RequestContext,
        content: &str,
        template_path: impl AsRef<Path>,
        output_path: impl AsRef<Path>,
        options: &[String],
        media: &[MediaFile],
    ) -> Result<ResponseInfo, ConversionError> {
        let output_path = output_path.as_ref();
        let template = read_template(template_path.as_ref())
            .await
            .map_err(|e| ConversionError::new(ResponseInfo::default(), e))?;

        let mut file = tokio::fs::File::create(output_path).await.map_err(|source| {
            ConversionError::new(
                ResponseInfo::default(),
                TypstPdfError::OutputCreate {
                    path: output_path.to_path_buf(),
                    source,
                },
            )
        })?;

        let result = self
            .convert(ctx, &mut file, content, &template, options, media)
            .await;
        let closed = file.flush().await;
        drop(file);

        match (result, closed) {
            (Ok(info), Ok(())) => {
                debug!("Saved PDF to {}", output_path.display());
                Ok(info)
            }
            (Err(e), _) => {
                remove_partial(output_path).await;
                Err(e)
            }
            (Ok(info), Err(source)) => {
                remove_partial(output_path).await;
                Err(ConversionError::new(
                    info,
                    TypstPdfError::OutputClose {
                        path: output_path.to_path_buf(),
                        source,
                    },
                ))
            }
        }
    }

    /// One request/response round-trip. Fills `info` as the exchange progresses.
    #[allow(clippy::too_many_arguments)]
    async fn exchange<W>(
        &self,
        ctx: &RequestContext,
        sink: &mut W,
        content: &str,
        template: &[u8],
        options: &[String],
        media: &[MediaFile],
        info: &mut ResponseInfo,
    ) -> Result<(), TypstPdfError>
    where
        W: AsyncWrite + Unpin + ?Sized,
    {
        // ── Step 1: Encode and serialise the request ─────────────────────────
        let request = GenerationRequest::encode(content, template, options, media);
        let body = serde_json::to_vec(&request)
            .map_err(|e| TypstPdfError::connection("failed to serialise request", e))?;
        debug!(
            "Request body {} bytes ({} media files, {} options)",
            body.len(),
            request.media.len(),
            request.options.len()
        );

        // ── Step 2: Send ─────────────────────────────────────────────────────
        let timeout = ctx
            .timeout()
            .map_or(self.timeout, |deadline| deadline.min(self.timeout));

        let response = self
            .http
            .post(self.gateway.clone())
            .header(CONTENT_TYPE, "application/json")
            .header(AUTHORIZATION, self.auth_key.as_str())
            .header(CORRELATION_ID_HEADER, info.correlation_id.as_str())
            .timeout(timeout)
            .body(body)
            .send()
            .await
            .map_err(|e| TypstPdfError::connection("request failed", e))?;

        // ── Step 3: Adopt the server's correlation id ────────────────────────
        if let Some(server_id) = protocol::server_correlation_id(response.headers()) {
            if server_id != info.correlation_id {
                debug!(
                    "Server replaced correlation id {} with {}",
                    info.correlation_id, server_id
                );
            }
            info.correlation_id = server_id;
        }

        // ── Step 4: Drain and leniently parse the body ───────────────────────
        let status = response.status();
        let raw = response
            .bytes()
            .await
            .map_err(|e| TypstPdfError::connection("failed to read response body", e))?;

        let lenient = GenerationResponse::parse_lenient(&raw);

        // ── Step 5: Judge the status ─────────────────────────────────────────
        if !status.is_success() {
            let body = protocol::rejection_body(&lenient, &raw);
            info.stdout = lenient.stdout;
            info.stderr = lenient.stderr;
            return Err(TypstPdfError::Http {
                status: status.as_u16(),
                status_text: status.canonical_reason().unwrap_or_default().to_string(),
                body,
                correlation_id: info.correlation_id.clone(),
            });
        }
        info.stdout = lenient.stdout;
        info.stderr = lenient.stderr;

        // ── Step 6: Authoritative parse ──────────────────────────────────────
        let parsed = GenerationResponse::parse(&raw)
            .map_err(|e| TypstPdfError::connection("failed to parse response", e))?;

        if parsed.error {
            let message = if parsed.message.is_empty() {
                "Unknown error".to_string()
            } else {
                parsed.message
            };
            return Err(TypstPdfError::NotGenerated {
                message,
                correlation_id: info.correlation_id.clone(),
            });
        }

        if parsed.pdf.is_empty() {
            return Err(TypstPdfError::NotGenerated {
                message: "No PDF data in response".to_string(),
                correlation_id: info.correlation_id.clone(),
            });
        }

        // ── Step 7: Decode and stream to the sink ────────────────────────────
        let pdf = parsed.decode_pdf()?;
        debug!("Decoded PDF: {} bytes", pdf.len());

        sink.write_all(&pdf).await.map_err(TypstPdfError::Write)?;
        sink.flush().await.map_err(TypstPdfError::Write)?;

        Ok(())
    }
}

async fn read_template(path: &Path) -> Result<Vec<u8>, TypstPdfError> {
    tokio::fs::read(path).await.map_err(|source| {
        if source.kind() == std::io::ErrorKind::NotFound {
            TypstPdfError::TemplateNotFound {
                path: path.to_path_buf(),
            }
        } else {
            TypstPdfError::TemplateRead {
                path: path.to_path_buf(),
                source,
            }
        }
    })
}

async fn remove_partial(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        warn!("Failed to remove partial output {}: {}", path.display(), e);
    } else {
        debug!("Removed partial output {}", path.display());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn offline_client() -> Client {
        // Port 9 (discard) on localhost; nothing is expected to answer.
        Client::new("key", "http://127.0.0.1:9/", []).unwrap()
    }

    #[tokio::test]
    async fn missing_template_file_is_classified() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = Vec::new();
        let err = offline_client()
            .generate_pdf_from_file(
                &RequestContext::new(),
                &mut sink,
                "",
                dir.path().join("absent.typ"),
                &[],
                &[],
            )
            .await
            .unwrap_err();

        assert!(matches!(err.error(), TypstPdfError::TemplateNotFound { .. }));
        assert_eq!(err.kind(), ErrorKind::Other);
        assert_eq!(err.info(), &ResponseInfo::default());
        assert!(sink.is_empty());
    }

    #[tokio::test]
    async fn unreadable_template_is_a_read_failure() {
        // A directory exists but cannot be read as a file.
        let dir = tempfile::tempdir().unwrap();
        let err = offline_client()
            .save_pdf(
                &RequestContext::new(),
                "",
                dir.path(),
                dir.path().join("out.pdf"),
                &[],
                &[],
            )
            .await
            .unwrap_err();

        assert!(matches!(err.error(), TypstPdfError::TemplateRead { .. }));
        assert!(!dir.path().join("out.pdf").exists());
    }

    #[tokio::test]
    async fn connection_failure_keeps_caller_correlation_id() {
        let ctx = RequestContext::new().with_correlation_id("my-id");
        let mut sink = Vec::new();
        let err = offline_client()
            .generate_pdf_from_string(&ctx, &mut sink, "", "= Title", &[], &[])
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Connection);
        assert_eq!(err.info().correlation_id, "my-id");
        assert_eq!(err.correlation_id(), Some("my-id"));
    }

    #[tokio::test]
    async fn generated_correlation_id_is_a_uuid() {
        let mut sink = Vec::new();
        let err = offline_client()
            .generate_pdf_from_string(&RequestContext::new(), &mut sink, "", "", &[], &[])
            .await
            .unwrap_err();

        assert!(Uuid::parse_str(&err.info().correlation_id).is_ok());
    }
}
