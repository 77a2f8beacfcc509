//! Result record and request-side media types.

use crate::error::TypstPdfError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Diagnostic record of one exchange with the gateway.
///
/// Returned on success and carried inside [`crate::error::ConversionError`]
/// on failure. `correlation_id` is the id actually used for the exchange: the
/// caller's (or a generated) id, replaced by the server's when the response
/// names one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseInfo {
    pub correlation_id: String,
    /// Standard output of the remote renderer.
    pub stdout: String,
    /// Standard error of the remote renderer (warnings, diagnostics).
    pub stderr: String,
}

/// An auxiliary asset (image, font, data file) sent alongside the template.
///
/// `name` is the path the remote renderer resolves it under, e.g.
/// `fonts/Lato-Regular.ttf`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaFile {
    pub name: String,
    pub data: Vec<u8>,
}

impl MediaFile {
    pub fn new(name: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            data: data.into(),
        }
    }

    /// Load a media file from disk under the given logical name.
    pub async fn from_path(
        name: impl Into<String>,
        path: impl AsRef<Path>,
    ) -> Result<Self, TypstPdfError> {
        let path = path.as_ref();
        let data = tokio::fs::read(path)
            .await
            .map_err(|source| TypstPdfError::MediaRead {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(Self::new(name, data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[tokio::test]
    async fn media_from_path_reads_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logo.png");
        std::fs::write(&path, b"\x89PNG").unwrap();

        let media = MediaFile::from_path("images/logo.png", &path).await.unwrap();
        assert_eq!(media.name, "images/logo.png");
        assert_eq!(media.data, b"\x89PNG");
    }

    #[tokio::test]
    async fn media_from_missing_path_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = MediaFile::from_path("x", dir.path().join("absent.bin"))
            .await
            .unwrap_err();
        assert!(matches!(err, TypstPdfError::MediaRead { .. }));
        assert_eq!(err.kind(), ErrorKind::Other);
    }

    #[test]
    fn response_info_serialises() {
        let info = ResponseInfo {
            correlation_id: "abc".into(),
            stdout: String::new(),
            stderr: "warning: unused".into(),
        };
        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json["correlation_id"], "abc");
        assert_eq!(json["stderr"], "warning: unused");
    }
}
