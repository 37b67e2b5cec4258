//! Résumé document intake: size/type validation and base64 transport encoding.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

/// The only accepted document type.
pub const PDF_MIME_TYPE: &str = "application/pdf";
/// 5 MiB upload ceiling.
pub const MAX_DOCUMENT_BYTES: usize = 5 * 1024 * 1024;
const FALLBACK_FILENAME: &str = "resume.pdf";

#[derive(Debug, Error, PartialEq)]
pub enum IntakeError {
    #[error("Please upload a PDF file.")]
    UnsupportedType { received: String },

    #[error("File size exceeds 5MB limit.")]
    TooLarge { size: usize },

    #[error("The uploaded file is empty.")]
    Empty,

    #[error("The uploaded file could not be decoded: {0}")]
    InvalidEncoding(String),

    #[error("No resume file was provided.")]
    MissingFile,

    #[error("The upload could not be read: {0}")]
    Unreadable(String),
}

/// A validated résumé held in memory for the session.
#[derive(Debug, Clone)]
pub struct Document {
    pub filename: String,
    pub mime_type: String,
    pub bytes: Bytes,
    /// Standard base64 of `bytes`, without any `data:` scheme prefix.
    pub encoded: String,
    pub selected_at: DateTime<Utc>,
}

/// What the session view exposes about the held document. Never the payload.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentSummary {
    pub filename: String,
    pub size_bytes: usize,
    pub selected_at: DateTime<Utc>,
}

impl Document {
    /// Validates raw uploaded bytes and encodes them for the provider request.
    ///
    /// Size is checked before type, so an oversized file is always a size error.
    pub fn from_upload(
        filename: Option<&str>,
        content_type: Option<&str>,
        bytes: Bytes,
    ) -> Result<Self, IntakeError> {
        check_size(bytes.len())?;
        let mime_type = check_type(content_type)?;
        if bytes.is_empty() {
            return Err(IntakeError::Empty);
        }

        let encoded = BASE64.encode(&bytes);
        Ok(Self {
            filename: normalize_filename(filename),
            mime_type,
            bytes,
            encoded,
            selected_at: Utc::now(),
        })
    }

    /// Accepts a document a client has already encoded, either as bare base64 or
    /// as a `data:<mime>;base64,<payload>` URL.
    pub fn from_encoded(
        filename: Option<&str>,
        content_type: Option<&str>,
        data: &str,
    ) -> Result<Self, IntakeError> {
        let (embedded_type, payload) = split_data_url(data);
        let content_type = content_type.or(embedded_type);

        // Reject obviously oversized payloads before decoding them
        let estimated = payload.len() / 4 * 3;
        check_size(estimated.saturating_sub(2))?;

        let bytes = BASE64
            .decode(payload.trim())
            .map_err(|e| IntakeError::InvalidEncoding(e.to_string()))?;

        Self::from_upload(filename, content_type, Bytes::from(bytes))
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    pub fn summary(&self) -> DocumentSummary {
        DocumentSummary {
            filename: self.filename.clone(),
            size_bytes: self.size(),
            selected_at: self.selected_at,
        }
    }
}

pub fn check_size(size: usize) -> Result<(), IntakeError> {
    if size > MAX_DOCUMENT_BYTES {
        return Err(IntakeError::TooLarge { size });
    }
    Ok(())
}

/// Compares the essence of the declared MIME type (parameters dropped, case-folded).
fn check_type(content_type: Option<&str>) -> Result<String, IntakeError> {
    let declared = content_type.unwrap_or_default();
    let essence = declared
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    if essence != PDF_MIME_TYPE {
        return Err(IntakeError::UnsupportedType {
            received: if declared.is_empty() {
                "unknown".to_string()
            } else {
                declared.to_string()
            },
        });
    }
    Ok(essence)
}

/// Splits `data:application/pdf;base64,AAAA` into its MIME type and payload.
/// Input without a data-URL prefix is returned unchanged as the payload.
pub fn split_data_url(data: &str) -> (Option<&str>, &str) {
    let Some(rest) = data.strip_prefix("data:") else {
        return (None, data);
    };
    let Some((header, payload)) = rest.split_once(',') else {
        return (None, data);
    };
    let mime = header.split(';').next().filter(|m| !m.is_empty());
    (mime, payload)
}

fn normalize_filename(filename: Option<&str>) -> String {
    filename
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .unwrap_or(FALLBACK_FILENAME)
        .to_string()
}
