//! Axum route handlers for the wizard session.

use axum::{
    extract::{
        multipart::{Multipart, MultipartError},
        rejection::JsonRejection,
        State,
    },
    http::StatusCode,
    Json,
};
use bytes::{Bytes, BytesMut};
use serde::Deserialize;
use tracing::warn;

use crate::analysis::presentation::ResultView;
use crate::errors::AppError;
use crate::intake::document::{check_size, Document, IntakeError, MAX_DOCUMENT_BYTES};
use crate::intake::job_description::JobDescriptionUpdate;
use crate::state::AppState;
use crate::wizard::{run_analysis, SessionView, WizardError};

/// Multipart field carrying the résumé.
pub const RESUME_FIELD: &str = "resume";

// ────────────────────────────────────────────────────────────────────────────
// Request types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncodedResumeRequest {
    pub filename: Option<String>,
    pub mime_type: Option<String>,
    /// Base64, optionally as a `data:` URL.
    pub data: String,
}

struct Upload {
    filename: Option<String>,
    content_type: Option<String>,
    bytes: Bytes,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/session
pub async fn handle_get_session(State(state): State<AppState>) -> Json<SessionView> {
    Json(state.wizard.lock().await.view())
}

/// POST /api/v1/session/resume
///
/// Multipart upload, field `resume`. A rejected file leaves the held document as it was.
pub async fn handle_upload_resume(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<SessionView>, AppError> {
    let document = read_resume_field(&mut multipart).await.and_then(|upload| {
        Document::from_upload(
            upload.filename.as_deref(),
            upload.content_type.as_deref(),
            upload.bytes,
        )
    });
    accept_document(&state, document).await
}

/// POST /api/v1/session/resume/encoded
///
/// Same as the multipart upload, for clients that already hold a base64 payload.
/// A body over the route limit is reported as an oversized document.
pub async fn handle_upload_encoded_resume(
    State(state): State<AppState>,
    payload: Result<Json<EncodedResumeRequest>, JsonRejection>,
) -> Result<Json<SessionView>, AppError> {
    let document = payload
        .map_err(json_rejection_error)
        .and_then(|Json(request)| {
            Document::from_encoded(
                request.filename.as_deref(),
                request.mime_type.as_deref(),
                &request.data,
            )
        });
    accept_document(&state, document).await
}

/// PUT /api/v1/session/job-description
pub async fn handle_update_job_description(
    State(state): State<AppState>,
    Json(update): Json<JobDescriptionUpdate>,
) -> Result<Json<SessionView>, AppError> {
    let mut wizard = state.wizard.lock().await;
    wizard.update_job_description(update)?;
    Ok(Json(wizard.view()))
}

/// POST /api/v1/session/analyze
///
/// Blocks until the provider answers or the configured timeout elapses. The analysis
/// still completes if the client goes away first.
pub async fn handle_analyze(State(state): State<AppState>) -> Result<Json<SessionView>, AppError> {
    let view = run_analysis(
        state.wizard.clone(),
        state.analyzer.clone(),
        state.config.analysis_timeout,
    )
    .await?;
    Ok(Json(view))
}

/// POST /api/v1/session/reset
pub async fn handle_reset(State(state): State<AppState>) -> Result<Json<SessionView>, AppError> {
    let mut wizard = state.wizard.lock().await;
    wizard.reset()?;
    Ok(Json(wizard.view()))
}

/// GET /api/v1/session/report
///
/// Plain-text rendering of the current result.
pub async fn handle_report(State(state): State<AppState>) -> Result<String, AppError> {
    let wizard = state.wizard.lock().await;
    let result = wizard.result().ok_or(WizardError::NoResult)?;
    Ok(ResultView::from(result).to_string())
}

// ────────────────────────────────────────────────────────────────────────────
// Helpers
// ────────────────────────────────────────────────────────────────────────────

async fn accept_document(
    state: &AppState,
    document: Result<Document, IntakeError>,
) -> Result<Json<SessionView>, AppError> {
    let mut wizard = state.wizard.lock().await;
    match document {
        Ok(document) => {
            wizard.select_document(document)?;
            Ok(Json(wizard.view()))
        }
        Err(err) => {
            warn!("Resume rejected: {err:?}");
            wizard.record_intake_error(err.to_string())?;
            Err(err.into())
        }
    }
}

/// Reads the whole `resume` field, giving up as soon as it passes the size ceiling.
async fn read_resume_field(multipart: &mut Multipart) -> Result<Upload, IntakeError> {
    while let Some(mut field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(RESUME_FIELD) {
            continue;
        }

        let filename = field.file_name().map(String::from);
        let content_type = field.content_type().map(String::from);

        let mut buf = BytesMut::new();
        while let Some(chunk) = field.chunk().await.map_err(multipart_error)? {
            check_size(buf.len() + chunk.len())?;
            buf.extend_from_slice(&chunk);
        }

        return Ok(Upload {
            filename,
            content_type,
            bytes: buf.freeze(),
        });
    }

    Err(IntakeError::MissingFile)
}

fn json_rejection_error(rejection: JsonRejection) -> IntakeError {
    if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
        IntakeError::TooLarge {
            size: MAX_DOCUMENT_BYTES + 1,
        }
    } else {
        IntakeError::Unreadable(rejection.body_text())
    }
}

fn multipart_error(err: MultipartError) -> IntakeError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        IntakeError::TooLarge {
            size: MAX_DOCUMENT_BYTES + 1,
        }
    } else {
        IntakeError::Unreadable(err.body_text())
    }
}
