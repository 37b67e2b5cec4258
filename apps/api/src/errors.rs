use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::analysis::contract::AnalysisError;
use crate::intake::document::IntakeError;
use crate::wizard::{AnalyzeError, WizardError};

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
///
/// Every message here is user-facing: it is the same text the wizard shows.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Analysis error: {0}")]
    Analysis(String),

    #[error("Analysis timed out: {0}")]
    AnalysisTimeout(String),
}

impl From<IntakeError> for AppError {
    fn from(err: IntakeError) -> Self {
        match err {
            IntakeError::TooLarge { .. } => AppError::PayloadTooLarge(err.to_string()),
            _ => AppError::Validation(err.to_string()),
        }
    }
}

impl From<WizardError> for AppError {
    fn from(err: WizardError) -> Self {
        match err {
            WizardError::MissingDocument | WizardError::MissingJobDescription => {
                AppError::Validation(err.to_string())
            }
            WizardError::Busy | WizardError::NotEditable | WizardError::NoResult => {
                AppError::Conflict(err.to_string())
            }
        }
    }
}

impl From<AnalyzeError> for AppError {
    fn from(err: AnalyzeError) -> Self {
        match err {
            AnalyzeError::Rejected(e) => e.into(),
            AnalyzeError::Failed(e @ AnalysisError::Timeout(_)) => {
                AppError::AnalysisTimeout(e.to_string())
            }
            AnalyzeError::Failed(e) => AppError::Analysis(e.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::PayloadTooLarge(msg) => (
                StatusCode::PAYLOAD_TOO_LARGE,
                "PAYLOAD_TOO_LARGE",
                msg.clone(),
            ),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
            AppError::Analysis(msg) => {
                tracing::error!("Analysis error: {msg}");
                (StatusCode::BAD_GATEWAY, "ANALYSIS_ERROR", msg.clone())
            }
            AppError::AnalysisTimeout(msg) => {
                tracing::error!("Analysis timeout: {msg}");
                (StatusCode::GATEWAY_TIMEOUT, "ANALYSIS_TIMEOUT", msg.clone())
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
