//! Wizard state machine — INPUT → ANALYZING → RESULTS, with one failure branch
//! back to INPUT and an explicit reset.
//!
//! Phase-specific data lives inside the phase variant, so a result can only exist
//! in `Results` and an error only in `Input`. The document and job description are
//! owned by the wizard across phases so a failed analysis can be retried without
//! re-entering anything.

pub mod handlers;

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::analysis::contract::{AnalysisError, AnalysisProvider, AnalysisRequest, AnalysisResult};
use crate::analysis::presentation::ResultView;
use crate::intake::document::{Document, DocumentSummary};
use crate::intake::job_description::{JobDescriptionInput, JobDescriptionUpdate};

const FALLBACK_ERROR: &str = "Something went wrong during analysis. Please try again.";

#[derive(Debug, Clone)]
pub enum Phase {
    Input {
        error: Option<String>,
    },
    Analyzing {
        analysis_id: Uuid,
        started_at: DateTime<Utc>,
    },
    Results {
        analysis_id: Uuid,
        result: AnalysisResult,
        completed_at: DateTime<Utc>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PhaseName {
    Input,
    Analyzing,
    Results,
}

#[derive(Debug, Error, PartialEq)]
pub enum WizardError {
    #[error("Please upload your resume.")]
    MissingDocument,

    #[error("Please provide a job description or URL.")]
    MissingJobDescription,

    #[error("An analysis is already in progress.")]
    Busy,

    #[error("Results are being shown. Reset to start a new analysis.")]
    NotEditable,

    #[error("No analysis result is available yet.")]
    NoResult,
}

/// Failure of a user-triggered analysis: either rejected before the provider was
/// called, or failed during the call.
#[derive(Debug, Error)]
pub enum AnalyzeError {
    #[error(transparent)]
    Rejected(#[from] WizardError),

    #[error(transparent)]
    Failed(#[from] AnalysisError),
}

/// Snapshot returned to clients after every operation.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub phase: PhaseName,
    pub document: Option<DocumentSummary>,
    pub job_description: JobDescriptionInput,
    pub error: Option<String>,
    pub can_analyze: bool,
    pub analysis_id: Option<Uuid>,
    pub started_at: Option<DateTime<Utc>>,
    pub result: Option<ResultView>,
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct Wizard {
    document: Option<Document>,
    job_description: JobDescriptionInput,
    phase: Phase,
}

impl Default for Wizard {
    fn default() -> Self {
        Self {
            document: None,
            job_description: JobDescriptionInput::default(),
            phase: Phase::Input { error: None },
        }
    }
}

impl Wizard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase_name(&self) -> PhaseName {
        match self.phase {
            Phase::Input { .. } => PhaseName::Input,
            Phase::Analyzing { .. } => PhaseName::Analyzing,
            Phase::Results { .. } => PhaseName::Results,
        }
    }

    pub fn document(&self) -> Option<&Document> {
        self.document.as_ref()
    }

    pub fn job_description(&self) -> &JobDescriptionInput {
        &self.job_description
    }

    pub fn error(&self) -> Option<&str> {
        match &self.phase {
            Phase::Input { error } => error.as_deref(),
            _ => None,
        }
    }

    pub fn result(&self) -> Option<&AnalysisResult> {
        match &self.phase {
            Phase::Results { result, .. } => Some(result),
            _ => None,
        }
    }

    /// Whether the analyze action should be offered right now.
    pub fn can_analyze(&self) -> bool {
        matches!(self.phase, Phase::Input { .. })
            && self.document.is_some()
            && !self.job_description.is_blank()
    }

    fn ensure_editable(&self) -> Result<(), WizardError> {
        match self.phase {
            Phase::Input { .. } => Ok(()),
            Phase::Analyzing { .. } => Err(WizardError::Busy),
            Phase::Results { .. } => Err(WizardError::NotEditable),
        }
    }

    fn set_error(&mut self, message: Option<String>) {
        self.phase = Phase::Input { error: message };
    }

    /// Replaces any previously held document and clears the current error.
    pub fn select_document(&mut self, document: Document) -> Result<(), WizardError> {
        self.ensure_editable()?;
        info!(
            "Resume selected: {} ({} bytes)",
            document.filename,
            document.size()
        );
        self.document = Some(document);
        self.set_error(None);
        Ok(())
    }

    /// Shows an intake failure without touching the held inputs.
    pub fn record_intake_error(&mut self, message: impl Into<String>) -> Result<(), WizardError> {
        self.ensure_editable()?;
        self.set_error(Some(message.into()));
        Ok(())
    }

    pub fn update_job_description(
        &mut self,
        update: JobDescriptionUpdate,
    ) -> Result<(), WizardError> {
        self.ensure_editable()?;
        self.job_description.apply(update);
        Ok(())
    }

    /// INPUT → ANALYZING. On a failed guard the wizard stays in INPUT with the
    /// guard's message as its error, and no request is produced.
    pub fn begin_analysis(&mut self) -> Result<(Uuid, AnalysisRequest), WizardError> {
        self.ensure_editable()?;

        let Some(document) = &self.document else {
            self.set_error(Some(WizardError::MissingDocument.to_string()));
            return Err(WizardError::MissingDocument);
        };
        if self.job_description.is_blank() {
            self.set_error(Some(WizardError::MissingJobDescription.to_string()));
            return Err(WizardError::MissingJobDescription);
        }

        let request = AnalysisRequest::new(document, &self.job_description);
        let analysis_id = Uuid::new_v4();
        self.phase = Phase::Analyzing {
            analysis_id,
            started_at: Utc::now(),
        };
        Ok((analysis_id, request))
    }

    /// ANALYZING → RESULTS on success, ANALYZING → INPUT (inputs kept) on failure.
    /// The outcome is handed back to the caller unchanged.
    pub fn complete_analysis(
        &mut self,
        analysis_id: Uuid,
        outcome: Result<AnalysisResult, AnalysisError>,
    ) -> Result<(), AnalysisError> {
        match self.phase {
            Phase::Analyzing { analysis_id: current, .. } if current == analysis_id => {}
            _ => {
                warn!("Ignoring completion of stale analysis {analysis_id}");
                return outcome.map(|_| ());
            }
        }

        match outcome {
            Ok(result) => {
                self.phase = Phase::Results {
                    analysis_id,
                    result,
                    completed_at: Utc::now(),
                };
                Ok(())
            }
            Err(err) => {
                let message = err.to_string();
                let message = if message.trim().is_empty() {
                    FALLBACK_ERROR.to_string()
                } else {
                    message
                };
                self.set_error(Some(message));
                Err(err)
            }
        }
    }

    /// Back to a freshly started session. Not allowed mid-analysis.
    pub fn reset(&mut self) -> Result<(), WizardError> {
        if matches!(self.phase, Phase::Analyzing { .. }) {
            return Err(WizardError::Busy);
        }
        *self = Wizard::default();
        Ok(())
    }

    pub fn view(&self) -> SessionView {
        let (analysis_id, started_at, result, completed_at) = match &self.phase {
            Phase::Input { .. } => (None, None, None, None),
            Phase::Analyzing {
                analysis_id,
                started_at,
            } => (Some(*analysis_id), Some(*started_at), None, None),
            Phase::Results {
                analysis_id,
                result,
                completed_at,
            } => (
                Some(*analysis_id),
                None,
                Some(ResultView::from(result)),
                Some(*completed_at),
            ),
        };

        SessionView {
            phase: self.phase_name(),
            document: self.document.as_ref().map(Document::summary),
            job_description: self.job_description.clone(),
            error: self.error().map(String::from),
            can_analyze: self.can_analyze(),
            analysis_id,
            started_at,
            result,
            completed_at,
        }
    }
}

/// Drives one analysis end to end. The wizard lock is released while the provider
/// call is in flight; the ANALYZING phase keeps a second trigger out meanwhile.
///
/// The provider call and the completion run on their own task, so the wizard always
/// leaves ANALYZING even if the caller is dropped (a client disconnect).
pub async fn run_analysis(
    wizard: Arc<Mutex<Wizard>>,
    provider: Arc<dyn AnalysisProvider>,
    timeout: Duration,
) -> Result<SessionView, AnalyzeError> {
    let (analysis_id, request) = wizard.lock().await.begin_analysis()?;

    let span = info_span!("analysis", %analysis_id, mode = ?request.mode);
    let task = {
        let wizard = wizard.clone();
        tokio::spawn(
            async move {
                info!("Analysis started");
                let outcome =
                    match tokio::time::timeout(timeout, provider.analyze(&request)).await {
                        Ok(outcome) => outcome,
                        Err(_) => Err(AnalysisError::Timeout(timeout)),
                    };
                match &outcome {
                    Ok(result) => info!("Analysis completed: match_score={}", result.match_score),
                    Err(e) => warn!("Analysis failed: {e}"),
                }

                let mut wizard = wizard.lock().await;
                wizard.complete_analysis(analysis_id, outcome)?;
                Ok::<_, AnalysisError>(wizard.view())
            }
            .instrument(span),
        )
    };

    match task.await {
        Ok(outcome) => outcome.map_err(AnalyzeError::Failed),
        Err(join_error) => {
            error!(%analysis_id, "Analysis task ended abnormally: {join_error}");
            let _ = wizard
                .lock()
                .await
                .complete_analysis(analysis_id, Err(AnalysisError::Interrupted));
            Err(AnalyzeError::Failed(AnalysisError::Interrupted))
        }
    }
}
