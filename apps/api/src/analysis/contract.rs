//! Analysis contract — the one request/response exchange with the provider.
//!
//! `AnalysisProvider` is the seam: `GeminiAnalyzer` is the production backend,
//! tests substitute a scripted provider so nothing here needs the network.
//!
//! The provider's JSON is untrusted. `parse_analysis` checks every required field
//! for presence and type before an `AnalysisResult` exists; nothing is defaulted.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, warn};

use crate::analysis::prompts::{text_prompt, url_prompt, RECRUITER_SYSTEM};
use crate::analysis::schema::analysis_schema;
use crate::intake::document::Document;
use crate::intake::job_description::{JdMode, JobDescriptionInput};
use crate::llm_client::{
    strip_json_fences, Content, GenerateContentRequest, GenerationConfig, LlmClient, LlmError,
    Part, MODEL,
};

const MAX_SCORE: i64 = 100;

// ────────────────────────────────────────────────────────────────────────────
// Result model
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Improvement {
    pub section: String,
    pub original_concept: String,
    pub improved_rewrite: String,
    pub why_it_works: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub match_score: u8, // 0 – 100
    pub summary: String,
    pub missing_keywords: Vec<String>, // provider order, not sorted
    pub cultural_fit_analysis: String,
    pub improvements: Vec<Improvement>,
}

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("Analysis provider request failed: {0}")]
    Provider(LlmError),

    #[error("No response from the analysis provider")]
    NoResponse,

    #[error("The analysis provider returned malformed JSON: {0}")]
    MalformedJson(String),

    #[error("The analysis response is missing required field '{0}'")]
    MissingField(String),

    #[error("The analysis response field '{field}' is not {expected}")]
    InvalidField {
        field: String,
        expected: &'static str,
    },

    #[error("The analysis timed out after {} seconds", .0.as_secs())]
    Timeout(Duration),

    #[error("The analysis was interrupted before it finished. Please try again.")]
    Interrupted,
}

impl From<LlmError> for AnalysisError {
    fn from(err: LlmError) -> Self {
        match err {
            LlmError::EmptyContent => AnalysisError::NoResponse,
            other => AnalysisError::Provider(other),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Request
// ────────────────────────────────────────────────────────────────────────────

/// Everything one analysis call needs, snapshotted from the wizard.
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    pub document_base64: String,
    pub mime_type: String,
    pub job_description: String,
    pub mode: JdMode,
}

impl AnalysisRequest {
    pub fn new(document: &Document, job_description: &JobDescriptionInput) -> Self {
        Self {
            document_base64: document.encoded.clone(),
            mime_type: document.mime_type.clone(),
            job_description: job_description.active_content().to_string(),
            mode: job_description.mode,
        }
    }

    /// The instruction text part. URL mode swaps the framing for a best-effort
    /// hint; the link itself is never fetched.
    pub fn job_description_prompt(&self) -> String {
        match self.mode {
            JdMode::Text => text_prompt(&self.job_description),
            JdMode::Url => url_prompt(&self.job_description),
        }
    }

    pub fn to_generate_request(&self) -> GenerateContentRequest {
        GenerateContentRequest {
            system_instruction: Content::system(RECRUITER_SYSTEM),
            contents: vec![Content::user(vec![
                Part::inline(&self.mime_type, &self.document_base64),
                Part::text(self.job_description_prompt()),
            ])],
            generation_config: GenerationConfig {
                response_mime_type: "application/json".to_string(),
                response_schema: analysis_schema(),
            },
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Provider trait
// ────────────────────────────────────────────────────────────────────────────

/// One method: request in, validated result or typed error out.
///
/// Carried in `AppState` as `Arc<dyn AnalysisProvider>`.
#[async_trait]
pub trait AnalysisProvider: Send + Sync {
    async fn analyze(&self, request: &AnalysisRequest) -> Result<AnalysisResult, AnalysisError>;
}

/// Production backend: structured generation through Gemini.
pub struct GeminiAnalyzer {
    llm: LlmClient,
}

impl GeminiAnalyzer {
    pub fn new(llm: LlmClient) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl AnalysisProvider for GeminiAnalyzer {
    async fn analyze(&self, request: &AnalysisRequest) -> Result<AnalysisResult, AnalysisError> {
        debug!(
            "Requesting fit analysis: model={}, mode={:?}, encoded_len={}",
            MODEL,
            request.mode,
            request.document_base64.len()
        );
        let body = request.to_generate_request();
        let text = self.llm.generate_text(&body).await?;
        parse_analysis(&text)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Response validation
// ────────────────────────────────────────────────────────────────────────────

/// Parses and validates the provider's textual result.
pub fn parse_analysis(text: &str) -> Result<AnalysisResult, AnalysisError> {
    let text = strip_json_fences(text);
    if text.is_empty() {
        return Err(AnalysisError::NoResponse);
    }

    let value: Value =
        serde_json::from_str(text).map_err(|e| AnalysisError::MalformedJson(e.to_string()))?;
    let obj = value
        .as_object()
        .ok_or_else(|| AnalysisError::MalformedJson("expected a JSON object".to_string()))?;

    Ok(AnalysisResult {
        match_score: read_score(obj)?,
        summary: read_string(obj, "summary")?,
        missing_keywords: read_string_list(obj, "missingKeywords")?,
        cultural_fit_analysis: read_string(obj, "culturalFitAnalysis")?,
        improvements: read_improvements(obj)?,
    })
}

fn require<'a>(obj: &'a Map<String, Value>, field: &str) -> Result<&'a Value, AnalysisError> {
    match obj.get(field) {
        None | Some(Value::Null) => Err(AnalysisError::MissingField(field.to_string())),
        Some(v) => Ok(v),
    }
}

fn read_string(obj: &Map<String, Value>, field: &str) -> Result<String, AnalysisError> {
    read_string_at(obj, field, field)
}

fn read_string_at(
    obj: &Map<String, Value>,
    field: &str,
    path: &str,
) -> Result<String, AnalysisError> {
    match obj.get(field) {
        None | Some(Value::Null) => Err(AnalysisError::MissingField(path.to_string())),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(_) => Err(AnalysisError::InvalidField {
            field: path.to_string(),
            expected: "a string",
        }),
    }
}

/// Integer scores outside 0–100 are clamped; anything non-integer is rejected.
fn read_score(obj: &Map<String, Value>) -> Result<u8, AnalysisError> {
    let value = require(obj, "matchScore")?;
    let score = match (value.as_i64(), value.as_u64()) {
        (Some(i), _) => i,
        (None, Some(_)) => i64::MAX,
        (None, None) => {
            return Err(AnalysisError::InvalidField {
                field: "matchScore".to_string(),
                expected: "an integer",
            })
        }
    };

    let clamped = score.clamp(0, MAX_SCORE);
    if clamped != score {
        warn!("matchScore {score} outside 0-{MAX_SCORE}, clamped to {clamped}");
    }
    Ok(clamped as u8)
}

fn read_array<'a>(
    obj: &'a Map<String, Value>,
    field: &str,
) -> Result<&'a Vec<Value>, AnalysisError> {
    require(obj, field)?
        .as_array()
        .ok_or_else(|| AnalysisError::InvalidField {
            field: field.to_string(),
            expected: "an array",
        })
}

fn read_string_list(obj: &Map<String, Value>, field: &str) -> Result<Vec<String>, AnalysisError> {
    read_array(obj, field)?
        .iter()
        .enumerate()
        .map(|(i, item)| {
            item.as_str()
                .map(String::from)
                .ok_or_else(|| AnalysisError::InvalidField {
                    field: format!("{field}[{i}]"),
                    expected: "a string",
                })
        })
        .collect()
}

fn read_improvements(obj: &Map<String, Value>) -> Result<Vec<Improvement>, AnalysisError> {
    read_array(obj, "improvements")?
        .iter()
        .enumerate()
        .map(|(i, item)| -> Result<Improvement, AnalysisError> {
            let entry = item.as_object().ok_or_else(|| AnalysisError::InvalidField {
                field: format!("improvements[{i}]"),
                expected: "an object",
            })?;
            let field = |name: &str| read_string_at(entry, name, &format!("improvements[{i}].{name}"));
            Ok(Improvement {
                section: field("section")?,
                original_concept: field("originalConcept")?,
                improved_rewrite: field("improvedRewrite")?,
                why_it_works: field("whyItWorks")?,
            })
        })
        .collect()
}
