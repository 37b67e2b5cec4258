//! Declared output schema for the analysis call, in Gemini's OpenAPI subset.

use serde_json::{json, Value};

/// Top-level fields the provider must return.
pub const REQUIRED_FIELDS: [&str; 5] = [
    "matchScore",
    "summary",
    "missingKeywords",
    "improvements",
    "culturalFitAnalysis",
];

/// Fields of every improvement entry.
pub const IMPROVEMENT_FIELDS: [&str; 4] =
    ["section", "originalConcept", "improvedRewrite", "whyItWorks"];

pub fn analysis_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "matchScore": {
                "type": "INTEGER",
                "description": "A score from 0 to 100 indicating how well the resume matches the job description."
            },
            "summary": {
                "type": "STRING",
                "description": "A concise executive summary of the candidate's fit for this specific role, acting as a recruiter."
            },
            "missingKeywords": {
                "type": "ARRAY",
                "items": { "type": "STRING" },
                "description": "List of critical keywords or skills found in the JD but missing or weak in the resume."
            },
            "culturalFitAnalysis": {
                "type": "STRING",
                "description": "Analysis of how well the candidate's tone and experience align with the company culture implied in the JD."
            },
            "improvements": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "section": {
                            "type": "STRING",
                            "description": "The section of the resume (e.g., Experience, Skills, Summary)."
                        },
                        "originalConcept": {
                            "type": "STRING",
                            "description": "A brief description of the current content or a specific weak phrase."
                        },
                        "improvedRewrite": {
                            "type": "STRING",
                            "description": "A rewritten, impactful version using action verbs and metrics."
                        },
                        "whyItWorks": {
                            "type": "STRING",
                            "description": "Explanation of why this change improves the candidate's chances."
                        }
                    },
                    "required": IMPROVEMENT_FIELDS
                },
                "description": "A list of specific, actionable suggestions to tailor the resume."
            }
        },
        "required": REQUIRED_FIELDS
    })
}
