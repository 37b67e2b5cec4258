//! Derived, stateless views of an `AnalysisResult`.

use std::fmt;

use serde::Serialize;

use crate::analysis::contract::{AnalysisResult, Improvement};

const STRONG_THRESHOLD: u8 = 70;
const MODERATE_THRESHOLD: u8 = 40;
const NO_MISSING_KEYWORDS: &str = "No critical keywords missing!";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoreBand {
    Weak,
    Moderate,
    Strong,
}

impl ScoreBand {
    /// < 40 weak, 40–69 moderate, ≥ 70 strong.
    pub fn from_score(score: u8) -> Self {
        if score >= STRONG_THRESHOLD {
            ScoreBand::Strong
        } else if score >= MODERATE_THRESHOLD {
            ScoreBand::Moderate
        } else {
            ScoreBand::Weak
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ScoreBand::Weak => "Low Match",
            ScoreBand::Moderate => "Potential Match",
            ScoreBand::Strong => "Strong Match",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum KeywordSection {
    Missing { keywords: Vec<String> },
    AllCovered { message: &'static str },
}

/// One before/after/rationale card.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImprovementCard {
    pub section: String,
    pub before: String,
    pub after: String,
    pub rationale: String,
}

impl From<&Improvement> for ImprovementCard {
    fn from(item: &Improvement) -> Self {
        Self {
            section: item.section.clone(),
            before: item.original_concept.clone(),
            after: item.improved_rewrite.clone(),
            rationale: item.why_it_works.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultView {
    pub score: u8,
    pub band: ScoreBand,
    pub band_label: &'static str,
    pub summary: String,
    pub cultural_fit: String,
    pub keywords: KeywordSection,
    pub improvement_headline: String,
    pub improvements: Vec<ImprovementCard>,
}

impl From<&AnalysisResult> for ResultView {
    fn from(result: &AnalysisResult) -> Self {
        let band = ScoreBand::from_score(result.match_score);
        let keywords = if result.missing_keywords.is_empty() {
            KeywordSection::AllCovered {
                message: NO_MISSING_KEYWORDS,
            }
        } else {
            KeywordSection::Missing {
                keywords: result.missing_keywords.clone(),
            }
        };

        Self {
            score: result.match_score,
            band,
            band_label: band.label(),
            summary: result.summary.clone(),
            cultural_fit: result.cultural_fit_analysis.clone(),
            keywords,
            improvement_headline: format!(
                "{} high-impact tweaks found",
                result.improvements.len()
            ),
            improvements: result.improvements.iter().map(ImprovementCard::from).collect(),
        }
    }
}

/// Plain-text report, as served by the report endpoint.
impl fmt::Display for ResultView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Match score: {}/100 ({})", self.score, self.band_label)?;
        writeln!(f)?;
        writeln!(f, "Summary")?;
        writeln!(f, "{}", self.summary)?;
        writeln!(f)?;
        writeln!(f, "Missing keywords")?;
        match &self.keywords {
            KeywordSection::Missing { keywords } => {
                for kw in keywords {
                    writeln!(f, "  - {kw}")?;
                }
            }
            KeywordSection::AllCovered { message } => writeln!(f, "  {message}")?,
        }
        writeln!(f)?;
        writeln!(f, "Cultural fit")?;
        writeln!(f, "{}", self.cultural_fit)?;
        writeln!(f)?;
        write!(f, "Suggested improvements ({})", self.improvement_headline)?;
        for (i, card) in self.improvements.iter().enumerate() {
            writeln!(f)?;
            writeln!(f)?;
            writeln!(f, "{}. [{}]", i + 1, card.section)?;
            writeln!(f, "   Before: {}", card.before)?;
            writeln!(f, "   After:  {}", card.after)?;
            write!(f, "   Why:    {}", card.rationale)?;
        }
        writeln!(f)
    }
}
