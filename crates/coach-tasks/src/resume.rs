//! Resume analysis. The model does all of the parsing; this module only
//! validates and normalizes what comes back.

use serde::{Deserialize, Serialize};

use coach_providers::parse_model_json;

use crate::error::TaskError;
use crate::lenient;

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ResumeAnalysis {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    pub summary: String,
    #[serde(deserialize_with = "lenient::string_list")]
    pub skills: Vec<String>,
    #[serde(deserialize_with = "lenient::opt_f64")]
    pub experience_years: Option<f64>,
    #[serde(deserialize_with = "lenient::string_list")]
    pub strengths: Vec<String>,
    #[serde(deserialize_with = "lenient::string_list")]
    pub gaps: Vec<String>,
    #[serde(deserialize_with = "lenient::string_list")]
    pub suggested_roles: Vec<String>,
    /// Applicant-tracking-system friendliness, 0-100.
    #[serde(deserialize_with = "lenient::opt_score")]
    pub ats_score: Option<u32>,
}

impl ResumeAnalysis {
    /// Nothing at all was extracted.
    pub fn is_empty(&self) -> bool {
        self.summary.is_empty() && self.skills.is_empty() && self.strengths.is_empty()
    }
}

/// Reject input that cannot be a resume before spending a request on it.
pub(crate) fn validate_resume_text(text: &str) -> Result<(), TaskError> {
    if text.trim().is_empty() {
        return Err(TaskError::InvalidInput("resume text is empty".into()));
    }
    Ok(())
}

/// Parse model output into a [`ResumeAnalysis`].
pub fn parse_resume_analysis(raw: &str) -> Result<ResumeAnalysis, TaskError> {
    let mut analysis: ResumeAnalysis = parse_model_json(raw)?;

    analysis.name = analysis
        .name
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty() && !n.eq_ignore_ascii_case("null"));
    analysis.experience_years = analysis.experience_years.map(|y| y.max(0.0));
    analysis.skills.dedup();

    if analysis.is_empty() {
        return Err(TaskError::EmptyResult("resume analysis"));
    }
    Ok(analysis)
}
