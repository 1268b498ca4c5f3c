//! Code answer evaluation.

use serde::{Deserialize, Serialize};

use coach_providers::parse_model_json;

use crate::error::TaskError;
use crate::lenient::{self, DEFAULT_SCORE};

/// A candidate's solution to a coding question.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct CodeSubmission {
    pub question: String,
    pub language: String,
    pub code: String,
}

impl CodeSubmission {
    pub(crate) fn validate(&self) -> Result<(), TaskError> {
        if self.code.trim().is_empty() {
            return Err(TaskError::InvalidInput("no code submitted".into()));
        }
        if self.question.trim().is_empty() {
            return Err(TaskError::InvalidInput("question must not be empty".into()));
        }
        Ok(())
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct CodeEvaluation {
    /// 0-100; [`DEFAULT_SCORE`] when the model gives none.
    #[serde(deserialize_with = "lenient::score")]
    pub score: u32,
    #[serde(deserialize_with = "lenient::string")]
    pub correctness: String,
    #[serde(deserialize_with = "lenient::string")]
    pub time_complexity: String,
    #[serde(deserialize_with = "lenient::string")]
    pub space_complexity: String,
    #[serde(deserialize_with = "lenient::string")]
    pub feedback: String,
    #[serde(deserialize_with = "lenient::string_list")]
    pub improvements: Vec<String>,
}

impl Default for CodeEvaluation {
    fn default() -> Self {
        Self {
            score: DEFAULT_SCORE,
            correctness: String::new(),
            time_complexity: String::new(),
            space_complexity: String::new(),
            feedback: String::new(),
            improvements: Vec::new(),
        }
    }
}

/// Parse model output into a [`CodeEvaluation`].
pub fn parse_code_evaluation(raw: &str) -> Result<CodeEvaluation, TaskError> {
    let mut evaluation: CodeEvaluation = parse_model_json(raw)?;
    for field in [&mut evaluation.time_complexity, &mut evaluation.space_complexity] {
        if field.is_empty() {
            *field = "unknown".to_string();
        }
    }
    Ok(evaluation)
}
