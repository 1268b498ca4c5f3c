//! End-of-interview feedback.

use serde::{Deserialize, Serialize};

use coach_providers::parse_model_json;

use crate::error::TaskError;
use crate::lenient::{self, DEFAULT_SCORE};
use crate::scoring::ScoreSummary;

/// One question and the candidate's answer to it.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct AnswerRecord {
    pub question: String,
    #[serde(default)]
    pub answer: String,
}

impl AnswerRecord {
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct QuestionFeedback {
    #[serde(deserialize_with = "lenient::string")]
    pub question: String,
    #[serde(deserialize_with = "lenient::score")]
    pub score: u32,
    #[serde(deserialize_with = "lenient::string")]
    pub comment: String,
}

impl Default for QuestionFeedback {
    fn default() -> Self {
        Self {
            question: String::new(),
            score: DEFAULT_SCORE,
            comment: String::new(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InterviewFeedback {
    pub overall_score: u32,
    pub summary: String,
    pub strengths: Vec<String>,
    pub improvements: Vec<String>,
    pub per_question: Vec<QuestionFeedback>,
}

impl InterviewFeedback {
    /// Ratio summary over the per-question scores.
    pub fn score_summary(&self) -> ScoreSummary {
        let scores: Vec<u32> = self.per_question.iter().map(|q| q.score).collect();
        ScoreSummary::from_scores(&scores)
    }
}

/// What the model sends; `overallScore` may be missing.
#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct FeedbackPayload {
    #[serde(deserialize_with = "lenient::opt_score")]
    overall_score: Option<u32>,
    #[serde(deserialize_with = "lenient::string")]
    summary: String,
    #[serde(deserialize_with = "lenient::string_list")]
    strengths: Vec<String>,
    #[serde(deserialize_with = "lenient::string_list")]
    improvements: Vec<String>,
    per_question: Vec<QuestionFeedback>,
}

pub(crate) fn validate_answers(answers: &[AnswerRecord]) -> Result<(), TaskError> {
    if answers.is_empty() {
        return Err(TaskError::InvalidInput("no answers to grade".into()));
    }
    if answers.iter().all(|a| a.question.trim().is_empty()) {
        return Err(TaskError::InvalidInput("every question is blank".into()));
    }
    Ok(())
}

/// Parse model output into [`InterviewFeedback`] for `answers`.
///
/// A missing overall score is the mean of the per-question scores (or the
/// default score if there are none). Per-question entries without a
/// question text take it from the transcript, by position.
pub fn parse_feedback(raw: &str, answers: &[AnswerRecord]) -> Result<InterviewFeedback, TaskError> {
    let payload: FeedbackPayload = parse_model_json(raw)?;

    let mut per_question = payload.per_question;
    for (entry, record) in per_question.iter_mut().zip(answers) {
        if entry.question.is_empty() {
            entry.question = record.question.trim().to_string();
        }
    }

    let overall_score = payload.overall_score.unwrap_or_else(|| {
        if per_question.is_empty() {
            DEFAULT_SCORE
        } else {
            let total: u32 = per_question.iter().map(|q| q.score).sum();
            lenient::to_score(total as f64 / per_question.len() as f64)
        }
    });

    Ok(InterviewFeedback {
        overall_score,
        summary: payload.summary,
        strengths: payload.strengths,
        improvements: payload.improvements,
        per_question,
    })
}
