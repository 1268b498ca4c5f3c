//! Interview question generation.

use serde::{Deserialize, Serialize};

use coach_providers::parse_model_json;

use crate::error::TaskError;
use crate::lenient;

/// Upper bound on questions per request.
pub const MAX_QUESTIONS: usize = 20;

/// What to generate questions for.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct QuestionRequest {
    pub role: String,
    /// Seniority as free text, e.g. `"junior"`, `"senior"`.
    pub experience: String,
    pub count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub focus: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resume_summary: Option<String>,
}

impl QuestionRequest {
    pub fn new(role: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            experience: "mid-level".to_string(),
            count: 5,
            focus: None,
            resume_summary: None,
        }
    }

    pub(crate) fn validate(&self) -> Result<(), TaskError> {
        if self.role.trim().is_empty() {
            return Err(TaskError::InvalidInput("role must not be empty".into()));
        }
        if self.count == 0 || self.count > MAX_QUESTIONS {
            return Err(TaskError::InvalidInput(format!(
                "question count must be between 1 and {MAX_QUESTIONS}"
            )));
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    /// Unknown labels map to `Medium`.
    pub fn parse(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "easy" | "beginner" | "junior" => Difficulty::Easy,
            "hard" | "difficult" | "advanced" | "senior" => Difficulty::Hard,
            _ => Difficulty::Medium,
        }
    }
}

impl<'de> Deserialize<'de> for Difficulty {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(Difficulty::parse(&lenient::string(deserializer)?))
    }
}

impl std::fmt::Display for Difficulty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Difficulty::Easy => f.write_str("easy"),
            Difficulty::Medium => f.write_str("medium"),
            Difficulty::Hard => f.write_str("hard"),
        }
    }
}

/// One generated question.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct InterviewQuestion {
    /// 1-based position, assigned locally.
    #[serde(skip_deserializing)]
    pub id: usize,
    #[serde(deserialize_with = "lenient::string")]
    pub question: String,
    #[serde(deserialize_with = "lenient::string")]
    pub category: String,
    pub difficulty: Difficulty,
    #[serde(deserialize_with = "lenient::string_list")]
    pub expected_points: Vec<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum QuestionsPayload {
    Wrapped { questions: Vec<InterviewQuestion> },
    Bare(Vec<InterviewQuestion>),
}

/// Parse model output into at most `limit` questions.
///
/// Accepts `{"questions": [...]}` or a bare array. Blank questions are
/// dropped, ids are renumbered from 1, and a missing category becomes
/// `"general"`.
pub fn parse_questions(raw: &str, limit: usize) -> Result<Vec<InterviewQuestion>, TaskError> {
    let questions = match parse_model_json::<QuestionsPayload>(raw)? {
        QuestionsPayload::Wrapped { questions } | QuestionsPayload::Bare(questions) => questions,
    };

    let questions: Vec<InterviewQuestion> = questions
        .into_iter()
        .filter(|q| !q.question.is_empty())
        .take(limit)
        .enumerate()
        .map(|(i, mut q)| {
            q.id = i + 1;
            if q.category.is_empty() {
                q.category = "general".to_string();
            }
            q
        })
        .collect();

    if questions.is_empty() {
        return Err(TaskError::EmptyResult("questions"));
    }
    Ok(questions)
}
