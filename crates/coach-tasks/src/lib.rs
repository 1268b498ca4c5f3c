//! Interview Coach tasks — structured calls built on the dispatcher.
//!
//! This crate contains:
//! - **coach**: [`InterviewCoach`], one method per task
//! - **questions / resume / code_eval / feedback**: result schemas and parsing
//! - **prompts**: the prompt text for every task
//! - **scoring**: score ratio and summaries

pub mod code_eval;
pub mod coach;
pub mod error;
pub mod feedback;
mod lenient;
pub mod prompts;
pub mod questions;
pub mod resume;
pub mod scoring;

pub use code_eval::{CodeEvaluation, CodeSubmission};
pub use coach::InterviewCoach;
pub use error::TaskError;
pub use feedback::{AnswerRecord, InterviewFeedback, QuestionFeedback};
pub use lenient::DEFAULT_SCORE;
pub use questions::{Difficulty, InterviewQuestion, QuestionRequest};
pub use resume::ResumeAnalysis;
pub use scoring::{score_ratio, ScoreSummary};
