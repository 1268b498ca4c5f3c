//! [`InterviewCoach`] — the task-level API on top of a [`ChatDispatch`].
//!
//! Every task is the same three steps: build the prompt, dispatch it, and
//! parse the JSON answer with schema defaults. Resume analysis uses the
//! document credential pool and its larger token budget; everything else
//! goes through the chat pool.

use std::sync::Arc;

use tracing::{debug, info};

use coach_core::config::GenerationConfig;
use coach_core::session::SessionContext;
use coach_core::types::{CallPurpose, ChatMessage, GenerationParams};
use coach_providers::ChatDispatch;

use crate::code_eval::{parse_code_evaluation, CodeEvaluation, CodeSubmission};
use crate::error::TaskError;
use crate::feedback::{parse_feedback, validate_answers, AnswerRecord, InterviewFeedback};
use crate::prompts;
use crate::questions::{parse_questions, InterviewQuestion, QuestionRequest};
use crate::resume::{parse_resume_analysis, validate_resume_text, ResumeAnalysis};

pub struct InterviewCoach {
    dispatch: Arc<dyn ChatDispatch>,
    chat_params: GenerationParams,
    document_params: GenerationParams,
}

impl InterviewCoach {
    /// Coach with the default generation settings.
    pub fn new(dispatch: Arc<dyn ChatDispatch>) -> Self {
        Self::from_config(dispatch, &GenerationConfig::default())
    }

    pub fn from_config(dispatch: Arc<dyn ChatDispatch>, config: &GenerationConfig) -> Self {
        Self {
            dispatch,
            chat_params: GenerationParams::new(config.max_tokens, config.temperature),
            document_params: GenerationParams::new(config.document_max_tokens, config.temperature),
        }
    }

    /// Raw chat call: returns the model's text unparsed.
    pub async fn ask(
        &self,
        ctx: &mut SessionContext,
        messages: &[ChatMessage],
    ) -> Result<String, TaskError> {
        Ok(self
            .dispatch
            .complete(ctx, CallPurpose::Chat, messages, &self.chat_params)
            .await?)
    }

    pub async fn generate_questions(
        &self,
        ctx: &mut SessionContext,
        request: &QuestionRequest,
    ) -> Result<Vec<InterviewQuestion>, TaskError> {
        request.validate()?;
        let messages = prompts::question_messages(request);
        let raw = self
            .dispatch
            .complete(ctx, CallPurpose::Chat, &messages, &self.chat_params)
            .await?;
        let questions = parse_questions(&raw, request.count)?;
        info!(role = %request.role, count = questions.len(), "Generated interview questions");
        Ok(questions)
    }

    pub async fn analyze_resume(
        &self,
        ctx: &mut SessionContext,
        resume_text: &str,
    ) -> Result<ResumeAnalysis, TaskError> {
        validate_resume_text(resume_text)?;
        let messages = prompts::resume_messages(resume_text);
        let raw = self
            .dispatch
            .complete(ctx, CallPurpose::Document, &messages, &self.document_params)
            .await?;
        debug!(bytes = raw.len(), "Resume analysis received");
        parse_resume_analysis(&raw)
    }

    pub async fn evaluate_code(
        &self,
        ctx: &mut SessionContext,
        submission: &CodeSubmission,
    ) -> Result<CodeEvaluation, TaskError> {
        submission.validate()?;
        let messages = prompts::code_messages(submission);
        let raw = self
            .dispatch
            .complete(ctx, CallPurpose::Chat, &messages, &self.chat_params)
            .await?;
        parse_code_evaluation(&raw)
    }

    pub async fn generate_feedback(
        &self,
        ctx: &mut SessionContext,
        answers: &[AnswerRecord],
    ) -> Result<InterviewFeedback, TaskError> {
        validate_answers(answers)?;
        let messages = prompts::feedback_messages(answers);
        let raw = self
            .dispatch
            .complete(ctx, CallPurpose::Chat, &messages, &self.chat_params)
            .await?;
        let feedback = parse_feedback(&raw, answers)?;
        info!(
            answers = answers.len(),
            overall = feedback.overall_score,
            "Generated interview feedback"
        );
        Ok(feedback)
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
