//! One-shot commands: `ask`, `questions`, `resume`, `code`, `feedback`.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use coach_core::ChatMessage;
use coach_tasks::{AnswerRecord, CodeSubmission, QuestionRequest, TaskError};

use crate::helpers;
use crate::{CoachRuntime, InterviewTarget};

pub async fn ask(
    runtime: &mut CoachRuntime,
    message: &str,
    system: Option<ChatMessage>,
) -> Result<()> {
    let mut messages = Vec::with_capacity(2);
    if let Some(system) = system.filter(|s| !s.content.trim().is_empty()) {
        messages.push(system);
    }
    messages.push(ChatMessage::user(message));

    helpers::print_thinking();
    let result = runtime.coach.ask(&mut runtime.context, &messages).await;
    helpers::clear_thinking();

    helpers::print_response(&result.map_err(task_failed)?);
    Ok(())
}

pub async fn questions(runtime: &mut CoachRuntime, target: &InterviewTarget, json: bool) -> Result<()> {
    let request = build_request(runtime, target).await?;

    helpers::print_thinking();
    let result = runtime
        .coach
        .generate_questions(&mut runtime.context, &request)
        .await;
    helpers::clear_thinking();
    let questions = result.map_err(task_failed)?;

    if json {
        helpers::print_json(&questions)?;
    } else {
        helpers::print_questions(&request.role, &questions);
    }
    Ok(())
}

pub async fn resume(runtime: &mut CoachRuntime, file: &Path, json: bool) -> Result<()> {
    let text = helpers::read_text_file(file)?;

    helpers::print_thinking();
    let result = runtime.coach.analyze_resume(&mut runtime.context, &text).await;
    helpers::clear_thinking();
    let analysis = result.map_err(task_failed)?;

    if json {
        helpers::print_json(&analysis)?;
    } else {
        helpers::print_resume_analysis(&analysis);
    }
    Ok(())
}

pub async fn code(
    runtime: &mut CoachRuntime,
    question: String,
    language: String,
    file: &Path,
    json: bool,
) -> Result<()> {
    let submission = CodeSubmission {
        question,
        language,
        code: helpers::read_text_file(file)?,
    };

    helpers::print_thinking();
    let result = runtime
        .coach
        .evaluate_code(&mut runtime.context, &submission)
        .await;
    helpers::clear_thinking();
    let evaluation = result.map_err(task_failed)?;

    if json {
        helpers::print_json(&evaluation)?;
    } else {
        helpers::print_code_evaluation(&evaluation);
    }
    Ok(())
}

pub async fn feedback(runtime: &mut CoachRuntime, transcript: &Path, json: bool) -> Result<()> {
    let answers = read_transcript(transcript)?;
    info!(answers = answers.len(), "grading transcript");

    helpers::print_thinking();
    let result = runtime
        .coach
        .generate_feedback(&mut runtime.context, &answers)
        .await;
    helpers::clear_thinking();
    let feedback = result.map_err(task_failed)?;

    if json {
        helpers::print_json(&feedback)?;
    } else {
        helpers::print_feedback(&feedback);
    }
    Ok(())
}

/// Turn CLI options into a [`QuestionRequest`], summarizing the resume
/// first when one is given.
pub async fn build_request(
    runtime: &mut CoachRuntime,
    target: &InterviewTarget,
) -> Result<QuestionRequest> {
    let mut request = target.to_request();
    if let Some(path) = &target.resume {
        let text = helpers::read_text_file(path)?;
        helpers::print_thinking();
        let result = runtime.coach.analyze_resume(&mut runtime.context, &text).await;
        helpers::clear_thinking();
        let analysis = result.map_err(task_failed)?;
        if !analysis.summary.is_empty() {
            request.resume_summary = Some(analysis.summary);
        }
    }
    Ok(request)
}

/// Parse a transcript file: `[{"question": "...", "answer": "..."}]`.
fn read_transcript(path: &Path) -> Result<Vec<AnswerRecord>> {
    let content = helpers::read_text_file(path)?;
    serde_json::from_str(&content)
        .with_context(|| format!("{} is not a JSON array of question/answer pairs", path.display()))
}

/// Convert a task error for `main`, printing a retry hint when waiting
/// could help.
pub fn task_failed(err: TaskError) -> anyhow::Error {
    if err.is_quota() {
        helpers::print_quota_hint();
    } else if err.is_transient() {
        helpers::print_busy_hint();
    }
    anyhow::Error::new(err)
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_transcript_ok() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.json");
        std::fs::write(
            &path,
            r#"[{"question": "Why Rust?", "answer": "Memory safety."}, {"question": "Skipped"}]"#,
        )
        .unwrap();

        let answers = read_transcript(&path).unwrap();
        assert_eq!(answers.len(), 2);
        assert_eq!(answers[0].answer, "Memory safety.");
        assert_eq!(answers[1].answer, "");
    }

    #[test]
    fn read_transcript_rejects_object() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.json");
        std::fs::write(&path, r#"{"question": "Why Rust?"}"#).unwrap();

        let err = read_transcript(&path).unwrap_err();
        assert!(err.to_string().contains("question/answer"));
    }

    #[test]
    fn task_failed_keeps_message() {
        let err = task_failed(TaskError::InvalidInput("no code submitted".into()));
        assert_eq!(err.to_string(), "invalid input: no code submitted");
    }
}
