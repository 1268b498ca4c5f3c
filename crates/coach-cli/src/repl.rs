//! Mock interview REPL.
//!
//! Generates the questions up front, asks them one at a time with `rustyline`
//! (persistent history), then grades the whole transcript in one call.

use anyhow::Result;
use colored::Colorize;
use rustyline::config::Configurer;
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use rustyline::{DefaultEditor, Editor};
use tracing::debug;

use coach_tasks::AnswerRecord;

use crate::commands::{build_request, task_failed};
use crate::helpers;
use crate::{CoachRuntime, InterviewTarget};

/// Exit commands (case-insensitive match).
const EXIT_COMMANDS: &[&str] = &["exit", "quit", "/exit", "/quit", ":q"];

/// Skip the current question (case-insensitive match).
const SKIP_COMMANDS: &[&str] = &["skip", "/skip", "pass"];

/// What a line of input means for the current question.
#[derive(Debug, PartialEq, Eq)]
enum Reply {
    Answer(String),
    Skip,
    Stop,
}

/// Run the interview loop.
pub async fn run(runtime: &mut CoachRuntime, target: &InterviewTarget) -> Result<()> {
    let request = build_request(runtime, target).await?;

    helpers::print_thinking();
    let result = runtime
        .coach
        .generate_questions(&mut runtime.context, &request)
        .await;
    helpers::clear_thinking();
    let questions = result.map_err(task_failed)?;

    helpers::print_banner(&request.role, questions.len());

    let mut editor = create_editor()?;
    let mut answers = Vec::with_capacity(questions.len());

    for question in &questions {
        println!("{}", helpers::question_heading(question));
        let reply = read_reply(&mut editor);
        println!();
        match reply {
            Reply::Answer(answer) => answers.push(AnswerRecord::new(&question.question, answer)),
            Reply::Skip => answers.push(AnswerRecord::new(&question.question, "")),
            Reply::Stop => break,
        }
    }

    save_history(&mut editor);

    if !has_answers(&answers) {
        println!("{}", "No answers to grade. Goodbye!".dimmed());
        return Ok(());
    }

    debug!(answered = answers.len(), "grading interview");
    helpers::print_thinking();
    let result = runtime
        .coach
        .generate_feedback(&mut runtime.context, &answers)
        .await;
    helpers::clear_thinking();

    helpers::print_feedback(&result.map_err(task_failed)?);
    Ok(())
}

/// Prompt until the user gives an answer, a skip, or an exit.
fn read_reply(editor: &mut Editor<(), DefaultHistory>) -> Reply {
    loop {
        let input = match editor.readline("You: ") {
            Ok(line) => line,
            // Ctrl-C / Ctrl-D end the interview
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => return Reply::Stop,
            Err(e) => {
                eprintln!("Input error: {e}");
                return Reply::Stop;
            }
        };

        if let Some(reply) = classify_input(&input) {
            if matches!(reply, Reply::Answer(_)) {
                let _ = editor.add_history_entry(&input);
            }
            return reply;
        }
    }
}

/// `None` for blank input, which re-prompts.
fn classify_input(input: &str) -> Option<Reply> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }
    let lower = trimmed.to_lowercase();
    if EXIT_COMMANDS.contains(&lower.as_str()) {
        Some(Reply::Stop)
    } else if SKIP_COMMANDS.contains(&lower.as_str()) {
        Some(Reply::Skip)
    } else {
        Some(Reply::Answer(trimmed.to_string()))
    }
}

/// At least one question got a non-empty answer.
fn has_answers(answers: &[AnswerRecord]) -> bool {
    answers.iter().any(|a| !a.answer.trim().is_empty())
}

/// Create a rustyline editor with history.
fn create_editor() -> Result<Editor<(), DefaultHistory>> {
    let mut editor = DefaultEditor::new()?;
    editor.set_max_history_size(1000)?;

    let history_path = history_path();
    if history_path.exists() {
        let _ = editor.load_history(&history_path);
        debug!("loaded REPL history from {}", history_path.display());
    }

    Ok(editor)
}

/// Save history to disk.
fn save_history(editor: &mut Editor<(), DefaultHistory>) {
    let path = history_path();
    if let Some(parent) = path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    if let Err(e) = editor.save_history(&path) {
        debug!("failed to save history: {e}");
    }
}

/// `~/.coach/history/interview_history`
fn history_path() -> std::path::PathBuf {
    coach_core::utils::get_data_path()
        .join("history")
        .join("interview_history")
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_commands() {
        assert_eq!(classify_input("exit"), Some(Reply::Stop));
        assert_eq!(classify_input("EXIT"), Some(Reply::Stop));
        assert_eq!(classify_input(" /quit "), Some(Reply::Stop));
        assert_eq!(classify_input(":q"), Some(Reply::Stop));
    }

    #[test]
    fn skip_and_blank() {
        assert_eq!(classify_input("skip"), Some(Reply::Skip));
        assert_eq!(classify_input("Pass"), Some(Reply::Skip));
        assert_eq!(classify_input("   "), None);
        assert_eq!(classify_input(""), None);
    }

    #[test]
    fn answers_are_trimmed() {
        assert_eq!(
            classify_input("  Ownership moves the value.  "),
            Some(Reply::Answer("Ownership moves the value.".into()))
        );
        // "exit" inside a sentence is an answer
        assert_eq!(
            classify_input("I would exit early"),
            Some(Reply::Answer("I would exit early".into()))
        );
    }

    #[test]
    fn skipped_only_is_nothing_to_grade() {
        let skipped = vec![AnswerRecord::new("Q1", ""), AnswerRecord::new("Q2", " ")];
        assert!(!has_answers(&skipped));
        assert!(!has_answers(&[]));
        assert!(has_answers(&[AnswerRecord::new("Q1", "yes")]));
    }

    #[test]
    fn history_path_under_data_dir() {
        let path = history_path();
        assert!(path.to_string_lossy().contains(".coach"));
        assert!(path.to_string_lossy().contains("interview_history"));
    }
}
