//! Shared CLI helpers — path expansion, file input, and result printing.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use colored::Colorize;
use serde::Serialize;

use coach_tasks::{
    CodeEvaluation, InterviewFeedback, InterviewQuestion, ResumeAnalysis, ScoreSummary,
};

/// Expand `~` at the start of a path to the user's home directory.
pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs_next::home_dir() {
            return home.join(rest);
        }
    }
    if path == "~" {
        if let Some(home) = dirs_next::home_dir() {
            return home;
        }
    }
    PathBuf::from(path)
}

/// Read a UTF-8 input file, expanding a leading `~`.
pub fn read_text_file(path: &Path) -> Result<String> {
    let path = expand_tilde(&path.to_string_lossy());
    std::fs::read_to_string(&path).with_context(|| format!("failed to read {}", path.display()))
}

/// Print a raw model reply to stdout.
pub fn print_response(response: &str) {
    println!();
    println!("{}", "Coach".cyan().bold());
    if response.trim().is_empty() {
        println!("{}", "(no response)".dimmed());
    } else {
        println!("{response}");
    }
    println!();
}

pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print the banner shown at the start of a mock interview.
pub fn print_banner(role: &str, questions: usize) {
    let version = env!("CARGO_PKG_VERSION");
    println!();
    println!(
        "{}  v{}",
        "Interview Coach".cyan().bold(),
        version.dimmed()
    );
    println!("Mock interview for {} ({} questions)", role.bold(), questions);
    println!(
        "{}",
        "Answer each question, \"skip\" to pass, or \"exit\" to stop early.".dimmed()
    );
    println!();
}

/// Print a "thinking" placeholder on stderr.
pub fn print_thinking() {
    eprint!("{}", "⠿ thinking...".dimmed());
}

/// Clear the "thinking" placeholder.
pub fn clear_thinking() {
    eprint!("\r{}\r", " ".repeat(40));
}

pub fn print_quota_hint() {
    eprintln!();
    eprintln!(
        "{}",
        "Every API key is out of quota right now. Wait a minute or two before trying again."
            .yellow()
    );
}

pub fn print_busy_hint() {
    eprintln!();
    eprintln!(
        "{}",
        "The model service is busy or unreachable. Try again in a few moments.".yellow()
    );
}

/// One question as shown in lists and in the interview prompt.
pub fn question_heading(question: &InterviewQuestion) -> String {
    format!(
        "{}. {} {}",
        question.id,
        question.question,
        format!("[{} · {}]", question.category, question.difficulty).dimmed()
    )
}

pub fn print_questions(role: &str, questions: &[InterviewQuestion]) {
    println!();
    println!("{}", format!("Interview questions: {role}").cyan().bold());
    println!();
    for question in questions {
        println!("  {}", question_heading(question));
        for point in &question.expected_points {
            println!("     {} {}", "-".dimmed(), point.dimmed());
        }
    }
    println!();
}

pub fn print_resume_analysis(analysis: &ResumeAnalysis) {
    println!();
    println!("{}", "Resume analysis".cyan().bold());
    println!();

    if let Some(name) = &analysis.name {
        println!("  {:<18} {}", "Name:".bold(), name);
    }
    if let Some(years) = analysis.experience_years {
        println!("  {:<18} {} years", "Experience:".bold(), years);
    }
    if let Some(ats) = analysis.ats_score {
        println!("  {:<18} {}/100", "ATS score:".bold(), ats);
    }
    if !analysis.summary.is_empty() {
        println!();
        println!("  {}", analysis.summary);
    }

    print_list("Skills", &analysis.skills);
    print_list("Strengths", &analysis.strengths);
    print_list("Gaps", &analysis.gaps);
    print_list("Suggested roles", &analysis.suggested_roles);

    if analysis.is_empty() {
        println!("  {}", "(nothing could be extracted)".dimmed());
    }
    println!();
}

pub fn print_code_evaluation(evaluation: &CodeEvaluation) {
    println!();
    println!(
        "{}  {}",
        "Code evaluation".cyan().bold(),
        score_badge(evaluation.score)
    );
    println!();
    println!("  {:<18} {}", "Time:".bold(), evaluation.time_complexity);
    println!("  {:<18} {}", "Space:".bold(), evaluation.space_complexity);
    if !evaluation.correctness.is_empty() {
        println!("  {:<18} {}", "Correctness:".bold(), evaluation.correctness);
    }
    if !evaluation.feedback.is_empty() {
        println!();
        println!("  {}", evaluation.feedback);
    }
    print_list("Improvements", &evaluation.improvements);
    println!();
}

pub fn print_feedback(feedback: &InterviewFeedback) {
    println!();
    println!(
        "{}  {}",
        "Interview feedback".cyan().bold(),
        score_badge(feedback.overall_score)
    );
    if !feedback.summary.is_empty() {
        println!();
        println!("  {}", feedback.summary);
    }

    print_list("Strengths", &feedback.strengths);
    print_list("To improve", &feedback.improvements);

    if !feedback.per_question.is_empty() {
        println!();
        println!("  {}", "Per question:".bold());
        for (i, item) in feedback.per_question.iter().enumerate() {
            println!("    {}. {} {}", i + 1, item.question, score_badge(item.score));
            if !item.comment.is_empty() {
                println!("       {}", item.comment.dimmed());
            }
        }
        print_score_summary(&feedback.score_summary());
    }
    println!();
}

pub fn print_score_summary(summary: &ScoreSummary) {
    println!();
    println!(
        "  {:<18} {}/{} ({}%) {}",
        "Total:".bold(),
        summary.earned,
        summary.possible,
        summary.percentage,
        summary.label().bold()
    );
}

fn print_list(title: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    println!();
    println!("  {}", format!("{title}:").bold());
    for item in items {
        println!("    • {item}");
    }
}

/// Colored `NN/100`: green from 75, yellow from 50, red below.
fn score_badge(score: u32) -> String {
    let text = format!("{score}/100");
    match score {
        75.. => text.green().to_string(),
        50..=74 => text.yellow().to_string(),
        _ => text.red().to_string(),
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
