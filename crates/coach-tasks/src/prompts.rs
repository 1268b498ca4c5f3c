//! Prompt builders for every coaching task.
//!
//! Each builder returns the full message list for one dispatch: a system
//! message describing the interviewer persona and the exact JSON shape
//! expected back, then a single user message with the task input.

use coach_core::types::ChatMessage;
use coach_core::utils::truncate_string;

use crate::code_eval::CodeSubmission;
use crate::feedback::AnswerRecord;
use crate::questions::QuestionRequest;

/// Resume text beyond this many characters is cut before sending.
pub const MAX_RESUME_CHARS: usize = 30_000;

/// Submitted code beyond this many characters is cut before sending.
pub const MAX_CODE_CHARS: usize = 20_000;

const JSON_ONLY: &str = "Respond with a single JSON object and nothing else: \
no markdown fences, no commentary before or after it.";

const INTERVIEWER: &str = "You are an experienced technical interviewer and career coach. \
You are direct, fair and specific.";

/// Messages asking for a set of interview questions.
pub fn question_messages(request: &QuestionRequest) -> Vec<ChatMessage> {
    let system = format!(
        "{INTERVIEWER}\n\n{JSON_ONLY}\n\nSchema:\n\
         {{\"questions\": [{{\"question\": string, \"category\": \"technical\" | \"behavioral\" | \"system-design\" | \"coding\", \
         \"difficulty\": \"easy\" | \"medium\" | \"hard\", \"expectedPoints\": [string]}}]}}"
    );

    let mut user = format!(
        "Generate {} interview questions for a {} candidate applying for the role of {}.",
        request.count, request.experience, request.role
    );
    if let Some(focus) = request.focus.as_deref().filter(|f| !f.trim().is_empty()) {
        user.push_str(&format!("\nFocus areas: {focus}."));
    }
    if let Some(summary) = request
        .resume_summary
        .as_deref()
        .filter(|s| !s.trim().is_empty())
    {
        user.push_str(&format!(
            "\nTailor some questions to this candidate background:\n{summary}"
        ));
    }
    user.push_str("\nMix difficulty levels and list 2-4 expected points per question.");

    vec![ChatMessage::system(system), ChatMessage::user(user)]
}

/// Messages asking for a structured resume analysis.
pub fn resume_messages(resume_text: &str) -> Vec<ChatMessage> {
    let system = format!(
        "You are a senior technical recruiter reviewing a resume.\n\n{JSON_ONLY}\n\nSchema:\n\
         {{\"name\": string | null, \"summary\": string, \"skills\": [string], \
         \"experienceYears\": number, \"strengths\": [string], \"gaps\": [string], \
         \"suggestedRoles\": [string], \"atsScore\": number (0-100)}}"
    );
    let user = format!(
        "Analyze this resume:\n\n{}",
        truncate_string(resume_text.trim(), MAX_RESUME_CHARS)
    );
    vec![ChatMessage::system(system), ChatMessage::user(user)]
}

/// Messages asking for a review of a coding answer.
pub fn code_messages(submission: &CodeSubmission) -> Vec<ChatMessage> {
    let system = format!(
        "{INTERVIEWER} You are reviewing a candidate's solution to a coding question.\n\n\
         {JSON_ONLY}\n\nSchema:\n\
         {{\"score\": number (0-100), \"correctness\": string, \"timeComplexity\": string, \
         \"spaceComplexity\": string, \"feedback\": string, \"improvements\": [string]}}"
    );
    let user = format!(
        "Question:\n{}\n\nLanguage: {}\n\nSolution:\n{}",
        submission.question.trim(),
        submission.language.trim(),
        truncate_string(&submission.code, MAX_CODE_CHARS)
    );
    vec![ChatMessage::system(system), ChatMessage::user(user)]
}

/// Messages asking for end-of-interview feedback on a transcript.
pub fn feedback_messages(answers: &[AnswerRecord]) -> Vec<ChatMessage> {
    let system = format!(
        "{INTERVIEWER} The mock interview is over; grade the candidate.\n\n{JSON_ONLY}\n\nSchema:\n\
         {{\"overallScore\": number (0-100), \"summary\": string, \"strengths\": [string], \
         \"improvements\": [string], \"perQuestion\": [{{\"question\": string, \
         \"score\": number (0-100), \"comment\": string}}]}}"
    );

    let mut user = String::from("Interview transcript:\n");
    for (i, record) in answers.iter().enumerate() {
        let answer = if record.answer.trim().is_empty() {
            "(no answer)"
        } else {
            record.answer.trim()
        };
        user.push_str(&format!(
            "\nQ{n}: {q}\nA{n}: {answer}\n",
            n = i + 1,
            q = record.question.trim()
        ));
    }
    vec![ChatMessage::system(system), ChatMessage::user(user)]
}

/// System prompt for a free-form interviewer conversation.
pub fn interviewer_system(role: &str) -> ChatMessage {
    ChatMessage::system(format!(
        "{INTERVIEWER} You are interviewing a candidate for the role of {role}. \
         Ask one question at a time and keep replies short."
    ))
}
