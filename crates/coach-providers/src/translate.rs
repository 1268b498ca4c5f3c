//! Message translator: provider-agnostic [`ChatMessage`]s → Gemini [`Content`] turns.
//!
//! Gemini has no system role, so system messages are folded into the first
//! user turn as a `"System: …\n\n"` preface. A system message that arrives
//! before any user message gets a synthetic user turn to live in; the next
//! user message is merged into that turn.

use coach_core::types::{ChatMessage, Content, Part, Role, TurnRole};

use crate::error::DispatchError;

/// Translate a conversation into `generateContent` turns.
///
/// Never mutates the input. Fails with [`DispatchError::EmptyMessages`] on an
/// empty list.
pub fn translate(messages: &[ChatMessage]) -> Result<Vec<Content>, DispatchError> {
    if messages.is_empty() {
        return Err(DispatchError::EmptyMessages);
    }

    let mut turns: Vec<Content> = Vec::with_capacity(messages.len());
    // Turn that receives system prefaces: the first user turn, real or synthetic.
    let mut anchor: Option<usize> = None;
    // The anchor is synthetic and still waiting for its user text.
    let mut holder_open = false;

    for msg in messages {
        match msg.role {
            Role::System => {
                let preface = system_preface(&msg.content);
                match anchor {
                    Some(idx) => prepend_text(&mut turns[idx], &preface),
                    None => {
                        turns.push(Content::text(TurnRole::User, preface));
                        anchor = Some(turns.len() - 1);
                        holder_open = true;
                    }
                }
            }
            Role::User => match anchor {
                Some(idx) if holder_open => {
                    append_text(&mut turns[idx], &msg.content);
                    holder_open = false;
                }
                _ => {
                    turns.push(Content::text(TurnRole::User, msg.content.clone()));
                    anchor.get_or_insert(turns.len() - 1);
                }
            },
            Role::Assistant => {
                holder_open = false;
                turns.push(Content::text(TurnRole::Model, msg.content.clone()));
            }
        }
    }

    Ok(turns)
}

fn system_preface(content: &str) -> String {
    format!("System: {content}\n\n")
}

fn prepend_text(turn: &mut Content, text: &str) {
    match turn.parts.first_mut() {
        Some(part) => part.text.insert_str(0, text),
        None => turn.parts.push(Part {
            text: text.to_string(),
        }),
    }
}

fn append_text(turn: &mut Content, text: &str) {
    match turn.parts.last_mut() {
        Some(part) => part.text.push_str(text),
        None => turn.parts.push(Part {
            text: text.to_string(),
        }),
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
