//! Core types for Interview Coach — chat messages, generation parameters, and
//! the wire shapes spoken to the proxy and to the Gemini `generateContent` API.
//!
//! `ChatMessage` is the provider-agnostic format produced by callers. The
//! dispatcher translates it into [`Content`] turns for direct calls, or sends
//! it verbatim to the proxy.

use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────
// Chat messages (provider-agnostic)
// ─────────────────────────────────────────────

/// Author of a chat message.
///
/// A closed set: translating a new role must be a compile error, not a silent no-op.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single message in conversation order.
///
/// Serialized as `{"role": "user", "content": "..."}`, which is also the
/// proxy wire format.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    /// Create a system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    /// Create a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// Create an assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

// ─────────────────────────────────────────────
// Generation parameters
// ─────────────────────────────────────────────

/// Per-call generation settings.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GenerationParams {
    /// Maximum tokens the model may produce.
    pub max_output_tokens: u32,
    /// Sampling temperature, kept in `[0.0, 1.0]` on the wire.
    pub temperature: f64,
}

impl GenerationParams {
    pub fn new(max_output_tokens: u32, temperature: f64) -> Self {
        Self {
            max_output_tokens,
            temperature,
        }
    }

    /// Temperature clamped into the accepted range. NaN becomes 0.
    pub fn clamped_temperature(&self) -> f64 {
        if self.temperature.is_nan() {
            0.0
        } else {
            self.temperature.clamp(0.0, 1.0)
        }
    }
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            max_output_tokens: 2048,
            temperature: 0.7,
        }
    }
}

/// Which credential pool a call draws from.
///
/// Pools are strictly partitioned: a document call never falls back to chat keys.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum CallPurpose {
    /// Interview chat, question generation, code evaluation, feedback.
    Chat,
    /// Resume / document analysis.
    Document,
}

impl std::fmt::Display for CallPurpose {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CallPurpose::Chat => f.write_str("chat"),
            CallPurpose::Document => f.write_str("document"),
        }
    }
}

// ─────────────────────────────────────────────
// Gemini generateContent (direct transport)
// ─────────────────────────────────────────────

/// Role of a translated turn on the Gemini wire.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    User,
    Model,
}

/// One conversation turn in the provider's format.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Content {
    pub role: TurnRole,
    pub parts: Vec<Part>,
}

impl Content {
    /// A single-part turn.
    pub fn text(role: TurnRole, text: impl Into<String>) -> Self {
        Self {
            role,
            parts: vec![Part { text: text.into() }],
        }
    }

    /// Concatenated text of all parts.
    pub fn joined_text(&self) -> String {
        self.parts.iter().map(|p| p.text.as_str()).collect()
    }
}

/// A text part of a turn.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Part {
    pub text: String,
}

/// `generationConfig` block of a direct request.
#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub max_output_tokens: u32,
    pub temperature: f64,
}

/// Request body for `models/<model>:generateContent`.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    pub generation_config: GenerationConfig,
}

impl GenerateContentRequest {
    pub fn new(contents: Vec<Content>, params: &GenerationParams) -> Self {
        Self {
            contents,
            generation_config: GenerationConfig {
                max_output_tokens: params.max_output_tokens,
                temperature: params.clamped_temperature(),
            },
        }
    }
}

/// Successful `generateContent` response. Every level is optional because the
/// provider omits `content` on safety blocks and truncations.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<CandidateContent>,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
pub struct CandidatePart {
    #[serde(default)]
    pub text: Option<String>,
}

impl GenerateContentResponse {
    /// `candidates[0].content.parts[0].text`, if present.
    pub fn first_text(&self) -> Option<&str> {
        self.candidates
            .first()?
            .content
            .as_ref()?
            .parts
            .first()?
            .text
            .as_deref()
    }

    /// Finish reason of the first candidate (for diagnostics).
    pub fn finish_reason(&self) -> Option<&str> {
        self.candidates.first()?.finish_reason.as_deref()
    }
}

/// Error envelope returned by the provider on non-2xx responses.
#[derive(Debug, Deserialize)]
pub struct ProviderErrorEnvelope {
    pub error: ProviderErrorBody,
}

#[derive(Debug, Deserialize)]
pub struct ProviderErrorBody {
    #[serde(default)]
    pub code: Option<u16>,
    #[serde(default)]
    pub message: String,
    /// Structured code such as `RESOURCE_EXHAUSTED`.
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub details: Vec<serde_json::Value>,
}

// ─────────────────────────────────────────────
// Proxy transport
// ─────────────────────────────────────────────

/// Body posted to the same-origin proxy endpoint.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProxyRequest<'a> {
    pub messages: &'a [ChatMessage],
    pub max_tokens: u32,
    pub temperature: f64,
}

/// Proxy response: `{ text }` on success, `{ error }` on failure.
#[derive(Debug, Default, Deserialize)]
pub struct ProxyResponse {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
