//! Direct transport: calls Gemini `generateContent` with a locally held key.

use coach_core::types::{GenerateContentRequest, GenerateContentResponse};
use coach_core::utils::truncate_string;
use tracing::debug;

use crate::error::Failure;
use crate::retry::retry_after_from_headers;

/// Header carrying the API key.
pub const API_KEY_HEADER: &str = "x-goog-api-key";

#[derive(Clone, Debug)]
pub struct DirectTransport {
    client: reqwest::Client,
    /// Normalized endpoint, ending in `:generateContent`.
    endpoint: String,
}

impl DirectTransport {
    pub fn new(client: reqwest::Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// One `generateContent` call with `api_key`.
    ///
    /// Returns `candidates[0].content.parts[0].text`; a 200 without it is a
    /// [`ErrorClass::MalformedResponse`](crate::classify::ErrorClass) failure.
    pub async fn generate(
        &self,
        api_key: &str,
        request: &GenerateContentRequest,
    ) -> Result<String, Failure> {
        let response = self
            .client
            .post(&self.endpoint)
            .header(API_KEY_HEADER, api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| Failure::network(format!("request failed: {e}")))?;

        let status = response.status();
        let retry_after = retry_after_from_headers(response.headers());
        let body = response
            .text()
            .await
            .map_err(|e| Failure::network(format!("failed to read response: {e}")))?;

        if !status.is_success() {
            return Err(Failure::from_http(status.as_u16(), &body, retry_after));
        }

        let parsed: GenerateContentResponse = serde_json::from_str(&body).map_err(|e| {
            Failure::malformed(format!(
                "invalid response body ({e}): {}",
                truncate_string(&body, 200)
            ))
        })?;

        debug!(
            candidates = parsed.candidates.len(),
            finish_reason = parsed.finish_reason().unwrap_or("?"),
            "Gemini responded"
        );

        match parsed.first_text() {
            Some(text) => Ok(text.to_string()),
            None => Err(Failure::malformed(format!(
                "response has no candidate text (finishReason: {})",
                parsed.finish_reason().unwrap_or("none")
            ))),
        }
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
