//! Proxy transport: POSTs the untranslated conversation to a server-side relay
//! that holds the credentials (`{messages, maxTokens, temperature}` → `{text}`).

use coach_core::types::{ChatMessage, GenerationParams, ProxyRequest, ProxyResponse};
use coach_core::utils::truncate_string;
use tracing::debug;

use crate::classify::classify;
use crate::error::Failure;
use crate::retry::{parse_retry_hint, retry_after_from_headers};

/// Client for the relay endpoint.
#[derive(Clone, Debug)]
pub struct ProxyTransport {
    client: reqwest::Client,
    url: String,
}

impl ProxyTransport {
    pub fn new(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// One request to the relay. No retries here.
    pub async fn send(
        &self,
        messages: &[ChatMessage],
        params: &GenerationParams,
    ) -> Result<String, Failure> {
        let body = ProxyRequest {
            messages,
            max_tokens: params.max_output_tokens,
            temperature: params.clamped_temperature(),
        };

        let response = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| Failure::network(format!("proxy request failed: {e}")))?;

        let status = response.status();
        let retry_after = retry_after_from_headers(response.headers());
        let text = response
            .text()
            .await
            .map_err(|e| Failure::network(format!("failed to read proxy response: {e}")))?;

        debug!(status = status.as_u16(), bytes = text.len(), "Proxy responded");

        if status.is_success() {
            return match serde_json::from_str::<ProxyResponse>(&text) {
                Ok(ProxyResponse {
                    text: Some(output), ..
                }) => Ok(output),
                Ok(ProxyResponse {
                    error: Some(error), ..
                }) => Err(Failure::malformed(format!("proxy returned error with 200: {error}"))),
                _ => Err(Failure::malformed(format!(
                    "proxy response has no text: {}",
                    truncate_string(&text, 200)
                ))),
            };
        }

        Err(proxy_failure(status.as_u16(), &text, retry_after))
    }
}

/// Failure from a non-2xx relay response, reading `{ "error": "…" }` when present.
fn proxy_failure(
    status: u16,
    body: &str,
    retry_after: Option<std::time::Duration>,
) -> Failure {
    let message = serde_json::from_str::<ProxyResponse>(body)
        .ok()
        .and_then(|r| r.error)
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| {
            if body.trim().is_empty() {
                format!("proxy HTTP {status}")
            } else {
                truncate_string(body.trim(), 500)
            }
        });

    let mut failure = Failure::new(classify(Some(status), None, &message), Some(status), message);
    failure.retry_after = retry_after.or_else(|| parse_retry_hint(body));
    failure
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
