//! Dispatch errors.
//!
//! [`Failure`] describes a single failed attempt and stays inside the crate's
//! retry machinery; [`DispatchError`] is what callers see once every local
//! recovery path (next credential, next transport, backoff) is used up.

use std::time::Duration;

use coach_core::types::{CallPurpose, ProviderErrorEnvelope};
use coach_core::utils::truncate_string;

use crate::classify::{classify, ErrorClass};
use crate::retry::parse_retry_hint;

/// Error bodies are cut to this many characters in messages and logs.
const MAX_ERROR_BODY_CHARS: usize = 500;

/// Errors surfaced by the dispatcher.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// No credential for this call class and no proxy to fall back on.
    #[error("no API key configured for {0} requests")]
    NotConfigured(CallPurpose),

    /// The caller passed an empty message list.
    #[error("cannot dispatch an empty message list")]
    EmptyMessages,

    /// Quota/rate-limit errors persisted through every retry.
    #[error("quota exceeded after {attempts} attempts: {message}")]
    QuotaExceeded { attempts: u32, message: String },

    /// Transient failures (unavailable, network) persisted through every retry.
    #[error("provider unavailable after {attempts} attempts: {message}")]
    Exhausted { attempts: u32, message: String },

    /// The provider refused the request in a way retrying won't fix.
    #[error("provider rejected the request: {message}")]
    Provider { status: Option<u16>, message: String },

    /// 200 OK without the expected text field.
    #[error("unexpected response shape: {0}")]
    ResponseShape(String),

    /// Model output could not be repaired into the expected JSON.
    #[error("model output is not valid JSON: {0}")]
    Parse(String),

    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

impl DispatchError {
    /// Whether the UI should show a cool-down hint before allowing a retry.
    pub fn is_quota(&self) -> bool {
        matches!(self, DispatchError::QuotaExceeded { .. })
    }

    /// Whether a manual retry later has a reasonable chance of succeeding.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            DispatchError::QuotaExceeded { .. } | DispatchError::Exhausted { .. }
        )
    }
}

/// One failed attempt against a transport.
#[derive(Clone, Debug, PartialEq)]
pub struct Failure {
    pub class: ErrorClass,
    pub status: Option<u16>,
    pub message: String,
    /// Provider-supplied wait before retrying, if any.
    pub retry_after: Option<Duration>,
}

impl Failure {
    pub fn new(class: ErrorClass, status: Option<u16>, message: impl Into<String>) -> Self {
        Self {
            class,
            status,
            message: message.into(),
            retry_after: None,
        }
    }

    /// A request that never received an HTTP response.
    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ErrorClass::Network, None, message)
    }

    /// A 200 response without usable text.
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::new(ErrorClass::MalformedResponse, Some(200), message)
    }

    /// Build a failure from a non-2xx provider response.
    ///
    /// Understands the `{ "error": { "message", "status" } }` envelope and falls
    /// back to the raw body. A `Retry-After` header wins over hints in the body.
    pub fn from_http(status: u16, body: &str, retry_after_header: Option<Duration>) -> Self {
        let (message, provider_status) = match serde_json::from_str::<ProviderErrorEnvelope>(body) {
            Ok(env) if !env.error.message.is_empty() => (env.error.message, env.error.status),
            Ok(env) => (format!("HTTP {status}"), env.error.status),
            Err(_) if body.trim().is_empty() => (format!("HTTP {status}"), None),
            Err(_) => (truncate_string(body.trim(), MAX_ERROR_BODY_CHARS), None),
        };

        Self {
            class: classify(Some(status), provider_status.as_deref(), &message),
            status: Some(status),
            retry_after: retry_after_header.or_else(|| parse_retry_hint(body)),
            message,
        }
    }
}

impl std::fmt::Display for Failure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.status {
            Some(status) => write!(f, "{} (status {status})", self.message),
            None => f.write_str(&self.message),
        }
    }
}

impl From<Failure> for DispatchError {
    /// Terminal conversion: used when a failure is surfaced without further retries.
    fn from(failure: Failure) -> Self {
        match failure.class {
            ErrorClass::MalformedResponse => DispatchError::ResponseShape(failure.message),
            _ => DispatchError::Provider {
                status: failure.status,
                message: failure.message,
            },
        }
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_http_envelope() {
        let body = r#"{"error":{"code":429,"message":"Resource exhausted. Please retry in 3.5s.","status":"RESOURCE_EXHAUSTED"}}"#;
        let failure = Failure::from_http(429, body, None);

        assert_eq!(failure.class, ErrorClass::Quota);
        assert_eq!(failure.status, Some(429));
        assert_eq!(failure.message, "Resource exhausted. Please retry in 3.5s.");
        assert_eq!(failure.retry_after, Some(Duration::from_millis(3500)));
    }

    #[test]
    fn test_from_http_header_wins() {
        let body = r#"{"error":{"message":"retry in 10s"}}"#;
        let failure = Failure::from_http(429, body, Some(Duration::from_secs(2)));
        assert_eq!(failure.retry_after, Some(Duration::from_secs(2)));
    }

    #[test]
    fn test_from_http_plain_body() {
        let failure = Failure::from_http(404, "Not Found", None);
        assert_eq!(failure.class, ErrorClass::Terminal);
        assert_eq!(failure.message, "Not Found");
        assert!(failure.retry_after.is_none());
    }

    #[test]
    fn test_from_http_empty_body() {
        let failure = Failure::from_http(503, "", None);
        assert_eq!(failure.class, ErrorClass::Unavailable);
        assert_eq!(failure.message, "HTTP 503");
    }

    #[test]
    fn test_from_http_truncates_huge_body() {
        let body = "x".repeat(5000);
        let failure = Failure::from_http(500, &body, None);
        assert_eq!(failure.message.chars().count(), MAX_ERROR_BODY_CHARS);
    }

    #[test]
    fn test_failure_into_dispatch_error() {
        let err: DispatchError = Failure::malformed("no candidates").into();
        assert!(matches!(err, DispatchError::ResponseShape(ref m) if m == "no candidates"));

        let err: DispatchError = Failure::new(ErrorClass::Terminal, Some(400), "bad").into();
        assert!(matches!(
            err,
            DispatchError::Provider { status: Some(400), .. }
        ));
    }

    #[test]
    fn test_error_flags() {
        let quota = DispatchError::QuotaExceeded {
            attempts: 5,
            message: "quota".into(),
        };
        assert!(quota.is_quota());
        assert!(quota.is_transient());
        assert!(!DispatchError::EmptyMessages.is_transient());
        assert_eq!(
            DispatchError::NotConfigured(CallPurpose::Document).to_string(),
            "no API key configured for document requests"
        );
    }
}
