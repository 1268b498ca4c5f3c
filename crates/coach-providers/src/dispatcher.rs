//! The dispatcher: proxy first, direct Gemini calls as the fallback.
//!
//! Per call:
//!
//! 1. **Proxy** (if configured). 429/503 are retried against the proxy with
//!    linear backoff; a 200 without text is terminal; anything else (404 for
//!    a missing proxy, connection errors, other statuses, or an exhausted
//!    retry budget) falls through to the direct transport.
//! 2. **Direct**. Messages are translated and sent through the credential
//!    pool for the call's purpose, one rotation sweep per attempt. Sweeps
//!    that end in quota/unavailable/network failures are retried after a
//!    backoff (provider hint + margin when available).

use std::time::Instant;

use async_trait::async_trait;
use tracing::{debug, error, info, warn};

use coach_core::config::{Config, ProviderConfig, RetryConfig};
use coach_core::session::{RotationLedger, SessionContext};
use coach_core::types::{CallPurpose, ChatMessage, GenerateContentRequest, GenerationParams};

use crate::classify::ErrorClass;
use crate::credentials::CredentialPool;
use crate::direct::DirectTransport;
use crate::error::{DispatchError, Failure};
use crate::proxy::ProxyTransport;
use crate::retry::RetryPolicy;
use crate::traits::ChatDispatch;
use crate::translate::translate;

/// How the proxy leg ended.
enum ProxyOutcome {
    Done(String),
    Terminal(DispatchError),
    Fallback { failure: Failure, attempts: u32 },
}

/// Routes chat calls to the model.
#[derive(Debug)]
pub struct Dispatcher {
    proxy: Option<ProxyTransport>,
    direct: DirectTransport,
    chat_keys: CredentialPool,
    document_keys: CredentialPool,
    policy: RetryPolicy,
}

impl Dispatcher {
    /// Build a dispatcher from provider and retry settings.
    pub fn new(provider: &ProviderConfig, retry: &RetryConfig) -> Result<Self, DispatchError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(provider.timeout_secs.max(1)))
            .build()?;

        let proxy = provider
            .proxy_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .map(|url| ProxyTransport::new(client.clone(), url));

        Ok(Self {
            proxy,
            direct: DirectTransport::new(client, provider.normalized_endpoint()),
            chat_keys: CredentialPool::new(CallPurpose::Chat, provider.api_keys.clone()),
            document_keys: CredentialPool::new(
                CallPurpose::Document,
                provider.document_api_keys.clone(),
            ),
            policy: RetryPolicy::from(retry),
        })
    }

    /// Resume the pools' round-robin counters.
    pub fn with_ledger(mut self, ledger: &RotationLedger) -> Self {
        self.chat_keys = self
            .chat_keys
            .with_next_assignment(ledger.next_for(CallPurpose::Chat));
        self.document_keys = self
            .document_keys
            .with_next_assignment(ledger.next_for(CallPurpose::Document));
        self
    }

    /// Snapshot of the round-robin counters, for persisting.
    pub fn ledger(&self) -> RotationLedger {
        let mut ledger = RotationLedger::default();
        for purpose in [CallPurpose::Chat, CallPurpose::Document] {
            ledger.set_next(purpose, self.pool(purpose).next_assignment());
        }
        ledger
    }

    pub fn pool(&self, purpose: CallPurpose) -> &CredentialPool {
        match purpose {
            CallPurpose::Chat => &self.chat_keys,
            CallPurpose::Document => &self.document_keys,
        }
    }

    pub fn proxy_url(&self) -> Option<&str> {
        self.proxy.as_ref().map(ProxyTransport::url)
    }

    pub fn endpoint(&self) -> &str {
        self.direct.endpoint()
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Send `messages` and return the model's text.
    pub async fn dispatch(
        &self,
        ctx: &mut SessionContext,
        purpose: CallPurpose,
        messages: &[ChatMessage],
        params: &GenerationParams,
    ) -> Result<String, DispatchError> {
        if messages.is_empty() {
            return Err(DispatchError::EmptyMessages);
        }
        let pool = self.pool(purpose);
        if self.proxy.is_none() && pool.is_empty() {
            return Err(DispatchError::NotConfigured(purpose));
        }

        let started = Instant::now();
        debug!(
            purpose = %purpose,
            messages = messages.len(),
            max_tokens = params.max_output_tokens,
            "Dispatching"
        );

        if let Some(proxy) = &self.proxy {
            match self.via_proxy(proxy, messages, params).await {
                ProxyOutcome::Done(text) => {
                    debug!(
                        purpose = %purpose,
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        "Proxy call succeeded"
                    );
                    return Ok(text);
                }
                ProxyOutcome::Terminal(err) => {
                    error!(purpose = %purpose, error = %err, "Proxy returned an unusable response");
                    return Err(err);
                }
                ProxyOutcome::Fallback { failure, attempts } => {
                    if pool.is_empty() {
                        return Err(proxy_failure_without_keys(purpose, failure, attempts));
                    }
                    warn!(
                        purpose = %purpose,
                        status = ?failure.status,
                        error = %failure,
                        "Proxy unavailable, falling back to direct calls"
                    );
                }
            }
        }

        let text = self.via_direct(ctx, pool, messages, params).await?;
        debug!(
            purpose = %purpose,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Direct call succeeded"
        );
        Ok(text)
    }

    async fn via_proxy(
        &self,
        proxy: &ProxyTransport,
        messages: &[ChatMessage],
        params: &GenerationParams,
    ) -> ProxyOutcome {
        let mut attempt = 1;
        loop {
            let failure = match proxy.send(messages, params).await {
                Ok(text) => return ProxyOutcome::Done(text),
                Err(failure) => failure,
            };

            if failure.class == ErrorClass::MalformedResponse {
                return ProxyOutcome::Terminal(failure.into());
            }
            if !matches!(failure.status, Some(429) | Some(503)) {
                return ProxyOutcome::Fallback {
                    failure,
                    attempts: attempt,
                };
            }
            if attempt >= self.policy.proxy_attempts {
                warn!(attempts = attempt, "Proxy retry budget exhausted");
                return ProxyOutcome::Fallback {
                    failure,
                    attempts: attempt,
                };
            }

            let delay = self.policy.proxy_delay(attempt);
            warn!(
                attempt,
                status = ?failure.status,
                delay_ms = delay.as_millis() as u64,
                "Proxy busy, backing off"
            );
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }

    async fn via_direct(
        &self,
        ctx: &mut SessionContext,
        pool: &CredentialPool,
        messages: &[ChatMessage],
        params: &GenerationParams,
    ) -> Result<String, DispatchError> {
        let request = GenerateContentRequest::new(translate(messages)?, params);
        let direct = &self.direct;
        let body = &request;
        let purpose = pool.purpose();

        let mut sweep: u32 = 1;
        loop {
            let err = match pool
                .rotate(ctx, move |key| async move { direct.generate(&key, body).await })
                .await
            {
                Ok(text) => return Ok(text),
                Err(err) => err,
            };

            let Some(backoff) = err.backoff_failure() else {
                error!(purpose = %purpose, sweep, "Direct call failed");
                return Err(err.into());
            };

            let budget = match backoff.class {
                ErrorClass::Network => self.policy.network_attempts,
                _ => self.policy.quota_attempts,
            };
            if sweep >= budget {
                let message = backoff.message.clone();
                error!(
                    purpose = %purpose,
                    attempts = sweep,
                    class = ?backoff.class,
                    error = %message,
                    "Retry budget exhausted"
                );
                return Err(match backoff.class {
                    ErrorClass::Quota => DispatchError::QuotaExceeded {
                        attempts: sweep,
                        message,
                    },
                    _ => DispatchError::Exhausted {
                        attempts: sweep,
                        message,
                    },
                });
            }

            let delay = self.policy.direct_delay(sweep, backoff.retry_after);
            warn!(
                purpose = %purpose,
                sweep,
                class = ?backoff.class,
                hinted = backoff.retry_after.is_some(),
                delay_ms = delay.as_millis() as u64,
                "All credentials failed, backing off"
            );
            tokio::time::sleep(delay).await;
            sweep += 1;
        }
    }
}

/// Error for a proxy failure when no direct credential can take over.
fn proxy_failure_without_keys(purpose: CallPurpose, failure: Failure, attempts: u32) -> DispatchError {
    match failure.status {
        Some(429) => DispatchError::QuotaExceeded {
            attempts,
            message: failure.message,
        },
        Some(503) => DispatchError::Exhausted {
            attempts,
            message: failure.message,
        },
        Some(404) | None => DispatchError::NotConfigured(purpose),
        Some(_) => failure.into(),
    }
}

#[async_trait]
impl ChatDispatch for Dispatcher {
    async fn complete(
        &self,
        ctx: &mut SessionContext,
        purpose: CallPurpose,
        messages: &[ChatMessage],
        params: &GenerationParams,
    ) -> Result<String, DispatchError> {
        self.dispatch(ctx, purpose, messages, params).await
    }
}

// ─────────────────────────────────────────────
// Builder (convenience)
// ─────────────────────────────────────────────

/// Build a [`Dispatcher`] from the full configuration.
pub fn create_dispatcher(config: &Config) -> Result<Dispatcher, DispatchError> {
    let dispatcher = Dispatcher::new(&config.provider, &config.retry)?;
    info!(
        endpoint = %dispatcher.endpoint(),
        proxy = dispatcher.proxy_url().unwrap_or("none"),
        chat_keys = dispatcher.chat_keys.len(),
        document_keys = dispatcher.document_keys.len(),
        "Dispatcher ready"
    );
    Ok(dispatcher)
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const PROXY_PATH: &str = "/api/gemini";
    const DIRECT_PATH: &str = "/v1beta/models/gemini-2.0-flash:generateContent";

    fn fast_retry() -> RetryConfig {
        RetryConfig {
            proxy_base_delay_ms: 5,
            direct_base_delay_ms: 5,
            hint_margin_ms: 5,
            ..RetryConfig::default()
        }
    }

    fn provider(server: &MockServer, proxy: bool, keys: &[&str]) -> ProviderConfig {
        ProviderConfig {
            endpoint: format!("{}/v1beta/models/gemini-2.0-flash", server.uri()),
            api_keys: keys.iter().map(|k| k.to_string()).collect(),
            proxy_url: proxy.then(|| format!("{}{PROXY_PATH}", server.uri())),
            ..ProviderConfig::default()
        }
    }

    fn gemini_ok(text: &str) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{"content": {"role": "model", "parts": [{"text": text}]}}]
        }))
    }

    fn gemini_error(status: u16, message: &str, code: &str) -> ResponseTemplate {
        ResponseTemplate::new(status).set_body_json(json!({
            "error": {"code": status, "message": message, "status": code}
        }))
    }

    fn hello() -> Vec<ChatMessage> {
        vec![ChatMessage::system("Be brief."), ChatMessage::user("hello")]
    }

    #[tokio::test]
    async fn test_empty_messages_rejected() {
        let server = MockServer::start().await;
        let dispatcher = Dispatcher::new(&provider(&server, true, &["k"]), &fast_retry()).unwrap();
        let err = dispatcher
            .dispatch(
                &mut SessionContext::new(),
                CallPurpose::Chat,
                &[],
                &GenerationParams::default(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DispatchError::EmptyMessages));
    }

    #[tokio::test]
    async fn test_not_configured_without_proxy_or_keys() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(gemini_ok("never"))
            .expect(0)
            .mount(&server)
            .await;

        let dispatcher = Dispatcher::new(&provider(&server, false, &[]), &fast_retry()).unwrap();
        let err = dispatcher
            .dispatch(
                &mut SessionContext::new(),
                CallPurpose::Chat,
                &hello(),
                &GenerationParams::default(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DispatchError::NotConfigured(CallPurpose::Chat)));
    }

    #[tokio::test]
    async fn test_proxy_503_twice_then_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(PROXY_PATH))
            .respond_with(ResponseTemplate::new(503).set_body_json(json!({"error": "busy"})))
            .up_to_n_times(2)
            .expect(2)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path(PROXY_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"text": "hello"})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path(DIRECT_PATH))
            .respond_with(gemini_ok("direct"))
            .expect(0)
            .mount(&server)
            .await;

        let dispatcher = Dispatcher::new(&provider(&server, true, &["k1"]), &fast_retry()).unwrap();
        let text = dispatcher
            .dispatch(
                &mut SessionContext::new(),
                CallPurpose::Chat,
                &hello(),
                &GenerationParams::default(),
            )
            .await
            .unwrap();
        assert_eq!(text, "hello");
    }

    #[tokio::test]
    async fn test_proxy_404_falls_back_immediately() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(PROXY_PATH))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path(DIRECT_PATH))
            .and(header("x-goog-api-key", "k1"))
            .respond_with(gemini_ok("from direct"))
            .expect(1)
            .mount(&server)
            .await;

        let dispatcher = Dispatcher::new(&provider(&server, true, &["k1"]), &fast_retry()).unwrap();
        let text = dispatcher
            .dispatch(
                &mut SessionContext::new(),
                CallPurpose::Chat,
                &hello(),
                &GenerationParams::default(),
            )
            .await
            .unwrap();
        assert_eq!(text, "from direct");
    }

    #[tokio::test]
    async fn test_proxy_200_without_text_is_terminal() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(PROXY_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path(DIRECT_PATH))
            .respond_with(gemini_ok("unused"))
            .expect(0)
            .mount(&server)
            .await;

        let dispatcher = Dispatcher::new(&provider(&server, true, &["k1"]), &fast_retry()).unwrap();
        let err = dispatcher
            .dispatch(
                &mut SessionContext::new(),
                CallPurpose::Chat,
                &hello(),
                &GenerationParams::default(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DispatchError::ResponseShape(_)));
    }

    #[tokio::test]
    async fn test_proxy_budget_exhausted_falls_back() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(PROXY_PATH))
            .respond_with(ResponseTemplate::new(429).set_body_json(json!({"error": "slow down"})))
            .expect(3)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path(DIRECT_PATH))
            .respond_with(gemini_ok("rescued"))
            .expect(1)
            .mount(&server)
            .await;

        let dispatcher = Dispatcher::new(&provider(&server, true, &["k1"]), &fast_retry()).unwrap();
        let text = dispatcher
            .dispatch(
                &mut SessionContext::new(),
                CallPurpose::Chat,
                &hello(),
                &GenerationParams::default(),
            )
            .await
            .unwrap();
        assert_eq!(text, "rescued");
    }

    #[tokio::test]
    async fn test_proxy_missing_and_no_keys_is_not_configured() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(PROXY_PATH))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let dispatcher = Dispatcher::new(&provider(&server, true, &[]), &fast_retry()).unwrap();
        let err = dispatcher
            .dispatch(
                &mut SessionContext::new(),
                CallPurpose::Document,
                &hello(),
                &GenerationParams::default(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DispatchError::NotConfigured(CallPurpose::Document)));
    }

    #[tokio::test]
    async fn test_direct_rotates_past_exhausted_key() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(DIRECT_PATH))
            .and(header("x-goog-api-key", "k1"))
            .respond_with(gemini_error(429, "Quota exceeded", "RESOURCE_EXHAUSTED"))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path(DIRECT_PATH))
            .and(header("x-goog-api-key", "k2"))
            .respond_with(gemini_ok("second key"))
            .expect(1)
            .mount(&server)
            .await;

        let dispatcher =
            Dispatcher::new(&provider(&server, false, &["k1", "k2"]), &fast_retry()).unwrap();
        let mut ctx = SessionContext::new();
        let text = dispatcher
            .dispatch(&mut ctx, CallPurpose::Chat, &hello(), &GenerationParams::default())
            .await
            .unwrap();

        assert_eq!(text, "second key");
        assert_eq!(ctx.sticky_index(CallPurpose::Chat), Some(1));
        assert_eq!(dispatcher.ledger().chat_next, 1);
    }

    #[tokio::test]
    async fn test_direct_quota_exhausted_after_budget() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(DIRECT_PATH))
            .respond_with(gemini_error(429, "Quota exceeded", "RESOURCE_EXHAUSTED"))
            .expect(10)
            .mount(&server)
            .await;

        let dispatcher =
            Dispatcher::new(&provider(&server, false, &["k1", "k2"]), &fast_retry()).unwrap();
        let err = dispatcher
            .dispatch(
                &mut SessionContext::new(),
                CallPurpose::Chat,
                &hello(),
                &GenerationParams::default(),
            )
            .await
            .unwrap_err();

        assert!(err.is_quota());
        assert!(matches!(err, DispatchError::QuotaExceeded { attempts: 5, .. }));
    }

    #[tokio::test]
    async fn test_direct_unavailable_exhausted() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(DIRECT_PATH))
            .respond_with(gemini_error(503, "The model is overloaded.", "UNAVAILABLE"))
            .mount(&server)
            .await;

        let retry = RetryConfig {
            quota_attempts: 2,
            ..fast_retry()
        };
        let dispatcher = Dispatcher::new(&provider(&server, false, &["k1"]), &retry).unwrap();
        let err = dispatcher
            .dispatch(
                &mut SessionContext::new(),
                CallPurpose::Chat,
                &hello(),
                &GenerationParams::default(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DispatchError::Exhausted { attempts: 2, .. }));
        assert!(!err.is_quota());
    }

    #[tokio::test]
    async fn test_direct_terminal_error_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(DIRECT_PATH))
            .respond_with(gemini_error(
                400,
                "Invalid JSON payload received.",
                "INVALID_ARGUMENT",
            ))
            .expect(1)
            .mount(&server)
            .await;

        let dispatcher =
            Dispatcher::new(&provider(&server, false, &["k1", "k2", "k3"]), &fast_retry()).unwrap();
        let err = dispatcher
            .dispatch(
                &mut SessionContext::new(),
                CallPurpose::Chat,
                &hello(),
                &GenerationParams::default(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DispatchError::Provider { status: Some(400), .. }));
    }

    #[tokio::test]
    async fn test_direct_auth_on_every_key_surfaces_provider_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(DIRECT_PATH))
            .respond_with(gemini_error(403, "Permission denied", "PERMISSION_DENIED"))
            .expect(2)
            .mount(&server)
            .await;

        let dispatcher =
            Dispatcher::new(&provider(&server, false, &["k1", "k2"]), &fast_retry()).unwrap();
        let err = dispatcher
            .dispatch(
                &mut SessionContext::new(),
                CallPurpose::Chat,
                &hello(),
                &GenerationParams::default(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DispatchError::Provider { status: Some(403), .. }));
    }

    #[tokio::test]
    async fn test_direct_network_failure_budget() {
        // Nothing listens on port 1.
        let config = ProviderConfig {
            endpoint: "http://127.0.0.1:1/v1beta/models/gemini-2.0-flash".to_string(),
            api_keys: vec!["k1".to_string()],
            ..ProviderConfig::default()
        };
        let dispatcher = Dispatcher::new(&config, &fast_retry()).unwrap();
        let err = dispatcher
            .dispatch(
                &mut SessionContext::new(),
                CallPurpose::Chat,
                &hello(),
                &GenerationParams::default(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DispatchError::Exhausted { attempts: 2, .. }));
    }

    #[tokio::test]
    async fn test_document_pool_is_separate() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(DIRECT_PATH))
            .and(header("x-goog-api-key", "doc-key"))
            .respond_with(gemini_ok("{\"name\":\"Ada\"}"))
            .expect(1)
            .mount(&server)
            .await;

        let mut config = provider(&server, false, &["chat-key"]);
        config.document_api_keys = vec!["doc-key".to_string()];
        let dispatcher = Dispatcher::new(&config, &fast_retry()).unwrap();

        let mut ctx = SessionContext::new();
        let text = dispatcher
            .dispatch(&mut ctx, CallPurpose::Document, &hello(), &GenerationParams::default())
            .await
            .unwrap();
        assert_eq!(text, "{\"name\":\"Ada\"}");
        assert_eq!(ctx.sticky_index(CallPurpose::Document), Some(0));
        assert_eq!(ctx.sticky_index(CallPurpose::Chat), None);
    }

    #[tokio::test]
    async fn test_direct_429_waits_for_hint() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(DIRECT_PATH))
            .respond_with(gemini_error(
                429,
                "Resource has been exhausted. Please retry in 3.5s.",
                "RESOURCE_EXHAUSTED",
            ))
            .up_to_n_times(1)
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path(DIRECT_PATH))
            .respond_with(gemini_ok("after wait"))
            .expect(1)
            .mount(&server)
            .await;

        // Default margin (1s) on top of the 3.5s hint.
        let dispatcher =
            Dispatcher::new(&provider(&server, false, &["k1"]), &RetryConfig::default()).unwrap();
        let started = Instant::now();
        let text = dispatcher
            .dispatch(
                &mut SessionContext::new(),
                CallPurpose::Chat,
                &hello(),
                &GenerationParams::default(),
            )
            .await
            .unwrap();
        let elapsed = started.elapsed();

        assert_eq!(text, "after wait");
        assert!(elapsed >= Duration::from_millis(4500), "{elapsed:?}");
        assert!(elapsed < Duration::from_secs(8), "{elapsed:?}");
    }

    #[tokio::test]
    async fn test_direct_429_long_hint_is_capped() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(DIRECT_PATH))
            .respond_with(gemini_error(
                429,
                "Quota exceeded. Please retry in 86400s.",
                "RESOURCE_EXHAUSTED",
            ))
            .up_to_n_times(1)
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path(DIRECT_PATH))
            .respond_with(gemini_ok("capped"))
            .expect(1)
            .mount(&server)
            .await;

        let retry = RetryConfig {
            max_hint_ms: 50,
            ..fast_retry()
        };
        let dispatcher = Dispatcher::new(&provider(&server, false, &["k1"]), &retry).unwrap();
        let started = Instant::now();
        let text = dispatcher
            .dispatch(
                &mut SessionContext::new(),
                CallPurpose::Chat,
                &hello(),
                &GenerationParams::default(),
            )
            .await
            .unwrap();

        assert_eq!(text, "capped");
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn test_blank_proxy_url_ignored() {
        let config = ProviderConfig {
            proxy_url: Some("  ".to_string()),
            api_keys: vec!["k".to_string()],
            ..ProviderConfig::default()
        };
        let dispatcher = Dispatcher::new(&config, &RetryConfig::default()).unwrap();
        assert!(dispatcher.proxy_url().is_none());
        assert!(dispatcher.endpoint().ends_with(":generateContent"));
    }

    #[test]
    fn test_ledger_round_trip() {
        let config = ProviderConfig {
            api_keys: vec!["a".into(), "b".into()],
            document_api_keys: vec!["d".into()],
            ..ProviderConfig::default()
        };
        let ledger = RotationLedger {
            chat_next: 5,
            document_next: 2,
        };
        let dispatcher = Dispatcher::new(&config, &RetryConfig::default())
            .unwrap()
            .with_ledger(&ledger);
        assert_eq!(dispatcher.ledger(), ledger);
    }
}
