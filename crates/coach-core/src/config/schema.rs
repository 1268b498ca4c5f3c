//! Configuration schema.
//!
//! Hierarchy: `Config` → `GenerationConfig`, `ProviderConfig`, `RetryConfig`.
//!
//! JSON on disk uses **camelCase** keys; Rust uses snake_case.
//! We use `#[serde(rename_all = "camelCase")]` to handle the conversion.

use serde::{Deserialize, Serialize};

/// Default Gemini endpoint (already carries the `:generateContent` action).
pub const DEFAULT_ENDPOINT: &str =
    "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.0-flash:generateContent";

/// Action suffix every direct endpoint must end with.
pub const GENERATE_CONTENT_SUFFIX: &str = ":generateContent";

// ─────────────────────────────────────────────
// Root Config
// ─────────────────────────────────────────────

/// Root configuration — loaded from `~/.coach/config.json` + env vars.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    pub generation: GenerationConfig,
    pub provider: ProviderConfig,
    pub retry: RetryConfig,
}

// ─────────────────────────────────────────────
// Generation defaults
// ─────────────────────────────────────────────

/// Default generation parameters for calls that don't override them.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GenerationConfig {
    /// Maximum output tokens for chat-class calls.
    pub max_tokens: u32,
    /// Sampling temperature (0.0 – 1.0).
    pub temperature: f64,
    /// Maximum output tokens for document analysis.
    pub document_max_tokens: u32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            max_tokens: 2048,
            temperature: 0.7,
            document_max_tokens: 4096,
        }
    }
}

// ─────────────────────────────────────────────
// Provider
// ─────────────────────────────────────────────

/// Where and how to reach the model.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProviderConfig {
    /// Direct `generateContent` endpoint.
    pub endpoint: String,
    /// Credentials for chat-class calls, in rotation order.
    pub api_keys: Vec<String>,
    /// Credentials for document analysis, in rotation order.
    pub document_api_keys: Vec<String>,
    /// Server-side proxy; when set it is tried before direct calls.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proxy_url: Option<String>,
    /// Per-request HTTP timeout.
    pub timeout_secs: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            api_keys: Vec::new(),
            document_api_keys: Vec::new(),
            proxy_url: None,
            timeout_secs: 120,
        }
    }
}

impl ProviderConfig {
    /// Whether any chat credential is configured.
    pub fn is_configured(&self) -> bool {
        self.api_keys.iter().any(|k| !k.trim().is_empty())
    }

    /// The endpoint with trailing slashes trimmed and `:generateContent` appended
    /// when missing.
    pub fn normalized_endpoint(&self) -> String {
        normalize_endpoint(&self.endpoint)
    }
}

/// Normalize a direct endpoint so it always ends with the generate-content action.
///
/// An empty value falls back to [`DEFAULT_ENDPOINT`].
pub fn normalize_endpoint(endpoint: &str) -> String {
    let trimmed = endpoint.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return DEFAULT_ENDPOINT.to_string();
    }
    if trimmed.ends_with(GENERATE_CONTENT_SUFFIX) {
        trimmed.to_string()
    } else {
        format!("{trimmed}{GENERATE_CONTENT_SUFFIX}")
    }
}

// ─────────────────────────────────────────────
// Retry
// ─────────────────────────────────────────────

/// Retry budgets and backoff bases for both transports.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct RetryConfig {
    /// Attempts against the proxy for 429/503 responses.
    pub proxy_attempts: u32,
    /// Proxy backoff: `proxyBaseDelayMs * attempt`.
    pub proxy_base_delay_ms: u64,
    /// Credential sweeps for quota/unavailable failures on the direct transport.
    pub quota_attempts: u32,
    /// Credential sweeps for network failures on the direct transport.
    pub network_attempts: u32,
    /// Direct backoff when the provider gives no hint: `directBaseDelayMs * attempt`.
    pub direct_base_delay_ms: u64,
    /// Added on top of a provider-supplied retry hint.
    pub hint_margin_ms: u64,
    /// Longest provider hint honored; longer hints are clamped to this.
    pub max_hint_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            proxy_attempts: 3,
            proxy_base_delay_ms: 2000,
            quota_attempts: 5,
            network_attempts: 2,
            direct_base_delay_ms: 2000,
            hint_margin_ms: 1000,
            max_hint_ms: 60_000,
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
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.generation.max_tokens, 2048);
        assert_eq!(config.generation.temperature, 0.7);
        assert_eq!(config.provider.endpoint, DEFAULT_ENDPOINT);
        assert!(config.provider.proxy_url.is_none());
        assert_eq!(config.retry.proxy_attempts, 3);
        assert_eq!(config.retry.quota_attempts, 5);
        assert_eq!(config.retry.network_attempts, 2);
    }

    #[test]
    fn test_config_from_json_camel_case() {
        let json = serde_json::json!({
            "generation": { "maxTokens": 1024, "temperature": 0.2 },
            "provider": {
                "apiKeys": ["k1", "k2"],
                "documentApiKeys": ["d1"],
                "proxyUrl": "http://localhost:3000/api/gemini"
            },
            "retry": { "proxyBaseDelayMs": 10 }
        });

        let config: Config = serde_json::from_value(json).unwrap();
        assert_eq!(config.generation.max_tokens, 1024);
        assert_eq!(config.generation.document_max_tokens, 4096);
        assert_eq!(config.provider.api_keys, vec!["k1", "k2"]);
        assert_eq!(config.provider.document_api_keys, vec!["d1"]);
        assert_eq!(
            config.provider.proxy_url.as_deref(),
            Some("http://localhost:3000/api/gemini")
        );
        assert_eq!(config.retry.proxy_base_delay_ms, 10);
        // Defaults preserved for missing fields
        assert_eq!(config.retry.proxy_attempts, 3);
    }

    #[test]
    fn test_config_json_uses_camel_case() {
        let json = serde_json::to_value(Config::default()).unwrap();
        assert!(json["generation"].get("maxTokens").is_some());
        assert!(json["provider"].get("apiKeys").is_some());
        assert!(json["retry"].get("hintMarginMs").is_some());
        assert!(json["generation"].get("max_tokens").is_none());
        // Unset proxy is omitted
        assert!(json["provider"].get("proxyUrl").is_none());
    }

    #[test]
    fn test_is_configured_ignores_blank_keys() {
        let mut provider = ProviderConfig::default();
        assert!(!provider.is_configured());
        provider.api_keys = vec!["  ".to_string()];
        assert!(!provider.is_configured());
        provider.api_keys.push("AIza-real".to_string());
        assert!(provider.is_configured());
    }

    #[test]
    fn test_normalize_endpoint_appends_action() {
        assert_eq!(
            normalize_endpoint("https://example.com/v1beta/models/gemini-1.5-flash"),
            "https://example.com/v1beta/models/gemini-1.5-flash:generateContent"
        );
    }

    #[test]
    fn test_normalize_endpoint_keeps_existing_action() {
        let url = "https://example.com/v1beta/models/gemini-pro:generateContent";
        assert_eq!(normalize_endpoint(url), url);
        assert_eq!(normalize_endpoint(&format!("{url}/")), url);
    }

    #[test]
    fn test_normalize_empty_endpoint_uses_default() {
        assert_eq!(normalize_endpoint("   "), DEFAULT_ENDPOINT);
    }

    #[test]
    fn test_empty_json_gives_defaults() {
        let config: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(config.provider.timeout_secs, 120);
        assert_eq!(config.retry, RetryConfig::default());
    }
}
