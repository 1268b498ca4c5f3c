//! Retry budgets, backoff formulas, and provider retry-hint parsing.

use std::time::Duration;

use coach_core::config::RetryConfig;
use regex::Regex;
use reqwest::header::{HeaderMap, RETRY_AFTER};

/// Retry budgets for one dispatcher. Built from [`RetryConfig`].
#[derive(Clone, Debug, PartialEq)]
pub struct RetryPolicy {
    /// Proxy attempts for 429/503 responses (first try included).
    pub proxy_attempts: u32,
    pub proxy_base_delay: Duration,
    /// Direct sweeps allowed for quota/unavailable failures.
    pub quota_attempts: u32,
    /// Direct sweeps allowed for network failures.
    pub network_attempts: u32,
    pub direct_base_delay: Duration,
    /// Added to a provider hint so we don't retry a hair too early.
    pub hint_margin: Duration,
    /// Upper bound on a provider hint, applied before the margin.
    pub max_hint: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&RetryConfig::default())
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            proxy_attempts: config.proxy_attempts.max(1),
            proxy_base_delay: Duration::from_millis(config.proxy_base_delay_ms),
            quota_attempts: config.quota_attempts.max(1),
            network_attempts: config.network_attempts.max(1),
            direct_base_delay: Duration::from_millis(config.direct_base_delay_ms),
            hint_margin: Duration::from_millis(config.hint_margin_ms),
            max_hint: Duration::from_millis(config.max_hint_ms),
        }
    }
}

impl RetryPolicy {
    /// Wait before proxy attempt `attempt + 1`, where `attempt` is 1-based.
    pub fn proxy_delay(&self, attempt: u32) -> Duration {
        self.proxy_base_delay.saturating_mul(attempt)
    }

    /// Wait after direct sweep `attempt` failed: the provider hint (capped at
    /// `max_hint`) plus margin when present, else `direct_base_delay * attempt`.
    pub fn direct_delay(&self, attempt: u32, hint: Option<Duration>) -> Duration {
        match hint {
            Some(hint) => hint.min(self.max_hint).saturating_add(self.hint_margin),
            None => self.direct_base_delay.saturating_mul(attempt),
        }
    }
}

/// Extract a provider-supplied retry delay from an error body.
///
/// Recognizes prose like `"Please retry in 3.5s."` / `"retry in 250ms"` and the
/// structured `"retryDelay": "3s"` field of Google's `RetryInfo` detail.
pub fn parse_retry_hint(body: &str) -> Option<Duration> {
    let prose = Regex::new(
        r"(?i)retry\s+in\s+([0-9]+(?:\.[0-9]+)?)\s*(ms|milliseconds?|s|secs?|seconds?)?\b",
    )
    .ok()?;
    if let Some(caps) = prose.captures(body) {
        let value: f64 = caps.get(1)?.as_str().parse().ok()?;
        let millis = matches!(
            caps.get(2).map(|m| m.as_str().to_lowercase()),
            Some(ref unit) if unit.starts_with("m")
        );
        let secs = if millis { value / 1000.0 } else { value };
        return Duration::try_from_secs_f64(secs).ok();
    }

    let structured = Regex::new(r#""retryDelay"\s*:\s*"([0-9]+(?:\.[0-9]+)?)s""#).ok()?;
    let caps = structured.captures(body)?;
    let secs: f64 = caps.get(1)?.as_str().parse().ok()?;
    Duration::try_from_secs_f64(secs).ok()
}

/// Parse a `Retry-After` header given in whole seconds.
pub fn parse_retry_after_header(value: &str) -> Option<Duration> {
    value.trim().parse::<u64>().ok().map(Duration::from_secs)
}

/// `Retry-After` from a response's headers, if present and numeric.
pub fn retry_after_from_headers(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(parse_retry_after_header)
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
