//! Failure classification — decides whether a failed call may move on to the
//! next credential, back off and retry, or must stop.
//!
//! Lookup order: HTTP status table, then the provider's structured status
//! code, then case-insensitive substring matching on the message for
//! providers (and proxies) that expose neither.

/// What went wrong, coarsely.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorClass {
    /// Quota or rate limit (HTTP 429, `RESOURCE_EXHAUSTED`).
    Quota,
    /// Provider temporarily unavailable (HTTP 503, `UNAVAILABLE`).
    Unavailable,
    /// Credential rejected (HTTP 401/403, `PERMISSION_DENIED`).
    Auth,
    /// The request never got an HTTP answer.
    Network,
    /// 200 OK but the body lacks the expected text field.
    MalformedResponse,
    /// Anything else, e.g. a malformed request.
    Terminal,
}

/// Coarse retry tag for a class.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Disposition {
    Retryable,
    Terminal,
}

impl ErrorClass {
    pub fn disposition(self) -> Disposition {
        match self {
            ErrorClass::Quota | ErrorClass::Unavailable | ErrorClass::Auth | ErrorClass::Network => {
                Disposition::Retryable
            }
            ErrorClass::MalformedResponse | ErrorClass::Terminal => Disposition::Terminal,
        }
    }

    /// Whether rotation should advance to the next credential.
    pub fn is_failover_eligible(self) -> bool {
        self.disposition() == Disposition::Retryable
    }

    /// Classes worth waiting for and sweeping the whole pool again, most
    /// telling first. Auth is absent: another sweep would hit the same
    /// rejected keys.
    pub const BACKOFF_PRIORITY: [ErrorClass; 3] =
        [ErrorClass::Quota, ErrorClass::Unavailable, ErrorClass::Network];

    /// Whether waiting and trying the whole pool again can help.
    pub fn is_backoff_eligible(self) -> bool {
        Self::BACKOFF_PRIORITY.contains(&self)
    }
}

/// HTTP status → class.
pub const STATUS_TABLE: &[(u16, ErrorClass)] = &[
    (429, ErrorClass::Quota),
    (503, ErrorClass::Unavailable),
    (401, ErrorClass::Auth),
    (403, ErrorClass::Auth),
];

/// Provider `error.status` → class.
pub const PROVIDER_STATUS_TABLE: &[(&str, ErrorClass)] = &[
    ("RESOURCE_EXHAUSTED", ErrorClass::Quota),
    ("UNAVAILABLE", ErrorClass::Unavailable),
    ("PERMISSION_DENIED", ErrorClass::Auth),
    ("UNAUTHENTICATED", ErrorClass::Auth),
];

/// Lowercase message substring → class, checked in order.
pub const MESSAGE_PATTERNS: &[(&str, ErrorClass)] = &[
    ("quota", ErrorClass::Quota),
    ("rate limit", ErrorClass::Quota),
    ("rate-limit", ErrorClass::Quota),
    ("too many requests", ErrorClass::Quota),
    ("429", ErrorClass::Quota),
    ("unavailable", ErrorClass::Unavailable),
    ("overloaded", ErrorClass::Unavailable),
    ("503", ErrorClass::Unavailable),
    ("permission", ErrorClass::Auth),
    ("unauthorized", ErrorClass::Auth),
    ("api key not valid", ErrorClass::Auth),
    ("api_key_invalid", ErrorClass::Auth),
    ("network", ErrorClass::Network),
    ("connection", ErrorClass::Network),
    ("timed out", ErrorClass::Network),
];

/// Classify a failure from whatever the transport could observe.
pub fn classify(status: Option<u16>, provider_status: Option<&str>, message: &str) -> ErrorClass {
    if let Some(class) = status.and_then(classify_status) {
        return class;
    }
    if let Some(class) = provider_status.and_then(classify_provider_status) {
        return class;
    }
    classify_message(message)
}

pub fn classify_status(status: u16) -> Option<ErrorClass> {
    STATUS_TABLE
        .iter()
        .find(|(code, _)| *code == status)
        .map(|(_, class)| *class)
}

pub fn classify_provider_status(code: &str) -> Option<ErrorClass> {
    PROVIDER_STATUS_TABLE
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(code))
        .map(|(_, class)| *class)
}

/// Substring fallback. Unmatched messages are terminal.
pub fn classify_message(message: &str) -> ErrorClass {
    let lower = message.to_lowercase();
    MESSAGE_PATTERNS
        .iter()
        .find(|(pattern, _)| lower.contains(pattern))
        .map(|(_, class)| *class)
        .unwrap_or(ErrorClass::Terminal)
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
