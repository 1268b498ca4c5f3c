//! Config loader — reads `~/.coach/config.json` and merges env vars.
//!
//! # Loading precedence
//! 1. Defaults (from `Config::default()`)
//! 2. JSON file at `~/.coach/config.json`
//! 3. Environment variables `COACH_<SECTION>__<FIELD>` (override JSON)

use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::schema::Config;

/// Env var holding the primary chat credential.
const API_KEY_VAR: &str = "COACH_PROVIDER__API_KEY";
/// Env var holding the primary document credential.
const DOCUMENT_API_KEY_VAR: &str = "COACH_PROVIDER__DOCUMENT_API_KEY";

/// Default config file path.
pub fn get_config_path() -> PathBuf {
    crate::utils::get_data_path().join("config.json")
}

/// Load configuration from the default path + env vars.
///
/// Falls back to `Config::default()` if the file doesn't exist or can't be parsed.
pub fn load_config(path: Option<&Path>) -> Config {
    let config_path = path.map(PathBuf::from).unwrap_or_else(get_config_path);
    let vars: Vec<(String, String)> = std::env::vars().collect();
    apply_env_overrides(load_config_from_path(&config_path), &vars)
}

/// Load config from a specific file path, without env overrides.
fn load_config_from_path(path: &Path) -> Config {
    if !path.exists() {
        info!("No config file found at {}, using defaults", path.display());
        return Config::default();
    }

    debug!("Loading config from {}", path.display());

    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            warn!("Failed to read config file {}: {}", path.display(), e);
            return Config::default();
        }
    };

    match serde_json::from_str(&content) {
        Ok(c) => c,
        Err(e) => {
            warn!("Failed to parse config JSON: {}", e);
            Config::default()
        }
    }
}

/// Save configuration to disk (pretty-printed JSON with camelCase keys).
pub fn save_config(config: &Config, path: Option<&Path>) -> std::io::Result<()> {
    let config_path = path.map(PathBuf::from).unwrap_or_else(get_config_path);

    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let json = serde_json::to_string_pretty(config).map_err(std::io::Error::other)?;

    std::fs::write(&config_path, json)?;
    debug!("Config saved to {}", config_path.display());
    Ok(())
}

/// Apply environment variable overrides on top of a loaded config.
///
/// Env var format: `COACH_<SECTION>__<FIELD>` (double underscore as delimiter).
///
/// Supported overrides:
/// - `COACH_PROVIDER__API_KEY` → first chat credential
/// - `COACH_PROVIDER__API_KEY_<n>` → additional chat credentials, in numeric order
/// - `COACH_PROVIDER__DOCUMENT_API_KEY[_<n>]` → document credentials, same rules
/// - `COACH_PROVIDER__ENDPOINT` → `provider.endpoint`
/// - `COACH_PROVIDER__PROXY_URL` → `provider.proxy_url` (empty string clears it)
/// - `COACH_PROVIDER__TIMEOUT_SECS` → `provider.timeout_secs`
/// - `COACH_GENERATION__MAX_TOKENS` → `generation.max_tokens`
/// - `COACH_GENERATION__TEMPERATURE` → `generation.temperature`
/// - `COACH_RETRY__QUOTA_ATTEMPTS` → `retry.quota_attempts`
/// - `COACH_RETRY__MAX_HINT_MS` → `retry.max_hint_ms`
///
/// Env credentials come first in rotation order, followed by those from the
/// file; duplicates keep their first position.
fn apply_env_overrides(mut config: Config, vars: &[(String, String)]) -> Config {
    let lookup = |name: &str| {
        vars.iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.clone())
    };

    let chat_keys = numbered_keys(vars, API_KEY_VAR);
    config.provider.api_keys = merge_keys(chat_keys, &config.provider.api_keys);

    let document_keys = numbered_keys(vars, DOCUMENT_API_KEY_VAR);
    config.provider.document_api_keys =
        merge_keys(document_keys, &config.provider.document_api_keys);

    if let Some(val) = lookup("COACH_PROVIDER__ENDPOINT") {
        config.provider.endpoint = val;
    }
    if let Some(val) = lookup("COACH_PROVIDER__PROXY_URL") {
        let val = val.trim().to_string();
        config.provider.proxy_url = if val.is_empty() { None } else { Some(val) };
    }
    if let Some(val) = lookup("COACH_PROVIDER__TIMEOUT_SECS") {
        if let Ok(n) = val.parse::<u64>() {
            config.provider.timeout_secs = n;
        }
    }

    if let Some(val) = lookup("COACH_GENERATION__MAX_TOKENS") {
        if let Ok(n) = val.parse::<u32>() {
            config.generation.max_tokens = n;
        }
    }
    if let Some(val) = lookup("COACH_GENERATION__TEMPERATURE") {
        if let Ok(t) = val.parse::<f64>() {
            config.generation.temperature = t;
        }
    }

    if let Some(val) = lookup("COACH_RETRY__QUOTA_ATTEMPTS") {
        if let Ok(n) = val.parse::<u32>() {
            config.retry.quota_attempts = n;
        }
    }
    if let Some(val) = lookup("COACH_RETRY__MAX_HINT_MS") {
        if let Ok(n) = val.parse::<u64>() {
            config.retry.max_hint_ms = n;
        }
    }

    config
}

/// Collect `<base>` and `<base>_<n>` values: the bare name first, then numbered
/// suffixes in ascending numeric order. Blank values are skipped.
fn numbered_keys(vars: &[(String, String)], base: &str) -> Vec<String> {
    let mut numbered: Vec<(u32, String)> = Vec::new();
    let mut primary = None;
    let prefix = format!("{base}_");

    for (name, value) in vars {
        let value = value.trim();
        if value.is_empty() {
            continue;
        }
        if name == base {
            primary = Some(value.to_string());
        } else if let Some(suffix) = name.strip_prefix(&prefix) {
            if let Ok(n) = suffix.parse::<u32>() {
                numbered.push((n, value.to_string()));
            }
        }
    }

    numbered.sort_by_key(|(n, _)| *n);
    primary
        .into_iter()
        .chain(numbered.into_iter().map(|(_, v)| v))
        .collect()
}

/// `first` followed by `rest`, trimmed, blank and duplicate entries removed.
fn merge_keys(first: Vec<String>, rest: &[String]) -> Vec<String> {
    let mut merged: Vec<String> = Vec::with_capacity(first.len() + rest.len());
    for key in first.into_iter().chain(rest.iter().cloned()) {
        let key = key.trim().to_string();
        if !key.is_empty() && !merged.contains(&key) {
            merged.push(key);
        }
    }
    merged
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
