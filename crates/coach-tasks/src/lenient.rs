//! Forgiving field deserializers for model-produced JSON.
//!
//! Models return scores as `85`, `"85"`, `"85%"` or `"8/10"`, and lists as
//! either arrays or a single string. These helpers accept all of those and
//! degrade to defaults instead of failing the whole parse.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Score used when the model omits one or sends garbage.
pub const DEFAULT_SCORE: u32 = 50;

/// Best-effort number extraction.
pub(crate) fn number(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_numeric(s),
        _ => None,
    };
    n.filter(|n| n.is_finite())
}

fn parse_numeric(s: &str) -> Option<f64> {
    let s = s.trim().trim_end_matches('%').trim();
    if let Some((num, den)) = s.split_once('/') {
        let num = leading_number(num)?;
        let den = leading_number(den)?;
        return (den > 0.0).then(|| num / den * 100.0);
    }
    leading_number(s)
}

fn leading_number(s: &str) -> Option<f64> {
    let s = s.trim();
    let end = s
        .char_indices()
        .find(|&(i, c)| !(c.is_ascii_digit() || c == '.' || (i == 0 && c == '-')))
        .map(|(i, _)| i)
        .unwrap_or(s.len());
    s[..end].parse().ok()
}

/// Clamp to `0..=100` and round.
pub(crate) fn to_score(n: f64) -> u32 {
    n.clamp(0.0, 100.0).round() as u32
}

pub(crate) fn opt_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(number(&Value::deserialize(deserializer)?))
}

pub(crate) fn opt_score<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(number(&Value::deserialize(deserializer)?).map(to_score))
}

pub(crate) fn score<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(opt_score(deserializer)?.unwrap_or(DEFAULT_SCORE))
}

pub(crate) fn string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => String::new(),
        Value::String(s) => s.trim().to_string(),
        other => other.to_string(),
    })
}

pub(crate) fn string_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let items = match Value::deserialize(deserializer)? {
        Value::Array(items) => items,
        Value::Null => Vec::new(),
        single => vec![single],
    };
    Ok(items
        .into_iter()
        .filter_map(|item| match item {
            Value::String(s) => Some(s.trim().to_string()),
            Value::Null => None,
            other => Some(other.to_string()),
        })
        .filter(|s| !s.is_empty())
        .collect())
}
