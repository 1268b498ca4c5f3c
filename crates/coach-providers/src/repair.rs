//! Best-effort repair of JSON objects returned by the model.
//!
//! Model output that should be a JSON object often arrives wrapped in
//! markdown fences, followed by prose, or cut off mid-value when the token
//! budget runs out. [`repair_json`] makes it syntactically valid where it can;
//! it never looks at field names, so callers still validate the schema.

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use coach_core::utils::truncate_string;

use crate::error::DispatchError;

const FENCE: &str = "```";

/// Remove a leading ```` ```lang ```` marker and a trailing ```` ``` ````.
///
/// Backticks inside the payload are left alone.
pub fn strip_fences(text: &str) -> &str {
    let mut s = text.trim();
    if let Some(rest) = s.strip_prefix(FENCE) {
        let tag_end = rest
            .find(|c: char| c == '\n' || c == '{' || c == '[')
            .unwrap_or(rest.len());
        s = &rest[tag_end..];
    }
    if let Some(rest) = s.trim_end().strip_suffix(FENCE) {
        s = rest;
    }
    s.trim()
}

/// Repair model output into the most complete JSON object it contains.
///
/// Starts at the first `{` and stops once that object closes. Raw line
/// breaks inside strings are escaped. At end of input:
///
/// - an unfinished object key (with no `:` yet) is dropped with its comma
/// - an open string value is closed
/// - a cut-off bare literal or number such as `tru` or `1e` becomes `null`
/// - a trailing comma is dropped and a dangling `:` gets `null`
/// - every open bracket is closed in LIFO order
///
/// Text without any `{` comes back trimmed and otherwise untouched.
pub fn repair_json(raw: &str) -> String {
    let text = strip_fences(raw);
    let Some(start) = text.find('{') else {
        return text.to_string();
    };

    let mut out = String::with_capacity(text.len() + 8);
    let mut closers: Vec<char> = Vec::new();
    let mut in_string = false;
    let mut escaped = false;
    // Key tracking: the next string in an object is a key after `{` or `,`.
    let mut expect_key = false;
    let mut string_is_key = false;
    let mut string_start = 0;
    // Start of a finished key still waiting for its `:`.
    let mut pending_key: Option<usize> = None;

    for ch in text[start..].chars() {
        if in_string {
            if escaped {
                escaped = false;
                out.push(ch);
                continue;
            }
            match ch {
                '\\' => {
                    escaped = true;
                    out.push(ch);
                }
                '"' => {
                    in_string = false;
                    if string_is_key {
                        pending_key = Some(string_start);
                    }
                    out.push(ch);
                }
                '\n' => out.push_str("\\n"),
                '\r' => out.push_str("\\r"),
                '\t' => out.push_str("\\t"),
                _ => out.push(ch),
            }
            continue;
        }

        match ch {
            '"' => {
                in_string = true;
                string_is_key = expect_key;
                string_start = out.len();
                expect_key = false;
                out.push(ch);
            }
            '{' => {
                closers.push('}');
                expect_key = true;
                out.push(ch);
            }
            '[' => {
                closers.push(']');
                expect_key = false;
                out.push(ch);
            }
            '}' | ']' => {
                // Stray closers that don't match the open structure are dropped.
                if closers.last() == Some(&ch) {
                    closers.pop();
                    expect_key = false;
                    pending_key = None;
                    out.push(ch);
                    if closers.is_empty() {
                        return out;
                    }
                }
            }
            ',' => {
                expect_key = closers.last() == Some(&'}');
                out.push(ch);
            }
            ':' => {
                expect_key = false;
                pending_key = None;
                out.push(ch);
            }
            _ => out.push(ch),
        }
    }

    if in_string {
        if string_is_key {
            out.truncate(string_start);
        } else {
            if escaped {
                out.pop();
            }
            out.push('"');
        }
    } else if let Some(key_start) = pending_key {
        out.truncate(key_start);
    }

    let mut out = out.trim_end().to_string();
    drop_partial_literal(&mut out);
    if out.ends_with(',') {
        out.pop();
        out.truncate(out.trim_end().len());
    }
    if out.ends_with(':') {
        out.push_str(" null");
    }
    while let Some(closer) = closers.pop() {
        out.push(closer);
    }
    out
}

/// Remove a trailing bare token that is not a complete JSON literal or
/// number, e.g. `tru`, `nul`, `1e` or `-`.
fn drop_partial_literal(out: &mut String) {
    let token_start = out
        .char_indices()
        .rev()
        .take_while(|&(_, c)| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '+'))
        .last()
        .map(|(i, _)| i);
    let Some(token_start) = token_start else {
        return;
    };
    let complete = matches!(
        serde_json::from_str::<Value>(&out[token_start..]),
        Ok(Value::Bool(_) | Value::Null | Value::Number(_))
    );
    if !complete {
        out.truncate(token_start);
        out.truncate(out.trim_end().len());
    }
}

/// Parse model output as `T`, repairing it first if needed.
///
/// Order: strict parse of the unfenced text, then the repaired text, then a
/// repair of the text cut after its last `}`. Gives up with
/// [`DispatchError::Parse`].
pub fn parse_model_json<T: DeserializeOwned>(raw: &str) -> Result<T, DispatchError> {
    let text = strip_fences(raw);
    if let Ok(value) = serde_json::from_str::<T>(text) {
        return Ok(value);
    }

    let repaired = repair_json(text);
    let first_err = match serde_json::from_str::<T>(&repaired) {
        Ok(value) => {
            debug!("Model JSON parsed after repair");
            return Ok(value);
        }
        Err(e) => e,
    };

    if let Some(last_brace) = text.rfind('}') {
        let truncated = repair_json(&text[..=last_brace]);
        if let Ok(value) = serde_json::from_str::<T>(&truncated) {
            debug!("Model JSON parsed after truncating to last brace");
            return Ok(value);
        }
    }

    Err(DispatchError::Parse(format!(
        "{first_err}; output: {}",
        truncate_string(text, 200)
    )))
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[test]
    fn test_valid_json_unchanged() {
        for input in [
            r#"{"a":1}"#,
            r#"{"a":[1,2,{"b":"x"}],"c":null}"#,
            r#"{"s":"brace } and [ inside","e":"quote \" here"}"#,
            r#"{}"#,
        ] {
            assert_eq!(repair_json(input), input);
        }
    }

    #[test]
    fn test_strips_fences() {
        assert_eq!(repair_json("```json\n{\"a\":1}\n```"), r#"{"a":1}"#);
        assert_eq!(repair_json("```\n{\"a\":1}\n```"), r#"{"a":1}"#);
        assert_eq!(repair_json("```json{\"a\":1}```"), r#"{"a":1}"#);
    }

    #[test]
    fn test_closes_unbalanced_structures() {
        let repaired = repair_json(r#"{"a": [1, 2, {"b": "x"#);
        let value: Value = serde_json::from_str(&repaired).unwrap();
        let arr = value["a"].as_array().unwrap();
        assert_eq!(arr.len(), 3);
        assert_eq!(arr[2]["b"], "x");
    }

    #[test]
    fn test_drops_leading_and_trailing_prose() {
        let repaired = repair_json("Sure! Here it is: {\"score\": 80} Hope that helps {x}");
        assert_eq!(repaired, r#"{"score": 80}"#);
    }

    #[test]
    fn test_escapes_raw_newlines_in_strings() {
        let repaired = repair_json("{\"feedback\": \"line one\nline two\"}");
        let value: Value = serde_json::from_str(&repaired).unwrap();
        assert_eq!(value["feedback"], "line one\nline two");
    }

    #[test]
    fn test_trailing_comma_and_dangling_colon() {
        let value: Value = serde_json::from_str(&repair_json(r#"{"a": 1,"#)).unwrap();
        assert_eq!(value, json!({"a": 1}));

        let value: Value = serde_json::from_str(&repair_json(r#"{"a": 1, "b":"#)).unwrap();
        assert_eq!(value, json!({"a": 1, "b": null}));
    }

    #[test]
    fn test_dangling_escape_in_string() {
        let value: Value = serde_json::from_str(&repair_json(r#"{"a": "abc\"#)).unwrap();
        assert_eq!(value["a"], "abc");
    }

    #[test]
    fn test_no_brace_returns_trimmed_text() {
        assert_eq!(repair_json("  I cannot help with that.  "), "I cannot help with that.");
    }

    #[test]
    fn test_repair_is_idempotent() {
        let once = repair_json(r#"{"a": {"b": [1, 2"#);
        assert_eq!(repair_json(&once), once);
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct Score {
        score: u32,
        #[serde(default)]
        notes: Vec<String>,
    }

    #[test]
    fn test_parse_model_json_strict() {
        let parsed: Score = parse_model_json(r#"{"score": 7, "notes": ["ok"]}"#).unwrap();
        assert_eq!(parsed.score, 7);
    }

    #[test]
    fn test_parse_model_json_accepts_bare_array() {
        let parsed: Vec<Score> = parse_model_json("```json\n[{\"score\":1},{\"score\":2}]\n```").unwrap();
        assert_eq!(parsed.len(), 2);
    }

    #[test]
    fn test_parse_model_json_repairs_truncation() {
        let parsed: Score = parse_model_json("```json\n{\"score\": 9, \"notes\": [\"clear\", \"conc").unwrap();
        assert_eq!(parsed.score, 9);
        assert_eq!(parsed.notes, vec!["clear", "conc"]);
    }

    #[test]
    fn test_parse_model_json_last_brace_fallback() {
        // Junk after the last complete object can't be repaired in place.
        let parsed: Value = parse_model_json(r#"{"a": 1, "b": {"c": 2}, "d": @@"#).unwrap();
        assert_eq!(parsed, json!({"a": 1, "b": {"c": 2}}));
    }

    #[test]
    fn test_truncated_mid_key_drops_key() {
        let value: Value = parse_model_json(r#"{"score": 80, "feedb"#).unwrap();
        assert_eq!(value, json!({"score": 80}));

        // Key finished but its colon never arrived.
        let value: Value = parse_model_json(r#"{"score": 80, "feedback""#).unwrap();
        assert_eq!(value, json!({"score": 80}));

        let value: Value = parse_model_json(r#"{"a": {"b": 1, "c"#).unwrap();
        assert_eq!(value, json!({"a": {"b": 1}}));

        let value: Value = parse_model_json(r#"{"fe"#).unwrap();
        assert_eq!(value, json!({}));
    }

    #[test]
    fn test_truncated_string_in_array_is_kept() {
        // Strings after a comma inside an array are values, not keys.
        let value: Value = parse_model_json(r#"{"tags": ["a", "b"#).unwrap();
        assert_eq!(value, json!({"tags": ["a", "b"]}));
    }

    #[test]
    fn test_truncated_literal_becomes_null() {
        let value: Value = parse_model_json(r#"{"score": 80, "ok": tru"#).unwrap();
        assert_eq!(value, json!({"score": 80, "ok": null}));

        let value: Value = parse_model_json(r#"{"score": 80, "ratio": 1e"#).unwrap();
        assert_eq!(value, json!({"score": 80, "ratio": null}));

        let value: Value = parse_model_json(r#"{"xs": [1, 2, nu"#).unwrap();
        assert_eq!(value, json!({"xs": [1, 2]}));
    }

    #[test]
    fn test_complete_trailing_literal_kept() {
        let value: Value = serde_json::from_str(&repair_json(r#"{"ok": false, "n": 42"#)).unwrap();
        assert_eq!(value, json!({"ok": false, "n": 42}));
    }

    #[test]
    fn test_parse_model_json_gives_up() {
        let err = parse_model_json::<Score>("no json here").unwrap_err();
        assert!(matches!(err, DispatchError::Parse(_)));
    }
}
