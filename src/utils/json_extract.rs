//! Resilient JSON extraction from language-model replies
//!
//! Model output is rarely pure JSON: it arrives wrapped in prose, inside
//! markdown fences, or followed by commentary. `extract_json` tries three
//! strategies in order and returns the first one that deserializes into
//! the caller's type:
//!
//! 1. the whole (trimmed) text
//! 2. the first object after a ```` ``` ```` / ```` ```json ```` fence
//! 3. the first balanced object anywhere in the text
//!
//! Strategy 3 always runs when 1 and 2 did not produce a value, even if a
//! fence was found. Malformed input never errors; the only failure signal
//! is `None`.

use serde::de::DeserializeOwned;
use tracing::warn;

use crate::utils::constants::JSON_PREVIEW_CHARS;

const FENCE: &str = "```";
const FENCE_LANG: &str = "json";

/// Recover the first well-formed JSON value of type `T` from free-form text.
///
/// Performs no shape validation beyond what `T`'s `Deserialize` impl
/// enforces; callers validate content afterwards.
pub fn extract_json<T: DeserializeOwned>(text: &str) -> Option<T> {
    let trimmed = text.trim();

    // Strategy 1: the whole reply is JSON
    if let Ok(value) = serde_json::from_str::<T>(trimmed) {
        return Some(value);
    }

    // Strategy 2: object inside a markdown fence
    if let Some(content_start) = fence_content_start(trimmed) {
        if let Some(candidate) = balanced_object(trimmed, content_start) {
            match serde_json::from_str::<T>(candidate) {
                Ok(value) => return Some(value),
                Err(err) => warn!(
                    error = %err,
                    preview = %preview(candidate, JSON_PREVIEW_CHARS),
                    "Failed to parse JSON from code block"
                ),
            }
        }
    }

    // Strategy 3: first balanced object in the text
    let candidate = balanced_object(trimmed, 0)?;
    match serde_json::from_str::<T>(candidate) {
        Ok(value) => Some(value),
        Err(err) => {
            warn!(
                error = %err,
                preview = %preview(candidate, JSON_PREVIEW_CHARS),
                "Failed to parse extracted JSON"
            );
            None
        }
    }
}

/// Byte offset right after the first fence marker (```` ``` ````, an
/// optional `json` tag, then any whitespace).
fn fence_content_start(text: &str) -> Option<usize> {
    let mut pos = text.find(FENCE)? + FENCE.len();
    if text[pos..].starts_with(FENCE_LANG) {
        pos += FENCE_LANG.len();
    }
    let whitespace: usize = text[pos..]
        .chars()
        .take_while(|c| c.is_whitespace())
        .map(char::len_utf8)
        .sum();
    Some(pos + whitespace)
}

/// Balanced-brace scan.
///
/// Returns the slice from the first `{` at or after `offset` through its
/// matching `}`. Braces inside double-quoted strings are ignored and a
/// backslash always consumes the next character, so `\"` never toggles
/// the string state. `None` when there is no `{` or the object never
/// closes.
pub fn balanced_object(text: &str, offset: usize) -> Option<&str> {
    let start = offset + text.get(offset..)?.find('{')?;

    let mut depth: usize = 0;
    let mut in_string = false;
    let mut escape_pending = false;

    for (i, ch) in text[start..].char_indices() {
        if escape_pending {
            escape_pending = false;
            continue;
        }

        match ch {
            '\\' => escape_pending = true,
            '"' => in_string = !in_string,
            '{' if !in_string => depth += 1,
            '}' if !in_string => {
                // depth >= 1 here: the scan opens on an unescaped '{'
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..=start + i]);
                }
            }
            _ => {}
        }
    }

    None
}

/// First `max_chars` characters of `text`, for log lines
pub fn preview(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}…", &text[..cut]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::{json, Value};

    #[derive(Debug, Deserialize, PartialEq)]
    struct Verdict {
        summary: String,
        score: u8,
    }

    #[test]
    fn test_plain_json() {
        let inputs = [
            r#"{"a":1,"b":[true,null,"x"]}"#,
            r#"  {"nested":{"deep":{"x":1.5}}}  "#,
            "[1,2,3]",
            "42",
            r#""just a string""#,
        ];
        for input in inputs {
            let expected: Value = serde_json::from_str(input).unwrap();
            assert_eq!(extract_json::<Value>(input), Some(expected), "input: {}", input);
        }
    }

    #[test]
    fn test_fenced_block() {
        let body = r#"{"summary":"ok","score":12}"#;
        for text in [
            format!("```json\n{}\n```", body),
            format!("Here is the report:\n```json\n{}\n```\nLet me know!", body),
            format!("```\n{}\n```", body),
            format!("```json{}```", body),
        ] {
            assert_eq!(
                extract_json::<Verdict>(&text),
                Some(Verdict { summary: "ok".to_string(), score: 12 }),
                "text: {}",
                text
            );
        }
    }

    #[test]
    fn test_trailing_prose_ignored() {
        let text = r#"{"a":1} — that's the result {and some braces}"#;
        assert_eq!(extract_json::<Value>(text), Some(json!({"a": 1})));
    }

    #[test]
    fn test_leading_prose() {
        let text = "Sure! Based on the code, here you go: {\"a\":{\"b\":2}}\nThanks.";
        assert_eq!(extract_json::<Value>(text), Some(json!({"a": {"b": 2}})));
    }

    #[test]
    fn test_braces_inside_strings() {
        let text = r#"{"note":"use {x} here","n":1}"#;
        let prose = format!("Result: {} done", text);
        let expected = json!({"note": "use {x} here", "n": 1});
        assert_eq!(extract_json::<Value>(text), Some(expected.clone()));
        assert_eq!(extract_json::<Value>(&prose), Some(expected));
    }

    #[test]
    fn test_escaped_quote_then_braces() {
        let text = r#"prefix {"note":"she said \"hi {there}\"","n":2} suffix"#;
        assert_eq!(
            extract_json::<Value>(text),
            Some(json!({"note": "she said \"hi {there}\"", "n": 2}))
        );
    }

    #[test]
    fn test_escaped_backslash_before_quote() {
        // "\\" is a complete escape; the following quote closes the string
        let text = r#"x {"path":"C:\\","open":"{"} y"#;
        assert_eq!(
            extract_json::<Value>(text),
            Some(json!({"path": "C:\\", "open": "{"}))
        );
    }

    #[test]
    fn test_truncated_object() {
        assert_eq!(extract_json::<Value>(r#"{"a":1,"b":"#), None);
        assert_eq!(extract_json::<Value>("```json\n{\"a\":{\"b\":1}\n```"), None);
    }

    #[test]
    fn test_no_json() {
        assert_eq!(extract_json::<Value>("no json here"), None);
        assert_eq!(extract_json::<Value>(""), None);
        assert_eq!(extract_json::<Value>("   \n\t "), None);
        assert_eq!(extract_json::<Value>("closing only }}}"), None);
    }

    #[test]
    fn test_malformed_object_is_absent() {
        assert_eq!(extract_json::<Value>("answer: {\"a\":1,}"), None);
        assert_eq!(extract_json::<Value>("answer: {a: 1}"), None);
    }

    #[test]
    fn test_failed_fence_falls_through_to_bare_scan() {
        // Fence holds no object; the object before it is still found
        let text = "Result {\"a\":1}\n```\nno object in here\n```";
        assert_eq!(extract_json::<Value>(text), Some(json!({"a": 1})));

        // Fence object is malformed; the bare scan re-finds the first object
        let text = "{\"ok\":true}\n```json\n{\"broken\":,}\n```";
        assert_eq!(extract_json::<Value>(text), Some(json!({"ok": true})));

        // Both strategies land on the same malformed object
        let text = "```json\n{\"broken\":,}\n```\nretry: {\"fixed\":1}";
        assert_eq!(extract_json::<Value>(text), None);
    }

    #[test]
    fn test_fence_preferred_over_earlier_object() {
        let text = "Example shape {\"summary\":\"...\"}\n```json\n{\"summary\":\"real\",\"score\":90}\n```";
        assert_eq!(
            extract_json::<Verdict>(text),
            Some(Verdict { summary: "real".to_string(), score: 90 })
        );
    }

    #[test]
    fn test_shape_mismatch_is_absent() {
        // Only the first balanced object is tried
        let text = r#"{"other":1} and then {"summary":"x","score":1}"#;
        assert_eq!(extract_json::<Verdict>(text), None);
        assert!(extract_json::<Value>(text).is_some());
    }

    #[test]
    fn test_multibyte_text() {
        let text = "Résumé 🦀: {\"name\":\"Çà {va} 🦀\",\"n\":3} ✓";
        assert_eq!(
            extract_json::<Value>(text),
            Some(json!({"name": "Çà {va} 🦀", "n": 3}))
        );
    }

    #[test]
    fn test_idempotent() {
        let text = "noise ```json\n{\"a\":[1,{\"b\":\"}\"}]}\n``` more";
        let first = extract_json::<Value>(text);
        let second = extract_json::<Value>(text);
        assert!(first.is_some());
        assert_eq!(first, second);
    }

    #[test]
    fn test_balanced_object_bounds() {
        let text = r#"ab {"x":{"y":"}"}} cd {"z":1}"#;
        assert_eq!(balanced_object(text, 0), Some(r#"{"x":{"y":"}"}}"#));
        assert_eq!(balanced_object(text, 5), Some(r#"{"y":"}"}"#));
        assert_eq!(balanced_object(text, 20), Some(r#"{"z":1}"#));
        assert_eq!(balanced_object(text, text.len()), None);
        assert_eq!(balanced_object(text, text.len() + 10), None);
        assert_eq!(balanced_object("{ \"open\": \"}", 0), None);
    }

    #[test]
    fn test_fence_content_start() {
        assert_eq!(fence_content_start("```json\n{}"), Some(8));
        assert_eq!(fence_content_start("pre ```  {}"), Some(9));
        assert_eq!(fence_content_start("no fence"), None);
    }

    #[test]
    fn test_preview_truncates_on_char_boundary() {
        assert_eq!(preview("short", 10), "short");
        assert_eq!(preview("🦀🦀🦀", 2), "🦀🦀…");
    }
}
