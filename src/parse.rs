//! Model Output Parsing
//!
//! Model output is text that usually contains JSON, often wrapped in a
//! markdown code fence or surrounded by prose. Recovery is layered: strip
//! an exact code fence, try a direct parse, then scan for the first
//! balanced JSON value. The scanner walks the text tracking bracket depth
//! and string state, so braces inside string literals never confuse it.
//!
//! Every failure here maps to [`QuizError::Parse`], the only retryable
//! error class.

use serde_json::Value;

use crate::types::{ParsedQuestion, ParsedTagSet, QuizError, Result};

// =============================================================================
// Fence Stripping
// =============================================================================

/// Strip a markdown code fence, matching the exact ```` ```json ```` or
/// ```` ``` ```` opener and the exact ```` ``` ```` closer. Only whole
/// fences are removed; stray backticks inside the payload are preserved.
pub fn strip_code_fence(raw: &str) -> &str {
    let mut text = raw.trim();

    let lower = text.to_ascii_lowercase();
    if lower.starts_with("```json") {
        text = text["```json".len()..].trim_start();
    } else if text.starts_with("```") {
        text = text["```".len()..].trim_start();
    }

    if text.ends_with("```") {
        text = text[..text.len() - "```".len()].trim_end();
    }

    text
}

// =============================================================================
// Balanced JSON Scan
// =============================================================================

/// Find the first balanced JSON value (object or array) in mixed text.
///
/// Starts at the first `{` or `[` and tracks nesting with a delimiter
/// stack, honoring string literals and escape sequences. Returns the
/// candidate slice without parsing it.
pub fn find_balanced_json(text: &str) -> Option<&str> {
    let bytes = text.as_bytes();
    let start = bytes.iter().position(|&b| b == b'{' || b == b'[')?;

    let mut stack: Vec<u8> = Vec::new();
    let mut in_string = false;
    let mut escaped = false;

    for (i, &b) in bytes[start..].iter().enumerate() {
        if escaped {
            escaped = false;
            continue;
        }
        match b {
            b'\\' if in_string => escaped = true,
            b'"' => in_string = !in_string,
            b'{' | b'[' if !in_string => stack.push(b),
            b'}' if !in_string => {
                if stack.pop() != Some(b'{') {
                    return None;
                }
                if stack.is_empty() {
                    return Some(&text[start..start + i + 1]);
                }
            }
            b']' if !in_string => {
                if stack.pop() != Some(b'[') {
                    return None;
                }
                if stack.is_empty() {
                    return Some(&text[start..start + i + 1]);
                }
            }
            _ => {}
        }
    }

    None
}

/// Fence-strip, then parse directly, then fall back to scanning for an
/// embedded balanced value.
fn recover_json(raw: &str) -> Result<Value> {
    let stripped = strip_code_fence(raw);

    if let Ok(value) = serde_json::from_str(stripped) {
        return Ok(value);
    }

    find_balanced_json(stripped)
        .and_then(|candidate| serde_json::from_str(candidate).ok())
        .ok_or_else(|| QuizError::parse("no parseable JSON found in model output"))
}

// =============================================================================
// Question Parsing
// =============================================================================

fn question_from_value(value: &Value) -> Result<ParsedQuestion> {
    let object = value
        .as_object()
        .ok_or_else(|| QuizError::parse("question entry is not an object"))?;

    let stem = object
        .get("stem")
        .and_then(Value::as_str)
        .ok_or_else(|| QuizError::parse("question entry missing 'stem'"))?;

    let answers: Vec<String> = object
        .get("answers")
        .and_then(Value::as_array)
        .ok_or_else(|| QuizError::parse("question entry missing 'answers'"))?
        .iter()
        .map(|a| {
            a.as_str()
                .map(str::to_string)
                .ok_or_else(|| QuizError::parse("answer entry is not a string"))
        })
        .collect::<Result<_>>()?;

    let index = object
        .get("correctAnswerIndex")
        .and_then(Value::as_u64)
        .ok_or_else(|| QuizError::parse("question entry missing 'correctAnswerIndex'"))?;

    ParsedQuestion::new(stem.to_string(), answers, index as usize)
}

/// Parse model output into validated questions.
///
/// The payload must be a non-empty JSON array of objects, each carrying
/// `stem`, `answers` and `correctAnswerIndex`. Any shape violation is a
/// retryable parse failure.
pub fn parse_questions(raw: &str) -> Result<Vec<ParsedQuestion>> {
    let value = recover_json(raw)?;

    let entries = value
        .as_array()
        .ok_or_else(|| QuizError::parse("expected a JSON array of questions"))?;

    if entries.is_empty() {
        return Err(QuizError::parse("model returned an empty question array"));
    }

    entries.iter().map(question_from_value).collect()
}

// =============================================================================
// Tag Parsing
// =============================================================================

/// Parse tagging output. Expects `{"tags": [...]}`; anything else falls
/// back to comma-splitting the raw text, whether the output was
/// unparseable or parsed into a shape without a `tags` array. An empty
/// final set is a parse failure.
pub fn parse_tags(raw: &str) -> Result<ParsedTagSet> {
    let from_json = recover_json(raw).ok().and_then(|value| {
        value.get("tags").and_then(Value::as_array).map(|entries| {
            entries
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect::<Vec<_>>()
        })
    });

    // Degraded recovery for answers like "biology, plants" or JSON that
    // named its list something other than "tags"
    let tags = from_json.unwrap_or_else(|| {
        strip_code_fence(raw)
            .split(',')
            .map(str::to_string)
            .collect()
    });

    let set = ParsedTagSet::from_raw(tags);
    if set.is_empty() {
        return Err(QuizError::parse("no tags found in model output"));
    }
    Ok(set)
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const QUESTIONS_JSON: &str = r#"[
        {"stem": "What powers the cell?", "answers": ["Mitochondria", "Nucleus", "Ribosome", "Golgi"], "correctAnswerIndex": 0},
        {"stem": "Where is DNA stored?", "answers": ["Mitochondria", "Nucleus", "Ribosome", "Golgi"], "correctAnswerIndex": 1}
    ]"#;

    #[test]
    fn test_strip_json_fence() {
        assert_eq!(strip_code_fence("```json\n[1,2]\n```"), "[1,2]");
        assert_eq!(strip_code_fence("```JSON\n[1,2]\n```"), "[1,2]");
        assert_eq!(strip_code_fence("```\n[1,2]\n```"), "[1,2]");
        assert_eq!(strip_code_fence("  [1,2]  "), "[1,2]");
    }

    #[test]
    fn test_strip_fence_preserves_inner_backticks() {
        // A char-class trim would eat the payload's own backticks
        assert_eq!(
            strip_code_fence("```json\n[\"code: `x`\"]\n```"),
            "[\"code: `x`\"]"
        );
    }

    #[test]
    fn test_balanced_scan_in_prose() {
        let text = "Here are your questions: [{\"stem\": \"q\"}] hope they help!";
        assert_eq!(find_balanced_json(text), Some("[{\"stem\": \"q\"}]"));
    }

    #[test]
    fn test_balanced_scan_ignores_braces_in_strings() {
        let text = r#"noise {"stem": "use {braces} and \" quotes", "n": 1} trailing"#;
        let found = find_balanced_json(text).unwrap();
        let value: Value = serde_json::from_str(found).unwrap();
        assert_eq!(value["n"], 1);
    }

    #[test]
    fn test_balanced_scan_nested() {
        let text = r#"x {"a": {"b": [1, {"c": 2}]}} y"#;
        assert_eq!(find_balanced_json(text), Some(r#"{"a": {"b": [1, {"c": 2}]}}"#));
    }

    #[test]
    fn test_balanced_scan_unterminated() {
        assert_eq!(find_balanced_json(r#"{"a": [1, 2"#), None);
        assert_eq!(find_balanced_json("no json here"), None);
    }

    #[test]
    fn test_parse_questions_direct() {
        let questions = parse_questions(QUESTIONS_JSON).unwrap();
        assert_eq!(questions.len(), 2);
        assert_eq!(questions[0].correct_answer_index, 0);
        assert_eq!(questions[1].stem, "Where is DNA stored?");
    }

    #[test]
    fn test_parse_questions_fenced_and_noisy() {
        let raw = format!("Sure! Here you go:\n```json\n{}\n```\nEnjoy.", QUESTIONS_JSON);
        let questions = parse_questions(&raw).unwrap();
        assert_eq!(questions.len(), 2);
    }

    #[test]
    fn test_parse_questions_rejects_bad_shapes() {
        assert!(parse_questions("[]").is_err());
        assert!(parse_questions("{\"stem\": \"not an array\"}").is_err());
        assert!(parse_questions("total garbage").is_err());
        // Missing required key
        assert!(parse_questions(r#"[{"stem": "q", "answers": ["a", "b"]}]"#).is_err());
        // Index out of range
        assert!(
            parse_questions(r#"[{"stem": "q", "answers": ["a", "b"], "correctAnswerIndex": 5}]"#)
                .is_err()
        );
    }

    #[test]
    fn test_parse_failures_are_retryable() {
        let err = parse_questions("garbage").unwrap_err();
        assert!(err.is_retryable());
    }

    #[test]
    fn test_parse_tags_json() {
        let tags = parse_tags(r#"{"tags": ["biology", "plants", "biology"]}"#).unwrap();
        assert_eq!(tags.tags, vec!["biology", "plants"]);
    }

    #[test]
    fn test_parse_tags_comma_fallback() {
        let tags = parse_tags("biology, plants , cells").unwrap();
        assert_eq!(tags.tags, vec!["biology", "plants", "cells"]);
    }

    #[test]
    fn test_parse_tags_fallback_when_json_lacks_tags_key() {
        // Valid JSON, wrong key: recover what we can instead of failing
        let tags = parse_tags(r#"{"topics": ["ecology"]}"#).unwrap();
        assert!(!tags.is_empty());
    }

    #[test]
    fn test_parse_tags_fallback_for_bare_array() {
        let tags = parse_tags(r#"["biology", "plants"]"#).unwrap();
        assert_eq!(tags.tags.len(), 2);
    }

    #[test]
    fn test_parse_tags_empty_is_error() {
        assert!(parse_tags(r#"{"tags": []}"#).is_err());
        assert!(parse_tags("   ,  , ").is_err());
    }

    proptest! {
        #[test]
        fn prop_fence_strip_idempotent(s in "\\PC{0,200}") {
            let once = strip_code_fence(&s);
            prop_assert_eq!(strip_code_fence(once), once);
        }

        #[test]
        fn prop_fenced_body_parses_like_bare(n in 0usize..4) {
            let body = format!(
                r#"[{{"stem": "q", "answers": ["a", "b", "c", "d"], "correctAnswerIndex": {}}}]"#,
                n
            );
            let fenced = format!("```json\n{}\n```", body);
            prop_assert_eq!(
                parse_questions(&body).unwrap(),
                parse_questions(&fenced).unwrap()
            );
        }
    }
}
