//! Locating structured output inside free-form model text.

use serde::de::DeserializeOwned;

use crate::llm_client::LlmError;

/// Returns the first top-level balanced `{...}` region of `text`.
///
/// Braces inside JSON string literals (including escaped quotes) do not
/// count towards nesting, so prose or code fences around the object are
/// skipped.
pub fn extract_json_object(text: &str) -> Option<&str> {
    let mut depth = 0usize;
    let mut start = None;
    let mut in_string = false;
    let mut escaped = false;

    for (i, ch) in text.char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match ch {
            '"' if start.is_some() => in_string = true,
            '{' => {
                if depth == 0 {
                    start = Some(i);
                }
                depth += 1;
            }
            '}' if depth > 0 => {
                depth -= 1;
                if depth == 0 {
                    return start.map(|s| &text[s..=i]);
                }
            }
            _ => {}
        }
    }

    None
}

/// Decodes the first JSON object found in a model reply.
pub fn parse_structured<T: DeserializeOwned>(text: &str) -> Result<T, LlmError> {
    let object = extract_json_object(text).ok_or(LlmError::NoJsonObject)?;
    serde_json::from_str(object).map_err(LlmError::Parse)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    #[test]
    fn test_plain_object() {
        assert_eq!(extract_json_object(r#"{"a": 1}"#), Some(r#"{"a": 1}"#));
    }

    #[test]
    fn test_object_wrapped_in_prose_and_fences() {
        let reply = "Sure! Here it is:\n```json\n{\"personal\": {\"name\": \"Jane\"}}\n```\nAnything else?";
        assert_eq!(
            extract_json_object(reply),
            Some("{\"personal\": {\"name\": \"Jane\"}}")
        );
    }

    #[test]
    fn test_braces_inside_strings_are_ignored() {
        let reply = r#"{"quote": "use {braces} and \"quotes\" }", "n": 2} trailing }"#;
        assert_eq!(
            extract_json_object(reply),
            Some(r#"{"quote": "use {braces} and \"quotes\" }", "n": 2}"#)
        );
    }

    #[test]
    fn test_only_first_top_level_object() {
        assert_eq!(extract_json_object("{\"a\":1} {\"b\":2}"), Some("{\"a\":1}"));
    }

    #[test]
    fn test_unbalanced_or_missing() {
        assert_eq!(extract_json_object("no json here"), None);
        assert_eq!(extract_json_object("{\"a\": {\"b\": 1}"), None);
        assert_eq!(extract_json_object("} stray"), None);
    }

    #[test]
    fn test_parse_structured_errors() {
        assert!(matches!(
            parse_structured::<Value>("garbage"),
            Err(LlmError::NoJsonObject)
        ));
        assert!(matches!(
            parse_structured::<Value>("{not: json}"),
            Err(LlmError::Parse(_))
        ));
        let value: Value = parse_structured("ok {\"skills\": []}").unwrap();
        assert!(value["skills"].is_array());
    }
}
