//! Tolerant extraction of a JSON object from free-form model output.

/// Remove markdown code fences, keeping their contents.
pub fn strip_code_fences(text: &str) -> String {
    text.trim().replace("```json", "").replace("```", "")
}

/// The first balanced top-level `{...}` in `text`.
///
/// Brace matching ignores braces inside JSON strings and honours escapes.
/// Returns `None` when there is no `{` or the first object never closes.
pub fn first_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_code_fences() {
        let text = "```json\n{\"a\": 1}\n```";
        assert_eq!(strip_code_fences(text).trim(), "{\"a\": 1}");
    }

    #[test]
    fn test_first_object_ignores_prose_and_trailing_objects() {
        let text = r#"Here is your plan: {"workflow": []} and also {"other": true}"#;
        assert_eq!(first_json_object(text), Some(r#"{"workflow": []}"#));
    }

    #[test]
    fn test_braces_inside_strings_and_escapes() {
        let text = r#"{"description": "use {braces} and \"quotes\" }", "n": {"x": 1}} tail"#;
        assert_eq!(
            first_json_object(text),
            Some(r#"{"description": "use {braces} and \"quotes\" }", "n": {"x": 1}}"#)
        );
    }

    #[test]
    fn test_missing_or_unbalanced() {
        assert_eq!(first_json_object("no json here"), None);
        assert_eq!(first_json_object(r#"{"workflow": [1, 2"#), None);
    }

    #[test]
    fn test_multibyte_text_before_object() {
        assert_eq!(first_json_object("Plán → {\"ok\": \"é\"}"), Some("{\"ok\": \"é\"}"));
    }
}
