//! Tiered JSON extraction from free-text model replies.
//!
//! Strategy, in order: a fenced ```json block; a balanced `{…}` object
//! scanned with string/escape awareness; a balanced `[…]` array the same
//! way. Every candidate is checked by parsing; the first valid one wins.

use serde_json::Value;

/// Returns the first well-formed JSON object or array found in `text`,
/// as the exact substring, or `None` when nothing parses.
pub fn extract_json(text: &str) -> Option<String> {
    if let Some(candidate) = from_fenced_block(text) {
        return Some(candidate);
    }
    if let Some(candidate) = from_balanced(text, '{', '}') {
        return Some(candidate);
    }
    from_balanced(text, '[', ']')
}

fn is_valid(candidate: &str) -> bool {
    serde_json::from_str::<Value>(candidate).is_ok()
}

/// Looks for ```json fences and returns the first body that parses.
fn from_fenced_block(text: &str) -> Option<String> {
    let mut rest = text;
    while let Some(start) = rest.find("```json") {
        let body_start = start + "```json".len();
        let body = &rest[body_start..];
        match body.find("```") {
            Some(end) => {
                let candidate = body[..end].trim();
                if is_valid(candidate) {
                    return Some(candidate.to_string());
                }
                rest = &body[end + 3..];
            }
            None => break,
        }
    }
    None
}

/// Scans for a balanced `open`…`close` span, respecting JSON string and
/// escape context, and returns the first span that parses.
fn from_balanced(text: &str, open: char, close: char) -> Option<String> {
    let bytes: Vec<(usize, char)> = text.char_indices().collect();
    let mut search_from = 0usize;

    while let Some(start_pos) = bytes[search_from..]
        .iter()
        .position(|(_, c)| *c == open)
        .map(|p| p + search_from)
    {
        let mut depth = 0i32;
        let mut in_string = false;
        let mut escaped = false;
        let mut end: Option<usize> = None;

        for &(idx, c) in &bytes[start_pos..] {
            if escaped {
                escaped = false;
                continue;
            }
            match c {
                '\\' if in_string => escaped = true,
                '"' => in_string = !in_string,
                c if c == open && !in_string => depth += 1,
                c if c == close && !in_string => {
                    depth -= 1;
                    if depth == 0 {
                        end = Some(idx + c.len_utf8());
                        break;
                    }
                }
                _ => {}
            }
        }

        match end {
            Some(end) => {
                let (start_idx, _) = bytes[start_pos];
                let candidate = &text[start_idx..end];
                if is_valid(candidate) {
                    return Some(candidate.to_string());
                }
                search_from = start_pos + 1;
            }
            // Unbalanced to the end of the text; later opens cannot close either.
            None => return None,
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    /// **Scenario**: A fenced block wins over surrounding braces.
    #[test]
    fn fenced_block_preferred() {
        let text = "ignore {not json} -- ```json\n{\"a\": 1}\n``` done";
        assert_eq!(extract_json(text).unwrap(), "{\"a\": 1}");
    }

    /// **Scenario**: A bare object embedded in prose is found by balanced scan.
    #[test]
    fn balanced_object_in_prose() {
        let text = "The answer is {\"name\": \"Alice\", \"age\": 30} as requested.";
        let got: Value = serde_json::from_str(&extract_json(text).unwrap()).unwrap();
        assert_eq!(got, json!({"name": "Alice", "age": 30}));
    }

    /// **Scenario**: Braces inside JSON strings do not break the scan.
    #[test]
    fn braces_inside_strings() {
        let text = r#"note {"text": "uses { and } and \" inside"} end"#;
        let got: Value = serde_json::from_str(&extract_json(text).unwrap()).unwrap();
        assert_eq!(got["text"], "uses { and } and \" inside");
    }

    /// **Scenario**: Arrays are found when no object candidate parses.
    #[test]
    fn array_fallback() {
        let text = "values: [1, 2, 3] trailing";
        assert_eq!(extract_json(text).unwrap(), "[1, 2, 3]");
    }

    /// **Scenario**: An invalid first candidate does not mask a later valid one.
    #[test]
    fn skips_invalid_candidates() {
        let text = "{oops} then {\"ok\": true}";
        assert_eq!(extract_json(text).unwrap(), "{\"ok\": true}");
    }

    /// **Scenario**: Wrapping any serialized value in brace-free noise round-trips.
    #[test]
    fn roundtrip_under_noise() {
        for value in [json!({"a": [1, 2], "b": {"c": "x"}}), json!([{"k": "v"}]), json!({})] {
            let s = serde_json::to_string(&value).unwrap();
            let wrapped = format!("some prefix noise... {s} ...suffix noise");
            assert_eq!(extract_json(&wrapped).unwrap(), s);
        }
    }

    /// **Scenario**: Text with no JSON yields None.
    #[test]
    fn none_when_absent() {
        assert!(extract_json("nothing to see here").is_none());
        assert!(extract_json("unbalanced { forever").is_none());
        assert!(extract_json("").is_none());
    }

    /// **Scenario**: Nested objects return the outermost span.
    #[test]
    fn outermost_span() {
        let text = "x {\"outer\": {\"inner\": 1}} y";
        assert_eq!(extract_json(text).unwrap(), "{\"outer\": {\"inner\": 1}}");
    }
}
