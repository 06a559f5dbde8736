//! Syntax repairs for almost-valid JSON
//!
//! Both repairs are string-aware: text inside string literals is only touched
//! by control-character escaping, and text outside them only by trailing-comma
//! removal.

use super::scan::ScanState;

/// Escape raw control characters that appear inside string literals
///
/// CR LF, lone CR and LF become `\n`, TAB becomes `\t`, any other character
/// below 0x20 becomes `\u00XX`. Text outside strings is copied unchanged.
pub fn escape_control_chars_in_strings(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut state = ScanState::Normal;
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        if state == ScanState::InString {
            match ch {
                '\r' => {
                    if chars.peek() == Some(&'\n') {
                        chars.next();
                    }
                    out.push_str("\\n");
                    continue;
                }
                '\n' => {
                    out.push_str("\\n");
                    continue;
                }
                '\t' => {
                    out.push_str("\\t");
                    continue;
                }
                c if (c as u32) < 0x20 => {
                    out.push_str(&format!("\\u{:04x}", c as u32));
                    continue;
                }
                _ => {}
            }
        }
        out.push(ch);
        state = state.step(ch);
    }

    out
}

/// Remove commas that directly precede `}` or `]`, ignoring whitespace
///
/// Repeats until nothing changes, so `[1,,]` becomes `[1]`.
pub fn remove_trailing_commas(text: &str) -> String {
    let mut current = remove_trailing_commas_once(text);
    loop {
        let next = remove_trailing_commas_once(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}

fn remove_trailing_commas_once(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut state = ScanState::Normal;

    for (idx, ch) in text.char_indices() {
        if state == ScanState::Normal && ch == ',' {
            let next = text[idx + 1..].chars().find(|c| !c.is_whitespace());
            if matches!(next, Some('}') | Some(']')) {
                continue;
            }
        }
        out.push(ch);
        state = state.step(ch);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::BTreeMap;

    #[test]
    fn test_escape_newlines_and_tabs_in_strings() {
        let raw = "{\"notes\": \"line1\nline2\r\nline3\rend\tx\"}";
        let fixed = escape_control_chars_in_strings(raw);
        assert_eq!(fixed, "{\"notes\": \"line1\\nline2\\nline3\\nend\\tx\"}");

        let value: serde_json::Value = serde_json::from_str(&fixed).unwrap();
        assert_eq!(value["notes"], "line1\nline2\nline3\nend\tx");
    }

    #[test]
    fn test_escape_other_control_chars_as_unicode() {
        let raw = "{\"a\": \"bell\u{7}\"}";
        assert_eq!(escape_control_chars_in_strings(raw), "{\"a\": \"bell\\u0007\"}");
    }

    #[test]
    fn test_escape_leaves_structure_untouched() {
        let raw = "{\n\t\"a\": \"x\",\r\n  \"b\": 2\n}";
        assert_eq!(escape_control_chars_in_strings(raw), raw);
    }

    #[test]
    fn test_escape_respects_escaped_quotes() {
        let raw = "{\"a\": \"say \\\"hi\\\"\nnow\"}";
        assert_eq!(escape_control_chars_in_strings(raw), "{\"a\": \"say \\\"hi\\\"\\nnow\"}");
    }

    #[test]
    fn test_remove_trailing_commas() {
        assert_eq!(remove_trailing_commas("{\"a\": [1, 2,], }"), "{\"a\": [1, 2] }");
        assert_eq!(remove_trailing_commas("[1,\n  ]"), "[1\n  ]");
        assert_eq!(remove_trailing_commas("[1,,]"), "[1]");
    }

    #[test]
    fn test_remove_trailing_commas_keeps_string_contents() {
        let text = "{\"a\": \"x,}\", \"b\": \"[y, ]\"}";
        assert_eq!(remove_trailing_commas(text), text);
    }

    #[test]
    fn test_repairs_compose_into_valid_json() {
        let raw = "{\"checklist\": [\"Book\ntickets\",],}";
        let fixed = remove_trailing_commas(&escape_control_chars_in_strings(raw));
        let value: serde_json::Value = serde_json::from_str(&fixed).unwrap();
        assert_eq!(value["checklist"][0], "Book\ntickets");
    }

    /// Writes a JSON object literal by hand, leaving control characters raw
    fn raw_object(map: &BTreeMap<String, String>) -> String {
        let fields: Vec<String> = map
            .iter()
            .map(|(k, v)| {
                let body: String = v
                    .chars()
                    .map(|c| match c {
                        '"' => "\\\"".to_string(),
                        '\\' => "\\\\".to_string(),
                        other => other.to_string(),
                    })
                    .collect();
                format!("\"{}\": \"{}\"", k, body)
            })
            .collect();
        format!("{{\n  {}\n}}", fields.join(",\n  "))
    }

    proptest! {
        #[test]
        fn prop_escape_is_identity_on_valid_json(map in prop::collection::btree_map("[a-z]{1,6}", any::<String>(), 0..5)) {
            let text = serde_json::to_string_pretty(&map).unwrap();
            prop_assert_eq!(escape_control_chars_in_strings(&text), text);
        }

        #[test]
        fn prop_escape_recovers_raw_strings(map in prop::collection::btree_map("[a-z]{1,6}", "[^\r]{0,30}", 0..5)) {
            let raw = raw_object(&map);
            let fixed = escape_control_chars_in_strings(&raw);
            let parsed: BTreeMap<String, String> = serde_json::from_str(&fixed).unwrap();
            prop_assert_eq!(parsed, map);
        }

        #[test]
        fn prop_escape_is_idempotent(text in any::<String>()) {
            let once = escape_control_chars_in_strings(&text);
            prop_assert_eq!(escape_control_chars_in_strings(&once), once.clone());
        }

        #[test]
        fn prop_trailing_comma_removal_is_idempotent(text in any::<String>()) {
            let once = remove_trailing_commas(&text);
            prop_assert_eq!(remove_trailing_commas(&once), once.clone());
        }

        #[test]
        fn prop_trailing_comma_removal_keeps_string_commas(map in prop::collection::btree_map("[a-z]{1,6}", "[ ,}\\]a-z]{0,12}", 0..5)) {
            let text = serde_json::to_string(&map).unwrap();
            prop_assert_eq!(remove_trailing_commas(&text), text);
        }
    }
}
