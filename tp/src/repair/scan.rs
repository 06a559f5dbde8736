//! Brace scanning over untrusted reply text
//!
//! Everything here works on `&str` slices and never allocates. Structural
//! characters inside string literals are ignored through [`ScanState`].

use tracing::debug;

/// Where the scanner is relative to JSON string literals
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    /// Outside any string: braces are structural
    Normal,
    /// Inside a string literal
    InString,
    /// Inside a string, right after a backslash
    InStringEscape,
}

impl ScanState {
    /// Advance over one character
    pub fn step(self, ch: char) -> ScanState {
        match (self, ch) {
            (ScanState::Normal, '"') => ScanState::InString,
            (ScanState::Normal, _) => ScanState::Normal,
            (ScanState::InString, '\\') => ScanState::InStringEscape,
            (ScanState::InString, '"') => ScanState::Normal,
            (ScanState::InString, _) => ScanState::InString,
            (ScanState::InStringEscape, _) => ScanState::InString,
        }
    }

    pub fn in_string(self) -> bool {
        !matches!(self, ScanState::Normal)
    }
}

/// Drop surrounding markdown code fences
///
/// Trims, removes a leading "```json" and then a leading "```", removes a
/// trailing "```", and trims again.
pub fn strip_code_fences(text: &str) -> &str {
    let mut cleaned = text.trim();
    if let Some(rest) = cleaned.strip_prefix("```json") {
        cleaned = rest;
    }
    if let Some(rest) = cleaned.strip_prefix("```") {
        cleaned = rest;
    }
    if let Some(rest) = cleaned.strip_suffix("```") {
        cleaned = rest;
    }
    cleaned.trim()
}

/// Find the first depth-balanced `{...}` object, starting at the first `{`
///
/// Returns `None` when the text has no `{` or the object never closes.
pub fn find_first_complete_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;

    let mut state = ScanState::Normal;
    let mut depth: usize = 0;

    for (offset, ch) in text[start..].char_indices() {
        let was_in_string = state.in_string();
        state = state.step(ch);
        if was_in_string {
            continue;
        }
        match ch {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    let end = start + offset + ch.len_utf8();
                    return Some(text[start..end].trim());
                }
            }
            _ => {}
        }
    }

    debug!(start, "find_first_complete_object: object never closes");
    None
}

/// Take everything between the first `{` and the last `}`
///
/// No balancing is attempted; use only when [`find_first_complete_object`]
/// found nothing.
pub fn extract_loose_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end <= start {
        return None;
    }
    Some(text[start..=end].trim())
}

/// A `{` exists but no balanced object does
pub fn is_likely_truncated(text: &str) -> bool {
    text.contains('{') && find_first_complete_object(text).is_none()
}
