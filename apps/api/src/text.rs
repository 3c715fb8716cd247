//! Small string helpers shared by the prompt and demo code.

/// Caps `text` at `max` characters, never splitting a character.
pub fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// "start – end", or whichever side is present.
pub fn period(start: &str, end: &str) -> String {
    match (start.trim(), end.trim()) {
        ("", "") => String::new(),
        (s, "") => s.to_string(),
        ("", e) => e.to_string(),
        (s, e) => format!("{s} – {e}"),
    }
}
