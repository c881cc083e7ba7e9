//! Automatic session titles.
//!
//! A session's title is derived once from its first user message: the
//! first four whitespace-separated words with the leading character
//! upper-cased. No model call is involved.

use parley_types::chat::{NEW_CHAT_TITLE, UNTITLED};

/// Maximum number of words kept from the message.
const TITLE_WORDS: usize = 4;

/// Derive a short session title from raw message text.
///
/// Absent or blank text yields `"New Chat"`. Only the first character is
/// upper-cased; the rest keeps the casing of the source text. Words are
/// never cut and punctuation is kept.
pub fn make_title(text: Option<&str>) -> String {
    let words: Vec<&str> = text
        .unwrap_or_default()
        .split_whitespace()
        .take(TITLE_WORDS)
        .collect();

    if words.is_empty() {
        return NEW_CHAT_TITLE.to_string();
    }

    capitalize_first(&words.join(" "))
}

/// Whether a session with this current title should be auto-titled.
///
/// True only while the title is still the sentinel; missing sessions and
/// renamed sessions are left alone.
pub fn should_auto_title(current_title: Option<&str>) -> bool {
    current_title == Some(UNTITLED)
}

fn capitalize_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
