// src/enrich/clean.rs
//! Markup stripping and prompt-size trimming.

use once_cell::sync::Lazy;
use regex::Regex;

// Tags must start with a letter (or `/`, `!--`), so "a < b and c > d" is left alone.
static RE_TAGS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<!--.*?-->|</?[A-Za-z][^<>]*>").expect("tag regex"));

/// Remove markup tags. Idempotent; plain text (no tags) is returned unchanged.
pub fn strip_markup(text: &str) -> String {
    let mut out = text.to_string();
    // Repeat until stable: removing one tag can splice a new one together ("<<b>p>").
    loop {
        let next = RE_TAGS.replace_all(&out, "").into_owned();
        if next == out {
            return out;
        }
        out = next;
    }
}

/// Cut to at most `max_chars` characters (not bytes).
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

/// Body text as it goes into a prompt: markup stripped, trimmed, capped.
pub fn prompt_excerpt(text: &str, max_chars: usize) -> String {
    truncate_chars(strip_markup(text).trim(), max_chars)
}
