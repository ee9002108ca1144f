//! Small text helpers shared by logging, prompts and persistence.

use std::sync::LazyLock;

use regex::Regex;

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Truncate to at most `max_chars` characters, appending `...` when cut.
pub fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() > max_chars {
        let mut cut: String = text.chars().take(max_chars).collect();
        cut.push_str("...");
        cut
    } else {
        text.to_string()
    }
}

/// Lowercased, whitespace-collapsed file-name fragment (`"Acme Corp"` → `"acme_corp"`).
pub fn slug(text: &str) -> String {
    WHITESPACE
        .replace_all(text.trim(), "_")
        .to_lowercase()
        .replace(['/', '\\'], "_")
}
