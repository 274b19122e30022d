// src/utils/subject.rs

use std::sync::LazyLock;

use regex::Regex;

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Canonical subject labels. Imported or requested subjects matching one of
/// these case-insensitively are rewritten to the canonical spelling.
const KNOWN_SUBJECTS: &[&str] = &[
    "Polity",
    "Economy",
    "History",
    "Geography",
    "Environment",
    "Science & Tech",
    "Current Affairs",
];

/// Trims, collapses inner whitespace and applies the canonical casing for
/// known subjects. Unknown subjects keep their casing.
pub fn normalize_subject(raw: &str) -> String {
    let collapsed = WHITESPACE.replace_all(raw.trim(), " ");
    KNOWN_SUBJECTS
        .iter()
        .find(|known| known.eq_ignore_ascii_case(&collapsed))
        .map(|known| known.to_string())
        .unwrap_or_else(|| collapsed.into_owned())
}
