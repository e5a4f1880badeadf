//! Query and field normalization.
//!
//! Both query-time and scoring-time text goes through the same functions so
//! that tokens compare equal. Word characters follow the Unicode `\w` class
//! (letters, digits, marks, underscore); everything else separates tokens.

use std::collections::HashSet;
use std::sync::OnceLock;

use regex::Regex;

fn non_word() -> &'static Regex {
    static NON_WORD_RE: OnceLock<Regex> = OnceLock::new();
    NON_WORD_RE.get_or_init(|| Regex::new(r"\W+").expect("static pattern is valid"))
}

/// Lowercase, collapse every run of non-word characters to a single space,
/// and trim. Used as the query cache key.
pub fn normalize(text: &str) -> String {
    let lower = text.to_lowercase();
    non_word().replace_all(&lower, " ").trim().to_string()
}

/// Lowercase and split on runs of non-word characters, dropping empties.
pub fn tokenize(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    non_word()
        .split(&lower)
        .filter(|t| !t.is_empty())
        .map(String::from)
        .collect()
}

/// Tokenize into a set for membership tests.
pub fn token_set(text: &str) -> HashSet<String> {
    tokenize(text).into_iter().collect()
}
