//! Cleaning of recognized text lines into candidate digit tokens.

use std::sync::LazyLock;

use regex::Regex;

/// Cleaned tokens shorter than this are treated as noise.
pub const MIN_TOKEN_LEN: usize = 4;

static DIGIT_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+").unwrap());

/// An accepted line: the cleaned text and the digit runs found in it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub cleaned: String,
    pub digit_runs: Vec<String>,
}

/// Remove every character that is not a letter or a number.
pub fn clean(text: &str) -> String {
    text.chars().filter(|c| c.is_alphanumeric()).collect()
}

/// Maximal runs of decimal digits, in order of appearance.
pub fn digit_runs(text: &str) -> Vec<String> {
    DIGIT_RUN
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Normalize one recognized line.
///
/// Returns `None` when the line is noise: fewer than [`MIN_TOKEN_LEN`]
/// characters survive cleaning, or no digits survive at all.
pub fn normalize(line: &str) -> Option<Token> {
    let cleaned = clean(line);
    if cleaned.chars().count() < MIN_TOKEN_LEN {
        return None;
    }

    let digit_runs = digit_runs(&cleaned);
    if digit_runs.is_empty() {
        return None;
    }

    Some(Token {
        cleaned,
        digit_runs,
    })
}

/// Digit runs of a reference value, with spaces removed first.
pub fn reference_runs(reference: &str) -> Vec<String> {
    let compact: String = reference.chars().filter(|c| *c != ' ').collect();
    digit_runs(&compact)
}
