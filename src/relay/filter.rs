//! Disallowed-term filtering.
//!
//! Terms match case-insensitively and only as whole words, so a term never
//! blocks a longer word that merely contains it.

use std::path::Path;

use fancy_regex::Regex;
use tracing::warn;

use crate::common::error::ConfigError;
use crate::common::persist::read_required_json;

/// Message filter that checks text against a set of disallowed terms.
#[derive(Debug, Clone)]
pub struct ContentFilter {
    terms: Vec<CompiledTerm>,
}

/// A compiled term with its original string for debugging.
#[derive(Debug, Clone)]
struct CompiledTerm {
    original: String,
    regex: Regex,
}

impl ContentFilter {
    /// Create a filter from raw terms. Blank or uncompilable terms are logged and skipped.
    pub fn new<I, S>(terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            terms: terms
                .into_iter()
                .filter_map(|term| compile_term(term.as_ref()))
                .collect(),
        }
    }

    /// Create an empty filter that allows all messages.
    pub fn empty() -> Self {
        Self { terms: Vec::new() }
    }

    /// Load terms from a JSON array document. The file must exist.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let terms: Vec<String> = read_required_json(path)?;
        Ok(Self::new(terms))
    }

    /// Returns `true` if the text contains any disallowed term.
    ///
    /// Empty or absent text is never blocked.
    pub fn is_blocked(&self, text: Option<&str>) -> bool {
        let text = match text {
            Some(text) if !text.is_empty() => text,
            _ => return false,
        };

        self.terms.iter().any(|t| {
            t.regex.is_match(text).unwrap_or_else(|e| {
                warn!("Regex match error for term '{}': {}", t.original, e);
                false
            })
        })
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

fn compile_term(term: &str) -> Option<CompiledTerm> {
    let trimmed = term.trim();
    if trimmed.is_empty() {
        warn!("Skipping blank disallowed term");
        return None;
    }

    let pattern = format!(r"(?i)\b{}\b", fancy_regex::escape(trimmed));
    match Regex::new(&pattern) {
        Ok(regex) => Some(CompiledTerm {
            original: trimmed.to_string(),
            regex,
        }),
        Err(e) => {
            warn!("Invalid disallowed term '{}': {}", trimmed, e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_filter_allows_all() {
        let filter = ContentFilter::empty();
        assert!(!filter.is_blocked(Some("any message")));
    }

    #[test]
    fn test_whole_word_match() {
        let filter = ContentFilter::new(["hate"]);
        assert!(filter.is_blocked(Some("I hate this")));
        assert!(!filter.is_blocked(Some("hateful")));
        assert!(!filter.is_blocked(Some("whatever")));
    }

    #[test]
    fn test_case_insensitive() {
        let filter = ContentFilter::new(["Scam"]);
        assert!(filter.is_blocked(Some("this is a SCAM")));
        assert!(filter.is_blocked(Some("scam!")));
        assert!(filter.is_blocked(Some("Scam")));
    }

    #[test]
    fn test_punctuation_is_a_boundary() {
        let filter = ContentFilter::new(["spam"]);
        assert!(filter.is_blocked(Some("no-spam, please")));
        assert!(filter.is_blocked(Some("(spam)")));
        assert!(!filter.is_blocked(Some("spammer")));
    }

    #[test]
    fn test_regex_metacharacters_are_literal() {
        let filter = ContentFilter::new(["a.b"]);
        assert!(filter.is_blocked(Some("see a.b here")));
        assert!(!filter.is_blocked(Some("see axb here")));
    }

    #[test]
    fn test_multi_word_term() {
        let filter = ContentFilter::new(["pump and dump"]);
        assert!(filter.is_blocked(Some("classic Pump and Dump scheme")));
        assert!(!filter.is_blocked(Some("pump and dumping")));
    }

    #[test]
    fn test_empty_or_absent_text_never_blocked() {
        let filter = ContentFilter::new(["hate"]);
        assert!(!filter.is_blocked(None));
        assert!(!filter.is_blocked(Some("")));
    }

    #[test]
    fn test_blank_terms_skipped() {
        let filter = ContentFilter::new(["", "   ", "ok"]);
        assert_eq!(filter.len(), 1);
        assert!(!filter.is_blocked(Some("just some words")));
    }

    #[test]
    fn test_load_from_json_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("terms.json");
        std::fs::write(&path, r#"["hate", "scam"]"#).unwrap();

        let filter = ContentFilter::load(&path).unwrap();
        assert_eq!(filter.len(), 2);
        assert!(filter.is_blocked(Some("total scam")));

        assert!(ContentFilter::load(&dir.path().join("missing.json")).is_err());
    }
}
