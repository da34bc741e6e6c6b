//! Query validation for the conversational boundary.
//!
//! Rejections are user feedback, not errors: each carries its own message
//! and the query never reaches the retrieval pipeline.

use regex::Regex;

use qadesk_core::config::ChatConfig;

/// Why a query was rejected before retrieval.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryRejection {
    /// More words than the configured cap.
    TooLong { max_words: usize },
    /// Fewer characters than the configured minimum.
    TooShort,
    /// Only digits, whitespace, and number punctuation.
    NumbersOnly,
    /// No alphabetic characters at all.
    NoLetters,
}

impl QueryRejection {
    /// The message shown to the user.
    pub fn user_message(&self) -> String {
        match self {
            QueryRejection::TooLong { max_words } => format!(
                "Your question is too long. Please limit it to {} words.",
                max_words
            ),
            QueryRejection::TooShort => "Please ask a more specific question.".to_string(),
            QueryRejection::NumbersOnly => {
                "Your question appears to contain only numbers. Please ask a full question."
                    .to_string()
            }
            QueryRejection::NoLetters => {
                "Your question must contain letters. Please ask a valid question.".to_string()
            }
        }
    }
}

/// Validates query length and character content.
#[derive(Debug, Clone)]
pub struct QueryValidator {
    max_words: usize,
    min_chars: usize,
}

impl QueryValidator {
    pub fn new(max_words: usize, min_chars: usize) -> Self {
        Self {
            max_words,
            min_chars,
        }
    }

    pub fn from_config(config: &ChatConfig) -> Self {
        Self::new(config.max_query_words, config.min_query_chars)
    }

    /// Check a trimmed query. Checks run in order: length cap, minimum
    /// length, numbers-only, no-letters.
    pub fn validate(&self, query: &str) -> Result<(), QueryRejection> {
        if query.split_whitespace().count() > self.max_words {
            return Err(QueryRejection::TooLong {
                max_words: self.max_words,
            });
        }

        if query.chars().count() < self.min_chars {
            return Err(QueryRejection::TooShort);
        }

        if numbers_only_re().is_match(query) {
            return Err(QueryRejection::NumbersOnly);
        }

        if !has_letter_re().is_match(query) {
            return Err(QueryRejection::NoLetters);
        }

        Ok(())
    }
}

impl Default for QueryValidator {
    fn default() -> Self {
        Self::from_config(&ChatConfig::default())
    }
}

fn numbers_only_re() -> &'static Regex {
    use std::sync::OnceLock;
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[\d\s.,-]+$").expect("Invalid numbers-only regex"))
}

fn has_letter_re() -> &'static Regex {
    use std::sync::OnceLock;
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[a-zA-Z]").expect("Invalid has-letter regex"))
}
