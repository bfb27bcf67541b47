//! Genre bag-of-words vocabulary.

use lazy_static::lazy_static;
use regex::Regex;
use serde::Deserialize;
use std::collections::HashMap;

lazy_static! {
    // Runs of two or more word characters; single-character tokens are ignored.
    static ref TOKEN_PATTERN: Regex = Regex::new(r"\b\w\w+\b").expect("Invalid token pattern");
}

/// Fixed, ordered token list produced at training time. The transform
/// lowercases a whitespace-joined document and counts the occurrences of each
/// vocabulary token; tokens outside the vocabulary are ignored.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GenreVocabulary {
    tokens: Vec<String>,
}

impl GenreVocabulary {
    pub fn new(tokens: Vec<String>) -> Self {
        GenreVocabulary { tokens }
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Occurrence count of each vocabulary token in `document`, in vocabulary
    /// order.
    pub fn transform(&self, document: &str) -> Vec<(&str, f64)> {
        let lowered = document.to_lowercase();
        let mut counts: HashMap<&str, f64> = HashMap::new();
        for token in TOKEN_PATTERN.find_iter(&lowered) {
            *counts.entry(token.as_str()).or_insert(0.0) += 1.0;
        }
        self.tokens
            .iter()
            .map(|token| {
                let count = counts.get(token.as_str()).copied().unwrap_or(0.0);
                (token.as_str(), count)
            })
            .collect()
    }
}
