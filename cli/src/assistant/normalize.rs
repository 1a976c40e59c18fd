//! # Prompt Normalization
//!
//! File: cli/src/assistant/normalize.rs
//!
//! Lowercases and trims a raw prompt and splits it on runs of whitespace.
//! The original-case tokens are kept alongside (same positions) so a city
//! extracted from them keeps the user's capitalisation.

/// A prompt after normalization. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedPrompt {
    /// Lowercase, trimmed text.
    pub text: String,
    /// `text` split on one or more whitespace characters.
    pub tokens: Vec<String>,
    /// The trimmed original prompt split the same way.
    pub original_tokens: Vec<String>,
}

impl NormalizedPrompt {
    pub fn new(raw: &str) -> Self {
        let trimmed = raw.trim();
        let text = trimmed.to_lowercase();
        let tokens = text.split_whitespace().map(str::to_string).collect();
        let original_tokens = trimmed.split_whitespace().map(str::to_string).collect();
        Self {
            text,
            tokens,
            original_tokens,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lowercases_trims_and_tokenizes() {
        let prompt = NormalizedPrompt::new("  Weather \t in\n  New   York ");
        assert_eq!(prompt.text, "weather \t in\n  new   york");
        assert_eq!(prompt.tokens, vec!["weather", "in", "new", "york"]);
        assert_eq!(prompt.original_tokens, vec!["Weather", "in", "New", "York"]);
    }

    #[test]
    fn test_whitespace_only_is_empty() {
        let prompt = NormalizedPrompt::new(" \n\t ");
        assert!(prompt.is_empty());
        assert_eq!(prompt.text, "");
        assert!(prompt.original_tokens.is_empty());
    }
}
