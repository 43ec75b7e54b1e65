//! Text analysis: turning raw field text into normalized terms.
//!
//! The pipeline is a [`tokenizer::Tokenizer`] followed by
//! [`token_filter::Filter`]s, wrapped in an [`analyzer::Analyzer`].
//! [`normalize`] is the shortcut used when the default configuration is enough.
//!
//! ```
//! use crease::analysis::normalize;
//!
//! assert_eq!(normalize("Six runs, FOUR!"), vec!["six", "runs", "four"]);
//! assert!(normalize("   ").is_empty());
//! ```

use std::sync::LazyLock;

use serde::{Deserialize, Serialize};

use crate::analysis::analyzer::Analyzer;
use crate::analysis::analyzer::standard::StandardAnalyzer;
use crate::analysis::token_filter::stop::ENGLISH_STOP_WORDS;

pub mod analyzer;
pub mod token;
pub mod token_filter;
pub mod tokenizer;

/// Normalization settings shared by every textual field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Words removed after lowercasing. `None` disables stop word removal.
    pub stop_words: Option<Vec<String>>,

    /// Minimum token length in characters.
    pub min_token_len: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        AnalysisConfig {
            stop_words: None,
            min_token_len: 1,
        }
    }
}

impl AnalysisConfig {
    /// Enable the built-in English stop word list.
    pub fn with_english_stop_words(mut self) -> Self {
        self.stop_words = Some(ENGLISH_STOP_WORDS.iter().map(|w| w.to_string()).collect());
        self
    }
}

static DEFAULT_ANALYZER: LazyLock<StandardAnalyzer> = LazyLock::new(StandardAnalyzer::new);

/// Normalize raw text with the default analyzer.
///
/// Total: empty, blank, or punctuation-only input yields no terms.
pub fn normalize(raw: &str) -> Vec<String> {
    // The built-in tokenizer and filters never fail.
    DEFAULT_ANALYZER.terms(raw).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("four runs"), vec!["four", "runs"]);
        assert_eq!(normalize("six runs four"), vec!["six", "runs", "four"]);
        assert_eq!(
            normalize("Kohli to Bumrah, OUT! Caught at long-on."),
            vec!["kohli", "to", "bumrah", "out", "caught", "at", "long", "on"]
        );
    }

    #[test]
    fn test_normalize_is_total() {
        assert!(normalize("").is_empty());
        assert!(normalize(" \t\r\n ").is_empty());
        assert!(normalize("--- !!! ...").is_empty());
    }

    #[test]
    fn test_normalize_is_deterministic() {
        let text = "1st over: Starc to Rohit, no run, 145.2kph";
        assert_eq!(normalize(text), normalize(text));
    }

    #[test]
    fn test_config_serde_defaults() {
        let config: AnalysisConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, AnalysisConfig::default());

        let config: AnalysisConfig =
            serde_json::from_str(r#"{"stop_words": ["the"], "min_token_len": 2}"#).unwrap();
        assert_eq!(config.stop_words, Some(vec!["the".to_string()]));
        assert_eq!(config.min_token_len, 2);
    }
}
