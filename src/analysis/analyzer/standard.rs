//! The analyzer used for every textual record field.

use std::sync::Arc;

use crate::analysis::AnalysisConfig;
use crate::analysis::analyzer::Analyzer;
use crate::analysis::analyzer::pipeline::PipelineAnalyzer;
use crate::analysis::token::TokenStream;
use crate::analysis::token_filter::length::LengthFilter;
use crate::analysis::token_filter::lowercase::LowercaseFilter;
use crate::analysis::token_filter::remove_empty::RemoveEmptyFilter;
use crate::analysis::token_filter::stop::StopFilter;
use crate::analysis::token_filter::strip::StripFilter;
use crate::analysis::tokenizer::alphanumeric::AlphanumericTokenizer;
use crate::error::Result;

/// Alphanumeric tokenization, lowercasing, punctuation stripping, optional
/// stop words and minimum length, and removal of empty tokens.
///
/// # Examples
///
/// ```
/// use crease::analysis::analyzer::Analyzer;
/// use crease::analysis::analyzer::standard::StandardAnalyzer;
///
/// let analyzer = StandardAnalyzer::new();
/// assert_eq!(analyzer.terms("Six runs, FOUR!").unwrap(), vec!["six", "runs", "four"]);
/// ```
#[derive(Clone, Debug)]
pub struct StandardAnalyzer {
    inner: PipelineAnalyzer,
}

impl StandardAnalyzer {
    /// Create an analyzer with the default configuration.
    pub fn new() -> Self {
        Self::from_config(&AnalysisConfig::default())
    }

    /// Create an analyzer from an [`AnalysisConfig`].
    pub fn from_config(config: &AnalysisConfig) -> Self {
        let mut analyzer = PipelineAnalyzer::new(Arc::new(AlphanumericTokenizer::new()))
            .add_filter(Arc::new(LowercaseFilter::new()))
            .add_filter(Arc::new(StripFilter::new()));

        if let Some(words) = &config.stop_words {
            let lowered = words.iter().map(|w| w.to_lowercase());
            analyzer = analyzer.add_filter(Arc::new(StopFilter::from_words(lowered)));
        }

        if config.min_token_len > 1 {
            analyzer = analyzer.add_filter(Arc::new(LengthFilter::new(config.min_token_len)));
        }

        let inner = analyzer
            .add_filter(Arc::new(RemoveEmptyFilter::new()))
            .with_name("standard");

        StandardAnalyzer { inner }
    }

    pub fn inner(&self) -> &PipelineAnalyzer {
        &self.inner
    }
}

impl Default for StandardAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl Analyzer for StandardAnalyzer {
    fn analyze(&self, text: &str) -> Result<TokenStream> {
        self.inner.analyze(text)
    }

    fn name(&self) -> &'static str {
        "standard"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_analyzer() {
        let analyzer = StandardAnalyzer::new();

        let terms = analyzer.terms("Hello the World, and TEST").unwrap();
        assert_eq!(terms, vec!["hello", "the", "world", "and", "test"]);
    }

    #[test]
    fn test_positions_follow_input_order() {
        let analyzer = StandardAnalyzer::new();
        let positions: Vec<usize> = analyzer
            .analyze("six runs four")
            .unwrap()
            .map(|t| t.position)
            .collect();
        assert_eq!(positions, vec![0, 1, 2]);
    }

    #[test]
    fn test_with_stop_words() {
        let analyzer = StandardAnalyzer::from_config(&AnalysisConfig::default().with_english_stop_words());

        let terms = analyzer.terms("Edged to the keeper").unwrap();
        assert_eq!(terms, vec!["edged", "keeper"]);
    }

    #[test]
    fn test_min_token_len() {
        let config = AnalysisConfig {
            min_token_len: 2,
            ..AnalysisConfig::default()
        };
        let analyzer = StandardAnalyzer::from_config(&config);

        let terms = analyzer.terms("c Kohli b Bumrah 4").unwrap();
        assert_eq!(terms, vec!["kohli", "bumrah"]);
    }

    #[test]
    fn test_custom_stop_words_are_case_insensitive() {
        let config = AnalysisConfig {
            stop_words: Some(vec!["BALL".to_string()]),
            ..AnalysisConfig::default()
        };
        let analyzer = StandardAnalyzer::from_config(&config);

        assert_eq!(analyzer.terms("Ball bowled").unwrap(), vec!["bowled"]);
    }
}
