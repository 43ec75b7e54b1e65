//! Stop word filter implementation.

use std::collections::HashSet;
use std::sync::{Arc, LazyLock};

use crate::analysis::token::TokenStream;
use crate::analysis::token_filter::Filter;
use crate::error::Result;

/// A small English stop word list suited to ball-by-ball commentary.
pub const ENGLISH_STOP_WORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "by", "for", "from", "has", "he", "in", "is", "it",
    "its", "of", "on", "that", "the", "to", "was", "will", "with",
];

static ENGLISH_STOP_WORDS_SET: LazyLock<Arc<HashSet<String>>> = LazyLock::new(|| {
    Arc::new(
        ENGLISH_STOP_WORDS
            .iter()
            .map(|&s| s.to_string())
            .collect(),
    )
});

/// A filter that removes stop words.
///
/// Matching is exact, so place it after [`super::lowercase::LowercaseFilter`].
#[derive(Clone, Debug)]
pub struct StopFilter {
    stop_words: Arc<HashSet<String>>,
    remove_stopped: bool,
}

impl StopFilter {
    /// Create a stop filter with the built-in English list.
    pub fn english() -> Self {
        StopFilter {
            stop_words: Arc::clone(&ENGLISH_STOP_WORDS_SET),
            remove_stopped: true,
        }
    }

    /// Create a stop filter from a custom word list.
    pub fn from_words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        StopFilter {
            stop_words: Arc::new(words.into_iter().map(|s| s.into()).collect()),
            remove_stopped: true,
        }
    }

    /// Keep stop words in the stream, marked as stopped, instead of removing them.
    pub fn remove_stopped(mut self, remove: bool) -> Self {
        self.remove_stopped = remove;
        self
    }

    /// Check whether a word is on the list.
    pub fn is_stop_word(&self, word: &str) -> bool {
        self.stop_words.contains(word)
    }

    pub fn len(&self) -> usize {
        self.stop_words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stop_words.is_empty()
    }
}

impl Default for StopFilter {
    fn default() -> Self {
        Self::english()
    }
}

impl Filter for StopFilter {
    fn filter(&self, tokens: TokenStream) -> Result<TokenStream> {
        let filter = self.clone();
        Ok(Box::new(tokens.filter_map(move |token| {
            if token.is_stopped() || !filter.is_stop_word(&token.text) {
                Some(token)
            } else if filter.remove_stopped {
                None
            } else {
                Some(token.stop())
            }
        })))
    }

    fn name(&self) -> &'static str {
        "stop"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::token::Token;

    #[test]
    fn test_stop_filter() {
        let filter = StopFilter::from_words(vec!["the", "and", "or"]);
        let tokens = vec![
            Token::new("hello", 0),
            Token::new("the", 1),
            Token::new("world", 2),
            Token::new("and", 3),
            Token::new("test", 4),
        ];

        let result: Vec<Token> = filter.filter(Box::new(tokens.into_iter())).unwrap().collect();

        assert_eq!(result.len(), 3);
        assert_eq!(result[0].text, "hello");
        assert_eq!(result[1].text, "world");
        assert_eq!(result[2].text, "test");
    }

    #[test]
    fn test_stop_filter_preserve_stopped() {
        let filter = StopFilter::from_words(vec!["the"]).remove_stopped(false);
        let tokens = vec![Token::new("the", 0), Token::new("ball", 1)];

        let result: Vec<Token> = filter.filter(Box::new(tokens.into_iter())).unwrap().collect();

        assert_eq!(result.len(), 2);
        assert!(result[0].is_stopped());
        assert!(!result[1].is_stopped());
    }

    #[test]
    fn test_english_list() {
        let filter = StopFilter::english();
        assert!(filter.is_stop_word("the"));
        assert!(filter.is_stop_word("from"));
        assert!(!filter.is_stop_word("wicket"));
        assert_eq!(filter.len(), ENGLISH_STOP_WORDS.len());
    }
}
