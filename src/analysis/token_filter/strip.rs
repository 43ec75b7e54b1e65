//! Strip filter implementation.

use super::Filter;
use crate::analysis::token::TokenStream;
use crate::error::Result;

/// A filter that strips leading and trailing non-alphanumeric characters.
///
/// A token left with no text is marked as stopped.
#[derive(Clone, Debug, Default)]
pub struct StripFilter;

impl StripFilter {
    /// Create a new strip filter.
    pub fn new() -> Self {
        StripFilter
    }
}

impl Filter for StripFilter {
    fn filter(&self, tokens: TokenStream) -> Result<TokenStream> {
        Ok(Box::new(tokens.map(|token| {
            if token.is_stopped() {
                return token;
            }

            let trimmed = token.text.trim_matches(|c: char| !c.is_alphanumeric());
            if trimmed.is_empty() {
                token.stop()
            } else if trimmed.len() == token.text.len() {
                token
            } else {
                let trimmed = trimmed.to_string();
                token.with_text(trimmed)
            }
        })))
    }

    fn name(&self) -> &'static str {
        "strip"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::token::Token;

    #[test]
    fn test_strip_filter() {
        let filter = StripFilter::new();
        let tokens = vec![
            Token::new("  (hello)  ", 0),
            Token::new("world", 1),
            Token::new("...", 2),
            Token::new("long-on!", 3),
        ];

        let result: Vec<Token> = filter.filter(Box::new(tokens.into_iter())).unwrap().collect();

        assert_eq!(result.len(), 4);
        assert_eq!(result[0].text, "hello");
        assert_eq!(result[1].text, "world");
        assert!(result[2].is_stopped());
        assert_eq!(result[3].text, "long-on");
    }

    #[test]
    fn test_filter_name() {
        assert_eq!(StripFilter::new().name(), "strip");
    }
}
