//! Lowercase filter implementation.

use crate::analysis::token::TokenStream;
use crate::analysis::token_filter::Filter;
use crate::error::Result;

/// A filter that converts tokens to lowercase.
///
/// Stopped tokens pass through unchanged.
#[derive(Clone, Debug, Default)]
pub struct LowercaseFilter;

impl LowercaseFilter {
    /// Create a new lowercase filter.
    pub fn new() -> Self {
        LowercaseFilter
    }
}

impl Filter for LowercaseFilter {
    fn filter(&self, tokens: TokenStream) -> Result<TokenStream> {
        Ok(Box::new(tokens.map(|token| {
            if token.is_stopped() || !token.text.chars().any(char::is_uppercase) {
                token
            } else {
                let lowered = token.text.to_lowercase();
                token.with_text(lowered)
            }
        })))
    }

    fn name(&self) -> &'static str {
        "lowercase"
    }
}
