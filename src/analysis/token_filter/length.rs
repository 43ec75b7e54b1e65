//! Length filter implementation.

use crate::analysis::token::TokenStream;
use crate::analysis::token_filter::Filter;
use crate::error::Result;

/// A filter that marks tokens outside a character-length range as stopped.
#[derive(Clone, Debug)]
pub struct LengthFilter {
    min: usize,
    max: Option<usize>,
}

impl LengthFilter {
    /// Keep tokens with at least `min` characters.
    pub fn new(min: usize) -> Self {
        LengthFilter { min, max: None }
    }

    /// Also stop tokens longer than `max` characters.
    pub fn with_max(mut self, max: usize) -> Self {
        self.max = Some(max);
        self
    }

    fn accepts(&self, len: usize) -> bool {
        len >= self.min && self.max.is_none_or(|max| len <= max)
    }
}

impl Filter for LengthFilter {
    fn filter(&self, tokens: TokenStream) -> Result<TokenStream> {
        let filter = self.clone();
        Ok(Box::new(tokens.map(move |token| {
            if token.is_stopped() || filter.accepts(token.char_len()) {
                token
            } else {
                token.stop()
            }
        })))
    }

    fn name(&self) -> &'static str {
        "length"
    }
}
