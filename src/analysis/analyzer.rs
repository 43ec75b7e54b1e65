//! Analyzers combine a tokenizer with a chain of filters.

use crate::analysis::token::TokenStream;
use crate::error::Result;

/// Trait for analyzers that turn field text into a filtered token stream.
pub trait Analyzer: Send + Sync {
    /// Analyze the given text.
    fn analyze(&self, text: &str) -> Result<TokenStream>;

    /// Get the name of this analyzer (for debugging and configuration).
    fn name(&self) -> &'static str;

    /// Analyze the text and collect the surviving token texts in order.
    fn terms(&self, text: &str) -> Result<Vec<String>> {
        Ok(self.analyze(text)?.map(|token| token.text).collect())
    }
}

pub mod pipeline;
pub mod standard;
