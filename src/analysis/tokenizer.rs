//! Tokenizers split raw field text into tokens.
//!
//! # Examples
//!
//! ```
//! use crease::analysis::tokenizer::Tokenizer;
//! use crease::analysis::tokenizer::alphanumeric::AlphanumericTokenizer;
//!
//! let tokenizer = AlphanumericTokenizer::new();
//! let tokens: Vec<_> = tokenizer.tokenize("FOUR! Driven, through covers").unwrap().collect();
//! assert_eq!(tokens.len(), 4);
//! assert_eq!(tokens[0].text, "FOUR");
//! ```

use crate::analysis::token::TokenStream;
use crate::error::Result;

/// Trait for tokenizers that convert text into tokens.
///
/// Tokenizers are shared across the assembly thread pool, hence `Send + Sync`.
pub trait Tokenizer: Send + Sync {
    /// Tokenize the given text into a stream of tokens.
    fn tokenize(&self, text: &str) -> Result<TokenStream>;

    /// Get the name of this tokenizer (for debugging and configuration).
    fn name(&self) -> &'static str;
}

pub mod alphanumeric;
