//! Tokenizer that splits on non-alphanumeric boundaries.

use std::sync::{Arc, LazyLock};

use regex::Regex;

use super::Tokenizer;
use crate::analysis::token::{Token, TokenStream};
use crate::error::{CreaseError, Result};

/// Runs of Unicode letters and digits, i.e. what `char::is_alphanumeric` accepts.
const ALPHANUMERIC_PATTERN: &str = r"[\p{Alphabetic}\p{N}]+";

static ALPHANUMERIC_REGEX: LazyLock<Arc<Regex>> = LazyLock::new(|| {
    Arc::new(Regex::new(ALPHANUMERIC_PATTERN).expect("Alphanumeric pattern should be valid"))
});

/// A tokenizer that emits maximal runs of alphanumeric characters.
///
/// Everything else (whitespace, punctuation, symbols) is a boundary, so
/// `"c Kohli b Bumrah 45(32)"` becomes `c`, `Kohli`, `b`, `Bumrah`, `45`, `32`.
#[derive(Clone, Debug)]
pub struct AlphanumericTokenizer {
    pattern: Arc<Regex>,
}

impl AlphanumericTokenizer {
    /// Create a tokenizer with the default alphanumeric pattern.
    pub fn new() -> Self {
        AlphanumericTokenizer {
            pattern: Arc::clone(&ALPHANUMERIC_REGEX),
        }
    }

    /// Create a tokenizer that emits matches of a custom pattern instead.
    pub fn with_pattern(pattern: &str) -> Result<Self> {
        let regex = Regex::new(pattern)
            .map_err(|e| CreaseError::invalid_config(format!("Invalid token pattern: {e}")))?;

        Ok(AlphanumericTokenizer {
            pattern: Arc::new(regex),
        })
    }
}

impl Default for AlphanumericTokenizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Tokenizer for AlphanumericTokenizer {
    fn tokenize(&self, text: &str) -> Result<TokenStream> {
        let tokens: Vec<Token> = self
            .pattern
            .find_iter(text)
            .enumerate()
            .map(|(position, mat)| {
                Token::with_offsets(mat.as_str(), position, mat.start(), mat.end())
            })
            .collect();

        Ok(Box::new(tokens.into_iter()))
    }

    fn name(&self) -> &'static str {
        "alphanumeric"
    }
}
