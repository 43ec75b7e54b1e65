//! Token filters transform token streams after tokenization.
//!
//! Filters may rewrite a token's text, mark it as stopped, or drop it.
//! [`remove_empty::RemoveEmptyFilter`] finally removes stopped and empty tokens,
//! so filters earlier in the chain can simply mark.

use crate::analysis::token::TokenStream;
use crate::error::Result;

/// Trait for filters that transform token streams.
///
/// # Examples
///
/// ```
/// use crease::analysis::token::Token;
/// use crease::analysis::token_filter::Filter;
/// use crease::analysis::token_filter::lowercase::LowercaseFilter;
///
/// let filter = LowercaseFilter::new();
/// let tokens = vec![Token::new("WICKET", 0)];
/// let result: Vec<_> = filter.filter(Box::new(tokens.into_iter())).unwrap().collect();
/// assert_eq!(result[0].text, "wicket");
/// ```
pub trait Filter: Send + Sync {
    /// Apply this filter to a token stream.
    fn filter(&self, tokens: TokenStream) -> Result<TokenStream>;

    /// Get the name of this filter (for debugging and configuration).
    fn name(&self) -> &'static str;
}

pub mod length;
pub mod lowercase;
pub mod remove_empty;
pub mod stop;
pub mod strip;
