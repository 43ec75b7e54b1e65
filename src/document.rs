//! Records and documents.
//!
//! A [`record::RawRecord`] is one row of input as named, possibly-null
//! strings. The [`assembler::DocumentAssembler`] turns it into a
//! [`Document`]: a stable id plus the ordered normalized terms of every
//! textual field in [`schema::RecordSchema`] order.
//!
//! # Core Components
//!
//! - [`record::RawRecord`] - One input row
//! - [`schema::RecordSchema`] - Which fields exist, which are textual, which are required
//! - [`assembler::DocumentAssembler`] - Record to document, serially or on a thread pool
//! - [`csv::CsvRecordSource`] - Reads records from a CSV file with a header row
//! - [`store::DocumentStore`] - Persisted stored fields and snippets, keyed by doc id

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub mod assembler;
pub mod csv;
pub mod record;
pub mod schema;
pub mod store;

/// Maximum number of characters kept as a document's snippet.
pub const SNIPPET_CHARS: usize = 200;

/// One assembled document.
///
/// Immutable once assembled. `id` is the record's position in the input
/// stream, so ids are monotonic and never reused; a skipped record leaves a gap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// Stable numeric id.
    pub id: u64,

    /// Raw values of the textual fields, in schema order (null as empty).
    pub fields: Vec<String>,

    /// Normalized terms of all textual fields, concatenated in schema order.
    pub terms: Vec<String>,

    /// Values of stored fields, for display.
    pub stored: BTreeMap<String, String>,

    /// The first characters of the joined textual fields.
    pub snippet: String,
}

impl Document {
    /// Number of term occurrences.
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Distinct terms in first-occurrence order.
    pub fn distinct_terms(&self) -> Vec<&str> {
        let mut seen = ahash::AHashSet::with_capacity(self.terms.len());
        self.terms
            .iter()
            .map(String::as_str)
            .filter(|term| seen.insert(*term))
            .collect()
    }
}

/// Truncate text to at most [`SNIPPET_CHARS`] characters.
pub fn snippet_of(text: &str) -> String {
    match text.char_indices().nth(SNIPPET_CHARS) {
        Some((end, _)) => text[..end].to_string(),
        None => text.to_string(),
    }
}
