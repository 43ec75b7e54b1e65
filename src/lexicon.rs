//! The lexicon: every distinct term with its dense id and document frequency.
//!
//! Term ids are assigned from 0 in first-seen order over documents ingested in
//! id order, so the same input always yields the same ids. Ids are only
//! meaningful within one build.
//!
//! ```
//! use crease::lexicon::builder::LexiconBuilder;
//! # use crease::document::Document;
//! # fn doc(id: u64, text: &str) -> Document {
//! #     Document { id, fields: vec![], terms: crease::analysis::normalize(text),
//! #                stored: Default::default(), snippet: String::new() }
//! # }
//!
//! # fn main() -> crease::error::Result<()> {
//! let mut builder = LexiconBuilder::new();
//! builder.ingest(&doc(0, "four runs"))?;
//! builder.ingest(&doc(1, "six runs four"))?;
//! let lexicon = builder.finalize();
//!
//! assert_eq!(lexicon.term_id("four"), Some(0));
//! assert_eq!(lexicon.term_id("six"), Some(2));
//! assert_eq!(lexicon.get("runs").map(|e| e.doc_frequency), Some(2));
//! # Ok(())
//! # }
//! ```

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::error::{CreaseError, Result};
use crate::storage::Storage;
use crate::storage::structured::{read_artifact, write_artifact};

pub mod builder;

/// Artifact file name.
pub const LEXICON_FILE: &str = "lexicon.dat";

const MAGIC: &[u8; 4] = b"CRLX";
const VERSION: u32 = 1;

/// One lexicon entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LexiconEntry {
    pub term: String,
    pub term_id: u32,
    /// Number of documents containing the term at least once.
    pub doc_frequency: u32,
}

/// A finalized, read-only lexicon.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Lexicon {
    /// Indexed by term id.
    entries: Vec<LexiconEntry>,
    ids: AHashMap<String, u32>,
    doc_count: u64,
}

impl Lexicon {
    pub(crate) fn from_parts(entries: Vec<LexiconEntry>, doc_count: u64) -> Result<Self> {
        let mut ids = AHashMap::with_capacity(entries.len());
        for (position, entry) in entries.iter().enumerate() {
            if entry.term_id as usize != position {
                return Err(CreaseError::serialization(format!(
                    "Term `{}` has id {} at position {position}",
                    entry.term, entry.term_id
                )));
            }
            if ids.insert(entry.term.clone(), entry.term_id).is_some() {
                return Err(CreaseError::serialization(format!(
                    "Duplicate term `{}` in lexicon",
                    entry.term
                )));
            }
        }

        Ok(Lexicon {
            entries,
            ids,
            doc_count,
        })
    }

    /// Look up a term's id.
    pub fn term_id(&self, term: &str) -> Option<u32> {
        self.ids.get(term).copied()
    }

    /// Look up a term's id, failing with [`CreaseError::UnknownTerm`].
    pub fn require_term_id(&self, term: &str) -> Result<u32> {
        self.term_id(term)
            .ok_or_else(|| CreaseError::unknown_term(format!("`{term}` is not in the lexicon")))
    }

    /// Look up an entry by term id.
    pub fn entry(&self, term_id: u32) -> Option<&LexiconEntry> {
        self.entries.get(term_id as usize)
    }

    /// Look up an entry by term.
    pub fn get(&self, term: &str) -> Option<&LexiconEntry> {
        self.term_id(term).and_then(|id| self.entry(id))
    }

    pub fn contains_id(&self, term_id: u32) -> bool {
        (term_id as usize) < self.entries.len()
    }

    /// Number of distinct terms.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of documents the lexicon was built from.
    pub fn doc_count(&self) -> u64 {
        self.doc_count
    }

    /// Entries in term id order.
    pub fn iter(&self) -> impl Iterator<Item = &LexiconEntry> {
        self.entries.iter()
    }

    /// Write `lexicon.dat` atomically.
    pub fn save(&self, storage: &dyn Storage) -> Result<u64> {
        write_artifact(storage, LEXICON_FILE, MAGIC, VERSION, |writer| {
            writer.write_u64(self.doc_count)?;
            writer.write_varint(self.entries.len() as u64)?;
            for entry in &self.entries {
                writer.write_string(&entry.term)?;
                writer.write_varint(entry.doc_frequency as u64)?;
            }
            Ok(())
        })
    }

    /// Read `lexicon.dat`.
    pub fn load(storage: &dyn Storage) -> Result<Self> {
        let (entries, doc_count) =
            read_artifact(storage, LEXICON_FILE, MAGIC, VERSION, |reader| {
                let doc_count = reader.read_u64()?;
                let count = reader.read_length()?;
                let mut entries = Vec::with_capacity(count);
                for term_id in 0..count {
                    let term = reader.read_string()?;
                    let doc_frequency = reader.read_varint_u32()?;
                    entries.push(LexiconEntry {
                        term,
                        term_id: term_id as u32,
                        doc_frequency,
                    });
                }
                Ok((entries, doc_count))
            })?;

        Self::from_parts(entries, doc_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::memory::MemoryStorage;

    fn entry(term: &str, term_id: u32, doc_frequency: u32) -> LexiconEntry {
        LexiconEntry {
            term: term.to_string(),
            term_id,
            doc_frequency,
        }
    }

    fn lexicon() -> Lexicon {
        Lexicon::from_parts(
            vec![entry("four", 0, 2), entry("runs", 1, 2), entry("six", 2, 1)],
            2,
        )
        .unwrap()
    }

    #[test]
    fn test_lookups() {
        let lexicon = lexicon();

        assert_eq!(lexicon.len(), 3);
        assert_eq!(lexicon.term_id("runs"), Some(1));
        assert_eq!(lexicon.entry(2).unwrap().term, "six");
        assert_eq!(lexicon.get("four").unwrap().doc_frequency, 2);
        assert!(lexicon.get("wicket").is_none());
        assert!(lexicon.entry(3).is_none());
        assert!(lexicon.contains_id(2));
        assert!(!lexicon.contains_id(3));
        assert!(matches!(
            lexicon.require_term_id("wicket"),
            Err(CreaseError::UnknownTerm(_))
        ));
    }

    #[test]
    fn test_save_and_load() {
        let storage = MemoryStorage::default();
        let lexicon = lexicon();

        lexicon.save(&storage).unwrap();
        let loaded = Lexicon::load(&storage).unwrap();

        assert_eq!(loaded, lexicon);
        assert_eq!(loaded.doc_count(), 2);
        let terms: Vec<_> = loaded.iter().map(|e| e.term.as_str()).collect();
        assert_eq!(terms, vec!["four", "runs", "six"]);
    }

    #[test]
    fn test_from_parts_rejects_inconsistent_entries() {
        let duplicate = Lexicon::from_parts(vec![entry("four", 0, 1), entry("four", 1, 1)], 1);
        assert!(matches!(duplicate, Err(CreaseError::Serialization(_))));

        let gap = Lexicon::from_parts(vec![entry("four", 1, 1)], 1);
        assert!(gap.is_err());
    }
}
