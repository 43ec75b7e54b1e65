//! Incremental lexicon construction.

use ahash::{AHashMap, AHashSet};
use log::debug;

use crate::document::Document;
use crate::error::{CreaseError, Result};
use crate::lexicon::{Lexicon, LexiconEntry};

/// Builds a [`Lexicon`] from documents ingested one at a time in id order.
#[derive(Debug, Default)]
pub struct LexiconBuilder {
    entries: Vec<LexiconEntry>,
    ids: AHashMap<String, u32>,
    last_doc_id: Option<u64>,
    doc_count: u64,
}

impl LexiconBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ingest one document.
    ///
    /// Each distinct term of the document either gets the next id with a
    /// document frequency of 1, or has its frequency raised by exactly 1.
    /// Documents must arrive in strictly ascending id order.
    pub fn ingest(&mut self, doc: &Document) -> Result<()> {
        if let Some(last) = self.last_doc_id {
            if doc.id <= last {
                return Err(CreaseError::incomplete_build(
                    format!("document id greater than {last}"),
                    format!("document id {}", doc.id),
                ));
            }
        }

        let mut seen = AHashSet::with_capacity(doc.terms.len());
        for term in &doc.terms {
            if !seen.insert(term.as_str()) {
                continue;
            }

            match self.ids.get(term.as_str()) {
                Some(&term_id) => {
                    let entry = &mut self.entries[term_id as usize];
                    entry.doc_frequency = entry.doc_frequency.checked_add(1).ok_or_else(|| {
                        CreaseError::other(format!("document frequency overflow for `{term}`"))
                    })?;
                }
                None => {
                    let term_id = u32::try_from(self.entries.len())
                        .map_err(|_| CreaseError::other("more than u32::MAX distinct terms"))?;
                    self.ids.insert(term.clone(), term_id);
                    self.entries.push(LexiconEntry {
                        term: term.clone(),
                        term_id,
                        doc_frequency: 1,
                    });
                }
            }
        }

        self.last_doc_id = Some(doc.id);
        self.doc_count += 1;
        Ok(())
    }

    /// Ingest documents in order.
    pub fn ingest_all<'a, I>(&mut self, docs: I) -> Result<()>
    where
        I: IntoIterator<Item = &'a Document>,
    {
        for doc in docs {
            self.ingest(doc)?;
        }
        Ok(())
    }

    /// Number of distinct terms so far.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Freeze into a read-only [`Lexicon`].
    pub fn finalize(self) -> Lexicon {
        debug!(
            "Finalizing lexicon: {} terms from {} documents",
            self.entries.len(),
            self.doc_count
        );
        Lexicon {
            entries: self.entries,
            ids: self.ids,
            doc_count: self.doc_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn doc(id: u64, terms: &[&str]) -> Document {
        Document {
            id,
            fields: vec![],
            terms: terms.iter().map(|t| t.to_string()).collect(),
            stored: BTreeMap::new(),
            snippet: String::new(),
        }
    }

    #[test]
    fn test_first_seen_ids_and_doc_frequency() {
        let mut builder = LexiconBuilder::new();
        builder.ingest(&doc(0, &["four", "runs"])).unwrap();
        builder.ingest(&doc(1, &["six", "runs", "four"])).unwrap();
        let lexicon = builder.finalize();

        let entries: Vec<_> = lexicon
            .iter()
            .map(|e| (e.term.as_str(), e.term_id, e.doc_frequency))
            .collect();
        assert_eq!(
            entries,
            vec![("four", 0, 2), ("runs", 1, 2), ("six", 2, 1)]
        );
        assert_eq!(lexicon.doc_count(), 2);
    }

    #[test]
    fn test_repeats_count_once_per_document() {
        let mut builder = LexiconBuilder::new();
        builder.ingest(&doc(0, &["four", "four", "four"])).unwrap();
        builder.ingest(&doc(1, &["four"])).unwrap();
        let lexicon = builder.finalize();

        assert_eq!(lexicon.len(), 1);
        assert_eq!(lexicon.get("four").unwrap().doc_frequency, 2);
    }

    #[test]
    fn test_empty_documents_count_but_add_nothing() {
        let mut builder = LexiconBuilder::new();
        builder.ingest(&doc(0, &[])).unwrap();
        builder.ingest(&doc(5, &["dot"])).unwrap();
        assert_eq!(builder.len(), 1);

        let lexicon = builder.finalize();
        assert_eq!(lexicon.doc_count(), 2);
    }

    #[test]
    fn test_out_of_order_ingest_rejected() {
        let mut builder = LexiconBuilder::new();
        builder.ingest(&doc(3, &["four"])).unwrap();

        assert!(matches!(
            builder.ingest(&doc(3, &["six"])),
            Err(CreaseError::IncompleteBuild { .. })
        ));
        assert!(builder.ingest(&doc(1, &["six"])).is_err());
        assert_eq!(builder.len(), 1);
    }

    #[test]
    fn test_deterministic() {
        let docs = vec![doc(0, &["b", "a"]), doc(1, &["c", "a", "d"])];

        let build = || {
            let mut builder = LexiconBuilder::new();
            builder.ingest_all(&docs).unwrap();
            builder.finalize()
        };
        assert_eq!(build(), build());
    }
}
