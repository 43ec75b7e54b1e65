//! Forward index: for every document, its term occurrences as `(term_id, position)`.

use log::debug;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::document::Document;
use crate::error::{CreaseError, Result};
use crate::lexicon::Lexicon;
use crate::storage::Storage;
use crate::storage::structured::{read_artifact, write_artifact};

/// Artifact file name.
pub const FORWARD_FILE: &str = "forward.dat";

const MAGIC: &[u8; 4] = b"CRFW";
const VERSION: u32 = 1;

/// The term occurrences of one document, in document order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForwardRecord {
    pub doc_id: u64,
    /// `(term_id, position)`, one per occurrence; position is the 0-based
    /// index in the document's term sequence.
    pub postings: Vec<(u32, u32)>,
}

/// Stateless builder of forward records over a finalized lexicon.
#[derive(Debug, Clone, Copy, Default)]
pub struct ForwardIndexBuilder;

impl ForwardIndexBuilder {
    pub fn new() -> Self {
        ForwardIndexBuilder
    }

    /// Map a document's terms to `(term_id, position)` pairs.
    ///
    /// A term missing from the lexicon means the lexicon was not built from
    /// this document set; that is [`CreaseError::UnknownTerm`].
    pub fn build(&self, doc: &Document, lexicon: &Lexicon) -> Result<ForwardRecord> {
        let postings = doc
            .terms
            .iter()
            .enumerate()
            .map(|(position, term)| {
                let term_id = lexicon.term_id(term).ok_or_else(|| {
                    CreaseError::unknown_term(format!(
                        "`{term}` of document {} is not in the lexicon",
                        doc.id
                    ))
                })?;
                let position = u32::try_from(position).map_err(|_| {
                    CreaseError::other(format!("document {} has too many terms", doc.id))
                })?;
                Ok((term_id, position))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(ForwardRecord {
            doc_id: doc.id,
            postings,
        })
    }

    /// Build records for all documents in parallel on the current rayon pool.
    ///
    /// The output keeps the input document order.
    pub fn build_all(&self, docs: &[Document], lexicon: &Lexicon) -> Result<ForwardIndex> {
        let records = docs
            .par_iter()
            .map(|doc| self.build(doc, lexicon))
            .collect::<Result<Vec<_>>>()?;

        debug!(
            "Built {} forward records with {} postings",
            records.len(),
            records.iter().map(|r| r.postings.len()).sum::<usize>()
        );
        ForwardIndex::new(records)
    }
}

/// All forward records of a build, ordered by doc id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ForwardIndex {
    records: Vec<ForwardRecord>,
}

impl ForwardIndex {
    /// Wrap records that are already in strictly ascending doc id order.
    pub fn new(records: Vec<ForwardRecord>) -> Result<Self> {
        if let Some(pair) = records.windows(2).find(|w| w[0].doc_id >= w[1].doc_id) {
            return Err(CreaseError::incomplete_build(
                format!("forward records ascending after doc {}", pair[0].doc_id),
                format!("doc {}", pair[1].doc_id),
            ));
        }
        Ok(ForwardIndex { records })
    }

    /// Look up a document's record.
    pub fn get(&self, doc_id: u64) -> Option<&ForwardRecord> {
        self.records
            .binary_search_by_key(&doc_id, |r| r.doc_id)
            .ok()
            .map(|i| &self.records[i])
    }

    pub fn records(&self) -> &[ForwardRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Total number of term occurrences.
    pub fn posting_count(&self) -> usize {
        self.records.iter().map(|r| r.postings.len()).sum()
    }

    /// Write `forward.dat` atomically.
    pub fn save(&self, storage: &dyn Storage) -> Result<u64> {
        write_artifact(storage, FORWARD_FILE, MAGIC, VERSION, |writer| {
            writer.write_varint(self.records.len() as u64)?;

            let mut previous = 0u64;
            for record in &self.records {
                writer.write_varint(record.doc_id - previous)?;
                previous = record.doc_id;

                writer.write_varint(record.postings.len() as u64)?;
                for &(term_id, _) in &record.postings {
                    writer.write_varint(term_id as u64)?;
                }
                let positions: Vec<u32> = record.postings.iter().map(|&(_, p)| p).collect();
                writer.write_delta_compressed_u32s(&positions)?;
            }
            Ok(())
        })
    }

    /// Read `forward.dat`.
    pub fn load(storage: &dyn Storage) -> Result<Self> {
        let records = read_artifact(storage, FORWARD_FILE, MAGIC, VERSION, |reader| {
            let count = reader.read_length()?;
            let mut records = Vec::with_capacity(count);

            let mut doc_id = 0u64;
            for _ in 0..count {
                doc_id = doc_id
                    .checked_add(reader.read_varint()?)
                    .ok_or_else(|| CreaseError::serialization("Doc id overflow"))?;

                let length = reader.read_length()?;
                let mut term_ids = Vec::with_capacity(length);
                for _ in 0..length {
                    term_ids.push(reader.read_varint_u32()?);
                }
                let positions = reader.read_delta_compressed_u32s()?;
                if positions.len() != term_ids.len() {
                    return Err(CreaseError::serialization(format!(
                        "Doc {doc_id} has {} term ids but {} positions",
                        term_ids.len(),
                        positions.len()
                    )));
                }

                records.push(ForwardRecord {
                    doc_id,
                    postings: term_ids.into_iter().zip(positions).collect(),
                });
            }
            Ok(records)
        })?;

        Self::new(records).map_err(|e| CreaseError::serialization(e.to_string()))
    }
}
