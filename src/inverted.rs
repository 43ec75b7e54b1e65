//! Inverted index: for every term, the documents containing it.
//!
//! Ordering contract, relied on by barrels and readers:
//!
//! - records ascend by `term_id`, exactly one per lexicon term;
//! - postings within a record ascend by `doc_id`;
//! - positions within a posting ascend.
//!
//! Inversion is a single accumulation pass over forward records in doc id
//! order. Work is split into shards by a hash of the term id; every shard
//! owns a disjoint set of terms, so shards never share a posting list.

use std::time::Instant;

use ahash::AHashMap;
use log::debug;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{CreaseError, Result};
use crate::forward::ForwardRecord;
use crate::lexicon::Lexicon;

/// Default number of inversion shards.
pub const DEFAULT_SHARDS: usize = 8;

/// One document's occurrences of a term.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Posting {
    pub doc_id: u64,
    /// Always equal to `positions.len()`.
    pub term_frequency: u32,
    pub positions: Vec<u32>,
}

impl Posting {
    fn new(doc_id: u64, position: u32) -> Self {
        Posting {
            doc_id,
            term_frequency: 1,
            positions: vec![position],
        }
    }
}

/// All postings of one term.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvertedRecord {
    pub term_id: u32,
    pub postings: Vec<Posting>,
}

impl InvertedRecord {
    /// Number of documents containing the term.
    pub fn doc_frequency(&self) -> usize {
        self.postings.len()
    }
}

/// Inverted records indexed by term id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InvertedIndex {
    records: Vec<InvertedRecord>,
}

impl InvertedIndex {
    /// Look up a term's record.
    pub fn get(&self, term_id: u32) -> Option<&InvertedRecord> {
        self.records.get(term_id as usize)
    }

    pub fn records(&self) -> &[InvertedRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<InvertedRecord> {
        self.records
    }

    /// Number of terms.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Total number of postings over all terms.
    pub fn posting_count(&self) -> usize {
        self.records.iter().map(|r| r.postings.len()).sum()
    }
}

/// Inverts forward records with a configurable number of shards.
#[derive(Debug, Clone, Copy)]
pub struct InvertedIndexBuilder {
    shards: usize,
}

impl Default for InvertedIndexBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_SHARDS)
    }
}

impl InvertedIndexBuilder {
    /// Create a builder; zero shards is treated as one.
    pub fn new(shards: usize) -> Self {
        InvertedIndexBuilder {
            shards: shards.max(1),
        }
    }

    pub fn shards(&self) -> usize {
        self.shards
    }

    fn shard_of(&self, term_id: u32) -> usize {
        let hash = (term_id as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15) >> 32;
        (hash % self.shards as u64) as usize
    }

    /// Invert forward records into one record per lexicon term.
    ///
    /// Forward records must ascend by doc id with ascending positions, else
    /// [`CreaseError::IncompleteBuild`]. A term id outside the lexicon is
    /// [`CreaseError::UnknownTerm`]; a lexicon term whose posting count
    /// disagrees with its document frequency is [`CreaseError::IncompleteBuild`].
    pub fn invert(&self, records: &[ForwardRecord], lexicon: &Lexicon) -> Result<InvertedIndex> {
        let start = Instant::now();
        check_forward_records(records, lexicon)?;

        let shards: Vec<AHashMap<u32, Vec<Posting>>> = (0..self.shards)
            .into_par_iter()
            .map(|shard| self.accumulate_shard(shard, records))
            .collect();

        let mut slots: Vec<Option<Vec<Posting>>> = vec![None; lexicon.len()];
        for shard in shards {
            for (term_id, postings) in shard {
                slots[term_id as usize] = Some(postings);
            }
        }

        let inverted = slots
            .into_iter()
            .enumerate()
            .map(|(term_id, postings)| {
                let term_id = term_id as u32;
                let postings = postings.unwrap_or_default();
                let expected = lexicon.entry(term_id).map_or(0, |e| e.doc_frequency);
                if postings.len() != expected as usize {
                    return Err(CreaseError::incomplete_build(
                        format!("{expected} postings for term {term_id} as counted by the lexicon"),
                        format!("{} postings", postings.len()),
                    ));
                }
                Ok(InvertedRecord { term_id, postings })
            })
            .collect::<Result<Vec<_>>>()?;

        let index = InvertedIndex { records: inverted };
        debug!(
            "Inverted {} forward records into {} terms / {} postings over {} shards in {:?}",
            records.len(),
            index.len(),
            index.posting_count(),
            self.shards,
            start.elapsed()
        );
        Ok(index)
    }

    fn accumulate_shard(&self, shard: usize, records: &[ForwardRecord]) -> AHashMap<u32, Vec<Posting>> {
        let mut lists: AHashMap<u32, Vec<Posting>> = AHashMap::new();

        for record in records {
            for &(term_id, position) in &record.postings {
                if self.shard_of(term_id) != shard {
                    continue;
                }

                let postings = lists.entry(term_id).or_default();
                match postings.last_mut() {
                    Some(last) if last.doc_id == record.doc_id => {
                        last.positions.push(position);
                        last.term_frequency += 1;
                    }
                    _ => postings.push(Posting::new(record.doc_id, position)),
                }
            }
        }

        lists
    }
}

/// Invert with the default shard count.
pub fn invert(records: &[ForwardRecord], lexicon: &Lexicon) -> Result<InvertedIndex> {
    InvertedIndexBuilder::default().invert(records, lexicon)
}

fn check_forward_records(records: &[ForwardRecord], lexicon: &Lexicon) -> Result<()> {
    let mut previous_doc = None;

    for record in records {
        if previous_doc.is_some_and(|previous| record.doc_id <= previous) {
            return Err(CreaseError::incomplete_build(
                "forward records in ascending doc id order",
                format!("doc {} after doc {}", record.doc_id, previous_doc.unwrap_or(0)),
            ));
        }
        previous_doc = Some(record.doc_id);

        let mut previous_position = None;
        for &(term_id, position) in &record.postings {
            if !lexicon.contains_id(term_id) {
                return Err(CreaseError::unknown_term(format!(
                    "term id {term_id} in doc {} is not in the lexicon",
                    record.doc_id
                )));
            }
            if previous_position.is_some_and(|previous| position <= previous) {
                return Err(CreaseError::incomplete_build(
                    format!("ascending positions in doc {}", record.doc_id),
                    format!("position {position}"),
                ));
            }
            previous_position = Some(position);
        }
    }

    Ok(())
}
