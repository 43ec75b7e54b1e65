//! Barrels: the inverted index split into independently loadable term-id ranges.
//!
//! Barrel `b` holds exactly the terms with `term_id / capacity == b`, i.e. the
//! range `[b * capacity, min((b + 1) * capacity, term_count))`. Barrels
//! together cover `[0, term_count)` with no gaps or overlaps, so the barrel of
//! any term is computed from its id alone, without scanning.
//!
//! Each barrel is its own checksummed file (`barrel_000000.dat`, ...), written
//! atomically. A [`manifest::BarrelManifest`] (`manifest.json`) is written
//! after all barrels and records the capacity and barrel count.

use std::ops::Range;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{CreaseError, Result};
use crate::inverted::{InvertedIndex, InvertedRecord};

pub mod codec;
pub mod manager;
pub mod manifest;

/// Default number of terms per barrel.
pub const DEFAULT_BARREL_CAPACITY: u32 = 2500;

/// File name of a barrel.
pub fn barrel_file_name(barrel_id: u32) -> String {
    format!("barrel_{barrel_id:06}.dat")
}

/// The barrel that owns `term_id`.
pub fn barrel_id_for(term_id: u32, capacity: u32) -> Result<u32> {
    if capacity == 0 {
        return Err(CreaseError::invalid_config("barrel capacity must be positive"));
    }
    Ok(term_id / capacity)
}

/// A contiguous term-id range of the inverted index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Barrel {
    pub barrel_id: u32,
    /// `[low, high)`.
    pub term_id_range: Range<u32>,
    /// One record per term of the range, ascending by term id.
    pub records: Vec<InvertedRecord>,
}

impl Barrel {
    /// The record of `term_id`, if it falls in this barrel.
    pub fn get(&self, term_id: u32) -> Option<&InvertedRecord> {
        if !self.term_id_range.contains(&term_id) {
            return None;
        }
        let offset = (term_id - self.term_id_range.start) as usize;
        self.records
            .get(offset)
            .filter(|record| record.term_id == term_id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn posting_count(&self) -> usize {
        self.records.iter().map(|r| r.postings.len()).sum()
    }
}

/// Number of barrels needed for `term_count` terms.
pub fn barrel_count(term_count: usize, capacity: u32) -> Result<u32> {
    if capacity == 0 {
        return Err(CreaseError::invalid_config("barrel capacity must be positive"));
    }
    let count = term_count.div_ceil(capacity as usize);
    u32::try_from(count).map_err(|_| CreaseError::invalid_config("too many barrels"))
}

/// Split an inverted index into barrels of `capacity` terms.
///
/// Pure and deterministic; barrels are cut in parallel.
pub fn partition(index: &InvertedIndex, capacity: u32) -> Result<Vec<Barrel>> {
    let count = barrel_count(index.len(), capacity)?;
    let term_count = u32::try_from(index.len())
        .map_err(|_| CreaseError::invalid_config("more than u32::MAX terms"))?;
    let records = index.records();

    (0..count)
        .into_par_iter()
        .map(|barrel_id| {
            let low = barrel_id * capacity;
            let high = low.saturating_add(capacity).min(term_count);
            let slice = &records[low as usize..high as usize];

            if let Some((offset, record)) = slice
                .iter()
                .enumerate()
                .find(|(offset, record)| record.term_id != low + *offset as u32)
            {
                return Err(CreaseError::incomplete_build(
                    format!("term id {} in barrel {barrel_id}", low + offset as u32),
                    format!("term id {}", record.term_id),
                ));
            }

            Ok(Barrel {
                barrel_id,
                term_id_range: low..high,
                records: slice.to_vec(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inverted::{InvertedIndexBuilder, Posting};
    use crate::lexicon::Lexicon;

    fn index(term_count: u32) -> InvertedIndex {
        // Every term occurs once, in its own document.
        let records: Vec<crate::forward::ForwardRecord> = (0..term_count)
            .map(|t| crate::forward::ForwardRecord {
                doc_id: t as u64,
                postings: vec![(t, 0)],
            })
            .collect();
        let entries = (0..term_count)
            .map(|t| crate::lexicon::LexiconEntry {
                term: format!("t{t}"),
                term_id: t,
                doc_frequency: 1,
            })
            .collect();
        let lexicon = Lexicon::from_parts(entries, term_count as u64).unwrap();
        InvertedIndexBuilder::default().invert(&records, &lexicon).unwrap()
    }

    #[test]
    fn test_partition_covers_all_terms() {
        let index = index(7);
        let barrels = partition(&index, 3).unwrap();

        let ranges: Vec<_> = barrels.iter().map(|b| b.term_id_range.clone()).collect();
        assert_eq!(ranges, vec![0..3, 3..6, 6..7]);
        assert_eq!(barrels.iter().map(Barrel::len).sum::<usize>(), 7);

        for barrel in &barrels {
            for record in &barrel.records {
                assert_eq!(record.term_id / 3, barrel.barrel_id);
            }
        }
    }

    #[test]
    fn test_partition_reconstructs_index() {
        let index = index(10);
        let barrels = partition(&index, 4).unwrap();

        let rebuilt: Vec<InvertedRecord> = barrels.into_iter().flat_map(|b| b.records).collect();
        assert_eq!(rebuilt, index.records());
    }

    #[test]
    fn test_partition_is_deterministic() {
        let index = index(25);
        assert_eq!(partition(&index, 4).unwrap(), partition(&index, 4).unwrap());
    }

    #[test]
    fn test_capacity_edge_cases() {
        let index = index(5);

        assert!(matches!(partition(&index, 0), Err(CreaseError::InvalidConfig(_))));
        assert_eq!(partition(&index, 1).unwrap().len(), 5);
        assert_eq!(partition(&index, 5).unwrap().len(), 1);
        assert_eq!(partition(&index, 1000).unwrap().len(), 1);
        assert!(partition(&InvertedIndex::default(), 10).unwrap().is_empty());
    }

    #[test]
    fn test_barrel_lookup() {
        let barrels = partition(&index(6), 4).unwrap();

        assert_eq!(barrel_id_for(5, 4).unwrap(), 1);
        let record = barrels[1].get(5).unwrap();
        assert_eq!(
            record.postings,
            vec![Posting { doc_id: 5, term_frequency: 1, positions: vec![0] }]
        );
        assert!(barrels[1].get(2).is_none());
        assert!(barrel_id_for(5, 0).is_err());
    }

    #[test]
    fn test_file_names() {
        assert_eq!(barrel_file_name(0), "barrel_000000.dat");
        assert_eq!(barrel_file_name(42), "barrel_000042.dat");
    }
}
