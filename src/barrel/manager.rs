//! Persists and loads barrels one file at a time.

use std::sync::Arc;
use std::time::Instant;

use log::{debug, warn};
use rayon::prelude::*;

use crate::barrel::codec::{read_barrel, write_barrel};
use crate::barrel::manifest::BarrelEntry;
use crate::barrel::{Barrel, barrel_id_for};
use crate::error::{CreaseError, Result};
use crate::inverted::Posting;
use crate::storage::Storage;

/// Reads and writes the barrels of one index directory.
#[derive(Debug, Clone)]
pub struct BarrelManager {
    storage: Arc<dyn Storage>,
    capacity: u32,
}

impl BarrelManager {
    pub fn new(storage: Arc<dyn Storage>, capacity: u32) -> Result<Self> {
        if capacity == 0 {
            return Err(CreaseError::invalid_config("barrel capacity must be positive"));
        }
        Ok(BarrelManager { storage, capacity })
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    pub fn storage(&self) -> &Arc<dyn Storage> {
        &self.storage
    }

    /// Persist one barrel atomically.
    pub fn save(&self, barrel: &Barrel) -> Result<BarrelEntry> {
        if barrel.term_id_range.start != barrel.barrel_id.saturating_mul(self.capacity) {
            return Err(CreaseError::serialization(format!(
                "barrel {} starts at term {}, not a multiple of capacity {}",
                barrel.barrel_id, barrel.term_id_range.start, self.capacity
            )));
        }

        let start = Instant::now();
        let bytes = write_barrel(self.storage.as_ref(), barrel)?;
        debug!(
            "Saved barrel {} (terms {:?}, {} postings, {bytes} bytes) in {:?}",
            barrel.barrel_id,
            barrel.term_id_range,
            barrel.posting_count(),
            start.elapsed()
        );
        Ok(BarrelEntry::new(barrel, bytes))
    }

    /// Persist barrels in parallel.
    ///
    /// Each barrel is its own file, so a failed write leaves the others intact.
    /// Entries come back in barrel id order.
    pub fn save_all(&self, barrels: &[Barrel]) -> Result<Vec<BarrelEntry>> {
        barrels
            .par_iter()
            .map(|barrel| {
                self.save(barrel).inspect_err(|e| {
                    warn!("Failed to save barrel {}: {e}", barrel.barrel_id);
                })
            })
            .collect()
    }

    /// Load one barrel, touching no other barrel file.
    pub fn load(&self, barrel_id: u32) -> Result<Barrel> {
        let barrel = read_barrel(self.storage.as_ref(), barrel_id)?;
        if barrel.term_id_range.start != barrel_id.saturating_mul(self.capacity)
            || barrel.term_id_range.len() > self.capacity as usize
        {
            return Err(CreaseError::serialization(format!(
                "barrel {barrel_id} covers terms {:?}, which does not fit capacity {}",
                barrel.term_id_range, self.capacity
            )));
        }
        Ok(barrel)
    }

    /// Postings of `term_id`, loading only its barrel.
    ///
    /// A term id past the indexed range is [`CreaseError::UnknownTerm`].
    pub fn postings(&self, term_id: u32) -> Result<Vec<Posting>> {
        let barrel_id = barrel_id_for(term_id, self.capacity)?;
        if !self.storage.file_exists(&crate::barrel::barrel_file_name(barrel_id)) {
            return Err(CreaseError::unknown_term(format!(
                "term id {term_id} has no barrel"
            )));
        }

        let barrel = self.load(barrel_id)?;
        barrel
            .get(term_id)
            .map(|record| record.postings.clone())
            .ok_or_else(|| {
                CreaseError::unknown_term(format!(
                    "term id {term_id} is not in barrel {barrel_id}"
                ))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::barrel::{barrel_file_name, partition};
    use crate::forward::ForwardRecord;
    use crate::inverted::invert;
    use crate::lexicon::{Lexicon, LexiconEntry};
    use crate::storage::memory::MemoryStorage;

    fn barrels(term_count: u32, capacity: u32) -> Vec<Barrel> {
        let records: Vec<ForwardRecord> = (0..term_count)
            .map(|t| ForwardRecord {
                doc_id: t as u64,
                postings: vec![(t, 0), ((t + 1) % term_count, 1)],
            })
            .collect();
        let entries = (0..term_count)
            .map(|t| LexiconEntry {
                term: format!("t{t}"),
                term_id: t,
                doc_frequency: if term_count == 1 { 1 } else { 2 },
            })
            .collect();
        let lexicon = Lexicon::from_parts(entries, term_count as u64).unwrap();
        partition(&invert(&records, &lexicon).unwrap(), capacity).unwrap()
    }

    fn manager(capacity: u32) -> (MemoryStorage, BarrelManager) {
        let storage = MemoryStorage::default();
        let manager = BarrelManager::new(Arc::new(storage.clone()), capacity).unwrap();
        (storage, manager)
    }

    #[test]
    fn test_save_all_and_load() {
        let (storage, manager) = manager(3);
        let barrels = barrels(8, 3);

        let entries = manager.save_all(&barrels).unwrap();
        assert_eq!(entries.len(), 3);
        assert_eq!(
            entries.iter().map(|e| (e.low, e.high)).collect::<Vec<_>>(),
            vec![(0, 3), (3, 6), (6, 8)]
        );
        assert_eq!(storage.file_count(), 3);

        for barrel in &barrels {
            assert_eq!(&manager.load(barrel.barrel_id).unwrap(), barrel);
        }
    }

    #[test]
    fn test_load_is_independent_of_other_barrels() {
        let (storage, manager) = manager(2);
        let barrels = barrels(6, 2);
        manager.save_all(&barrels).unwrap();

        storage.delete_file(&barrel_file_name(0)).unwrap();
        storage.delete_file(&barrel_file_name(2)).unwrap();

        assert_eq!(manager.load(1).unwrap(), barrels[1]);
        assert!(manager.load(0).is_err());
    }

    #[test]
    fn test_postings() {
        let (_, manager) = manager(2);
        manager.save_all(&barrels(5, 2)).unwrap();

        let postings = manager.postings(3).unwrap();
        assert_eq!(postings.iter().map(|p| p.doc_id).collect::<Vec<_>>(), vec![2, 3]);
        assert!(matches!(manager.postings(5), Err(CreaseError::UnknownTerm(_))));
        assert!(matches!(manager.postings(40), Err(CreaseError::UnknownTerm(_))));
    }

    #[test]
    fn test_capacity_mismatch() {
        let (storage, _) = manager(2);
        let writer = BarrelManager::new(Arc::new(storage.clone()), 2).unwrap();
        writer.save_all(&barrels(4, 2)).unwrap();

        let reader = BarrelManager::new(Arc::new(storage), 3).unwrap();
        assert!(matches!(reader.load(1), Err(CreaseError::Serialization(_))));
        assert!(BarrelManager::new(Arc::new(MemoryStorage::default()), 0).is_err());
    }

    #[test]
    fn test_failed_save_leaves_other_barrels() {
        let (storage, manager) = manager(2);
        let mut barrels = barrels(6, 2);
        manager.save(&barrels[0]).unwrap();

        barrels[1].term_id_range = 3..4;
        assert!(manager.save(&barrels[1]).is_err());

        assert_eq!(storage.list_files().unwrap(), vec![barrel_file_name(0)]);
        assert_eq!(manager.load(0).unwrap(), barrels[0]);
    }
}
