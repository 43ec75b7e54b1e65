//! `manifest.json`: the last file written by a build.
//!
//! A directory without a manifest is not a finished index.

use std::io::{Read, Write};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::analysis::AnalysisConfig;
use crate::barrel::{Barrel, barrel_file_name, barrel_id_for};
use crate::error::{CreaseError, Result};
use crate::storage::Storage;

/// Manifest file name.
pub const MANIFEST_FILE: &str = "manifest.json";

/// Current manifest version.
pub const MANIFEST_VERSION: u32 = 1;

/// One persisted barrel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BarrelEntry {
    pub barrel_id: u32,
    pub low: u32,
    pub high: u32,
    pub file: String,
    pub bytes: u64,
    pub postings: u64,
}

impl BarrelEntry {
    pub fn new(barrel: &Barrel, bytes: u64) -> Self {
        BarrelEntry {
            barrel_id: barrel.barrel_id,
            low: barrel.term_id_range.start,
            high: barrel.term_id_range.end,
            file: barrel_file_name(barrel.barrel_id),
            bytes,
            postings: barrel.posting_count() as u64,
        }
    }
}

/// Summary of a finished build.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BarrelManifest {
    pub version: u32,
    pub barrel_capacity: u32,
    pub barrel_count: u32,
    pub term_count: u64,
    pub doc_count: u64,
    pub posting_count: u64,
    pub skipped_records: u64,
    pub created_at: DateTime<Utc>,
    /// Normalization the build used; queries must go through the same.
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub barrels: Vec<BarrelEntry>,
}

impl BarrelManifest {
    /// The barrel owning `term_id`, or `None` past the last term.
    pub fn barrel_for(&self, term_id: u32) -> Result<Option<u32>> {
        if u64::from(term_id) >= self.term_count {
            return Ok(None);
        }
        barrel_id_for(term_id, self.barrel_capacity).map(Some)
    }

    /// Check the counts against each other.
    pub fn validate(&self) -> Result<()> {
        if self.version != MANIFEST_VERSION {
            return Err(CreaseError::serialization(format!(
                "manifest version mismatch: expected {MANIFEST_VERSION}, found {}",
                self.version
            )));
        }
        if self.barrel_capacity == 0 {
            return Err(CreaseError::serialization("manifest has a zero barrel capacity"));
        }
        let expected = self.term_count.div_ceil(u64::from(self.barrel_capacity));
        if u64::from(self.barrel_count) != expected {
            return Err(CreaseError::serialization(format!(
                "manifest lists {} barrels for {} terms at capacity {}",
                self.barrel_count, self.term_count, self.barrel_capacity
            )));
        }
        if !self.barrels.is_empty() && self.barrels.len() != self.barrel_count as usize {
            return Err(CreaseError::serialization(format!(
                "manifest has {} barrel entries, expected {}",
                self.barrels.len(),
                self.barrel_count
            )));
        }
        Ok(())
    }

    /// Write `manifest.json` via a temp file and rename.
    pub fn save(&self, storage: &dyn Storage) -> Result<()> {
        let serialized = serde_json::to_vec_pretty(self)?;

        let (temp_name, mut output) = storage.create_temp_output("manifest")?;
        let written = output
            .write_all(&serialized)
            .map_err(CreaseError::from)
            .and_then(|_| output.flush_and_sync())
            .and_then(|_| output.close());
        drop(output);

        if let Err(e) = written {
            let _ = storage.delete_file(&temp_name);
            return Err(e);
        }
        storage.rename_file(&temp_name, MANIFEST_FILE)
    }

    /// Read and validate `manifest.json`.
    pub fn load(storage: &dyn Storage) -> Result<Self> {
        let mut input = storage.open_input(MANIFEST_FILE)?;
        let mut buffer = Vec::new();
        input.read_to_end(&mut buffer)?;
        input.close()?;

        let manifest: BarrelManifest = serde_json::from_slice(&buffer)?;
        manifest.validate()?;
        Ok(manifest)
    }
}
