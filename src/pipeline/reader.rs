//! Read side of a published index.

use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use log::debug;

use crate::analysis::analyzer::Analyzer;
use crate::analysis::analyzer::standard::StandardAnalyzer;
use crate::barrel::manager::BarrelManager;
use crate::barrel::manifest::{BarrelManifest, MANIFEST_FILE};
use crate::document::store::{DocumentStore, StoredDocument};
use crate::error::{CreaseError, Result};
use crate::inverted::Posting;
use crate::lexicon::{Lexicon, LexiconEntry};
use crate::pipeline::layout::CURRENT_DIR;
use crate::storage::Storage;
use crate::storage::file::FileStorage;

/// A term's lexicon entry and postings.
pub type TermPostings = (LexiconEntry, Vec<Posting>);

/// Answers term and document lookups against a finished index.
///
/// Only the manifest is read on open. The lexicon and the document store are
/// loaded on first use; each term lookup reads the single barrel owning it.
/// Free-text queries are normalized with the analysis settings the index was
/// built with.
#[derive(Debug)]
pub struct IndexReader {
    dir: PathBuf,
    manifest: BarrelManifest,
    analyzer: StandardAnalyzer,
    barrels: BarrelManager,
    lexicon: OnceLock<Lexicon>,
    documents: OnceLock<DocumentStore>,
}

impl IndexReader {
    /// Open an index. `dir` is either an output root holding `current/`
    /// or an index directory itself.
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref();
        let index_dir = if dir.join(CURRENT_DIR).join(MANIFEST_FILE).is_file() {
            dir.join(CURRENT_DIR)
        } else if dir.join(MANIFEST_FILE).is_file() {
            dir.to_path_buf()
        } else {
            return Err(CreaseError::storage(format!(
                "No finished index in {}",
                dir.display()
            )));
        };

        let storage: Arc<dyn Storage> = Arc::new(FileStorage::open(&index_dir)?);
        Self::from_storage(index_dir, storage)
    }

    /// Open an index held in any storage.
    pub fn from_storage(dir: PathBuf, storage: Arc<dyn Storage>) -> Result<Self> {
        let manifest = BarrelManifest::load(storage.as_ref())?;
        let barrels = BarrelManager::new(storage, manifest.barrel_capacity)?;
        let analyzer = StandardAnalyzer::from_config(&manifest.analysis);
        debug!(
            "Opened index {} ({} terms, {} barrels)",
            dir.display(),
            manifest.term_count,
            manifest.barrel_count
        );

        Ok(IndexReader {
            dir,
            manifest,
            analyzer,
            barrels,
            lexicon: OnceLock::new(),
            documents: OnceLock::new(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn manifest(&self) -> &BarrelManifest {
        &self.manifest
    }

    /// The lexicon, loaded on first call.
    pub fn lexicon(&self) -> Result<&Lexicon> {
        if let Some(lexicon) = self.lexicon.get() {
            return Ok(lexicon);
        }
        let loaded = Lexicon::load(self.barrels.storage().as_ref())?;
        if loaded.len() as u64 != self.manifest.term_count {
            return Err(CreaseError::serialization(format!(
                "lexicon has {} terms, manifest says {}",
                loaded.len(),
                self.manifest.term_count
            )));
        }
        Ok(self.lexicon.get_or_init(|| loaded))
    }

    fn documents(&self) -> Result<&DocumentStore> {
        if let Some(documents) = self.documents.get() {
            return Ok(documents);
        }
        let loaded = DocumentStore::load(self.barrels.storage().as_ref())?;
        Ok(self.documents.get_or_init(|| loaded))
    }

    /// Exact term lookup. `None` when the term is not indexed.
    pub fn lookup(&self, term: &str) -> Result<Option<TermPostings>> {
        let Some(entry) = self.lexicon()?.get(term).cloned() else {
            return Ok(None);
        };
        let postings = self.barrels.postings(entry.term_id)?;
        if postings.len() != entry.doc_frequency as usize {
            return Err(CreaseError::serialization(format!(
                "term `{term}` has {} postings but a document frequency of {}",
                postings.len(),
                entry.doc_frequency
            )));
        }
        Ok(Some((entry, postings)))
    }

    /// Normalize free text and look up each resulting term.
    pub fn lookup_text(&self, text: &str) -> Result<Vec<(String, Option<TermPostings>)>> {
        self.analyzer
            .terms(text)?
            .into_iter()
            .map(|term| {
                let found = self.lookup(&term)?;
                Ok((term, found))
            })
            .collect()
    }

    /// Postings by term id, reading only the owning barrel.
    pub fn postings(&self, term_id: u32) -> Result<Vec<Posting>> {
        match self.manifest.barrel_for(term_id)? {
            Some(_) => self.barrels.postings(term_id),
            None => Err(CreaseError::unknown_term(format!(
                "term id {term_id} is past the last indexed term"
            ))),
        }
    }

    /// Stored fields and snippet of a document.
    pub fn document(&self, doc_id: u64) -> Result<Option<&StoredDocument>> {
        Ok(self.documents()?.get(doc_id))
    }
}
