//! The staged index build.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use log::{debug, info, warn};
use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::barrel::manager::BarrelManager;
use crate::barrel::manifest::{BarrelManifest, MANIFEST_VERSION};
use crate::barrel::partition;
use crate::document::Document;
use crate::document::assembler::{DocumentAssembler, SkippedRecord};
use crate::document::record::RawRecord;
use crate::document::store::DocumentStore;
use crate::error::{CreaseError, Result};
use crate::forward::{ForwardIndex, ForwardIndexBuilder};
use crate::inverted::{InvertedIndex, InvertedIndexBuilder};
use crate::lexicon::Lexicon;
use crate::lexicon::builder::LexiconBuilder;
use crate::pipeline::config::IndexConfig;
use crate::pipeline::layout::IndexLayout;
use crate::pipeline::report::BuildReport;
use crate::pipeline::stage::BuildStage;
use crate::storage::Storage;

/// Drives one build through its stages.
///
/// Each stage method moves the build exactly one step forward and fails with
/// [`CreaseError::IncompleteBuild`] when called out of order. Parallel stages
/// run on a thread pool owned by the pipeline.
///
/// ```no_run
/// use crease::document::csv::CsvRecordSource;
/// use crease::pipeline::{IndexConfig, IndexPipeline};
///
/// # fn main() -> crease::error::Result<()> {
/// let source = CsvRecordSource::from_path("ipl.csv")?;
/// let report = IndexPipeline::new(IndexConfig::default())?.run(source, "index")?;
/// println!("{} documents, {} terms", report.documents, report.term_count);
/// # Ok(())
/// # }
/// ```
pub struct IndexPipeline {
    config: IndexConfig,
    pool: ThreadPool,
    assembler: DocumentAssembler,
    stage: BuildStage,
    documents: Vec<Document>,
    lexicon: Option<Lexicon>,
    forward: Option<ForwardIndex>,
    inverted: Option<InvertedIndex>,
    report: BuildReport,
}

impl IndexPipeline {
    /// Validate the config and set up the thread pool.
    pub fn new(config: IndexConfig) -> Result<Self> {
        config.validate()?;

        let pool = ThreadPoolBuilder::new()
            .num_threads(config.thread_count())
            .thread_name(|i| format!("crease-build-{i}"))
            .build()
            .map_err(|e| CreaseError::internal(format!("Failed to create thread pool: {e}")))?;
        let assembler = DocumentAssembler::new(config.schema.clone(), &config.analysis)?;

        let report = BuildReport {
            barrel_capacity: config.barrel_capacity,
            ..Default::default()
        };

        Ok(IndexPipeline {
            config,
            pool,
            assembler,
            stage: BuildStage::Empty,
            documents: Vec::new(),
            lexicon: None,
            forward: None,
            inverted: None,
            report,
        })
    }

    pub fn config(&self) -> &IndexConfig {
        &self.config
    }

    pub fn stage(&self) -> BuildStage {
        self.stage
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn lexicon(&self) -> Option<&Lexicon> {
        self.lexicon.as_ref()
    }

    pub fn forward_index(&self) -> Option<&ForwardIndex> {
        self.forward.as_ref()
    }

    pub fn inverted_index(&self) -> Option<&InvertedIndex> {
        self.inverted.as_ref()
    }

    pub fn report(&self) -> &BuildReport {
        &self.report
    }

    /// Assemble documents from already-parsed records.
    pub fn assemble_documents(&mut self, records: &[RawRecord]) -> Result<&[Document]> {
        self.assemble(records, Vec::new())
    }

    /// Assemble documents from a record source such as
    /// [`CsvRecordSource`](crate::document::csv::CsvRecordSource).
    ///
    /// Rows the source reports as malformed are skipped like any other
    /// malformed record, or abort the build in strict mode.
    pub fn assemble_from<I>(&mut self, source: I) -> Result<&[Document]>
    where
        I: IntoIterator<Item = Result<RawRecord>>,
    {
        self.stage.check_transition(BuildStage::DocumentsAssembled)?;

        let limit = self.config.max_records.unwrap_or(usize::MAX);
        let mut records = Vec::new();
        let mut skipped = Vec::new();
        for item in source.into_iter().take(limit) {
            match item {
                Ok(record) => records.push(record),
                Err(e) if self.config.strict => return Err(e),
                Err(e) => {
                    let record = SkippedRecord::from_error(e)?;
                    warn!("Skipping record {}: {}", record.index, record.reason);
                    skipped.push(record);
                }
            }
        }

        self.assemble(&records, skipped)
    }

    fn assemble(
        &mut self,
        records: &[RawRecord],
        mut skipped: Vec<SkippedRecord>,
    ) -> Result<&[Document]> {
        self.stage.check_transition(BuildStage::DocumentsAssembled)?;
        let start = Instant::now();

        let assembler = &self.assembler;
        let strict = self.config.strict;
        let assembled = self
            .pool
            .install(|| assembler.assemble_all(records, strict))?;

        self.report.records_read = (records.len() + skipped.len()) as u64;
        skipped.extend(assembled.skipped);
        skipped.sort_by_key(|record| record.index);

        self.report.documents = assembled.documents.len() as u64;
        self.report.skipped = skipped;
        self.documents = assembled.documents;

        self.finish_stage(BuildStage::DocumentsAssembled, start);
        info!(
            "Assembled {} documents from {} records ({} skipped) in {:?}",
            self.report.documents,
            self.report.records_read,
            self.report.skipped.len(),
            start.elapsed()
        );
        Ok(&self.documents)
    }

    /// Assign term ids and document frequencies.
    pub fn build_lexicon(&mut self) -> Result<&Lexicon> {
        self.stage.check_transition(BuildStage::LexiconBuilt)?;
        let start = Instant::now();

        let mut builder = LexiconBuilder::new();
        builder.ingest_all(&self.documents)?;
        let lexicon = builder.finalize();
        self.report.term_count = lexicon.len() as u64;

        self.finish_stage(BuildStage::LexiconBuilt, start);
        info!(
            "Built lexicon of {} terms in {:?}",
            lexicon.len(),
            start.elapsed()
        );
        Ok(&*self.lexicon.insert(lexicon))
    }

    /// Map every document to its `(term_id, position)` pairs.
    pub fn build_forward_index(&mut self) -> Result<&ForwardIndex> {
        self.stage.check_transition(BuildStage::ForwardIndexBuilt)?;
        let start = Instant::now();

        let lexicon = require(&self.lexicon, BuildStage::LexiconBuilt)?;
        let documents = &self.documents;
        let forward = self
            .pool
            .install(|| ForwardIndexBuilder::new().build_all(documents, lexicon))?;

        self.finish_stage(BuildStage::ForwardIndexBuilt, start);
        info!(
            "Built forward index of {} documents / {} postings in {:?}",
            forward.len(),
            forward.posting_count(),
            start.elapsed()
        );
        Ok(&*self.forward.insert(forward))
    }

    /// Invert the forward index.
    pub fn build_inverted_index(&mut self) -> Result<&InvertedIndex> {
        self.stage.check_transition(BuildStage::InvertedIndexBuilt)?;
        let start = Instant::now();

        let lexicon = require(&self.lexicon, BuildStage::LexiconBuilt)?;
        let forward = require(&self.forward, BuildStage::ForwardIndexBuilt)?;
        let builder = InvertedIndexBuilder::new(self.config.inversion_shards);
        let inverted = self
            .pool
            .install(|| builder.invert(forward.records(), lexicon))?;
        self.report.posting_count = inverted.posting_count() as u64;

        self.finish_stage(BuildStage::InvertedIndexBuilt, start);
        info!(
            "Built inverted index of {} terms / {} postings in {:?}",
            inverted.len(),
            inverted.posting_count(),
            start.elapsed()
        );
        Ok(&*self.inverted.insert(inverted))
    }

    /// Write every artifact into `storage`, the manifest last.
    ///
    /// Nothing is promoted; use [`IndexPipeline::persist`] for an index directory.
    pub fn persist_into(&mut self, storage: Arc<dyn Storage>) -> Result<BarrelManifest> {
        self.stage.check_transition(BuildStage::BarrelsPersisted)?;
        let start = Instant::now();

        let manifest = self.write_artifacts(storage)?;

        self.finish_stage(BuildStage::BarrelsPersisted, start);
        Ok(manifest)
    }

    /// Write every artifact into a staging directory under `output`, then
    /// publish it as `output/current`.
    ///
    /// On failure the staging directory is removed and any existing
    /// `current/` is left untouched.
    pub fn persist<P: AsRef<Path>>(&mut self, output: P) -> Result<PathBuf> {
        self.stage.check_transition(BuildStage::BarrelsPersisted)?;
        let start = Instant::now();

        let layout = IndexLayout::new(output);
        let staging = layout.begin_staging()?;
        self.write_artifacts(staging.storage())?;
        let current = staging.promote()?;

        self.report.index_dir = Some(current.clone());
        self.finish_stage(BuildStage::BarrelsPersisted, start);
        Ok(current)
    }

    /// Run every stage over `source` and publish the index under `output`.
    pub fn run<I, P>(mut self, source: I, output: P) -> Result<BuildReport>
    where
        I: IntoIterator<Item = Result<RawRecord>>,
        P: AsRef<Path>,
    {
        info!(
            "Starting build with {} threads, barrel capacity {}",
            self.pool.current_num_threads(),
            self.config.barrel_capacity
        );

        self.assemble_from(source)?;
        self.build_lexicon()?;
        self.build_forward_index()?;
        self.build_inverted_index()?;
        self.persist(output)?;

        info!(
            "Build finished: {} documents, {} terms, {} barrels in {} ms",
            self.report.documents,
            self.report.term_count,
            self.report.barrel_count,
            self.report.total_ms()
        );
        Ok(self.report)
    }

    /// Consume the pipeline, returning its report.
    pub fn into_report(self) -> BuildReport {
        self.report
    }

    fn write_artifacts(&mut self, storage: Arc<dyn Storage>) -> Result<BarrelManifest> {
        let lexicon = require(&self.lexicon, BuildStage::LexiconBuilt)?;
        let forward = require(&self.forward, BuildStage::ForwardIndexBuilt)?;
        let inverted = require(&self.inverted, BuildStage::InvertedIndexBuilt)?;

        let mut bytes = DocumentStore::from_documents(&self.documents).save(storage.as_ref())?;
        bytes += lexicon.save(storage.as_ref())?;
        bytes += forward.save(storage.as_ref())?;

        let capacity = self.config.barrel_capacity;
        let manager = BarrelManager::new(Arc::clone(&storage), capacity)?;
        let entries = self.pool.install(|| -> Result<_> {
            let barrels = partition(inverted, capacity)?;
            manager.save_all(&barrels)
        })?;
        bytes += entries.iter().map(|entry| entry.bytes).sum::<u64>();

        let barrel_count = u32::try_from(entries.len())
            .map_err(|_| CreaseError::invalid_config("too many barrels"))?;
        debug!("Wrote {barrel_count} barrels of up to {capacity} terms");

        let manifest = BarrelManifest {
            version: MANIFEST_VERSION,
            barrel_capacity: capacity,
            barrel_count,
            term_count: lexicon.len() as u64,
            doc_count: self.documents.len() as u64,
            posting_count: inverted.posting_count() as u64,
            skipped_records: self.report.skipped.len() as u64,
            created_at: Utc::now(),
            analysis: self.config.analysis.clone(),
            barrels: entries,
        };
        manifest.validate()?;
        manifest.save(storage.as_ref())?;
        storage.sync()?;

        self.report.barrel_count = barrel_count;
        self.report.bytes_written = bytes;
        Ok(manifest)
    }

    fn finish_stage(&mut self, stage: BuildStage, start: Instant) {
        self.stage = stage;
        self.report.record_timing(stage, start.elapsed());
    }
}

impl std::fmt::Debug for IndexPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexPipeline")
            .field("config", &self.config)
            .field("stage", &self.stage)
            .field("threads", &self.pool.current_num_threads())
            .field("documents", &self.documents.len())
            .finish()
    }
}

fn require<T>(value: &Option<T>, stage: BuildStage) -> Result<&T> {
    value
        .as_ref()
        .ok_or_else(|| CreaseError::incomplete_build(format!("stage {stage}"), "missing output"))
}
