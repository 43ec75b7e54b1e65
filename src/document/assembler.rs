//! Turns raw records into documents.

use std::collections::BTreeMap;
use std::sync::Arc;

use log::{debug, warn};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::analysis::AnalysisConfig;
use crate::analysis::analyzer::Analyzer;
use crate::analysis::analyzer::standard::StandardAnalyzer;
use crate::document::record::RawRecord;
use crate::document::schema::RecordSchema;
use crate::document::{Document, snippet_of};
use crate::error::{CreaseError, Result};

/// A record that was left out of the build, with the reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedRecord {
    /// Position in the input stream.
    pub index: u64,
    /// Why it was skipped.
    pub reason: String,
}

impl SkippedRecord {
    /// Build from a [`CreaseError::MalformedRecord`]; other errors are returned back.
    pub fn from_error(error: CreaseError) -> std::result::Result<Self, CreaseError> {
        match error {
            CreaseError::MalformedRecord { index, reason } => Ok(SkippedRecord { index, reason }),
            other => Err(other),
        }
    }
}

/// Documents in id order plus the records that were skipped on the way.
#[derive(Debug, Default)]
pub struct Assembled {
    pub documents: Vec<Document>,
    pub skipped: Vec<SkippedRecord>,
}

/// Assembles documents according to a [`RecordSchema`].
#[derive(Clone)]
pub struct DocumentAssembler {
    schema: Arc<RecordSchema>,
    analyzer: Arc<dyn Analyzer>,
}

impl DocumentAssembler {
    /// Create an assembler, validating the schema.
    pub fn new(schema: RecordSchema, analysis: &AnalysisConfig) -> Result<Self> {
        Self::with_analyzer(schema, Arc::new(StandardAnalyzer::from_config(analysis)))
    }

    /// Create an assembler with a custom analyzer.
    pub fn with_analyzer(schema: RecordSchema, analyzer: Arc<dyn Analyzer>) -> Result<Self> {
        schema.validate()?;
        Ok(DocumentAssembler {
            schema: Arc::new(schema),
            analyzer,
        })
    }

    pub fn schema(&self) -> &RecordSchema {
        &self.schema
    }

    /// Assemble one record into a document with id `next_id`.
    ///
    /// Fails with [`CreaseError::MalformedRecord`] only when a required field
    /// is absent. Null or blank values contribute no terms.
    pub fn assemble(&self, record: &RawRecord, next_id: u64) -> Result<Document> {
        if let Some(missing) = self
            .schema
            .required_fields()
            .find(|field| !record.contains(&field.name))
        {
            return Err(CreaseError::malformed_record(
                record.index(),
                format!("missing required field `{}`", missing.name),
            ));
        }

        let mut fields = Vec::new();
        let mut terms = Vec::new();
        let mut parts = Vec::new();

        for field in self.schema.textual_fields() {
            let value = record.get(&field.name).flatten().unwrap_or("");
            if !value.trim().is_empty() {
                terms.extend(self.analyzer.terms(value)?);
                parts.push(value);
            }
            fields.push(value.to_string());
        }

        let stored: BTreeMap<String, String> = self
            .schema
            .stored_fields()
            .filter_map(|field| {
                record
                    .get(&field.name)
                    .flatten()
                    .map(|value| (field.name.clone(), value.to_string()))
            })
            .collect();

        Ok(Document {
            id: next_id,
            fields,
            terms,
            stored,
            snippet: snippet_of(&parts.join(" ")),
        })
    }

    /// Assemble records in parallel, reducing back into input order.
    ///
    /// Each document's id is its record's index. Runs on the current rayon
    /// pool. Malformed records are skipped and listed unless `strict`, in
    /// which case the first one (in input order) aborts.
    pub fn assemble_all(&self, records: &[RawRecord], strict: bool) -> Result<Assembled> {
        let results: Vec<Result<Document>> = records
            .par_iter()
            .map(|record| self.assemble(record, record.index()))
            .collect();

        let mut assembled = Assembled {
            documents: Vec::with_capacity(results.len()),
            skipped: Vec::new(),
        };

        let mut last_id = None;
        for result in results {
            match result {
                Ok(document) => {
                    if last_id.is_some_and(|last| document.id <= last) {
                        return Err(CreaseError::incomplete_build(
                            format!("document ids ascending after {}", last_id.unwrap_or(0)),
                            format!("document id {}", document.id),
                        ));
                    }
                    last_id = Some(document.id);
                    assembled.documents.push(document);
                }
                Err(error) if strict => return Err(error),
                Err(error) => {
                    let skipped = SkippedRecord::from_error(error)?;
                    warn!("Skipping record {}: {}", skipped.index, skipped.reason);
                    assembled.skipped.push(skipped);
                }
            }
        }

        debug!(
            "Assembled {} documents, skipped {} records",
            assembled.documents.len(),
            assembled.skipped.len()
        );
        Ok(assembled)
    }
}

impl std::fmt::Debug for DocumentAssembler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentAssembler")
            .field("schema", &self.schema)
            .field("analyzer", &self.analyzer.name())
            .finish()
    }
}
