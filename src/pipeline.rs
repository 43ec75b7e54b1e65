//! The build pipeline and the read side of its output.
//!
//! A build moves through fixed stages:
//!
//! ```text
//! Empty -> DocumentsAssembled -> LexiconBuilt -> ForwardIndexBuilt
//!       -> InvertedIndexBuilt -> BarrelsPersisted
//! ```
//!
//! Artifacts are written into a staging directory and published as
//! `current/` only after the manifest is written. See [`layout`].

use std::path::Path;

use crate::document::csv::CsvRecordSource;
use crate::error::Result;

pub mod builder;
pub mod config;
pub mod layout;
pub mod reader;
pub mod report;
pub mod stage;

pub use builder::IndexPipeline;
pub use config::IndexConfig;
pub use reader::IndexReader;
pub use report::BuildReport;
pub use stage::BuildStage;

/// Build an index from a CSV file with a header row and publish it under `output`.
pub fn build_from_csv<P, Q>(input: P, output: Q, config: IndexConfig) -> Result<BuildReport>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    let source = CsvRecordSource::from_path(input)?.with_max_records(config.max_records);
    IndexPipeline::new(config)?.run(source, output)
}
