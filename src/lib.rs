//! # Crease
//!
//! Batch construction of a barrel-partitioned inverted index over
//! ball-by-ball cricket commentary records.
//!
//! ## Features
//!
//! - Configurable text normalization pipeline
//! - Deterministic term ids and document frequencies
//! - Forward and inverted indexes with term positions
//! - Barrels loadable one at a time
//! - Checksummed binary artifacts published atomically
//!
//! ```no_run
//! use crease::pipeline::{IndexConfig, IndexReader, build_from_csv};
//!
//! # fn main() -> crease::error::Result<()> {
//! let report = build_from_csv("ipl.csv", "index", IndexConfig::default())?;
//! println!("{} terms in {} barrels", report.term_count, report.barrel_count);
//!
//! let reader = IndexReader::open("index")?;
//! if let Some((entry, postings)) = reader.lookup("kohli")? {
//!     println!("{} appears in {} deliveries", entry.term, postings.len());
//! }
//! # Ok(())
//! # }
//! ```

pub mod analysis;
pub mod barrel;
pub mod cli;
pub mod document;
pub mod error;
pub mod forward;
pub mod inverted;
pub mod lexicon;
pub mod pipeline;
pub mod storage;
pub mod util;

pub mod prelude {
    pub use crate::document::Document;
    pub use crate::document::record::RawRecord;
    pub use crate::error::{CreaseError, Result};
    pub use crate::pipeline::{BuildReport, BuildStage, IndexConfig, IndexPipeline, IndexReader};
}

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
