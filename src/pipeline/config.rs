//! Build configuration.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::analysis::AnalysisConfig;
use crate::barrel::DEFAULT_BARREL_CAPACITY;
use crate::document::schema::RecordSchema;
use crate::error::{CreaseError, Result};
use crate::inverted::DEFAULT_SHARDS;

/// Everything that shapes a build.
///
/// Every field has a default, so a JSON config only needs the keys it changes:
///
/// ```
/// use crease::pipeline::IndexConfig;
///
/// let config: IndexConfig = serde_json::from_str(r#"{ "barrel_capacity": 100 }"#).unwrap();
/// assert_eq!(config.barrel_capacity, 100);
/// assert!(!config.strict);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// Input record layout.
    pub schema: RecordSchema,

    /// Tokenizer and filter settings.
    pub analysis: AnalysisConfig,

    /// Terms per barrel.
    pub barrel_capacity: u32,

    /// Abort on the first malformed record instead of skipping it.
    pub strict: bool,

    /// Worker threads; `None` uses one per CPU.
    pub threads: Option<usize>,

    /// Shards used while inverting.
    pub inversion_shards: usize,

    /// Read at most this many input records.
    pub max_records: Option<usize>,
}

impl Default for IndexConfig {
    fn default() -> Self {
        IndexConfig {
            schema: RecordSchema::ipl(),
            analysis: AnalysisConfig::default(),
            barrel_capacity: DEFAULT_BARREL_CAPACITY,
            strict: false,
            threads: None,
            inversion_shards: DEFAULT_SHARDS,
            max_records: None,
        }
    }
}

impl IndexConfig {
    /// Load a JSON config file.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            CreaseError::invalid_config(format!("Failed to read {}: {e}", path.display()))
        })?;
        let config: IndexConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Number of worker threads to use.
    pub fn thread_count(&self) -> usize {
        self.threads.unwrap_or_else(num_cpus::get).max(1)
    }

    /// Reject settings the build cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.barrel_capacity == 0 {
            return Err(CreaseError::invalid_config("barrel_capacity must be positive"));
        }
        if self.threads == Some(0) {
            return Err(CreaseError::invalid_config("threads must be positive"));
        }
        if self.inversion_shards == 0 {
            return Err(CreaseError::invalid_config("inversion_shards must be positive"));
        }
        self.schema.validate()
    }
}
