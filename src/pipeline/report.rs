//! What a build did.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::document::assembler::SkippedRecord;
use crate::pipeline::stage::BuildStage;

/// Time spent producing one stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageTiming {
    pub stage: BuildStage,
    pub elapsed_ms: u64,
}

impl StageTiming {
    pub fn new(stage: BuildStage, elapsed: Duration) -> Self {
        StageTiming {
            stage,
            elapsed_ms: u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
        }
    }
}

/// Summary of a finished build.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildReport {
    /// Input records seen, including skipped ones.
    pub records_read: u64,
    pub documents: u64,
    /// Records left out, in input order.
    pub skipped: Vec<SkippedRecord>,
    pub term_count: u64,
    pub posting_count: u64,
    pub barrel_capacity: u32,
    pub barrel_count: u32,
    /// Bytes written across all artifacts.
    pub bytes_written: u64,
    /// The published `current/` directory, once promoted.
    pub index_dir: Option<PathBuf>,
    pub timings: Vec<StageTiming>,
}

impl BuildReport {
    pub fn skipped_count(&self) -> usize {
        self.skipped.len()
    }

    /// Sum of all stage timings.
    pub fn total_ms(&self) -> u64 {
        self.timings.iter().map(|t| t.elapsed_ms).sum()
    }

    pub(crate) fn record_timing(&mut self, stage: BuildStage, elapsed: Duration) {
        self.timings.push(StageTiming::new(stage, elapsed));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_totals() {
        let mut report = BuildReport::default();
        report.record_timing(BuildStage::DocumentsAssembled, Duration::from_millis(5));
        report.record_timing(BuildStage::LexiconBuilt, Duration::from_millis(7));
        report.skipped.push(SkippedRecord {
            index: 3,
            reason: "missing required field `text`".to_string(),
        });

        assert_eq!(report.total_ms(), 12);
        assert_eq!(report.skipped_count(), 1);
    }

    #[test]
    fn test_serializes_stage_names() {
        let timing = StageTiming::new(BuildStage::ForwardIndexBuilt, Duration::from_secs(1));
        let json = serde_json::to_string(&timing).unwrap();
        assert_eq!(json, r#"{"stage":"forward_index_built","elapsed_ms":1000}"#);
    }
}
