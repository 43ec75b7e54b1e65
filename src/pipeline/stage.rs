//! Build stages and their order.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{CreaseError, Result};

/// Where a build is. Stages only move forward, one step at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildStage {
    Empty,
    DocumentsAssembled,
    LexiconBuilt,
    ForwardIndexBuilt,
    InvertedIndexBuilt,
    BarrelsPersisted,
}

impl BuildStage {
    /// All stages in order.
    pub const ALL: [BuildStage; 6] = [
        BuildStage::Empty,
        BuildStage::DocumentsAssembled,
        BuildStage::LexiconBuilt,
        BuildStage::ForwardIndexBuilt,
        BuildStage::InvertedIndexBuilt,
        BuildStage::BarrelsPersisted,
    ];

    /// The stage that must be complete before this one can be produced.
    pub fn predecessor(self) -> Option<BuildStage> {
        match self {
            BuildStage::Empty => None,
            BuildStage::DocumentsAssembled => Some(BuildStage::Empty),
            BuildStage::LexiconBuilt => Some(BuildStage::DocumentsAssembled),
            BuildStage::ForwardIndexBuilt => Some(BuildStage::LexiconBuilt),
            BuildStage::InvertedIndexBuilt => Some(BuildStage::ForwardIndexBuilt),
            BuildStage::BarrelsPersisted => Some(BuildStage::InvertedIndexBuilt),
        }
    }

    pub fn is_terminal(self) -> bool {
        self == BuildStage::BarrelsPersisted
    }

    pub fn name(self) -> &'static str {
        match self {
            BuildStage::Empty => "empty",
            BuildStage::DocumentsAssembled => "documents_assembled",
            BuildStage::LexiconBuilt => "lexicon_built",
            BuildStage::ForwardIndexBuilt => "forward_index_built",
            BuildStage::InvertedIndexBuilt => "inverted_index_built",
            BuildStage::BarrelsPersisted => "barrels_persisted",
        }
    }

    /// Check that a build currently at `self` may produce `target`.
    pub fn check_transition(self, target: BuildStage) -> Result<()> {
        match target.predecessor() {
            Some(required) if required == self => Ok(()),
            Some(required) => Err(CreaseError::incomplete_build(
                format!("stage {required} before {target}"),
                format!("stage {self}"),
            )),
            None => Err(CreaseError::incomplete_build(
                format!("a stage after {}", BuildStage::Empty),
                format!("transition to {target}"),
            )),
        }
    }
}

impl fmt::Display for BuildStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
