//! Error types for the Crease library.
//!
//! All errors are represented by the [`CreaseError`] enum. The first four
//! variants are the pipeline's own error kinds; the rest wrap the ambient
//! failures (I/O, storage, JSON, CSV, configuration).
//!
//! # Examples
//!
//! ```
//! use crease::error::{CreaseError, Result};
//!
//! fn example_operation() -> Result<()> {
//!     Err(CreaseError::invalid_config("barrel capacity must be positive"))
//! }
//!
//! match example_operation() {
//!     Ok(_) => println!("Success"),
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

use std::io;

use thiserror::Error;

/// The main error type for Crease operations.
#[derive(Error, Debug)]
pub enum CreaseError {
    /// A raw record is structurally invalid (a required field is missing entirely).
    #[error("Malformed record {index}: {reason}")]
    MalformedRecord {
        /// Zero-based position of the record in the input stream.
        index: u64,
        /// What was wrong with it.
        reason: String,
    },

    /// A term or term id was referenced that the lexicon does not contain.
    ///
    /// Always fatal: it means a stage ran against an incomplete lexicon.
    #[error("Unknown term: {0}")]
    UnknownTerm(String),

    /// An artifact could not be written or read in its expected shape.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// A stage was invoked before its prerequisite stage finished.
    #[error("Incomplete build: expected {expected}, found {actual}")]
    IncompleteBuild {
        /// The stage the caller needed to have completed.
        expected: String,
        /// The stage the build was actually in.
        actual: String,
    },

    /// I/O errors (file operations).
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Storage-related errors.
    #[error("Storage error: {0}")]
    Storage(String),

    /// JSON serialization/deserialization errors (manifest, config, stored fields).
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV parsing errors from the record source.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Generic error for other cases.
    #[error("Error: {0}")]
    Other(String),
}

/// Result type alias for operations that may fail with CreaseError.
pub type Result<T> = std::result::Result<T, CreaseError>;

impl CreaseError {
    /// Create a new malformed record error.
    pub fn malformed_record<S: Into<String>>(index: u64, reason: S) -> Self {
        CreaseError::MalformedRecord {
            index,
            reason: reason.into(),
        }
    }

    /// Create a new unknown term error.
    pub fn unknown_term<S: Into<String>>(msg: S) -> Self {
        CreaseError::UnknownTerm(msg.into())
    }

    /// Create a new serialization error.
    pub fn serialization<S: Into<String>>(msg: S) -> Self {
        CreaseError::Serialization(msg.into())
    }

    /// Create a new incomplete build error.
    pub fn incomplete_build<E: ToString, A: ToString>(expected: E, actual: A) -> Self {
        CreaseError::IncompleteBuild {
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }

    /// Create a new storage error.
    pub fn storage<S: Into<String>>(msg: S) -> Self {
        CreaseError::Storage(msg.into())
    }

    /// Create a new invalid config error.
    pub fn invalid_config<S: Into<String>>(msg: S) -> Self {
        CreaseError::InvalidConfig(msg.into())
    }

    /// Create a new generic error.
    pub fn other<S: Into<String>>(msg: S) -> Self {
        CreaseError::Other(msg.into())
    }

    /// Create a new internal error.
    pub fn internal<S: Into<String>>(msg: S) -> Self {
        CreaseError::Other(format!("Internal error: {}", msg.into()))
    }

    /// Whether this error must abort the whole build regardless of strictness.
    ///
    /// Only [`CreaseError::MalformedRecord`] is recoverable (the record is skipped).
    pub fn is_fatal(&self) -> bool {
        !matches!(self, CreaseError::MalformedRecord { .. })
    }
}
