//! Error types for termdb

use crate::ids::Nid;
use thiserror::Error;

/// Result type alias using our Error
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed packed taxonomy array
    #[error("Invalid taxonomy record at word {offset}: {reason}")]
    InvalidRecord { offset: usize, reason: String },

    /// Edge record with a word outside its identifier space
    #[error("Invalid edge record: {0}")]
    InvalidEdge(String),

    /// Two edge records sharing a key could not be reconciled
    #[error("Taxonomy merge conflict: {0}")]
    MergeConflict(String),

    /// No taxonomy array exists for the concept
    #[error("No taxonomy record for {0}")]
    MissingRecord(Nid),

    /// Invalid configuration or runtime setup
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON parsing error (serde_json)
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create an invalid record error at a word offset
    pub fn invalid_record(offset: usize, reason: impl Into<String>) -> Self {
        Error::InvalidRecord {
            offset,
            reason: reason.into(),
        }
    }

    /// Create an invalid edge error
    pub fn invalid_edge(msg: impl Into<String>) -> Self {
        Error::InvalidEdge(msg.into())
    }

    /// Create a merge conflict error
    pub fn merge_conflict(msg: impl Into<String>) -> Self {
        Error::MergeConflict(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }

    /// True for the invalid-record category: corrupt input that must not be
    /// retried or tolerated.
    pub fn is_invalid_record(&self) -> bool {
        matches!(self, Error::InvalidRecord { .. } | Error::InvalidEdge(_))
    }
}
