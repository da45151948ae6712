//! Graph collector configuration

use serde::{Deserialize, Serialize};
use termdb_core::{Error, Nid, PremiseType, Result};

/// Default rayon split granularity (concepts per task).
pub const DEFAULT_MIN_BATCH_LEN: usize = 1024;

/// Configuration for a taxonomy graph collection run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectorConfig {
    /// Which edges to follow: stated (authored) or inferred (classifier output).
    ///
    /// Default: inferred
    pub premise: PremiseType,

    /// Relationship type of the is-a edge.
    ///
    /// The default is a placeholder and fails [`validate`](Self::validate);
    /// callers must set the terminology's is-a nid.
    pub is_a: Nid,

    /// Worker thread count for a dedicated pool.
    ///
    /// `None` runs on the rayon global pool.
    pub threads: Option<usize>,

    /// Minimum number of concepts a rayon task processes before splitting.
    ///
    /// Default: 1024
    pub min_batch_len: usize,

    /// Log concepts without a taxonomy record at `warn` instead of `trace`.
    ///
    /// Default: true
    pub log_missing: bool,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            premise: PremiseType::default(),
            is_a: Nid::UNSPECIFIED,
            threads: None,
            min_batch_len: DEFAULT_MIN_BATCH_LEN,
            log_missing: true,
        }
    }
}

impl CollectorConfig {
    /// Configuration for `is_a` with every other setting at its default
    pub fn new(is_a: Nid) -> Self {
        Self {
            is_a,
            ..Self::default()
        }
    }

    /// Parse a JSON document. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Builder method to set the premise
    pub fn with_premise(mut self, premise: PremiseType) -> Self {
        self.premise = premise;
        self
    }

    /// Builder method to set the is-a relationship type
    pub fn with_is_a(mut self, is_a: Nid) -> Self {
        self.is_a = is_a;
        self
    }

    /// Builder method to run on a dedicated pool of `threads` workers
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = Some(threads);
        self
    }

    /// Builder method to set the rayon split granularity
    pub fn with_min_batch_len(mut self, min_batch_len: usize) -> Self {
        self.min_batch_len = min_batch_len;
        self
    }

    /// Builder method to choose the log level for missing records
    pub fn with_log_missing(mut self, log_missing: bool) -> Self {
        self.log_missing = log_missing;
        self
    }

    /// Reject settings the collector cannot run with.
    pub fn validate(&self) -> Result<()> {
        if !self.is_a.is_valid() {
            return Err(Error::config(format!(
                "is_a must be a concept nid (negative), got {}",
                self.is_a.0
            )));
        }
        if self.threads == Some(0) {
            return Err(Error::config("threads must be at least 1"));
        }
        if self.min_batch_len == 0 {
            return Err(Error::config("min_batch_len must be at least 1"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_needs_is_a() {
        let config = CollectorConfig::default();
        assert_eq!(config.premise, PremiseType::Inferred);
        assert_eq!(config.min_batch_len, DEFAULT_MIN_BATCH_LEN);
        assert!(config.log_missing);
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        CollectorConfig::new(Nid(-50)).validate().unwrap();
    }

    #[test]
    fn test_builders() {
        let config = CollectorConfig::new(Nid(-50))
            .with_premise(PremiseType::Stated)
            .with_threads(4)
            .with_min_batch_len(16)
            .with_log_missing(false);
        assert_eq!(config.premise, PremiseType::Stated);
        assert_eq!(config.threads, Some(4));
        assert_eq!(config.min_batch_len, 16);
        assert!(!config.log_missing);
        config.validate().unwrap();
    }

    #[test]
    fn test_validate_rejects_zero_sizes() {
        let base = CollectorConfig::new(Nid(-50));
        assert!(base.clone().with_threads(0).validate().is_err());
        assert!(base.clone().with_min_batch_len(0).validate().is_err());
        assert!(base.with_is_a(Nid(50)).validate().is_err());
    }

    #[test]
    fn test_from_json_fills_defaults() {
        let config = CollectorConfig::from_json(r#"{"is_a": -50, "premise": "stated"}"#).unwrap();
        assert_eq!(config.is_a, Nid(-50));
        assert_eq!(config.premise, PremiseType::Stated);
        assert_eq!(config.threads, None);
        assert_eq!(config.min_batch_len, DEFAULT_MIN_BATCH_LEN);
    }

    #[test]
    fn test_from_json_errors() {
        assert!(matches!(
            CollectorConfig::from_json("{not json"),
            Err(Error::Json(_))
        ));
        assert!(matches!(
            CollectorConfig::from_json(r#"{"is_a": -50, "threads": 0}"#),
            Err(Error::Config(_))
        ));
    }
}
