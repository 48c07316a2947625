//! Query core configuration
//!
//! Loaded from JSON; every field is optional.

use serde::{Deserialize, Serialize};

use crate::index::IndexInvalidation;
use crate::observability::{Logger, Severity};
use crate::store::ResolveConcurrency;

use super::error::CoreResult;

/// Query core configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryConfig {
    /// Scheduling of resolver calls within one type (default: sequential)
    #[serde(default)]
    pub resolve_concurrency: ResolveConcurrency,

    /// When cached indexes are rebuilt (default: on store generation change)
    #[serde(default)]
    pub index_invalidation: IndexInvalidation,

    /// Minimum severity written by the logger (default: info)
    #[serde(default = "default_log_level")]
    pub log_level: Severity,
}

fn default_log_level() -> Severity {
    Severity::Info
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            resolve_concurrency: ResolveConcurrency::default(),
            index_invalidation: IndexInvalidation::default(),
            log_level: default_log_level(),
        }
    }
}

impl QueryConfig {
    /// Parses a configuration from a JSON document
    pub fn from_json(source: &str) -> CoreResult<Self> {
        Ok(serde_json::from_str(source)?)
    }

    pub fn with_resolve_concurrency(mut self, concurrency: ResolveConcurrency) -> Self {
        self.resolve_concurrency = concurrency;
        self
    }

    pub fn with_index_invalidation(mut self, invalidation: IndexInvalidation) -> Self {
        self.index_invalidation = invalidation;
        self
    }

    /// Applies `log_level` to the process-wide logger
    pub fn apply_logging(&self) {
        Logger::set_min_severity(self.log_level);
    }
}
