//! Configuration for the knowledge-base pipeline.

use serde::{Deserialize, Serialize};

use crate::error::{RagError, Result};

/// Collection used when none is configured.
pub const DEFAULT_COLLECTION: &str = "project_knowledge_base";

/// Result limit applied when the caller asks for a non-positive number.
pub const DEFAULT_MAX_RESULTS: usize = 5;

/// Answer returned when retrieval finds nothing.
pub const NO_RESULTS_ANSWER: &str =
    "Sorry, no relevant information was found in the knowledge base.";

/// Configuration parameters for the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RagConfig {
    /// Name of the vector-store collection the pipeline works on.
    pub collection: String,
    /// Search limit substituted for non-positive `max_results`.
    pub default_max_results: usize,
    /// Fixed answer for queries that retrieve no documents.
    pub no_results_answer: String,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            collection: DEFAULT_COLLECTION.to_string(),
            default_max_results: DEFAULT_MAX_RESULTS,
            no_results_answer: NO_RESULTS_ANSWER.to_string(),
        }
    }
}

impl RagConfig {
    /// Create a new builder for constructing a [`RagConfig`].
    pub fn builder() -> RagConfigBuilder {
        RagConfigBuilder::default()
    }
}

/// Builder for constructing a validated [`RagConfig`].
#[derive(Debug, Clone, Default)]
pub struct RagConfigBuilder {
    config: RagConfig,
}

impl RagConfigBuilder {
    /// Set the collection name.
    pub fn collection(mut self, name: impl Into<String>) -> Self {
        self.config.collection = name.into();
        self
    }

    /// Set the default search limit.
    pub fn default_max_results(mut self, limit: usize) -> Self {
        self.config.default_max_results = limit;
        self
    }

    /// Set the answer returned when nothing is retrieved.
    pub fn no_results_answer(mut self, answer: impl Into<String>) -> Self {
        self.config.no_results_answer = answer.into();
        self
    }

    /// Build the [`RagConfig`], validating that parameters are consistent.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if:
    /// - `collection` is blank
    /// - `default_max_results == 0`
    pub fn build(self) -> Result<RagConfig> {
        if self.config.collection.trim().is_empty() {
            return Err(RagError::ConfigError("collection name must not be empty".to_string()));
        }
        if self.config.default_max_results == 0 {
            return Err(RagError::ConfigError(
                "default_max_results must be greater than zero".to_string(),
            ));
        }
        Ok(self.config)
    }
}
