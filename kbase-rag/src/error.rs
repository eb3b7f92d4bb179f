//! Error types for the `kbase-rag` crate.

use thiserror::Error;

/// Errors that can occur in knowledge-base operations.
#[derive(Debug, Error)]
pub enum RagError {
    /// The embedding provider failed to produce a vector.
    #[error("Embedding error ({provider}): {message}")]
    EmbeddingError {
        /// The embedding provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// Retrieval from the vector store failed.
    #[error("Search error ({backend}): {message}")]
    SearchError {
        /// The vector store backend that produced the error.
        backend: String,
        /// A description of the failure.
        message: String,
    },

    /// The answer generator failed.
    #[error("Generation error ({provider}): {message}")]
    GenerationError {
        /// The answer generator that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// Persisting to, or managing collections in, the vector store failed.
    #[error("Store error ({backend}): {message}")]
    StoreError {
        /// The vector store backend that produced the error.
        backend: String,
        /// A description of the failure.
        message: String,
    },

    /// A configuration validation error.
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// A convenience result type for knowledge-base operations.
pub type Result<T> = std::result::Result<T, RagError>;
