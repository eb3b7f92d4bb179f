//! Retrieval-augmented question answering over a project knowledge base.
//!
//! This crate provides:
//! - The [`Document`] / [`QueryResult`] data model
//! - Collaborator traits: [`EmbeddingProvider`], [`VectorStore`], [`AnswerGenerator`]
//! - The [`RagPipeline`] orchestrator for indexing and querying
//! - The context builder and confidence heuristic used by queries
//! - An in-memory store and offline collaborators, plus feature-gated
//!   OpenAI (`openai`) and ChromaDB (`chroma`) backends

pub mod confidence;
pub mod config;
pub mod context;
pub mod document;
pub mod embedding;
pub mod error;
pub mod generation;
pub mod inmemory;
pub mod offline;
pub mod pipeline;
pub mod vectorstore;

#[cfg(feature = "chroma")]
pub mod chroma;
#[cfg(feature = "openai")]
pub mod openai;

pub use confidence::calculate_confidence;
pub use config::{RagConfig, RagConfigBuilder};
pub use context::build_context;
pub use document::{Document, QueryResult, SearchResponse};
pub use embedding::EmbeddingProvider;
pub use error::{RagError, Result};
pub use generation::AnswerGenerator;
pub use inmemory::InMemoryVectorStore;
pub use offline::{CannedAnswerGenerator, HashEmbeddingProvider};
pub use pipeline::{RagPipeline, RagPipelineBuilder};
pub use vectorstore::VectorStore;
