//! Knowledge-base pipeline orchestrator.
//!
//! The [`RagPipeline`] coordinates indexing (embed → store) and question
//! answering (search → context → generate → score) by composing an
//! [`EmbeddingProvider`], a [`VectorStore`], and an [`AnswerGenerator`].
//!
//! # Example
//!
//! ```rust,ignore
//! use kbase_rag::{RagPipeline, RagConfig, InMemoryVectorStore, HashEmbeddingProvider};
//!
//! let embedder = Arc::new(HashEmbeddingProvider::new(64));
//! let pipeline = RagPipeline::builder()
//!     .config(RagConfig::default())
//!     .embedding_provider(embedder.clone())
//!     .vector_store(Arc::new(InMemoryVectorStore::new(embedder, "project_knowledge_base")))
//!     .answer_generator(Arc::new(CannedAnswerGenerator::default()))
//!     .build()?;
//!
//! pipeline.initialize().await?;
//! pipeline.index(documents).await?;
//! let result = pipeline.query("How is the backend structured?", 5).await?;
//! ```

use std::sync::Arc;

use tracing::{error, info, warn};

use crate::confidence::calculate_confidence;
use crate::config::RagConfig;
use crate::context::build_context;
use crate::document::{Document, QueryResult};
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::generation::AnswerGenerator;
use crate::vectorstore::VectorStore;

/// Question used by [`RagPipeline::health_check`].
const HEALTH_CHECK_QUESTION: &str = "test";

/// The knowledge-base pipeline orchestrator.
///
/// Holds no mutable state: every call is independent and collaborators are
/// shared through `Arc`, so one pipeline serves concurrent requests.
/// Construct one via [`RagPipeline::builder()`].
pub struct RagPipeline {
    config: RagConfig,
    embedding_provider: Arc<dyn EmbeddingProvider>,
    vector_store: Arc<dyn VectorStore>,
    answer_generator: Arc<dyn AnswerGenerator>,
}

impl std::fmt::Debug for RagPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RagPipeline")
            .field("config", &self.config)
            .field("embedding_provider", &self.embedding_provider.name())
            .field("vector_store", &self.vector_store.name())
            .field("answer_generator", &self.answer_generator.name())
            .finish()
    }
}

impl RagPipeline {
    /// Create a new [`RagPipelineBuilder`].
    pub fn builder() -> RagPipelineBuilder {
        RagPipelineBuilder::default()
    }

    /// Return a reference to the pipeline configuration.
    pub fn config(&self) -> &RagConfig {
        &self.config
    }

    /// Return a reference to the vector store.
    pub fn vector_store(&self) -> &Arc<dyn VectorStore> {
        &self.vector_store
    }

    /// Create the configured collection. Succeeds if it already exists.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::StoreError`] if the vector store operation fails.
    pub async fn initialize(&self) -> Result<()> {
        let name = self.config.collection.as_str();
        self.vector_store.create_collection(name).await.map_err(|e| {
            error!(collection = name, error = %e, "failed to create collection");
            RagError::StoreError {
                backend: self.vector_store.name().to_string(),
                message: format!("failed to create collection '{name}': {e}"),
            }
        })?;
        info!(collection = name, "knowledge base initialized");
        Ok(())
    }

    /// Delete the configured collection and everything in it.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::StoreError`] if the vector store operation fails.
    pub async fn delete_collection(&self) -> Result<()> {
        let name = self.config.collection.as_str();
        self.vector_store.delete_collection(name).await.map_err(|e| {
            error!(collection = name, error = %e, "failed to delete collection");
            RagError::StoreError {
                backend: self.vector_store.name().to_string(),
                message: format!("failed to delete collection '{name}': {e}"),
            }
        })
    }

    /// Embed every document that lacks an embedding, then store the batch.
    ///
    /// Documents already carrying a non-empty embedding are passed through
    /// without consulting the provider. All embeddings are computed before
    /// the store is called, so a failure leaves nothing stored. Empty ids
    /// are replaced with generated UUIDs. Returns the number of documents
    /// stored.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::EmbeddingError`] if embedding fails or produces
    /// vectors of the wrong width, and [`RagError::StoreError`] if the store
    /// rejects the batch.
    pub async fn index(&self, mut documents: Vec<Document>) -> Result<usize> {
        if documents.is_empty() {
            return Ok(0);
        }

        for document in &mut documents {
            if document.id.is_empty() {
                document.id = uuid::Uuid::new_v4().to_string();
            }
        }

        let dimensions = self.embedding_provider.dimensions();
        let pending: Vec<usize> = documents
            .iter()
            .enumerate()
            .filter(|(_, document)| !document.has_embedding())
            .map(|(position, _)| position)
            .collect();

        if let Some(document) = documents
            .iter()
            .find(|d| d.has_embedding() && d.embedding.as_ref().map(Vec::len) != Some(dimensions))
        {
            return Err(self.embedding_error(format!(
                "document '{}' has an embedding of width {}, expected {dimensions}",
                document.id,
                document.embedding.as_ref().map_or(0, Vec::len),
            )));
        }

        if !pending.is_empty() {
            let texts: Vec<&str> =
                pending.iter().map(|&position| documents[position].content.as_str()).collect();
            let embeddings = self.embedding_provider.embed_batch(&texts).await.map_err(|e| {
                error!(pending = pending.len(), error = %e, "embedding failed during indexing");
                self.embedding_error(format!("failed to generate embeddings: {e}"))
            })?;

            if embeddings.len() != pending.len() {
                return Err(self.embedding_error(format!(
                    "provider returned {} embeddings for {} documents",
                    embeddings.len(),
                    pending.len()
                )));
            }
            if let Some((&position, embedding)) =
                pending.iter().zip(&embeddings).find(|(_, e)| e.len() != dimensions || e.is_empty())
            {
                return Err(self.embedding_error(format!(
                    "embedding for document '{}' has width {}, expected {dimensions}",
                    documents[position].id,
                    embedding.len()
                )));
            }

            for (position, embedding) in pending.iter().zip(embeddings) {
                documents[*position].embedding = Some(embedding);
            }
        }

        self.vector_store.add_documents(&documents).await.map_err(|e| {
            error!(document_count = documents.len(), error = %e, "store failed during indexing");
            RagError::StoreError {
                backend: self.vector_store.name().to_string(),
                message: format!("failed to add documents: {e}"),
            }
        })?;

        info!(document_count = documents.len(), embedded = pending.len(), "indexed documents");
        Ok(documents.len())
    }

    /// Retrieve up to `max_results` documents for `question` without
    /// generating an answer. Non-positive limits use the configured default.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::SearchError`] if retrieval fails.
    pub async fn search(&self, question: &str, max_results: i64) -> Result<Vec<Document>> {
        let limit = self.normalize_limit(max_results);
        self.vector_store.search(question, limit).await.map_err(|e| {
            error!(limit, error = %e, "vector store search failed");
            RagError::SearchError {
                backend: self.vector_store.name().to_string(),
                message: format!("failed to search vector store: {e}"),
            }
        })
    }

    /// Answer `question` from the knowledge base.
    ///
    /// Retrieves up to `max_results` documents (non-positive → configured
    /// default), assembles them into a context block, asks the answer
    /// generator, and scores the result with
    /// [`calculate_confidence`]. When nothing is retrieved the configured
    /// no-results answer is returned with confidence `0.0` and the generator
    /// is not called.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::SearchError`] if retrieval fails and
    /// [`RagError::GenerationError`] if answer generation fails.
    pub async fn query(&self, question: &str, max_results: i64) -> Result<QueryResult> {
        let sources = self.search(question, max_results).await?;

        if sources.is_empty() {
            info!(result_count = 0, "query found no relevant documents");
            return Ok(QueryResult {
                answer: self.config.no_results_answer.clone(),
                sources: Vec::new(),
                confidence: 0.0,
            });
        }

        let context = build_context(&sources);

        let answer =
            self.answer_generator.generate_answer(question, &context).await.map_err(|e| {
                error!(error = %e, "answer generation failed");
                RagError::GenerationError {
                    provider: self.answer_generator.name().to_string(),
                    message: format!("failed to generate answer: {e}"),
                }
            })?;

        let context_length = context.chars().count();
        let confidence = calculate_confidence(sources.len(), context_length);

        info!(result_count = sources.len(), context_length, confidence, "query completed");

        Ok(QueryResult { answer, sources, confidence })
    }

    /// Run a trivial query end to end.
    ///
    /// # Errors
    ///
    /// Returns whatever error the query pipeline produced.
    pub async fn health_check(&self) -> Result<()> {
        self.query(HEALTH_CHECK_QUESTION, 1).await.map(|_| ()).inspect_err(|e| {
            warn!(error = %e, "health check failed");
        })
    }

    fn normalize_limit(&self, max_results: i64) -> usize {
        if max_results <= 0 {
            self.config.default_max_results
        } else {
            usize::try_from(max_results).unwrap_or(usize::MAX)
        }
    }

    fn embedding_error(&self, message: String) -> RagError {
        RagError::EmbeddingError { provider: self.embedding_provider.name().to_string(), message }
    }
}

/// Builder for constructing a [`RagPipeline`].
///
/// All collaborators are required; the configuration defaults to
/// [`RagConfig::default()`]. Call [`build()`](RagPipelineBuilder::build)
/// to validate and produce the pipeline.
#[derive(Default)]
pub struct RagPipelineBuilder {
    config: Option<RagConfig>,
    embedding_provider: Option<Arc<dyn EmbeddingProvider>>,
    vector_store: Option<Arc<dyn VectorStore>>,
    answer_generator: Option<Arc<dyn AnswerGenerator>>,
}

impl RagPipelineBuilder {
    /// Set the pipeline configuration.
    pub fn config(mut self, config: RagConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the embedding provider.
    pub fn embedding_provider(mut self, provider: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedding_provider = Some(provider);
        self
    }

    /// Set the vector store backend.
    pub fn vector_store(mut self, store: Arc<dyn VectorStore>) -> Self {
        self.vector_store = Some(store);
        self
    }

    /// Set the answer generator.
    pub fn answer_generator(mut self, generator: Arc<dyn AnswerGenerator>) -> Self {
        self.answer_generator = Some(generator);
        self
    }

    /// Build the [`RagPipeline`], validating that all required fields are set.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if any collaborator is missing.
    pub fn build(self) -> Result<RagPipeline> {
        let embedding_provider = self
            .embedding_provider
            .ok_or_else(|| RagError::ConfigError("embedding_provider is required".to_string()))?;
        let vector_store = self
            .vector_store
            .ok_or_else(|| RagError::ConfigError("vector_store is required".to_string()))?;
        let answer_generator = self
            .answer_generator
            .ok_or_else(|| RagError::ConfigError("answer_generator is required".to_string()))?;

        Ok(RagPipeline {
            config: self.config.unwrap_or_default(),
            embedding_provider,
            vector_store,
            answer_generator,
        })
    }
}
