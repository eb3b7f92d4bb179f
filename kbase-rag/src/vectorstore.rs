//! Vector store trait for storing and searching documents.

use async_trait::async_trait;

use crate::document::Document;
use crate::error::Result;

/// A storage backend for embedded documents with similarity search.
///
/// A store is bound to one working collection for
/// [`add_documents`](VectorStore::add_documents) and
/// [`search`](VectorStore::search); collection lifecycle calls take the
/// collection name explicitly. Ranking policy belongs to the store.
///
/// # Example
///
/// ```rust,ignore
/// use kbase_rag::{InMemoryVectorStore, VectorStore};
///
/// let store = InMemoryVectorStore::new(embedder, "docs");
/// store.create_collection("docs").await?;
/// store.add_documents(&documents).await?;
/// let hits = store.search("how is the backend structured?", 5).await?;
/// ```
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Create a named collection. Succeeds if it already exists.
    async fn create_collection(&self, name: &str) -> Result<()>;

    /// Add documents to the working collection. Documents must have embeddings set.
    async fn add_documents(&self, documents: &[Document]) -> Result<()>;

    /// Return up to `limit` documents most similar to `query`, best first.
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<Document>>;

    /// Delete a named collection and all its documents.
    async fn delete_collection(&self, name: &str) -> Result<()>;

    /// The backend name for diagnostics.
    fn name(&self) -> &str;
}
