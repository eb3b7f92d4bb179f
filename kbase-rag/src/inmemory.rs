//! In-memory vector store using cosine similarity.
//!
//! This module provides [`InMemoryVectorStore`], a vector store backed by a
//! `HashMap` protected by a `tokio::sync::RwLock`. It is suitable for
//! development, offline mode, and tests.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use crate::document::Document;
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::vectorstore::VectorStore;

const BACKEND: &str = "InMemory";

/// An in-memory vector store using cosine similarity for search.
///
/// Collections map to insertion-ordered document lists; re-adding an id
/// replaces the stored document in place. Query text is embedded with the
/// store's own [`EmbeddingProvider`]. Equal scores keep insertion order.
///
/// # Example
///
/// ```rust,ignore
/// use kbase_rag::{HashEmbeddingProvider, InMemoryVectorStore, VectorStore};
///
/// let store = InMemoryVectorStore::new(Arc::new(HashEmbeddingProvider::new(64)), "docs");
/// store.create_collection("docs").await?;
/// ```
pub struct InMemoryVectorStore {
    embedder: Arc<dyn EmbeddingProvider>,
    collection: String,
    collections: RwLock<HashMap<String, Collection>>,
}

/// Documents in insertion order plus an id → position index for upserts.
#[derive(Default)]
struct Collection {
    documents: Vec<Document>,
    positions: HashMap<String, usize>,
}

impl Collection {
    fn upsert(&mut self, document: &Document) {
        match self.positions.get(&document.id) {
            Some(&position) => self.documents[position] = document.clone(),
            None => {
                self.positions.insert(document.id.clone(), self.documents.len());
                self.documents.push(document.clone());
            }
        }
    }
}

impl InMemoryVectorStore {
    /// Create an empty store working on `collection`.
    pub fn new(embedder: Arc<dyn EmbeddingProvider>, collection: impl Into<String>) -> Self {
        Self { embedder, collection: collection.into(), collections: RwLock::default() }
    }

    fn missing_collection(&self) -> String {
        format!("collection '{}' does not exist", self.collection)
    }
}

/// Compute cosine similarity between two vectors.
///
/// Returns 0.0 if either vector has zero magnitude or the widths differ.
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    async fn create_collection(&self, name: &str) -> Result<()> {
        let mut collections = self.collections.write().await;
        collections.entry(name.to_string()).or_default();
        Ok(())
    }

    async fn add_documents(&self, documents: &[Document]) -> Result<()> {
        let mut collections = self.collections.write().await;
        let store = collections.get_mut(&self.collection).ok_or_else(|| {
            RagError::StoreError { backend: BACKEND.to_string(), message: self.missing_collection() }
        })?;

        for document in documents {
            store.upsert(document);
        }
        debug!(collection = %self.collection, count = documents.len(), "stored documents");
        Ok(())
    }

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<Document>> {
        let query_embedding = self.embedder.embed(query).await.map_err(|e| {
            RagError::SearchError {
                backend: BACKEND.to_string(),
                message: format!("query embedding failed: {e}"),
            }
        })?;

        let collections = self.collections.read().await;
        let store = collections.get(&self.collection).ok_or_else(|| RagError::SearchError {
            backend: BACKEND.to_string(),
            message: self.missing_collection(),
        })?;

        let mut scored: Vec<(f32, &Document)> = store
            .documents
            .iter()
            .map(|document| {
                let embedding = document.embedding.as_deref().unwrap_or_default();
                (cosine_similarity(embedding, &query_embedding), document)
            })
            .collect();

        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        Ok(scored.into_iter().take(limit).map(|(_, document)| document.clone()).collect())
    }

    async fn delete_collection(&self, name: &str) -> Result<()> {
        let mut collections = self.collections.write().await;
        collections.remove(name);
        Ok(())
    }

    fn name(&self) -> &str {
        BACKEND
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::offline::HashEmbeddingProvider;

    #[tokio::test]
    async fn re_adding_an_id_replaces_in_place() {
        let store = InMemoryVectorStore::new(Arc::new(HashEmbeddingProvider::new(64)), "kb");
        store.create_collection("kb").await.unwrap();

        let first = Document::new("a", "first").with_embedding(vec![1.0; 64]);
        let second = Document::new("b", "second").with_embedding(vec![1.0; 64]);
        store.add_documents(&[first, second]).await.unwrap();
        let updated = Document::new("a", "updated").with_embedding(vec![1.0; 64]);
        store.add_documents(&[updated]).await.unwrap();

        let collections = store.collections.read().await;
        let contents: Vec<&str> =
            collections["kb"].documents.iter().map(|d| d.content.as_str()).collect();
        assert_eq!(contents, ["updated", "second"]);
    }

    #[test]
    fn cosine_of_parallel_vectors_is_one() {
        let score = cosine_similarity(&[1.0, 2.0], &[2.0, 4.0]);
        assert!((score - 1.0).abs() < 1e-6);
    }

    #[test]
    fn mismatched_or_zero_vectors_score_zero() {
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
    }
}
