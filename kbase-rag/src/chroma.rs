//! ChromaDB vector store backend.
//!
//! Provides [`ChromaVectorStore`] which implements [`VectorStore`] against
//! the ChromaDB v1 REST API using `reqwest`. Query text is embedded locally
//! with the store's [`EmbeddingProvider`] and sent as a query embedding.
//!
//! # Example
//!
//! ```rust,ignore
//! use kbase_rag::chroma::ChromaVectorStore;
//!
//! let store = ChromaVectorStore::new("http://localhost:8000", "docs", embedder);
//! store.create_collection("docs").await?;
//! store.add_documents(&documents).await?;
//! let hits = store.search("deployment steps", 5).await?;
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use tracing::debug;

use crate::document::Document;
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::vectorstore::VectorStore;

const BACKEND: &str = "chroma";

/// A [`VectorStore`] backed by [ChromaDB](https://www.trychroma.com/).
///
/// Document content is stored as the Chroma document text and metadata as
/// Chroma metadata. Chroma accepts only scalar metadata, so arrays and
/// objects are stored as JSON strings and decoded again on search; nulls are
/// dropped.
pub struct ChromaVectorStore {
    client: reqwest::Client,
    base_url: String,
    collection: String,
    embedder: Arc<dyn EmbeddingProvider>,
}

impl ChromaVectorStore {
    /// Create a store for `collection` on the Chroma server at `base_url`.
    pub fn new(
        base_url: impl Into<String>,
        collection: impl Into<String>,
        embedder: Arc<dyn EmbeddingProvider>,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            collection: collection.into(),
            embedder,
        }
    }

    fn collections_url(&self) -> String {
        format!("{}/api/v1/collections", self.base_url)
    }

    fn store_error(message: impl Into<String>) -> RagError {
        RagError::StoreError { backend: BACKEND.to_string(), message: message.into() }
    }

    fn search_error(message: impl Into<String>) -> RagError {
        RagError::SearchError { backend: BACKEND.to_string(), message: message.into() }
    }

    /// Resolve the server-side id of the working collection.
    async fn collection_id(&self) -> std::result::Result<String, String> {
        let response = self
            .client
            .get(format!("{}/{}", self.collections_url(), self.collection))
            .send()
            .await
            .map_err(|e| format!("request failed: {e}"))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(format!("collection '{}' lookup returned {status}: {body}", self.collection));
        }

        let info: CollectionInfo =
            response.json().await.map_err(|e| format!("failed to parse collection: {e}"))?;
        Ok(info.id)
    }
}

/// Convert metadata to Chroma's scalar-only representation.
fn to_chroma_metadata(metadata: &HashMap<String, Value>) -> Option<Map<String, Value>> {
    let converted: Map<String, Value> = metadata
        .iter()
        .filter_map(|(key, value)| {
            let value = match value {
                Value::Null => return None,
                Value::Array(_) | Value::Object(_) => Value::String(value.to_string()),
                scalar => scalar.clone(),
            };
            Some((key.clone(), value))
        })
        .collect();
    if converted.is_empty() { None } else { Some(converted) }
}

/// Undo [`to_chroma_metadata`]: strings holding a JSON array or object are
/// decoded back to structured values.
fn from_chroma_metadata(metadata: HashMap<String, Value>) -> HashMap<String, Value> {
    metadata
        .into_iter()
        .map(|(key, value)| {
            let value = match value {
                Value::String(text) if text.starts_with('[') || text.starts_with('{') => {
                    match serde_json::from_str::<Value>(&text) {
                        Ok(decoded @ (Value::Array(_) | Value::Object(_))) => decoded,
                        _ => Value::String(text),
                    }
                }
                other => other,
            };
            (key, value)
        })
        .collect()
}

// ── Chroma API request/response types ──────────────────────────────

#[derive(Deserialize)]
struct CollectionInfo {
    id: String,
}

#[derive(Serialize)]
struct AddRequest<'a> {
    ids: Vec<&'a str>,
    embeddings: Vec<&'a [f32]>,
    documents: Vec<&'a str>,
    metadatas: Vec<Option<Map<String, Value>>>,
}

#[derive(Serialize)]
struct QueryRequest<'a> {
    query_embeddings: Vec<Vec<f32>>,
    n_results: usize,
    include: [&'a str; 2],
}

#[derive(Deserialize)]
struct QueryResponse {
    ids: Vec<Vec<String>>,
    #[serde(default)]
    documents: Option<Vec<Vec<Option<String>>>>,
    #[serde(default)]
    metadatas: Option<Vec<Vec<Option<HashMap<String, Value>>>>>,
}

impl QueryResponse {
    /// Flatten the first (and only) query's hits into documents, best first.
    fn into_documents(self) -> Vec<Document> {
        let ids = self.ids.into_iter().next().unwrap_or_default();
        let mut contents =
            self.documents.and_then(|d| d.into_iter().next()).unwrap_or_default().into_iter();
        let mut metadatas =
            self.metadatas.and_then(|m| m.into_iter().next()).unwrap_or_default().into_iter();

        ids.into_iter()
            .map(|id| Document {
                id,
                content: contents.next().flatten().unwrap_or_default(),
                metadata: metadatas
                    .next()
                    .flatten()
                    .map(from_chroma_metadata)
                    .unwrap_or_default(),
                embedding: None,
            })
            .collect()
    }
}

#[async_trait]
impl VectorStore for ChromaVectorStore {
    async fn create_collection(&self, name: &str) -> Result<()> {
        let response = self
            .client
            .post(self.collections_url())
            .json(&json!({
                "name": name,
                "get_or_create": true,
                "metadata": { "description": "Project knowledge base collection" },
            }))
            .send()
            .await
            .map_err(|e| Self::store_error(format!("request failed: {e}")))?;

        let status = response.status();
        if status == StatusCode::CONFLICT {
            debug!(collection = name, "chroma collection already exists");
            return Ok(());
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            if body.contains("already exists") {
                debug!(collection = name, "chroma collection already exists");
                return Ok(());
            }
            return Err(Self::store_error(format!("create collection returned {status}: {body}")));
        }

        debug!(collection = name, "chroma collection ready");
        Ok(())
    }

    async fn add_documents(&self, documents: &[Document]) -> Result<()> {
        if documents.is_empty() {
            return Ok(());
        }

        let id = self.collection_id().await.map_err(Self::store_error)?;
        let request = AddRequest {
            ids: documents.iter().map(|d| d.id.as_str()).collect(),
            embeddings: documents.iter().map(|d| d.embedding.as_deref().unwrap_or_default()).collect(),
            documents: documents.iter().map(|d| d.content.as_str()).collect(),
            metadatas: documents.iter().map(|d| to_chroma_metadata(&d.metadata)).collect(),
        };

        let response = self
            .client
            .post(format!("{}/{id}/add", self.collections_url()))
            .json(&request)
            .send()
            .await
            .map_err(|e| Self::store_error(format!("request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Self::store_error(format!("add returned {status}: {body}")));
        }

        debug!(collection = %self.collection, count = documents.len(), "added documents to chroma");
        Ok(())
    }

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<Document>> {
        let query_embedding = self
            .embedder
            .embed(query)
            .await
            .map_err(|e| Self::search_error(format!("query embedding failed: {e}")))?;

        let id = self.collection_id().await.map_err(Self::search_error)?;
        let request = QueryRequest {
            query_embeddings: vec![query_embedding],
            n_results: limit,
            include: ["documents", "metadatas"],
        };

        let response = self
            .client
            .post(format!("{}/{id}/query", self.collections_url()))
            .json(&request)
            .send()
            .await
            .map_err(|e| Self::search_error(format!("request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Self::search_error(format!("query returned {status}: {body}")));
        }

        let parsed: QueryResponse = response
            .json()
            .await
            .map_err(|e| Self::search_error(format!("failed to parse response: {e}")))?;
        let documents = parsed.into_documents();

        debug!(collection = %self.collection, hits = documents.len(), "chroma query completed");
        Ok(documents)
    }

    async fn delete_collection(&self, name: &str) -> Result<()> {
        let response = self
            .client
            .delete(format!("{}/{name}", self.collections_url()))
            .send()
            .await
            .map_err(|e| Self::store_error(format!("request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(Self::store_error(format!("delete collection returned {status}")));
        }

        debug!(collection = name, "deleted chroma collection");
        Ok(())
    }

    fn name(&self) -> &str {
        BACKEND
    }
}
