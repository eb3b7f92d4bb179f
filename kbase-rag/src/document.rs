//! Data types for knowledge-base documents and query results.

use std::collections::HashMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// A knowledge-base document with optional vector embedding.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Document {
    /// Identifier, unique within a collection. Empty ids are replaced with a
    /// generated UUID at indexing time.
    #[serde(default)]
    pub id: String,
    /// The text body of the document.
    pub content: String,
    /// Arbitrary scalar or array metadata. An explicit `null` reads as empty.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub metadata: HashMap<String, Value>,
    /// The vector embedding, absent until assigned.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<HashMap<String, Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<HashMap<String, Value>>::deserialize(deserializer)?.unwrap_or_default())
}

impl Document {
    /// Create a document with the given id and content and no metadata.
    pub fn new(id: impl Into<String>, content: impl Into<String>) -> Self {
        Self { id: id.into(), content: content.into(), ..Self::default() }
    }

    /// Attach a metadata entry.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Attach a precomputed embedding.
    pub fn with_embedding(mut self, embedding: Vec<f32>) -> Self {
        self.embedding = Some(embedding);
        self
    }

    /// Whether the document carries a non-empty embedding.
    pub fn has_embedding(&self) -> bool {
        self.embedding.as_ref().is_some_and(|e| !e.is_empty())
    }
}

/// The answer to a knowledge-base question together with its evidence.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QueryResult {
    /// The generated answer text.
    pub answer: String,
    /// Retrieved documents in retrieval-rank order.
    pub sources: Vec<Document>,
    /// Heuristic confidence in `[0.0, 1.0]`.
    pub confidence: f64,
}

/// Documents returned by a retrieval-only search.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchResponse {
    /// The query text that was searched.
    pub query: String,
    /// Retrieved documents in retrieval-rank order.
    pub sources: Vec<Document>,
    /// Number of retrieved documents.
    pub count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_shape_omits_absent_embedding() {
        let doc = Document::new("doc_1", "hello").with_metadata("title", "Greeting");
        let json = serde_json::to_value(&doc).unwrap();
        assert_eq!(json["id"], "doc_1");
        assert_eq!(json["metadata"]["title"], "Greeting");
        assert!(json.get("embedding").is_none());
    }

    #[test]
    fn deserializes_without_optional_fields() {
        let doc: Document = serde_json::from_str(r#"{"content":"body"}"#).unwrap();
        assert!(doc.id.is_empty());
        assert!(doc.metadata.is_empty());
        assert!(!doc.has_embedding());
    }

    #[test]
    fn null_metadata_reads_as_empty() {
        let doc: Document =
            serde_json::from_str(r#"{"id":"a","content":"body","metadata":null}"#).unwrap();
        assert!(doc.metadata.is_empty());
    }

    #[test]
    fn empty_embedding_counts_as_missing() {
        let doc = Document::new("a", "b").with_embedding(vec![]);
        assert!(!doc.has_embedding());
    }
}
