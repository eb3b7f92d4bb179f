//! Recording collaborators shared by the integration tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use kbase_rag::{
    AnswerGenerator, Document, EmbeddingProvider, RagConfig, RagError, RagPipeline, Result,
    VectorStore,
};

/// Embeds text as a constant vector and records every text it was asked about.
pub struct RecordingEmbedder {
    pub dimensions: usize,
    pub calls: Mutex<Vec<String>>,
    pub fail_on: Option<String>,
}

impl RecordingEmbedder {
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions, calls: Mutex::new(Vec::new()), fail_on: None }
    }

    pub fn failing_on(dimensions: usize, text: &str) -> Self {
        Self { fail_on: Some(text.to_string()), ..Self::new(dimensions) }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl EmbeddingProvider for RecordingEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.calls.lock().unwrap().push(text.to_string());
        if self.fail_on.as_deref() == Some(text) {
            return Err(RagError::EmbeddingError {
                provider: "recording".into(),
                message: "provider unavailable".into(),
            });
        }
        Ok(vec![0.5; self.dimensions])
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn name(&self) -> &str {
        "recording"
    }
}

/// Returns scripted search hits and records every batch it was given.
#[derive(Default)]
pub struct RecordingStore {
    pub hits: Vec<Document>,
    pub added: Mutex<Vec<Vec<Document>>>,
    pub searches: Mutex<Vec<(String, usize)>>,
    pub fail_add: bool,
    pub fail_search: bool,
}

impl RecordingStore {
    pub fn with_hits(hits: Vec<Document>) -> Self {
        Self { hits, ..Self::default() }
    }

    pub fn added(&self) -> Vec<Vec<Document>> {
        self.added.lock().unwrap().clone()
    }

    pub fn searches(&self) -> Vec<(String, usize)> {
        self.searches.lock().unwrap().clone()
    }
}

#[async_trait]
impl VectorStore for RecordingStore {
    async fn create_collection(&self, _name: &str) -> Result<()> {
        Ok(())
    }

    async fn add_documents(&self, documents: &[Document]) -> Result<()> {
        if self.fail_add {
            return Err(RagError::StoreError {
                backend: "recording".into(),
                message: "disk full".into(),
            });
        }
        self.added.lock().unwrap().push(documents.to_vec());
        Ok(())
    }

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<Document>> {
        self.searches.lock().unwrap().push((query.to_string(), limit));
        if self.fail_search {
            return Err(RagError::SearchError {
                backend: "recording".into(),
                message: "connection refused".into(),
            });
        }
        Ok(self.hits.iter().take(limit).cloned().collect())
    }

    async fn delete_collection(&self, _name: &str) -> Result<()> {
        Ok(())
    }

    fn name(&self) -> &str {
        "recording"
    }
}

/// Answers with a fixed string and records the prompts it received.
#[derive(Default)]
pub struct RecordingGenerator {
    pub calls: Mutex<Vec<(String, String)>>,
    pub fail: bool,
}

impl RecordingGenerator {
    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl AnswerGenerator for RecordingGenerator {
    async fn generate_answer(&self, question: &str, context: &str) -> Result<String> {
        self.calls.lock().unwrap().push((question.to_string(), context.to_string()));
        if self.fail {
            return Err(RagError::GenerationError {
                provider: "recording".into(),
                message: "rate limited".into(),
            });
        }
        Ok(format!("answer to {question}"))
    }

    fn name(&self) -> &str {
        "recording"
    }
}

pub fn pipeline(
    embedder: Arc<RecordingEmbedder>,
    store: Arc<RecordingStore>,
    generator: Arc<RecordingGenerator>,
) -> RagPipeline {
    RagPipeline::builder()
        .config(RagConfig::default())
        .embedding_provider(embedder)
        .vector_store(store)
        .answer_generator(generator)
        .build()
        .unwrap()
}
