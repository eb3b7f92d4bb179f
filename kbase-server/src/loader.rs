//! Bulk loading of a curated knowledge-base file.

use std::path::Path;

use anyhow::Context;
use kbase_rag::{Document, RagPipeline};
use serde::Deserialize;
use serde_json::json;
use tracing::info;

/// One curated article in a knowledge-base file.
#[derive(Debug, Clone, Deserialize)]
pub struct KnowledgeEntry {
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub last_updated: Option<String>,
}

/// Convert entries to documents numbered `doc_1`, `doc_2`, … with the title
/// folded into the content so it participates in retrieval.
pub fn entries_to_documents(entries: Vec<KnowledgeEntry>) -> Vec<Document> {
    entries
        .into_iter()
        .enumerate()
        .map(|(index, entry)| {
            let mut document = Document::new(
                format!("doc_{}", index + 1),
                format!("Title: {}\n\n{}", entry.title, entry.content),
            )
            .with_metadata("title", entry.title)
            .with_metadata("tags", json!(entry.tags));
            if let Some(category) = entry.category {
                document = document.with_metadata("category", category);
            }
            if let Some(last_updated) = entry.last_updated {
                document = document.with_metadata("last_updated", last_updated);
            }
            document
        })
        .collect()
}

pub fn read_knowledge_file(path: &Path) -> anyhow::Result<Vec<KnowledgeEntry>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read knowledge file {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse knowledge file {}", path.display()))
}

/// Create the collection and index every entry of the file at `path`.
pub async fn load_knowledge_base(pipeline: &RagPipeline, path: &Path) -> anyhow::Result<usize> {
    let documents = entries_to_documents(read_knowledge_file(path)?);
    pipeline.initialize().await?;
    let count = pipeline.index(documents).await.context("failed to index knowledge base")?;
    info!(count, path = %path.display(), "loaded knowledge base");
    Ok(count)
}
