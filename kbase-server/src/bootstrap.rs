//! Construct the pipeline and its collaborators from settings.

use std::sync::Arc;

use anyhow::Context;
use kbase_rag::chroma::ChromaVectorStore;
use kbase_rag::openai::{OpenAIAnswerGenerator, OpenAIEmbeddingProvider};
use kbase_rag::{
    AnswerGenerator, CannedAnswerGenerator, EmbeddingProvider, HashEmbeddingProvider,
    InMemoryVectorStore, RagConfig, RagPipeline, VectorStore,
};
use tracing::info;

use crate::config::{AppSettings, OFFLINE_DIMENSIONS, StoreKind};

type Models = (Arc<dyn EmbeddingProvider>, Arc<dyn AnswerGenerator>);

fn offline_models(settings: &AppSettings) -> Models {
    let dimensions = settings.embedding_dimensions.unwrap_or(OFFLINE_DIMENSIONS);
    info!(dimensions, "offline mode: hash embeddings and canned answers");
    (Arc::new(HashEmbeddingProvider::new(dimensions)), Arc::new(CannedAnswerGenerator::default()))
}

fn openai_models(settings: &AppSettings) -> anyhow::Result<Models> {
    let api_key = settings
        .openai_api_key
        .clone()
        .filter(|key| !key.is_empty())
        .context("OPENAI_API_KEY is not set; set it or run with --offline")?;

    let mut embedder = OpenAIEmbeddingProvider::new(api_key.clone())?;
    let mut generator = OpenAIAnswerGenerator::new(api_key)?;
    if let Some(base_url) = &settings.openai_base_url {
        embedder = embedder.with_base_url(base_url);
        generator = generator.with_base_url(base_url);
    }
    if let Some(model) = &settings.embedding_model {
        embedder = embedder.with_model(model);
    }
    if let Some(dimensions) = settings.embedding_dimensions {
        embedder = embedder.with_dimensions(dimensions);
    }
    if let Some(model) = &settings.chat_model {
        generator = generator.with_model(model);
    }

    info!(dimensions = embedder.dimensions(), "using OpenAI embeddings and answers");
    Ok((Arc::new(embedder), Arc::new(generator)))
}

/// Build a [`RagPipeline`] wired to the backends `settings` selects.
///
/// Offline mode must be chosen explicitly; a missing API key otherwise
/// fails startup.
pub fn build_pipeline(settings: &AppSettings) -> anyhow::Result<RagPipeline> {
    let config = RagConfig::builder().collection(settings.collection.clone()).build()?;

    let (embedder, generator) =
        if settings.offline { offline_models(settings) } else { openai_models(settings)? };

    let store: Arc<dyn VectorStore> = match settings.store {
        StoreKind::Memory => {
            Arc::new(InMemoryVectorStore::new(embedder.clone(), settings.collection.clone()))
        }
        StoreKind::Chroma => Arc::new(ChromaVectorStore::new(
            settings.chroma_url.clone(),
            settings.collection.clone(),
            embedder.clone(),
        )),
    };
    info!(store = store.name(), collection = %settings.collection, "vector store selected");

    let pipeline = RagPipeline::builder()
        .config(config)
        .embedding_provider(embedder)
        .vector_store(store)
        .answer_generator(generator)
        .build()?;
    Ok(pipeline)
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;
    use crate::config::Cli;

    fn settings(args: &[&str]) -> AppSettings {
        let mut argv = vec!["kbase"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap().settings
    }

    #[test]
    fn offline_mode_needs_no_credentials() {
        let mut settings = settings(&["--offline"]);
        settings.openai_api_key = None;
        let pipeline = build_pipeline(&settings).unwrap();
        assert_eq!(pipeline.vector_store().name(), "InMemory");
    }

    #[test]
    fn online_mode_without_key_fails() {
        let mut settings = settings(&[]);
        settings.offline = false;
        settings.openai_api_key = None;
        let err = build_pipeline(&settings).unwrap_err();
        assert!(err.to_string().contains("OPENAI_API_KEY"));
    }

    #[test]
    fn chroma_store_is_selectable() {
        let mut settings = settings(&["--offline", "--store", "chroma"]);
        settings.openai_api_key = None;
        let pipeline = build_pipeline(&settings).unwrap();
        assert_eq!(pipeline.vector_store().name(), "chroma");
    }
}
