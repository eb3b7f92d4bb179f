use std::sync::Arc;

use async_trait::async_trait;
use kbase_rag::{
    CannedAnswerGenerator, Document, HashEmbeddingProvider, InMemoryVectorStore, RagConfig,
    RagError, RagPipeline, VectorStore,
};
use kbase_server::{AppState, app_router};
use serde_json::{Value, json};

const COLLECTION: &str = "contract_kb";

struct UnreachableStore;

#[async_trait]
impl VectorStore for UnreachableStore {
    async fn create_collection(&self, _name: &str) -> kbase_rag::Result<()> {
        Ok(())
    }

    async fn add_documents(&self, _documents: &[Document]) -> kbase_rag::Result<()> {
        Err(RagError::StoreError { backend: "unreachable".into(), message: "connection refused".into() })
    }

    async fn search(&self, _query: &str, _limit: usize) -> kbase_rag::Result<Vec<Document>> {
        Err(RagError::SearchError { backend: "unreachable".into(), message: "connection refused".into() })
    }

    async fn delete_collection(&self, _name: &str) -> kbase_rag::Result<()> {
        Ok(())
    }

    fn name(&self) -> &str {
        "unreachable"
    }
}

fn offline_pipeline(store: Option<Arc<dyn VectorStore>>) -> Arc<RagPipeline> {
    let embedder = Arc::new(HashEmbeddingProvider::new(128));
    let store: Arc<dyn VectorStore> = match store {
        Some(store) => store,
        None => Arc::new(InMemoryVectorStore::new(embedder.clone(), COLLECTION)),
    };
    Arc::new(
        RagPipeline::builder()
            .config(RagConfig::builder().collection(COLLECTION).build().expect("config"))
            .embedding_provider(embedder)
            .vector_store(store)
            .answer_generator(Arc::new(CannedAnswerGenerator::new("offline answer")))
            .build()
            .expect("pipeline"),
    )
}

async fn spawn_server(pipeline: Arc<RagPipeline>) -> (String, tokio::task::JoinHandle<()>) {
    pipeline.initialize().await.expect("initialize collection");
    let app = app_router(AppState { pipeline });

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind test listener");
    let addr = listener.local_addr().expect("listener addr");

    let handle = tokio::spawn(async move {
        axum::serve(listener, app).await.expect("server run");
    });

    (format!("http://{}", addr), handle)
}

#[tokio::test]
async fn index_then_query_returns_enveloped_answer() {
    let (base, handle) = spawn_server(offline_pipeline(None)).await;
    let client = reqwest::Client::new();

    let added = client
        .post(format!("{}/api/rag/documents", base))
        .json(&json!({
            "documents": [
                {"id": "doc_1", "content": "The API is written in Go.", "metadata": {"title": "Backend"}},
                {"id": "doc_2", "content": "The UI uses Next.js.", "metadata": {}}
            ]
        }))
        .send()
        .await
        .expect("add documents response");
    assert!(added.status().is_success());
    let added: Value = added.json().await.expect("add json");
    assert_eq!(added["success"], json!(true));
    assert_eq!(added["count"], json!(2));

    let answered = client
        .post(format!("{}/api/rag/query", base))
        .json(&json!({"question": "What is the API written in?"}))
        .send()
        .await
        .expect("query response");
    assert!(answered.status().is_success());
    let body: Value = answered.json().await.expect("query json");

    assert_eq!(body["success"], json!(true));
    assert_eq!(body["data"]["answer"], json!("offline answer"));
    let sources = body["data"]["sources"].as_array().expect("sources array");
    assert_eq!(sources.len(), 2);
    let confidence = body["data"]["confidence"].as_f64().expect("confidence");
    assert!((0.5..=1.0).contains(&confidence));

    handle.abort();
}

#[tokio::test]
async fn query_on_empty_knowledge_base_has_zero_confidence() {
    let (base, handle) = spawn_server(offline_pipeline(None)).await;
    let client = reqwest::Client::new();

    let body: Value = client
        .post(format!("{}/api/rag/query", base))
        .json(&json!({"question": "anything", "max_results": 3}))
        .send()
        .await
        .expect("query response")
        .json()
        .await
        .expect("query json");

    assert_eq!(body["data"]["confidence"], json!(0.0));
    assert_eq!(body["data"]["sources"], json!([]));

    handle.abort();
}

#[tokio::test]
async fn malformed_query_is_bad_request() {
    let (base, handle) = spawn_server(offline_pipeline(None)).await;
    let client = reqwest::Client::new();

    for body in [json!({"max_results": 3}), json!({"question": "   "}), json!({"question": 42})] {
        let response = client
            .post(format!("{}/api/rag/query", base))
            .json(&body)
            .send()
            .await
            .expect("query response");
        assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST, "body {body}");
        let error: Value = response.json().await.expect("error json");
        assert_eq!(error["success"], json!(false));
        assert!(error["error"].as_str().unwrap_or_default().starts_with("Invalid request format"));
    }

    handle.abort();
}

#[tokio::test]
async fn pipeline_failures_are_internal_errors() {
    let store: Arc<dyn VectorStore> = Arc::new(UnreachableStore);
    let (base, handle) = spawn_server(offline_pipeline(Some(store))).await;
    let client = reqwest::Client::new();

    let query = client
        .post(format!("{}/api/rag/query", base))
        .json(&json!({"question": "q"}))
        .send()
        .await
        .expect("query response");
    assert_eq!(query.status(), reqwest::StatusCode::INTERNAL_SERVER_ERROR);
    let error: Value = query.json().await.expect("error json");
    assert!(error["error"].as_str().unwrap_or_default().contains("connection refused"));

    let add = client
        .post(format!("{}/api/rag/documents", base))
        .json(&json!({"documents": [{"id": "a", "content": "alpha"}]}))
        .send()
        .await
        .expect("add response");
    assert_eq!(add.status(), reqwest::StatusCode::INTERNAL_SERVER_ERROR);

    let health = client
        .get(format!("{}/api/rag/health", base))
        .send()
        .await
        .expect("health response");
    assert_eq!(health.status(), reqwest::StatusCode::SERVICE_UNAVAILABLE);
    let health: Value = health.json().await.expect("health json");
    assert_eq!(health["status"], json!("unhealthy"));

    handle.abort();
}

#[tokio::test]
async fn search_returns_sources_without_answer() {
    let (base, handle) = spawn_server(offline_pipeline(None)).await;
    let client = reqwest::Client::new();

    let added = client
        .post(format!("{}/api/rag/documents", base))
        .json(&json!({"documents": [
            {"id": "c", "content": "gamma"},
            {"id": "b", "content": "beta", "metadata": null},
            {"id": "a", "content": "alpha"}
        ]}))
        .send()
        .await
        .expect("add response");
    assert!(added.status().is_success(), "null metadata is accepted");

    let body: Value = client
        .get(format!("{}/api/rag/search?q=alpha&limit=2", base))
        .send()
        .await
        .expect("search response")
        .json()
        .await
        .expect("search json");
    assert_eq!(body["data"]["query"], json!("alpha"));
    assert_eq!(body["data"]["count"], json!(2));
    assert_eq!(body["data"]["sources"][0]["id"], json!("a"));

    let missing = client
        .get(format!("{}/api/rag/search", base))
        .send()
        .await
        .expect("search response");
    assert_eq!(missing.status(), reqwest::StatusCode::BAD_REQUEST);

    handle.abort();
}

#[tokio::test]
async fn health_reports_healthy_pipeline() {
    let (base, handle) = spawn_server(offline_pipeline(None)).await;
    let client = reqwest::Client::new();

    let health = client
        .get(format!("{}/api/rag/health", base))
        .send()
        .await
        .expect("health response");
    assert!(health.status().is_success());
    let body: Value = health.json().await.expect("health json");
    assert_eq!(body["status"], json!("healthy"));

    let live: Value = client
        .get(format!("{}/health", base))
        .send()
        .await
        .expect("liveness response")
        .json()
        .await
        .expect("liveness json");
    assert_eq!(live["status"], json!("ok"));

    handle.abort();
}
