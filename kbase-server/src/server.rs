use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::{
    Json, Router,
    extract::{Query, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use kbase_rag::{QueryResult, RagPipeline, SearchResponse};
use serde_json::json;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};

use crate::{
    config::ServerConfig,
    protocol::{
        AddDocumentsRequest, AddDocumentsResponse, ApiSuccess, ErrorBody, HealthResponse,
        QueryRequest, SearchParams,
    },
};

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<RagPipeline>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState").finish_non_exhaustive()
    }
}

/// An error envelope with its HTTP status.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self { status: StatusCode::BAD_REQUEST, message: message.into() }
    }

    fn internal(message: impl Into<String>) -> Self {
        Self { status: StatusCode::INTERNAL_SERVER_ERROR, message: message.into() }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::bad_request(format!("Invalid request format: {}", rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody { success: false, error: self.message };
        (self.status, Json(body)).into_response()
    }
}

pub fn app_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(liveness))
        .route("/api/rag/query", post(query))
        .route("/api/rag/documents", post(add_documents))
        .route("/api/rag/search", get(search))
        .route("/api/rag/health", get(health_check))
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

pub async fn run_server(config: ServerConfig, pipeline: Arc<RagPipeline>) -> anyhow::Result<()> {
    let app = app_router(AppState { pipeline });
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .with_context(|| "invalid host/port for kbase server")?;

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("kbase listening on http://{}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}

async fn liveness() -> impl IntoResponse {
    Json(json!({"status":"ok","service":"kbase"}))
}

async fn query(
    State(state): State<AppState>,
    payload: Result<Json<QueryRequest>, JsonRejection>,
) -> Result<Json<ApiSuccess<QueryResult>>, ApiError> {
    let Json(request) = payload?;
    if request.question.trim().is_empty() {
        return Err(ApiError::bad_request("Invalid request format: question is required"));
    }

    let result = state
        .pipeline
        .query(&request.question, request.max_results.unwrap_or(0))
        .await
        .map_err(|e| ApiError::internal(format!("Failed to process query: {e}")))?;

    Ok(Json(ApiSuccess::new(result)))
}

async fn add_documents(
    State(state): State<AppState>,
    payload: Result<Json<AddDocumentsRequest>, JsonRejection>,
) -> Result<Json<AddDocumentsResponse>, ApiError> {
    let Json(request) = payload?;

    let count = state
        .pipeline
        .index(request.documents)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to add documents: {e}")))?;

    Ok(Json(AddDocumentsResponse {
        success: true,
        message: "Documents added successfully".to_string(),
        count,
    }))
}

async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<ApiSuccess<SearchResponse>>, ApiError> {
    let query = params
        .q
        .filter(|q| !q.trim().is_empty())
        .ok_or_else(|| ApiError::bad_request("Query parameter 'q' is required"))?;
    let limit = params.limit.as_deref().and_then(|l| l.trim().parse::<i64>().ok()).unwrap_or(0);

    let sources = state
        .pipeline
        .search(&query, limit)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to search: {e}")))?;

    Ok(Json(ApiSuccess::new(SearchResponse { query, count: sources.len(), sources })))
}

async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    match state.pipeline.health_check().await {
        Ok(()) => (
            StatusCode::OK,
            Json(HealthResponse {
                status: "healthy".to_string(),
                message: Some("RAG service is operational".to_string()),
                error: None,
            }),
        ),
        Err(e) => {
            warn!(error = %e, "reporting unhealthy");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthResponse {
                    status: "unhealthy".to_string(),
                    message: None,
                    error: Some(e.to_string()),
                }),
            )
        }
    }
}
