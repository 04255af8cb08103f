//! HTTP surface for paperchat.
//!
//! This module exposes a compact Axum router:
//!
//! - `GET /health` – Liveness probe; never touches configuration or the vector store.
//! - `POST /upload` – Fetch a PDF by URL, optionally drop pages, chunk it, and store the chunks
//!   in Pinecone under a document name. Returns `{ success, message, documentCount, name }`.
//! - `POST /chat` – Answer a question from the stored chunks. Returns the model answer and the
//!   retrieved chunks as `relevantDocuments`.
//! - `GET /metrics` – Upload and chat counters.
//!
//! Failures are reported as `{ "error": "..." }` with status 400 for caller mistakes (missing
//! fields, malformed JSON, non-PDF URL, chat before upload) and 500 for everything else.

use crate::document::Document;
use crate::metrics::MetricsSnapshot;
use crate::processing::{
    ChatRequest, DEFAULT_DOCUMENT_NAME, ProcessingError, RagApi, UploadRequest,
};
use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use std::sync::Arc;

/// Build the HTTP router exposing the upload and chat API surface.
pub fn create_router<S>(service: Arc<S>) -> Router
where
    S: RagApi + 'static,
{
    Router::new()
        .route("/health", get(health))
        .route("/upload", post(upload::<S>))
        .route("/chat", post(chat::<S>))
        .route("/metrics", get(get_metrics::<S>))
        .with_state(service)
}

/// Response body for `GET /health`.
#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    message: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        message: "paperchat server is running",
    })
}

/// Request body for the `POST /upload` endpoint.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UploadBody {
    /// URL of the PDF to ingest; must end with `pdf`.
    #[serde(default)]
    paper_url: Option<String>,
    /// Name stored with every chunk (defaults to `"unnamed"`).
    #[serde(default)]
    name: Option<String>,
    /// 1-based page numbers to remove before extraction.
    #[serde(default)]
    pages_to_delete: Option<Vec<u32>>,
}

/// Success response for the `POST /upload` endpoint.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UploadResponse {
    success: bool,
    message: String,
    /// Number of chunks stored.
    document_count: usize,
    name: String,
}

/// Fetch, chunk, and store a PDF.
async fn upload<S>(
    State(service): State<Arc<S>>,
    payload: Result<Json<UploadBody>, JsonRejection>,
) -> Result<Json<UploadResponse>, AppError>
where
    S: RagApi,
{
    let Json(body) = payload?;
    let paper_url = body
        .paper_url
        .filter(|url| !url.trim().is_empty())
        .ok_or_else(|| ProcessingError::InvalidInput("paperUrl is required".into()))?;
    let name = body
        .name
        .filter(|name| !name.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_DOCUMENT_NAME.to_string());

    let outcome = service
        .upload(UploadRequest {
            paper_url,
            name,
            pages_to_delete: body.pages_to_delete.unwrap_or_default(),
        })
        .await?;
    tracing::info!(
        name = %outcome.name,
        document_count = outcome.document_count,
        "Upload request completed"
    );
    Ok(Json(UploadResponse {
        success: true,
        message: "PDF uploaded and processed successfully".into(),
        document_count: outcome.document_count,
        name: outcome.name,
    }))
}

/// Request body for the `POST /chat` endpoint.
#[derive(Deserialize)]
struct ChatBody {
    #[serde(default)]
    message: Option<String>,
    /// Number of chunks to retrieve (defaults to 4).
    #[serde(default)]
    k: Option<usize>,
}

/// Success response for the `POST /chat` endpoint.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ChatResponse {
    success: bool,
    message: String,
    response: String,
    relevant_documents: Vec<RelevantDocument>,
}

#[derive(Serialize)]
struct RelevantDocument {
    content: String,
    metadata: Map<String, Value>,
}

impl From<Document> for RelevantDocument {
    fn from(document: Document) -> Self {
        Self {
            content: document.page_content,
            metadata: document.metadata,
        }
    }
}

/// Answer a question over the uploaded documents.
async fn chat<S>(
    State(service): State<Arc<S>>,
    payload: Result<Json<ChatBody>, JsonRejection>,
) -> Result<Json<ChatResponse>, AppError>
where
    S: RagApi,
{
    let Json(body) = payload?;
    let message = body
        .message
        .filter(|message| !message.trim().is_empty())
        .ok_or_else(|| ProcessingError::InvalidInput("message is required".into()))?;

    let outcome = service.chat(ChatRequest { message, k: body.k }).await?;
    Ok(Json(ChatResponse {
        success: true,
        message: "Chat response generated successfully".into(),
        response: outcome.response,
        relevant_documents: outcome
            .relevant_documents
            .into_iter()
            .map(RelevantDocument::from)
            .collect(),
    }))
}

/// Return upload and chat counters.
async fn get_metrics<S>(State(service): State<Arc<S>>) -> Json<MetricsSnapshot>
where
    S: RagApi,
{
    Json(service.metrics_snapshot())
}

enum AppError {
    Processing(ProcessingError),
    Body(JsonRejection),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::Processing(error) => {
                let kind = error.kind();
                if kind.is_client_error() {
                    tracing::warn!(kind = ?kind, error = %error, "Request rejected");
                    (StatusCode::BAD_REQUEST, error.to_string())
                } else {
                    tracing::error!(kind = ?kind, error = %error, "Request failed");
                    (StatusCode::INTERNAL_SERVER_ERROR, error.to_string())
                }
            }
            Self::Body(rejection) => {
                tracing::warn!(error = %rejection.body_text(), "Malformed request body");
                (StatusCode::BAD_REQUEST, rejection.body_text())
            }
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

impl From<ProcessingError> for AppError {
    fn from(inner: ProcessingError) -> Self {
        Self::Processing(inner)
    }
}

impl From<JsonRejection> for AppError {
    fn from(inner: JsonRejection) -> Self {
        Self::Body(inner)
    }
}
