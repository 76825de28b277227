//! Code document endpoints.
//!
//! Provides HTTP endpoints for:
//! - Reading a meeting's document (GET /documents/:meeting_id)
//! - Reading single fields (GET /documents/:meeting_id/code|language|output)
//! - Writing fields (PUT, upsert-by-meeting semantics)
//! - Running the buffer on the execution service (POST /documents/:meeting_id/run)

use axum::{
    extract::{Path, State},
    response::Json,
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::info;

use crate::api::error::ApiResult;
use crate::execution::ExecutionClient;
use crate::languages;
use crate::store::DocumentStore;

/// Shared state for document routes.
#[derive(Clone)]
pub struct DocumentState {
    pub store: DocumentStore,
    pub executor: ExecutionClient,
    /// Quiescence window for WebSocket sessions' code write-backs.
    pub debounce: Duration,
}

#[derive(Debug, Deserialize)]
pub struct UpdateCodeRequest {
    pub code: String,
    pub language: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateLanguageRequest {
    pub language: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateOutputRequest {
    pub output: String,
}

/// Request body for the run endpoint. Omitted fields fall back to the
/// stored buffer and language selection.
#[derive(Debug, Default, Deserialize)]
pub struct RunRequestBody {
    pub code: Option<String>,
    pub language: Option<String>,
}

pub fn router(state: DocumentState) -> Router {
    Router::new()
        .route("/:meeting_id", get(get_document))
        .route("/:meeting_id/code", get(get_code).put(put_code))
        .route(
            "/:meeting_id/language",
            get(get_language).put(put_language),
        )
        .route("/:meeting_id/output", get(get_output).put(put_output))
        .route("/:meeting_id/run", post(run_code))
        .route("/:meeting_id/session", get(super::session::session_ws))
        .with_state(state)
}

async fn get_document(
    Path(meeting_id): Path<String>,
    State(state): State<DocumentState>,
) -> ApiResult<Json<Value>> {
    let view = state.store.document(&meeting_id).await?;
    Ok(Json(json!(view)))
}

async fn get_code(
    Path(meeting_id): Path<String>,
    State(state): State<DocumentState>,
) -> ApiResult<Json<Value>> {
    let code = state.store.get_code(&meeting_id).await?;
    Ok(Json(json!({ "code": code })))
}

async fn put_code(
    Path(meeting_id): Path<String>,
    State(state): State<DocumentState>,
    Json(body): Json<UpdateCodeRequest>,
) -> ApiResult<Json<Value>> {
    state
        .store
        .update_code(&meeting_id, &body.code, &body.language)
        .await?;
    Ok(Json(json!({ "success": true })))
}

async fn get_language(
    Path(meeting_id): Path<String>,
    State(state): State<DocumentState>,
) -> ApiResult<Json<Value>> {
    let language = state.store.get_language(&meeting_id).await?;
    Ok(Json(json!({ "language": language })))
}

async fn put_language(
    Path(meeting_id): Path<String>,
    State(state): State<DocumentState>,
    Json(body): Json<UpdateLanguageRequest>,
) -> ApiResult<Json<Value>> {
    state
        .store
        .update_language(&meeting_id, &body.language)
        .await?;
    Ok(Json(json!({ "success": true })))
}

async fn get_output(
    Path(meeting_id): Path<String>,
    State(state): State<DocumentState>,
) -> ApiResult<Json<Value>> {
    let output = state.store.get_output(&meeting_id).await?;
    Ok(Json(json!({ "output": output })))
}

async fn put_output(
    Path(meeting_id): Path<String>,
    State(state): State<DocumentState>,
    Json(body): Json<UpdateOutputRequest>,
) -> ApiResult<Json<Value>> {
    state.store.update_output(&meeting_id, &body.output).await?;
    Ok(Json(json!({ "success": true })))
}

/// Execute the buffer and persist the normalized result as the document's
/// output. Execution failures come back as `Error: ...` strings and are
/// persisted the same way as successful runs.
async fn run_code(
    Path(meeting_id): Path<String>,
    State(state): State<DocumentState>,
    body: Option<Json<RunRequestBody>>,
) -> ApiResult<Json<Value>> {
    let body = body.map(|Json(b)| b).unwrap_or_default();

    let code = match body.code {
        Some(code) => code,
        None => state.store.get_code(&meeting_id).await?,
    };
    let language = match body.language {
        Some(language) => language,
        None => state.store.get_language(&meeting_id).await?,
    };
    let version = languages::version_for(&language);

    info!("Run requested for meeting {} ({})", meeting_id, language);

    let output = state.executor.execute(&language, version, &code).await;
    state.store.update_output(&meeting_id, &output).await?;

    Ok(Json(json!({ "output": output })))
}
