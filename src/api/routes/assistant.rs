//! Assistant runtime endpoints.
//!
//! Provides HTTP endpoints for:
//! - Listing action descriptors (GET /assistant/actions)
//! - Invoking an action by name (POST /assistant/actions/:name)
//!
//! Invocations always answer 200 with the action's tolerant result shape;
//! only an unknown action name is an HTTP error.

use axum::{
    extract::{Path, State},
    response::Json,
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::info;

use crate::api::error::{ApiError, ApiResult};
use crate::assistant::ActionRegistry;

/// Shared state for assistant routes.
#[derive(Clone)]
pub struct AssistantState {
    pub registry: Arc<ActionRegistry>,
}

pub fn router(state: AssistantState) -> Router {
    Router::new()
        .route("/actions", get(list_actions))
        .route("/actions/:name", post(invoke_action))
        .with_state(state)
}

async fn list_actions(State(state): State<AssistantState>) -> Json<Value> {
    Json(json!({ "actions": state.registry.descriptors() }))
}

async fn invoke_action(
    Path(name): Path<String>,
    State(state): State<AssistantState>,
    body: Option<Json<Value>>,
) -> ApiResult<Json<Value>> {
    let action = state
        .registry
        .get(&name)
        .ok_or_else(|| ApiError::not_found(format!("Unknown action: {}", name)))?;

    let params = body.map(|Json(v)| v).unwrap_or(Value::Null);

    info!("Assistant action invoked: {}", name);
    let result = action.invoke(params).await;

    Ok(Json(result))
}
