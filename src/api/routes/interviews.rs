//! Interview record endpoints.
//!
//! Provides HTTP endpoints for:
//! - Listing interviews (GET /interviews)
//! - Creating an interview (POST /interviews)
//! - Updating an interview's status (PUT /interviews/:id/status)

use axum::{
    extract::{Path, State},
    response::Json,
    routing::{get, put},
    Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;
use uuid::Uuid;

use crate::api::error::{ApiError, ApiResult};
use crate::db::interviews::{InterviewRepository, InterviewStatus, NewInterview};
use crate::db::Database;

/// Shared state for interview and user routes.
#[derive(Clone)]
pub struct RecordsState {
    pub db: Database,
}

#[derive(Debug, Deserialize)]
pub struct CreateInterviewRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Milliseconds since the epoch.
    pub start_time: i64,
    pub candidate_id: String,
    #[serde(default)]
    pub interviewer_ids: Vec<String>,
    /// Optional externally assigned call identifier; generated when absent.
    pub stream_call_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
}

pub fn router(state: RecordsState) -> Router {
    Router::new()
        .route("/", get(list_interviews).post(create_interview))
        .route("/:id/status", put(update_status))
        .with_state(state)
}

async fn list_interviews(State(state): State<RecordsState>) -> ApiResult<Json<Value>> {
    let interviews = state.db.with_conn(InterviewRepository::list).await?;
    Ok(Json(json!({ "interviews": interviews })))
}

async fn create_interview(
    State(state): State<RecordsState>,
    Json(body): Json<CreateInterviewRequest>,
) -> ApiResult<Json<Value>> {
    let interview = NewInterview {
        title: body.title,
        description: body.description,
        start_time: body.start_time,
        status: InterviewStatus::Upcoming,
        stream_call_id: body
            .stream_call_id
            .unwrap_or_else(|| Uuid::new_v4().to_string()),
        candidate_id: body.candidate_id,
        interviewer_ids: body.interviewer_ids,
    };

    let id = state
        .db
        .with_conn(|conn| InterviewRepository::insert(conn, &interview))
        .await?;

    info!("Interview {} created", id);
    Ok(Json(json!({ "success": true, "id": id })))
}

async fn update_status(
    Path(id): Path<i64>,
    State(state): State<RecordsState>,
    Json(body): Json<UpdateStatusRequest>,
) -> ApiResult<Json<Value>> {
    let status = InterviewStatus::from_str(&body.status)
        .map_err(|err| ApiError::bad_request(err.to_string()))?;

    let updated = state
        .db
        .with_conn(|conn| InterviewRepository::update_status(conn, id, status))
        .await?;

    if !updated {
        return Err(ApiError::not_found(format!("Interview {} not found", id)));
    }

    Ok(Json(json!({ "success": true })))
}
