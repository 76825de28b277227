//! User record endpoints.
//!
//! Provides HTTP endpoints for:
//! - Listing users (GET /users)
//! - Creating a user (POST /users)

use axum::{
    extract::State,
    response::Json,
    routing::get,
    Router,
};
use serde::Deserialize;
use serde_json::{json, Value};

use super::interviews::RecordsState;
use crate::api::error::{ApiError, ApiResult};
use crate::db::users::{UserRepository, UserRole};

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub id: String,
    pub name: String,
    pub email: Option<String>,
    pub role: String,
}

pub fn router(state: RecordsState) -> Router {
    Router::new()
        .route("/", get(list_users).post(create_user))
        .with_state(state)
}

async fn list_users(State(state): State<RecordsState>) -> ApiResult<Json<Value>> {
    let users = state.db.with_conn(UserRepository::list).await?;
    Ok(Json(json!({ "users": users })))
}

async fn create_user(
    State(state): State<RecordsState>,
    Json(body): Json<CreateUserRequest>,
) -> ApiResult<Json<Value>> {
    let role =
        UserRole::from_str(&body.role).map_err(|err| ApiError::bad_request(err.to_string()))?;

    state
        .db
        .with_conn(|conn| {
            UserRepository::insert(conn, &body.id, &body.name, body.email.as_deref(), role)
        })
        .await?;

    Ok(Json(json!({ "success": true })))
}
