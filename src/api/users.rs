use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};

use super::{success, ApiResult, AppState};
use crate::services::users::{self, CreateUserInput, QuizSubmission, UpdateUserInput};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/users", get(list_users).post(create_user))
        .route("/api/users/default", get(default_user))
        .route(
            "/api/users/{id}",
            get(get_user).put(update_user).delete(delete_user),
        )
        .route("/api/users/{id}/psychology", post(submit_psychology))
}

async fn list_users(State(state): State<AppState>) -> ApiResult {
    success(StatusCode::OK, users::list_users(&state.pool).await?)
}

async fn default_user(State(state): State<AppState>) -> ApiResult {
    success(StatusCode::OK, users::get_or_create_default_user(&state.pool).await?)
}

async fn get_user(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult {
    success(StatusCode::OK, users::get_user(&state.pool, &id).await?)
}

async fn create_user(
    State(state): State<AppState>,
    Json(input): Json<CreateUserInput>,
) -> ApiResult {
    success(StatusCode::CREATED, users::create_user(&state.pool, input).await?)
}

async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<UpdateUserInput>,
) -> ApiResult {
    success(StatusCode::OK, users::update_user(&state.pool, &id, input).await?)
}

async fn delete_user(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult {
    users::delete_user(&state.pool, &id).await?;
    success(StatusCode::OK, serde_json::json!({ "id": id }))
}

async fn submit_psychology(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(submission): Json<QuizSubmission>,
) -> ApiResult {
    success(
        StatusCode::OK,
        users::submit_psychology_quiz(&state.pool, &id, submission).await?,
    )
}
