use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;

use super::{success, ApiResult, AppState};
use crate::repositories::tasks::TaskFilter;
use crate::services::tasks::{self, CreateTaskInput, UpdateTaskInput};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TaskQuery {
    user_id: Option<String>,
    project_id: Option<String>,
    is_completed: Option<bool>,
    limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct QuickAddRequest {
    #[serde(default)]
    input: String,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/tasks", get(list_tasks).post(create_task))
        .route("/api/tasks/quick-add", post(quick_add))
        .route(
            "/api/tasks/{id}",
            get(get_task).put(update_task).delete(delete_task),
        )
        .route("/api/tasks/{id}/substeps", post(generate_substeps))
        .route("/api/tasks/{id}/motivation", post(generate_motivation))
}

async fn list_tasks(State(state): State<AppState>, Query(query): Query<TaskQuery>) -> ApiResult {
    let filter = TaskFilter {
        user_id: query.user_id,
        project_id: query.project_id,
        is_completed: query.is_completed,
        limit: query.limit.map(|l| l.max(0)),
    };
    success(StatusCode::OK, tasks::list_tasks(&state.pool, &filter).await?)
}

async fn get_task(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult {
    success(StatusCode::OK, tasks::get_task(&state.pool, &id).await?)
}

async fn create_task(
    State(state): State<AppState>,
    Json(input): Json<CreateTaskInput>,
) -> ApiResult {
    let task = tasks::create_task(&state.pool, Some(state.model.as_ref()), input).await?;
    success(StatusCode::CREATED, task)
}

async fn quick_add(
    State(state): State<AppState>,
    Json(req): Json<QuickAddRequest>,
) -> ApiResult {
    let today = chrono::Local::now().date_naive();
    let task = tasks::quick_add(&state.pool, Some(state.model.as_ref()), &req.input, today).await?;
    success(StatusCode::CREATED, task)
}

async fn update_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<UpdateTaskInput>,
) -> ApiResult {
    success(StatusCode::OK, tasks::update_task(&state.pool, &id, input).await?)
}

async fn delete_task(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult {
    tasks::delete_task(&state.pool, &id).await?;
    success(StatusCode::OK, serde_json::json!({ "id": id }))
}

async fn generate_substeps(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult {
    let task = tasks::generate_substeps(&state.pool, state.model.as_ref(), &id).await?;
    success(StatusCode::OK, task)
}

async fn generate_motivation(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult {
    let motivation = tasks::generate_motivation(&state.pool, state.model.as_ref(), &id).await?;
    success(StatusCode::OK, motivation)
}
