use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::error;

use super::AppState;
use crate::core::validation::normalize_non_empty;
use crate::services::planner::process_project;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProcessProjectRequest {
    #[serde(default)]
    project_plan: Option<String>,
    #[serde(default)]
    employees: Value,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/api/ai/process-project", post(process))
}

async fn process(State(state): State<AppState>, Json(req): Json<ProcessProjectRequest>) -> Response {
    let Some(plan) = normalize_non_empty(req.project_plan) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "Project plan is required" })),
        )
            .into_response();
    };
    match process_project(state.model.as_ref(), &plan, &req.employees).await {
        Ok(breakdown) => Json(breakdown).into_response(),
        Err(err) => {
            error!("[AI] process project failed: {}", err);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Failed to process project plan" })),
            )
                .into_response()
        }
    }
}
