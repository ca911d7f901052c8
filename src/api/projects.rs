use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;

use super::{success, ApiResult, AppState};
use crate::services::projects::{self, CreateProjectInput, UpdateProjectInput};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProjectQuery {
    user_id: Option<String>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/projects", get(list_projects).post(create_project))
        .route(
            "/api/projects/{id}",
            get(get_project).put(update_project).delete(delete_project),
        )
}

async fn list_projects(
    State(state): State<AppState>,
    Query(query): Query<ProjectQuery>,
) -> ApiResult {
    let projects = projects::list_projects(&state.pool, query.user_id.as_deref()).await?;
    success(StatusCode::OK, projects)
}

async fn get_project(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult {
    success(StatusCode::OK, projects::get_project(&state.pool, &id).await?)
}

async fn create_project(
    State(state): State<AppState>,
    Json(input): Json<CreateProjectInput>,
) -> ApiResult {
    success(StatusCode::CREATED, projects::create_project(&state.pool, input).await?)
}

async fn update_project(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<UpdateProjectInput>,
) -> ApiResult {
    success(StatusCode::OK, projects::update_project(&state.pool, &id, input).await?)
}

async fn delete_project(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult {
    projects::delete_project(&state.pool, &id).await?;
    success(StatusCode::OK, serde_json::json!({ "id": id }))
}

#[cfg(test)]
mod tests {
    use crate::api::test_support::{app, json_body, send};
    use crate::llm::scripted::ScriptedModel;
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    #[tokio::test]
    async fn project_defaults_to_the_default_user() {
        let (app, _) = app(ScriptedModel::new()).await;
        let resp = send(&app, Method::POST, "/api/projects", Some(json!({ "title": "Launch" }))).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let project = json_body(resp).await["data"].clone();
        assert_eq!(project["status"], "Active");

        let user = json_body(send(&app, Method::GET, "/api/users/default", None).await).await;
        assert_eq!(project["userId"], user["data"]["id"]);

        let listed = json_body(
            send(
                &app,
                Method::GET,
                &format!("/api/projects?userId={}", user["data"]["id"].as_str().unwrap()),
                None,
            )
            .await,
        )
        .await;
        assert_eq!(listed["data"].as_array().map(Vec::len), Some(1));
    }

    #[tokio::test]
    async fn update_and_validation() {
        let (app, _) = app(ScriptedModel::new()).await;
        let missing_title = send(&app, Method::POST, "/api/projects", Some(json!({ "title": " " }))).await;
        assert_eq!(missing_title.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(missing_title).await["error"], "Title is required");

        let created = json_body(
            send(&app, Method::POST, "/api/projects", Some(json!({ "title": "Launch" }))).await,
        )
        .await;
        let id = created["data"]["id"].as_str().unwrap().to_string();
        let updated = json_body(
            send(
                &app,
                Method::PUT,
                &format!("/api/projects/{id}"),
                Some(json!({ "status": "On Hold" })),
            )
            .await,
        )
        .await;
        assert_eq!(updated["data"]["status"], "On Hold");

        let bad = send(
            &app,
            Method::PUT,
            &format!("/api/projects/{id}"),
            Some(json!({ "status": "Paused" })),
        )
        .await;
        assert_eq!(bad.status(), StatusCode::BAD_REQUEST);

        let gone = send(&app, Method::DELETE, "/api/projects/unknown", None).await;
        assert_eq!(gone.status(), StatusCode::NOT_FOUND);
    }
}
