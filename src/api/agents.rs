use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};

use super::AppState;
use crate::agent::os::agent_summary;
use crate::agent::{RunInput, RunOutput};
use crate::error::AppError;
use crate::models::agent_session::{AgentSession, AgentSessionDetail};

#[derive(Debug, Deserialize)]
struct SessionQuery {
    agent_id: Option<String>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/config", get(os_config))
        .route("/agents", get(list_agents))
        .route("/agents/{agent_id}", get(get_agent))
        .route("/agents/{agent_id}/runs", post(create_run))
        .route("/sessions", get(list_sessions))
        .route("/sessions/{id}", get(get_session).delete(delete_session))
}

async fn os_config(State(state): State<AppState>) -> Json<Value> {
    Json(state.os.config())
}

async fn list_agents(State(state): State<AppState>) -> Json<Vec<Value>> {
    Json(state.os.agents().iter().map(|a| agent_summary(a)).collect())
}

async fn get_agent(
    State(state): State<AppState>,
    Path(agent_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let agent = state
        .os
        .get_agent(&agent_id)
        .ok_or_else(|| AppError::not_found("Agent not found"))?;
    let mut summary = agent_summary(&agent);
    summary["instructions"] = json!(agent.system_prompt());
    summary["tools"] = json!(agent
        .tools()
        .list()
        .iter()
        .map(|t| t.name.clone())
        .collect::<Vec<_>>());
    Ok(Json(summary))
}

async fn create_run(
    State(state): State<AppState>,
    Path(agent_id): Path<String>,
    Json(input): Json<RunInput>,
) -> Result<Json<RunOutput>, AppError> {
    let agent = state
        .os
        .get_agent(&agent_id)
        .ok_or_else(|| AppError::not_found("Agent not found"))?;
    Ok(Json(agent.run(input).await?))
}

async fn list_sessions(
    State(state): State<AppState>,
    Query(query): Query<SessionQuery>,
) -> Result<Json<Vec<AgentSession>>, AppError> {
    Ok(Json(state.sessions.list_sessions(query.agent_id.as_deref()).await?))
}

async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<AgentSessionDetail>, AppError> {
    state
        .sessions
        .get_session(&id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found("Session not found"))
}

async fn delete_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    state.sessions.delete_session(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use crate::api::test_support::{app, json_body, send};
    use crate::llm::scripted::ScriptedModel;
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    #[tokio::test]
    async fn config_lists_the_assistant() {
        let (app, _) = app(ScriptedModel::new()).await;
        let body = json_body(send(&app, Method::GET, "/config", None).await).await;
        assert_eq!(body["os_id"], "my-first-os");
        assert_eq!(body["agents"][0]["id"], "assistant");
        assert_eq!(body["agents"][0]["model"], "scripted");

        let agent = json_body(send(&app, Method::GET, "/agents/assistant", None).await).await;
        assert_eq!(agent["name"], "Assistant");
        assert!(agent["tools"]
            .as_array()
            .unwrap()
            .contains(&json!("schedule_meeting")));

        let missing = send(&app, Method::GET, "/agents/nobody", None).await;
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn runs_create_browsable_sessions() {
        let (app, _) = app(ScriptedModel::new().with_text("Sure.")).await;
        let resp = send(
            &app,
            Method::POST,
            "/agents/assistant/runs",
            Some(json!({ "message": "plan my day", "session_id": "s1" })),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
        let run = json_body(resp).await;
        assert_eq!(run["content"], "Sure.");
        assert_eq!(run["session_id"], "s1");

        let sessions =
            json_body(send(&app, Method::GET, "/sessions?agent_id=assistant", None).await).await;
        assert_eq!(sessions.as_array().map(Vec::len), Some(1));
        let other =
            json_body(send(&app, Method::GET, "/sessions?agent_id=someone", None).await).await;
        assert_eq!(other, json!([]));

        let detail = json_body(send(&app, Method::GET, "/sessions/s1", None).await).await;
        assert_eq!(detail["session_id"], "s1");
        assert_eq!(detail["messages"].as_array().map(Vec::len), Some(2));

        let deleted = send(&app, Method::DELETE, "/sessions/s1", None).await;
        assert_eq!(deleted.status(), StatusCode::NO_CONTENT);
        let gone = send(&app, Method::GET, "/sessions/s1", None).await;
        assert_eq!(gone.status(), StatusCode::NOT_FOUND);
    }
}
