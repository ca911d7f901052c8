use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, error};

use super::AppState;
use crate::agent::RunInput;
use crate::core::validation::normalize_non_empty;
use crate::error::AppError;

pub const CHAT_FALLBACK_REPLY: &str = "I'm having trouble thinking right now.";

#[derive(Debug, Deserialize)]
struct ChatRequest {
    #[serde(default)]
    message: Option<String>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/hello", get(hello))
        .route("/chat", post(chat))
}

async fn hello() -> &'static str {
    "Hello World"
}

async fn chat(
    State(state): State<AppState>,
    body: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    // A missing or malformed body is treated like a missing message.
    let req = body.map(|Json(req)| req).unwrap_or_else(|rejection| {
        debug!("[Chat] rejected body: {}", rejection);
        ChatRequest { message: None }
    });
    let message = normalize_non_empty(req.message)
        .ok_or_else(|| AppError::validation("Message is required"))?;
    let agent = state
        .os
        .default_agent()
        .ok_or_else(|| AppError::Config("no agent registered".to_string()))?;

    Ok(match agent.run(RunInput::message(message)).await {
        Ok(output) => (StatusCode::OK, Json(json!({ "response": output.content }))),
        Err(err) => {
            error!("[Chat] agent run failed: {}", err);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "response": CHAT_FALLBACK_REPLY })),
            )
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_support::{app, json_body, send};
    use crate::llm::scripted::ScriptedModel;
    use axum::body::to_bytes;
    use axum::http::Method;

    #[tokio::test]
    async fn hello_is_plain_text() {
        let (app, _) = app(ScriptedModel::new()).await;
        let resp = send(&app, Method::GET, "/hello", None).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(resp.headers()["content-type"]
            .to_str()
            .unwrap()
            .starts_with("text/plain"));
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"Hello World");
    }

    #[tokio::test]
    async fn chat_returns_the_agent_reply() {
        let (app, _) = app(ScriptedModel::new().with_text("Hi!")).await;
        let resp = send(&app, Method::POST, "/chat", Some(json!({ "message": "hello" }))).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(json_body(resp).await, json!({ "response": "Hi!" }));
    }

    #[tokio::test]
    async fn blank_message_is_rejected() {
        let (app, _) = app(ScriptedModel::new()).await;
        let resp = send(&app, Method::POST, "/chat", Some(json!({ "message": "  " }))).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let resp = send(&app, Method::POST, "/chat", Some(json!({}))).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn missing_body_gets_a_json_error() {
        let (app, _) = app(ScriptedModel::new()).await;
        let resp = send(&app, Method::POST, "/chat", None).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            json_body(resp).await,
            json!({ "success": false, "error": "Message is required" })
        );
    }

    #[tokio::test]
    async fn model_failure_uses_the_fallback_reply() {
        let (app, _) = app(ScriptedModel::new().with_error("quota")).await;
        let resp = send(&app, Method::POST, "/chat", Some(json!({ "message": "hello" }))).await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json_body(resp).await["response"], CHAT_FALLBACK_REPLY);
    }
}
