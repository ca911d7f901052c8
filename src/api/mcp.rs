use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};

use super::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/api/mcp", post(handle))
}

/// One JSON-RPC frame per request. Notifications are acknowledged with 202.
async fn handle(State(state): State<AppState>, body: String) -> Response {
    match state.mcp.handle_message(&body).await {
        Some(reply) => Json(reply).into_response(),
        None => StatusCode::ACCEPTED.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use crate::api::test_support::{app, json_body, send};
    use crate::llm::scripted::ScriptedModel;
    use crate::mcp::PROTOCOL_VERSION;
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    #[tokio::test]
    async fn serves_jsonrpc_over_http() {
        let (app, _) = app(ScriptedModel::new()).await;
        let init = send(
            &app,
            Method::POST,
            "/api/mcp",
            Some(json!({ "jsonrpc": "2.0", "id": 1, "method": "initialize" })),
        )
        .await;
        assert_eq!(init.status(), StatusCode::OK);
        let init = json_body(init).await;
        assert_eq!(init["result"]["protocolVersion"], PROTOCOL_VERSION);
        assert_eq!(init["result"]["serverInfo"]["name"], "Doable Assistant");

        let note = send(
            &app,
            Method::POST,
            "/api/mcp",
            Some(json!({ "jsonrpc": "2.0", "method": "notifications/initialized" })),
        )
        .await;
        assert_eq!(note.status(), StatusCode::ACCEPTED);

        let hello = json_body(
            send(
                &app,
                Method::POST,
                "/api/mcp",
                Some(json!({
                    "jsonrpc": "2.0", "id": 2, "method": "tools/call",
                    "params": { "name": "hello", "arguments": { "name": "Doable" } }
                })),
            )
            .await,
        )
        .await;
        assert_eq!(hello["result"]["content"][0]["text"], "Hello, Doable!");
    }
}
