use std::sync::Arc;

use axum::body::Body;
use axum::extract::{DefaultBodyLimit, OriginalUri};
use axum::http::{
    header::{HeaderName, ACCEPT, AUTHORIZATION, CONTENT_TYPE, ORIGIN},
    Method, Request, StatusCode,
};
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use once_cell::sync::Lazy;
use serde::Serialize;
use serde_json::{json, Value};
use sqlx::SqlitePool;
use std::time::Instant;
use tower_http::cors::{Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, info_span};

use crate::agent::{assistant_agent_with_tools, AgentOs};
use crate::config::Config;
use crate::core::time::now_rfc3339;
use crate::error::AppError;
use crate::llm::ChatModel;
use crate::mcp::{doable_tools, McpServer};
use crate::repositories::agent_sessions::SessionStore;

static START_TIME: Lazy<Instant> = Lazy::new(Instant::now);
static REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

const BODY_LIMIT_BYTES: usize = 10 * 1024 * 1024;

pub mod agents;
pub mod ai;
pub mod chat;
pub mod mcp;
pub mod projects;
pub mod tasks;
pub mod users;

pub type ApiResult = Result<(StatusCode, Json<Value>), AppError>;

#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub model: Arc<dyn ChatModel>,
    pub sessions: SessionStore,
    pub os: Arc<AgentOs>,
    pub mcp: Arc<McpServer>,
    pub cors_origins: Vec<String>,
}

impl AppState {
    /// Wires the tool-enabled assistant into the AgentOS and the MCP server.
    pub fn from_config(cfg: &Config, pool: SqlitePool, model: Arc<dyn ChatModel>) -> AppState {
        let sessions = SessionStore::new(pool.clone());
        let agent = Arc::new(assistant_agent_with_tools(cfg, model.clone(), sessions.clone()));
        let os = AgentOs::new(cfg.os_id.clone(), cfg.os_description.clone(), vec![agent.clone()]);
        let mcp = McpServer::new(cfg.mcp_server_name.clone(), doable_tools(agent, pool.clone()));
        AppState {
            pool,
            model,
            sessions,
            os: Arc::new(os),
            mcp: Arc::new(mcp),
            cors_origins: cfg.cors_origins.clone(),
        }
    }
}

/// `{ success: true, data }` with the given status.
pub fn success<T: Serialize>(status: StatusCode, data: T) -> ApiResult {
    Ok((status, Json(json!({ "success": true, "data": serde_json::to_value(data)? }))))
}

pub fn router(state: AppState) -> Router {
    let allowed_headers = [
        ACCEPT,
        AUTHORIZATION,
        CONTENT_TYPE,
        ORIGIN,
        HeaderName::from_static("x-requested-with"),
        HeaderName::from_static("x-user-id"),
        HeaderName::from_static("x-session-id"),
        HeaderName::from_static("x-request-id"),
    ];

    let cors = if state.cors_origins.iter().any(|o| o == "*") {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_headers(allowed_headers)
            .allow_methods(Any)
            .allow_credentials(false)
    } else {
        let origins = state
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect::<Vec<_>>();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_headers(allowed_headers)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_credentials(true)
    };

    let trace = TraceLayer::new_for_http()
        .make_span_with(|req: &Request<Body>| {
            let request_id = header_value(req, &REQUEST_ID_HEADER);
            let user_id = header_value(req, &HeaderName::from_static("x-user-id"));
            let session_id = header_value(req, &HeaderName::from_static("x-session-id"));
            info_span!(
                "http.request",
                method = %req.method(),
                uri = %req.uri(),
                version = ?req.version(),
                request_id = %request_id,
                user_id = %user_id,
                session_id = %session_id
            )
        })
        .on_request(|_req: &Request<Body>, _span: &tracing::Span| {
            info!("request.start");
        })
        .on_response(
            |res: &Response, latency: std::time::Duration, _span: &tracing::Span| {
                info!(status = %res.status(), latency_ms = %latency.as_millis(), "request.end");
            },
        )
        .on_failure(|err, latency: std::time::Duration, _span: &tracing::Span| {
            tracing::error!(error = %err, latency_ms = %latency.as_millis(), "request.failure");
        });

    Router::new()
        .merge(chat::router())
        .merge(agents::router())
        .merge(users::router())
        .merge(projects::router())
        .merge(tasks::router())
        .merge(ai::router())
        .merge(mcp::router())
        .route("/health", axum::routing::get(health))
        .route("/", axum::routing::get(root))
        .fallback(fallback_404)
        .with_state(state)
        .layer(cors)
        .layer(DefaultBodyLimit::max(BODY_LIMIT_BYTES))
        .layer(trace)
        .layer(PropagateRequestIdLayer::new(REQUEST_ID_HEADER.clone()))
        .layer(SetRequestIdLayer::new(
            REQUEST_ID_HEADER.clone(),
            MakeRequestUuid,
        ))
}

async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "timestamp": now_rfc3339(),
        "uptime": START_TIME.elapsed().as_secs_f64()
    }))
}

async fn root(axum::extract::State(state): axum::extract::State<AppState>) -> Json<Value> {
    Json(json!({
        "name": "Doable Agent Server",
        "version": env!("CARGO_PKG_VERSION"),
        "description": state.os.description,
        "os_id": state.os.id,
        "endpoints": {
            "health": "/health",
            "hello": "/hello",
            "chat": "/chat",
            "config": "/config",
            "agents": "/agents",
            "sessions": "/sessions",
            "mcp": "/api/mcp",
            "users": "/api/users",
            "projects": "/api/projects",
            "tasks": "/api/tasks"
        }
    }))
}

async fn fallback_404(uri: OriginalUri) -> impl IntoResponse {
    let path = uri.0.path().to_string();
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "success": false,
            "error": "Not found",
            "path": path
        })),
    )
}

fn header_value(req: &Request<Body>, name: &HeaderName) -> String {
    req.headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-")
        .to_string()
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use axum::body::{to_bytes, Body};
    use axum::http::{Method, Request};
    use axum::response::Response;
    use axum::Router;
    use serde_json::Value;
    use tower::ServiceExt;

    use super::{router, AppState};
    use crate::config::Config;
    use crate::db::connect_in_memory;
    use crate::llm::scripted::ScriptedModel;

    pub async fn app(model: ScriptedModel) -> (Router, AppState) {
        app_with_config(&Config::from_lookup(|_| None), model).await
    }

    pub async fn app_with_config(cfg: &Config, model: ScriptedModel) -> (Router, AppState) {
        let pool = connect_in_memory().await.expect("db");
        let state = AppState::from_config(cfg, pool, Arc::new(model));
        (router(state.clone()), state)
    }

    pub async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> Response {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("request");
        app.clone().oneshot(request).await.expect("response")
    }

    pub async fn json_body(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body");
        serde_json::from_slice(&bytes).expect("json body")
    }
}
