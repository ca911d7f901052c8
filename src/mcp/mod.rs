//! JSON-RPC 2.0 Model Context Protocol server shared by the stdio binary and
//! the `/api/mcp` route.

use serde_json::{json, Map, Value};
use tracing::{info, warn};

use crate::tools::ToolRegistry;

pub mod stdio;
pub mod tools;

pub use tools::doable_tools;

pub const PROTOCOL_VERSION: &str = "2024-11-05";

pub const PARSE_ERROR: i64 = -32700;
pub const INVALID_REQUEST: i64 = -32600;
pub const METHOD_NOT_FOUND: i64 = -32601;
pub const INVALID_PARAMS: i64 = -32602;

pub struct McpServer {
    name: String,
    version: String,
    tools: ToolRegistry,
}

impl McpServer {
    pub fn new(name: impl Into<String>, tools: ToolRegistry) -> Self {
        Self {
            name: name.into(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            tools,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// Handles one raw frame. `None` means nothing is sent back.
    pub async fn handle_message(&self, raw: &str) -> Option<Value> {
        match serde_json::from_str::<Value>(raw) {
            Ok(value) => self.handle_value(value).await,
            Err(err) => Some(error_response(Value::Null, PARSE_ERROR, &format!("Parse error: {err}"))),
        }
    }

    pub async fn handle_value(&self, value: Value) -> Option<Value> {
        let Value::Object(obj) = value else {
            return Some(error_response(Value::Null, INVALID_REQUEST, "Invalid Request"));
        };
        // A missing id marks a notification.
        let id = obj.get("id").cloned();
        let method = obj.get("method").and_then(Value::as_str);
        let version_ok = obj.get("jsonrpc").and_then(Value::as_str) == Some("2.0");
        let Some(method) = method.filter(|_| version_ok) else {
            return Some(error_response(id.unwrap_or(Value::Null), INVALID_REQUEST, "Invalid Request"));
        };

        if method.starts_with("notifications/") {
            info!("[MCP] notification: {}", method);
            return None;
        }

        let params = obj.get("params").cloned().unwrap_or(Value::Null);
        let outcome = self.dispatch(method, params).await;
        let id = id?;
        Some(match outcome {
            Ok(result) => json!({ "jsonrpc": "2.0", "id": id, "result": result }),
            Err((code, message)) => error_response(id, code, &message),
        })
    }

    async fn dispatch(&self, method: &str, params: Value) -> Result<Value, (i64, String)> {
        match method {
            "initialize" => Ok(json!({
                "protocolVersion": PROTOCOL_VERSION,
                "capabilities": { "tools": { "listChanged": false } },
                "serverInfo": { "name": self.name, "version": self.version },
            })),
            "ping" => Ok(json!({})),
            "tools/list" => Ok(json!({ "tools": self.list_tools() })),
            "tools/call" => self.call_tool(params).await,
            other => Err((METHOD_NOT_FOUND, format!("Method not found: {other}"))),
        }
    }

    fn list_tools(&self) -> Vec<Value> {
        self.tools
            .list()
            .iter()
            .map(|tool| {
                json!({
                    "name": tool.name,
                    "description": tool.description,
                    "inputSchema": tool.input_schema,
                })
            })
            .collect()
    }

    async fn call_tool(&self, params: Value) -> Result<Value, (i64, String)> {
        let name = params
            .get("name")
            .and_then(Value::as_str)
            .ok_or((INVALID_PARAMS, "Missing tool name".to_string()))?;
        let tool = self
            .tools
            .get(name)
            .ok_or_else(|| (INVALID_PARAMS, format!("Unknown tool: {name}")))?;
        let args = match params.get("arguments") {
            None | Some(Value::Null) => Value::Object(Map::new()),
            Some(Value::Object(map)) => Value::Object(map.clone()),
            Some(_) => return Err((INVALID_PARAMS, "Tool arguments must be an object".to_string())),
        };

        info!("[MCP] tools/call: {}", name);
        Ok(match tool.call(args).await {
            Ok(value) => tool_result(value),
            Err(err) => {
                warn!("[MCP] tool {} failed: {}", name, err);
                json!({ "content": [{ "type": "text", "text": err }], "isError": true })
            }
        })
    }
}

fn tool_result(value: Value) -> Value {
    let text = match &value {
        Value::String(s) => s.clone(),
        other => serde_json::to_string_pretty(other).unwrap_or_else(|_| other.to_string()),
    };
    let mut result = json!({ "content": [{ "type": "text", "text": text }], "isError": false });
    if value.is_object() {
        result["structuredContent"] = value;
    }
    result
}

pub fn error_response(id: Value, code: i64, message: &str) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "error": { "code": code, "message": message },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::calendar::calendar_toolkit;

    fn server() -> McpServer {
        let mut tools = calendar_toolkit();
        tools.register_sync("fail", "always fails", json!({ "type": "object" }), |_| {
            Err("boom".to_string())
        });
        McpServer::new("Doable Assistant", tools)
    }

    #[tokio::test]
    async fn initialize_reports_protocol_and_server_info() {
        let resp = server()
            .handle_message(r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{}}"#)
            .await
            .expect("response");
        assert_eq!(resp["id"], 1);
        assert_eq!(resp["result"]["protocolVersion"], PROTOCOL_VERSION);
        assert_eq!(resp["result"]["capabilities"]["tools"]["listChanged"], false);
        assert_eq!(resp["result"]["serverInfo"]["name"], "Doable Assistant");
    }

    #[tokio::test]
    async fn notifications_and_ping() {
        let server = server();
        assert!(server
            .handle_message(r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#)
            .await
            .is_none());
        let pong = server
            .handle_message(r#"{"jsonrpc":"2.0","id":"p","method":"ping"}"#)
            .await
            .unwrap();
        assert_eq!(pong["result"], json!({}));
    }

    #[tokio::test]
    async fn lists_tools_with_input_schema() {
        let resp = server()
            .handle_value(json!({ "jsonrpc": "2.0", "id": 2, "method": "tools/list" }))
            .await
            .unwrap();
        let tools = resp["result"]["tools"].as_array().unwrap();
        assert_eq!(tools.len(), 4);
        assert_eq!(tools[0]["name"], "schedule_meeting");
        assert!(tools[0]["inputSchema"]["properties"]["title"].is_object());
    }

    #[tokio::test]
    async fn calls_tools_and_reports_failures_as_results() {
        let server = server();
        let resp = server
            .handle_value(json!({
                "jsonrpc": "2.0", "id": 3, "method": "tools/call",
                "params": { "name": "verify_task_completion", "arguments": { "task": "t", "steps": ["a"] } }
            }))
            .await
            .unwrap();
        assert_eq!(resp["result"]["isError"], false);
        assert_eq!(resp["result"]["structuredContent"]["verified"], true);

        let resp = server
            .handle_value(json!({
                "jsonrpc": "2.0", "id": 4, "method": "tools/call", "params": { "name": "fail" }
            }))
            .await
            .unwrap();
        assert_eq!(resp["result"]["isError"], true);
        assert_eq!(resp["result"]["content"][0]["text"], "boom");
    }

    #[tokio::test]
    async fn protocol_errors_use_jsonrpc_codes() {
        let server = server();
        let parse = server.handle_message("{not json").await.unwrap();
        assert_eq!(parse["error"]["code"], PARSE_ERROR);
        assert_eq!(parse["id"], Value::Null);

        let invalid = server.handle_value(json!({ "id": 5, "method": "ping" })).await.unwrap();
        assert_eq!(invalid["error"]["code"], INVALID_REQUEST);

        let unknown = server
            .handle_value(json!({ "jsonrpc": "2.0", "id": 6, "method": "resources/list" }))
            .await
            .unwrap();
        assert_eq!(unknown["error"]["code"], METHOD_NOT_FOUND);

        let bad_tool = server
            .handle_value(json!({
                "jsonrpc": "2.0", "id": 7, "method": "tools/call", "params": { "name": "nope" }
            }))
            .await
            .unwrap();
        assert_eq!(bad_tool["error"]["code"], INVALID_PARAMS);

        let bad_args = server
            .handle_value(json!({
                "jsonrpc": "2.0", "id": 8, "method": "tools/call",
                "params": { "name": "get_calendar_events", "arguments": [1] }
            }))
            .await
            .unwrap();
        assert_eq!(bad_args["error"]["code"], INVALID_PARAMS);
    }
}
