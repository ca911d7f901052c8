use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Map, Value};
use tracing::{error, info};

use super::{ChatMessage, ChatModel, ModelRequest, ModelResponse, Part, Role};
use crate::config::Config;
use crate::error::AppError;

const SCHEMA_KEYS: [&str; 7] = [
    "description",
    "enum",
    "format",
    "items",
    "nullable",
    "properties",
    "required",
];

#[derive(Clone)]
pub struct GeminiModel {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl GeminiModel {
    pub fn new(api_key: String, base_url: String, model: String, timeout: Duration) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Config(format!("build http client failed: {e}")))?;
        Ok(Self {
            client,
            base_url,
            api_key,
            model,
        })
    }

    pub fn from_config(cfg: &Config) -> Result<Self, AppError> {
        Self::new(
            cfg.google_api_key.clone(),
            cfg.gemini_base_url.clone(),
            cfg.gemini_model.clone(),
            Duration::from_secs(cfg.model_timeout_secs),
        )
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        )
    }
}

#[async_trait]
impl ChatModel for GeminiModel {
    fn id(&self) -> &str {
        &self.model
    }

    async fn generate(&self, request: ModelRequest) -> Result<ModelResponse, AppError> {
        if self.api_key.trim().is_empty() {
            return Err(AppError::Config("GOOGLE_API_KEY is not set".to_string()));
        }

        let payload = build_payload(&request);
        let url = self.endpoint();
        info!(
            "[Gemini] generateContent: model={}, messages={}, tools={}, json_mode={}",
            self.model,
            request.messages.len(),
            request.tools.len(),
            request.response_schema.is_some()
        );

        let resp = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| AppError::Model(e.to_string()))?;

        let status = resp.status();
        let raw = resp.text().await.map_err(|e| AppError::Model(e.to_string()))?;
        if !status.is_success() {
            let err_text = truncate_log(&raw, 2000);
            error!("[Gemini] request failed: status={}, error={}", status, err_text);
            return Err(AppError::Model(format!("status {}: {}", status, err_text)));
        }

        let value: Value = serde_json::from_str(&raw).map_err(|err| {
            AppError::Model(format!(
                "invalid JSON response (status {}): {}; body_preview={}",
                status,
                err,
                truncate_log(&raw, 1200)
            ))
        })?;
        parse_response(&value)
    }
}

pub(crate) fn build_payload(request: &ModelRequest) -> Value {
    let contents: Vec<Value> = request.messages.iter().map(message_to_content).collect();
    let mut payload = json!({ "contents": contents });

    if let Some(system) = request.system.as_deref().filter(|s| !s.trim().is_empty()) {
        payload["systemInstruction"] = json!({ "parts": [{ "text": system }] });
    }

    if !request.tools.is_empty() {
        let declarations: Vec<Value> = request
            .tools
            .iter()
            .map(|tool| {
                let mut decl = json!({
                    "name": tool.name,
                    "description": tool.description,
                });
                let has_params = tool
                    .parameters
                    .get("properties")
                    .and_then(Value::as_object)
                    .map(|props| !props.is_empty())
                    .unwrap_or(false);
                // Parameterless functions must omit the schema entirely.
                if has_params {
                    decl["parameters"] = to_gemini_schema(&tool.parameters);
                }
                decl
            })
            .collect();
        payload["tools"] = json!([{ "functionDeclarations": declarations }]);
    }

    if let Some(schema) = &request.response_schema {
        payload["generationConfig"] = json!({
            "responseMimeType": "application/json",
            "responseSchema": to_gemini_schema(schema),
        });
    }

    payload
}

fn message_to_content(message: &ChatMessage) -> Value {
    let role = match message.role {
        Role::Model => "model",
        Role::User | Role::Tool => "user",
    };
    let parts: Vec<Value> = message
        .parts
        .iter()
        .map(|part| match part {
            Part::Text { text } => json!({ "text": text }),
            Part::FunctionCall { name, args } => {
                json!({ "functionCall": { "name": name, "args": args } })
            }
            Part::FunctionResponse { name, response } => {
                let response = if response.is_object() {
                    response.clone()
                } else {
                    json!({ "result": response })
                };
                json!({ "functionResponse": { "name": name, "response": response } })
            }
        })
        .collect();
    json!({ "role": role, "parts": parts })
}

/// Narrows a JSON schema to the OpenAPI subset the Gemini API accepts.
pub(crate) fn to_gemini_schema(schema: &Value) -> Value {
    let Some(obj) = schema.as_object() else {
        return schema.clone();
    };

    let mut out = Map::new();
    if let Some(kind) = obj.get("type").and_then(Value::as_str) {
        out.insert("type".to_string(), Value::String(kind.to_uppercase()));
    }
    for key in SCHEMA_KEYS {
        let Some(value) = obj.get(key) else { continue };
        let converted = match key {
            "items" => to_gemini_schema(value),
            "properties" => match value.as_object() {
                Some(props) => Value::Object(
                    props
                        .iter()
                        .map(|(name, prop)| (name.clone(), to_gemini_schema(prop)))
                        .collect(),
                ),
                None => value.clone(),
            },
            _ => value.clone(),
        };
        out.insert(key.to_string(), converted);
    }
    Value::Object(out)
}

pub(crate) fn parse_response(value: &Value) -> Result<ModelResponse, AppError> {
    let candidate = value
        .get("candidates")
        .and_then(|c| c.get(0))
        .ok_or_else(|| AppError::Model(format!("no candidates returned: {}", truncate_log(&value.to_string(), 600))))?;

    let parts = candidate
        .get("content")
        .and_then(|c| c.get("parts"))
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| {
                    if let Some(call) = item.get("functionCall") {
                        let name = call.get("name").and_then(Value::as_str)?.to_string();
                        let args = call.get("args").cloned().unwrap_or_else(|| json!({}));
                        return Some(Part::FunctionCall { name, args });
                    }
                    item.get("text")
                        .and_then(Value::as_str)
                        .map(|text| Part::Text { text: text.to_string() })
                })
                .collect::<Vec<_>>()
        })
        .unwrap_or_default();

    Ok(ModelResponse {
        parts,
        finish_reason: candidate
            .get("finishReason")
            .and_then(Value::as_str)
            .map(|s| s.to_string()),
    })
}

fn truncate_log(value: &str, max_len: usize) -> String {
    if value.chars().count() <= max_len {
        return value.to_string();
    }
    let mut out: String = value.chars().take(max_len).collect();
    out.push_str("...[truncated]");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::ToolDeclaration;

    #[test]
    fn payload_carries_system_tools_and_schema() {
        let request = ModelRequest {
            system: Some("- You are a helpful AI assistant.".to_string()),
            messages: vec![
                ChatMessage::user_text("what's on my calendar?"),
                ChatMessage {
                    role: Role::Model,
                    parts: vec![Part::FunctionCall {
                        name: "get_calendar_events".into(),
                        args: json!({}),
                    }],
                },
                ChatMessage {
                    role: Role::Tool,
                    parts: vec![Part::FunctionResponse {
                        name: "get_calendar_events".into(),
                        response: json!([1, 2]),
                    }],
                },
            ],
            tools: vec![
                ToolDeclaration {
                    name: "get_calendar_events".into(),
                    description: "List events".into(),
                    parameters: json!({ "type": "object", "properties": {} }),
                },
                ToolDeclaration {
                    name: "schedule_meeting".into(),
                    description: "Schedule".into(),
                    parameters: json!({
                        "type": "object",
                        "properties": { "title": { "type": "string" } },
                        "additionalProperties": false
                    }),
                },
            ],
            response_schema: None,
        };

        let payload = build_payload(&request);
        assert_eq!(
            payload["systemInstruction"]["parts"][0]["text"],
            "- You are a helpful AI assistant."
        );
        assert_eq!(payload["contents"][1]["role"], "model");
        assert_eq!(payload["contents"][2]["role"], "user");
        assert_eq!(
            payload["contents"][2]["parts"][0]["functionResponse"]["response"],
            json!({ "result": [1, 2] })
        );
        let declarations = &payload["tools"][0]["functionDeclarations"];
        assert!(declarations[0].get("parameters").is_none());
        let params = &declarations[1]["parameters"];
        assert_eq!(params["type"], "OBJECT");
        assert!(params.get("additionalProperties").is_none());
        assert!(payload.get("generationConfig").is_none());
    }

    #[test]
    fn schema_conversion_recurses() {
        let schema = json!({
            "type": "object",
            "properties": {
                "steps": { "type": "array", "items": { "type": "string", "default": "x" } },
                "duration": { "type": "integer", "default": 30 }
            },
            "required": ["steps"]
        });
        let converted = to_gemini_schema(&schema);
        assert_eq!(converted["properties"]["steps"]["items"], json!({ "type": "STRING" }));
        assert_eq!(converted["properties"]["duration"], json!({ "type": "INTEGER" }));
        assert_eq!(converted["required"], json!(["steps"]));
    }

    #[test]
    fn parses_text_and_function_calls() {
        let body = json!({
            "candidates": [{
                "content": { "role": "model", "parts": [
                    { "text": "Sure." },
                    { "functionCall": { "name": "schedule_meeting", "args": { "title": "Sync" } } }
                ]},
                "finishReason": "STOP"
            }],
            "usageMetadata": { "totalTokenCount": 12 }
        });
        let response = parse_response(&body).unwrap();
        assert_eq!(response.text(), "Sure.");
        assert_eq!(
            response.function_calls(),
            vec![("schedule_meeting".to_string(), json!({ "title": "Sync" }))]
        );
        assert_eq!(response.finish_reason.as_deref(), Some("STOP"));
    }

    #[test]
    fn empty_candidates_is_a_model_error() {
        let err = parse_response(&json!({ "candidates": [] })).unwrap_err();
        assert!(matches!(err, AppError::Model(_)));
    }

    #[tokio::test]
    async fn missing_api_key_fails_before_any_request() {
        let model = GeminiModel::new(
            String::new(),
            "http://127.0.0.1:9".into(),
            "gemini-2.5-flash".into(),
            Duration::from_secs(1),
        )
        .unwrap();
        let err = model.generate(ModelRequest::prompt("hi")).await.unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }
}
