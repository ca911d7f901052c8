use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::AppError;

pub mod gemini;
#[cfg(test)]
pub mod scripted;

pub use gemini::GeminiModel;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
    Tool,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Model => "model",
            Role::Tool => "tool",
        }
    }

    pub fn parse(raw: &str) -> Option<Role> {
        match raw {
            "user" => Some(Role::User),
            "model" => Some(Role::Model),
            "tool" => Some(Role::Tool),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Part {
    Text { text: String },
    FunctionCall { name: String, args: Value },
    FunctionResponse { name: String, response: Value },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub parts: Vec<Part>,
}

impl ChatMessage {
    pub fn user_text(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            parts: vec![Part::Text { text: text.into() }],
        }
    }

    pub fn model_text(text: impl Into<String>) -> Self {
        Self {
            role: Role::Model,
            parts: vec![Part::Text { text: text.into() }],
        }
    }

    pub fn text(&self) -> String {
        collect_text(&self.parts)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolDeclaration {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

#[derive(Debug, Clone, Default)]
pub struct ModelRequest {
    pub system: Option<String>,
    pub messages: Vec<ChatMessage>,
    pub tools: Vec<ToolDeclaration>,
    pub response_schema: Option<Value>,
}

impl ModelRequest {
    pub fn prompt(text: impl Into<String>) -> Self {
        Self {
            messages: vec![ChatMessage::user_text(text)],
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ModelResponse {
    pub parts: Vec<Part>,
    pub finish_reason: Option<String>,
}

impl ModelResponse {
    pub fn text(&self) -> String {
        collect_text(&self.parts)
    }

    pub fn function_calls(&self) -> Vec<(String, Value)> {
        self.parts
            .iter()
            .filter_map(|part| match part {
                Part::FunctionCall { name, args } => Some((name.clone(), args.clone())),
                _ => None,
            })
            .collect()
    }
}

fn collect_text(parts: &[Part]) -> String {
    parts
        .iter()
        .filter_map(|part| match part {
            Part::Text { text } => Some(text.as_str()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("")
}

#[async_trait]
pub trait ChatModel: Send + Sync {
    fn id(&self) -> &str;

    async fn generate(&self, request: ModelRequest) -> Result<ModelResponse, AppError>;
}

/// Runs a single prompt in JSON mode and parses the reply.
pub async fn generate_json(
    model: &dyn ChatModel,
    prompt: &str,
    schema: Value,
) -> Result<Value, AppError> {
    let mut request = ModelRequest::prompt(prompt);
    request.response_schema = Some(schema);
    let response = model.generate(request).await?;
    parse_json_reply(&response.text())
}

pub fn parse_json_reply(raw: &str) -> Result<Value, AppError> {
    let cleaned = strip_code_fence(raw);
    if cleaned.is_empty() {
        return Err(AppError::Model("model returned an empty JSON reply".to_string()));
    }
    serde_json::from_str(cleaned)
        .map_err(|err| AppError::Model(format!("model returned invalid JSON: {err}")))
}

fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn strips_json_fences() {
        assert_eq!(strip_code_fence("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fence("  {\"a\":1} "), "{\"a\":1}");
        assert_eq!(parse_json_reply("```\n[1,2]\n```").unwrap(), json!([1, 2]));
    }

    #[test]
    fn rejects_non_json_replies() {
        let err = parse_json_reply("sure, here you go").unwrap_err();
        assert!(matches!(err, AppError::Model(_)));
    }

    #[test]
    fn collects_text_and_calls() {
        let response = ModelResponse {
            parts: vec![
                Part::Text { text: "Let me ".into() },
                Part::FunctionCall { name: "get_calendar_events".into(), args: json!({}) },
                Part::Text { text: "check.".into() },
            ],
            ..ModelResponse::default()
        };
        assert_eq!(response.text(), "Let me check.");
        assert_eq!(response.function_calls().len(), 1);
    }

    #[test]
    fn parts_serialize_with_type_tag() {
        let msg = ChatMessage::user_text("hi");
        let value = serde_json::to_value(&msg.parts).unwrap();
        assert_eq!(value, json!([{ "type": "text", "text": "hi" }]));
    }
}
