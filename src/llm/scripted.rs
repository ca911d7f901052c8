use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use super::{ChatModel, ModelRequest, ModelResponse, Part};
use crate::error::AppError;

/// Replays canned replies in order and records every request it receives.
#[derive(Default)]
pub struct ScriptedModel {
    replies: Mutex<VecDeque<Result<ModelResponse, String>>>,
    requests: Mutex<Vec<ModelRequest>>,
}

impl ScriptedModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_text(self, text: &str) -> Self {
        self.push(Ok(ModelResponse {
            parts: vec![Part::Text { text: text.to_string() }],
            ..ModelResponse::default()
        }))
    }

    pub fn with_call(self, name: &str, args: Value) -> Self {
        self.push(Ok(ModelResponse {
            parts: vec![Part::FunctionCall { name: name.to_string(), args }],
            ..ModelResponse::default()
        }))
    }

    pub fn with_error(self, message: &str) -> Self {
        self.push(Err(message.to_string()))
    }

    fn push(self, reply: Result<ModelResponse, String>) -> Self {
        self.replies.lock().expect("replies lock").push_back(reply);
        self
    }

    pub fn requests(&self) -> Vec<ModelRequest> {
        self.requests.lock().expect("requests lock").clone()
    }
}

#[async_trait]
impl ChatModel for ScriptedModel {
    fn id(&self) -> &str {
        "scripted"
    }

    async fn generate(&self, request: ModelRequest) -> Result<ModelResponse, AppError> {
        self.requests.lock().expect("requests lock").push(request);
        match self.replies.lock().expect("replies lock").pop_front() {
            Some(Ok(response)) => Ok(response),
            Some(Err(message)) => Err(AppError::Model(message)),
            None => Err(AppError::Model("no scripted reply left".to_string())),
        }
    }
}
