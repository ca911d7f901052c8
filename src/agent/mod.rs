use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};
use uuid::Uuid;

use crate::core::time::now_rfc3339;
use crate::core::validation::{normalize_non_empty, require_non_empty};
use crate::error::AppError;
use crate::llm::{ChatMessage, ChatModel, ModelRequest, Part, Role};
use crate::repositories::agent_sessions::SessionStore;
use crate::tools::ToolRegistry;

pub mod assistant;
pub mod os;

pub use assistant::{assistant_agent, assistant_agent_with_tools};
pub use os::AgentOs;

const MARKDOWN_HINT: &str = "Use markdown to format your answers.";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RunInput {
    pub message: String,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
}

impl RunInput {
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RunOutput {
    pub run_id: String,
    pub session_id: String,
    pub agent_id: String,
    pub content: String,
    pub tools_used: Vec<String>,
    pub created_at: String,
}

pub struct Agent {
    pub id: String,
    pub name: String,
    model: Arc<dyn ChatModel>,
    instructions: Vec<String>,
    markdown: bool,
    tools: ToolRegistry,
    store: SessionStore,
    history_limit: usize,
    max_tool_rounds: usize,
}

impl Agent {
    pub fn new(name: &str, model: Arc<dyn ChatModel>, store: SessionStore) -> Self {
        Self {
            id: agent_id_from_name(name),
            name: name.to_string(),
            model,
            instructions: Vec::new(),
            markdown: false,
            tools: ToolRegistry::new(),
            store,
            history_limit: 10,
            max_tool_rounds: 5,
        }
    }

    pub fn with_instructions<I, S>(mut self, instructions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.instructions = instructions.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_markdown(mut self, markdown: bool) -> Self {
        self.markdown = markdown;
        self
    }

    pub fn with_tools(mut self, tools: ToolRegistry) -> Self {
        self.tools = tools;
        self
    }

    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit;
        self
    }

    pub fn with_max_tool_rounds(mut self, rounds: usize) -> Self {
        self.max_tool_rounds = rounds.max(1);
        self
    }

    pub fn model_id(&self) -> &str {
        self.model.id()
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    pub fn system_prompt(&self) -> String {
        let mut prompt = self
            .instructions
            .iter()
            .map(|line| format!("- {line}"))
            .collect::<Vec<_>>()
            .join("\n");
        if self.markdown {
            if !prompt.is_empty() {
                prompt.push_str("\n\n");
            }
            prompt.push_str(MARKDOWN_HINT);
        }
        prompt
    }

    pub async fn run(&self, input: RunInput) -> Result<RunOutput, AppError> {
        let message = require_non_empty(Some(input.message.as_str()), "Message is required")?;
        let session_id =
            normalize_non_empty(input.session_id).unwrap_or_else(|| Uuid::new_v4().to_string());
        let user_id = normalize_non_empty(input.user_id);
        let run_id = Uuid::new_v4().to_string();

        self.store
            .ensure_session(&session_id, &self.id, user_id.as_deref())
            .await?;

        let history = trim_history(
            self.store
                .recent_messages(&session_id, self.history_limit)
                .await?,
        );
        info!(
            "[Agent] run start: agent={}, session={}, run={}, history={}",
            self.id,
            session_id,
            run_id,
            history.len()
        );

        let system = Some(self.system_prompt()).filter(|s| !s.is_empty());
        let declarations = self.tools.declarations();
        let mut new_messages = vec![ChatMessage::user_text(message)];
        let mut tools_used = Vec::new();
        let mut last_text: Option<String> = None;
        let mut rounds = 0;

        let content = loop {
            let mut messages = history.clone();
            messages.extend(new_messages.iter().cloned());
            let response = self
                .model
                .generate(ModelRequest {
                    system: system.clone(),
                    messages,
                    tools: declarations.clone(),
                    response_schema: None,
                })
                .await?;

            let text = response.text();
            if !text.trim().is_empty() {
                last_text = Some(text.clone());
            }
            let calls = response.function_calls();
            if calls.is_empty() {
                new_messages.push(ChatMessage {
                    role: Role::Model,
                    parts: response.parts,
                });
                break text;
            }

            if rounds >= self.max_tool_rounds {
                warn!(
                    "[Agent] tool round limit reached: agent={}, run={}, rounds={}",
                    self.id, run_id, rounds
                );
                let Some(text) = last_text.take() else {
                    return Err(AppError::Model(format!(
                        "no reply after {rounds} tool rounds"
                    )));
                };
                // Unanswered calls would break the next replay.
                new_messages.push(ChatMessage::model_text(text.clone()));
                break text;
            }
            rounds += 1;

            new_messages.push(ChatMessage {
                role: Role::Model,
                parts: response.parts,
            });
            let mut results = Vec::with_capacity(calls.len());
            for (name, args) in calls {
                info!("[Agent] tool call: agent={}, tool={}", self.id, name);
                let response = match self.tools.call(&name, args).await {
                    Ok(value) => value,
                    Err(err) => {
                        warn!("[Agent] tool failed: tool={}, error={}", name, err);
                        json!({ "error": err })
                    }
                };
                tools_used.push(name.clone());
                results.push(Part::FunctionResponse { name, response });
            }
            new_messages.push(ChatMessage {
                role: Role::Tool,
                parts: results,
            });
        };

        self.store
            .append_messages(&session_id, &run_id, &new_messages)
            .await?;

        Ok(RunOutput {
            run_id,
            session_id,
            agent_id: self.id.clone(),
            content,
            tools_used,
            created_at: now_rfc3339(),
        })
    }
}

pub fn agent_id_from_name(name: &str) -> String {
    name.split_whitespace()
        .map(|word| word.to_lowercase())
        .collect::<Vec<_>>()
        .join("-")
}

/// Drops leading messages until the window starts at a plain user turn, so a
/// cut never separates a function call from its response.
fn trim_history(mut history: Vec<ChatMessage>) -> Vec<ChatMessage> {
    let start = history
        .iter()
        .position(|m| {
            m.role == Role::User && m.parts.iter().all(|p| matches!(p, Part::Text { .. }))
        })
        .unwrap_or(history.len());
    history.drain(..start);
    history
}
