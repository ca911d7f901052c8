use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::llm::{ChatMessage, Part, Role};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentSession {
    pub session_id: String,
    pub agent_id: String,
    pub user_id: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredMessage {
    pub id: String,
    pub run_id: String,
    pub role: Role,
    pub parts: Vec<Part>,
    pub created_at: String,
}

impl StoredMessage {
    pub fn to_chat_message(&self) -> ChatMessage {
        ChatMessage {
            role: self.role,
            parts: self.parts.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentSessionDetail {
    #[serde(flatten)]
    pub session: AgentSession,
    pub messages: Vec<StoredMessage>,
}

#[derive(Debug, FromRow)]
pub struct AgentSessionRow {
    pub id: String,
    pub agent_id: String,
    pub user_id: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl AgentSessionRow {
    pub fn to_session(self) -> AgentSession {
        AgentSession {
            session_id: self.id,
            agent_id: self.agent_id,
            user_id: self.user_id,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(Debug, FromRow)]
pub struct AgentMessageRow {
    pub id: String,
    pub run_id: String,
    pub role: String,
    pub parts_json: String,
    pub created_at: String,
}

impl AgentMessageRow {
    /// Rows with an unknown role or unreadable parts are skipped.
    pub fn to_message(self) -> Option<StoredMessage> {
        let role = Role::parse(&self.role)?;
        let parts: Vec<Part> = serde_json::from_str(&self.parts_json).ok()?;
        Some(StoredMessage {
            id: self.id,
            run_id: self.run_id,
            role,
            parts,
            created_at: self.created_at,
        })
    }
}
