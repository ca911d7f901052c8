use std::sync::Arc;

use serde_json::{json, Value};

use super::Agent;

/// Groups agents under one id and description for serving.
pub struct AgentOs {
    pub id: String,
    pub description: String,
    agents: Vec<Arc<Agent>>,
}

impl AgentOs {
    pub fn new(id: impl Into<String>, description: impl Into<String>, agents: Vec<Arc<Agent>>) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            agents,
        }
    }

    pub fn agents(&self) -> &[Arc<Agent>] {
        &self.agents
    }

    pub fn get_agent(&self, agent_id: &str) -> Option<Arc<Agent>> {
        self.agents.iter().find(|a| a.id == agent_id).cloned()
    }

    pub fn default_agent(&self) -> Option<Arc<Agent>> {
        self.agents.first().cloned()
    }

    pub fn config(&self) -> Value {
        json!({
            "os_id": self.id,
            "description": self.description,
            "agents": self.agents.iter().map(|a| agent_summary(a)).collect::<Vec<_>>(),
        })
    }
}

pub fn agent_summary(agent: &Agent) -> Value {
    json!({
        "id": agent.id,
        "name": agent.name,
        "model": agent.model_id(),
    })
}
