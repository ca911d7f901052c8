use std::sync::Arc;

use super::Agent;
use crate::config::Config;
use crate::llm::ChatModel;
use crate::repositories::agent_sessions::SessionStore;
use crate::tools::calendar::calendar_toolkit;

pub const ASSISTANT_NAME: &str = "Assistant";
pub const ASSISTANT_INSTRUCTIONS: [&str; 1] = ["You are a helpful AI assistant."];

/// The conversational assistant without tools.
pub fn assistant_agent(cfg: &Config, model: Arc<dyn ChatModel>, store: SessionStore) -> Agent {
    Agent::new(ASSISTANT_NAME, model, store)
        .with_instructions(ASSISTANT_INSTRUCTIONS)
        .with_markdown(true)
        .with_history_limit(cfg.agent_history_limit)
        .with_max_tool_rounds(cfg.agent_max_tool_rounds)
}

/// Same assistant with the calendar and reflection tools attached.
pub fn assistant_agent_with_tools(
    cfg: &Config,
    model: Arc<dyn ChatModel>,
    store: SessionStore,
) -> Agent {
    assistant_agent(cfg, model, store).with_tools(calendar_toolkit())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::connect_in_memory;
    use crate::llm::scripted::ScriptedModel;

    #[tokio::test]
    async fn variants_differ_only_in_tools() {
        let cfg = Config::from_lookup(|_| None);
        let store = SessionStore::new(connect_in_memory().await.unwrap());
        let plain = assistant_agent(&cfg, Arc::new(ScriptedModel::new()), store.clone());
        let tooled = assistant_agent_with_tools(&cfg, Arc::new(ScriptedModel::new()), store);

        assert_eq!(plain.id, "assistant");
        assert_eq!(plain.system_prompt(), tooled.system_prompt());
        assert!(plain.tools().is_empty());
        let names: Vec<&str> = tooled.tools().list().iter().map(|t| t.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["schedule_meeting", "get_calendar_events", "verify_task_completion"]
        );
    }
}
