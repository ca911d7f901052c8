use std::sync::Arc;

use serde::Deserialize;
use serde_json::{json, Value};
use sqlx::SqlitePool;

use crate::agent::{Agent, RunInput};
use crate::repositories::tasks::TaskFilter;
use crate::services::tasks::{self, CreateTaskInput};
use crate::tools::calendar::{
    empty_schema, get_calendar_events, schedule_meeting, schedule_schema, verify_schema,
    verify_task_completion, ScheduleArgs, VerifyArgs,
};
use crate::tools::{parse_args, ToolRegistry};

const DEFAULT_LIST_LIMIT: i64 = 10;

#[derive(Debug, Deserialize)]
struct AskArgs {
    message: String,
    #[serde(default)]
    session_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct HelloArgs {
    name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateTaskArgs {
    title: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    priority: Option<i64>,
    user_id: String,
    #[serde(default)]
    due_date: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListTasksArgs {
    user_id: String,
    #[serde(default)]
    is_completed: Option<bool>,
    #[serde(default)]
    limit: Option<i64>,
}

/// Tools served by the Doable MCP server. The calendar tools are exposed
/// under their MCP names and delegate to the same mock functions the agent
/// uses.
pub fn doable_tools(agent: Arc<Agent>, pool: SqlitePool) -> ToolRegistry {
    let mut registry = ToolRegistry::new();

    registry.register(
        "ask_assistant",
        "Ask the Doable AI assistant a question or give it a task.",
        json!({
            "type": "object",
            "properties": {
                "message": { "type": "string", "description": "The message for the assistant" },
                "session_id": { "type": "string", "description": "Continue an earlier conversation" }
            },
            "required": ["message"]
        }),
        move |args| {
            let agent = agent.clone();
            async move {
                let args: AskArgs = parse_args(args)?;
                let output = agent
                    .run(RunInput {
                        message: args.message,
                        session_id: args.session_id,
                        user_id: None,
                    })
                    .await
                    .map_err(|e| e.to_string())?;
                Ok(Value::String(output.content))
            }
        },
    );

    registry.register_sync(
        "schedule_task",
        "Schedule a task or meeting in the calendar.",
        schedule_schema(),
        |args| {
            let args: ScheduleArgs = parse_args(args)?;
            Ok(Value::String(schedule_meeting(&args.title, &args.start_time, args.duration)))
        },
    );

    registry.register_sync(
        "list_calendar",
        "List the upcoming calendar events.",
        empty_schema(),
        |_| serde_json::to_value(get_calendar_events()).map_err(|e| e.to_string()),
    );

    registry.register_sync(
        "reflect_on_task",
        "Reflect on a completed task and verify the steps taken.",
        verify_schema(),
        |args| {
            let args: VerifyArgs = parse_args(args)?;
            serde_json::to_value(verify_task_completion(&args.task, &args.steps))
                .map_err(|e| e.to_string())
        },
    );

    registry.register_sync(
        "hello",
        "A simple hello world tool to verify MCP setup",
        json!({
            "type": "object",
            "properties": {
                "name": { "type": "string", "description": "The name of the person to greet" }
            },
            "required": ["name"]
        }),
        |args| {
            let args: HelloArgs = parse_args(args)?;
            Ok(Value::String(format!("Hello, {}!", args.name)))
        },
    );

    let create_pool = pool.clone();
    registry.register(
        "create_task",
        "Create a new task in the user's to-do list.",
        json!({
            "type": "object",
            "properties": {
                "title": { "type": "string", "description": "The title of the task" },
                "description": { "type": "string", "description": "A more detailed description of the task" },
                "priority": {
                    "type": "integer", "minimum": 1, "maximum": 5, "default": 3,
                    "description": "Priority level (1-5), where 5 is highest"
                },
                "userId": { "type": "string", "description": "The ID of the user creating the task" },
                "dueDate": { "type": "string", "description": "Due date in ISO 8601 format" }
            },
            "required": ["title", "userId"]
        }),
        move |args| {
            let pool = create_pool.clone();
            async move {
                let args: CreateTaskArgs = parse_args(args)?;
                let input = CreateTaskInput {
                    user_id: Some(args.user_id),
                    title: Some(args.title),
                    description: args.description,
                    priority: args.priority,
                    due_date: args.due_date,
                    ..CreateTaskInput::default()
                };
                Ok(match tasks::create_task(&pool, None, input).await {
                    Ok(task) => json!({
                        "success": true,
                        "task": { "id": task.id, "title": task.title, "status": "created" }
                    }),
                    Err(err) => json!({ "success": false, "error": err.to_string() }),
                })
            }
        },
    );

    registry.register(
        "list_tasks",
        "Retrieve a list of tasks for a user, optionally filtered by completion status.",
        json!({
            "type": "object",
            "properties": {
                "userId": { "type": "string", "description": "The ID of the user to retrieve tasks for" },
                "isCompleted": { "type": "boolean", "description": "Filter by completion status (true/false)" },
                "limit": { "type": "integer", "default": DEFAULT_LIST_LIMIT, "description": "Maximum number of tasks to return" }
            },
            "required": ["userId"]
        }),
        move |args| {
            let pool = pool.clone();
            async move {
                let args: ListTasksArgs = parse_args(args)?;
                let filter = TaskFilter {
                    user_id: Some(args.user_id),
                    project_id: None,
                    is_completed: args.is_completed,
                    limit: Some(args.limit.unwrap_or(DEFAULT_LIST_LIMIT).max(0)),
                };
                let tasks = tasks::list_tasks(&pool, &filter)
                    .await
                    .map_err(|e| e.to_string())?;
                Ok(Value::Array(
                    tasks
                        .into_iter()
                        .map(|t| {
                            json!({
                                "id": t.id,
                                "title": t.title,
                                "isCompleted": t.is_completed,
                                "priority": t.priority,
                                "dueDate": t.due_date,
                            })
                        })
                        .collect(),
                ))
            }
        },
    );

    registry
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::connect_in_memory;
    use crate::llm::scripted::ScriptedModel;
    use crate::mcp::McpServer;
    use crate::repositories::agent_sessions::SessionStore;

    async fn registry(model: ScriptedModel) -> (ToolRegistry, SqlitePool) {
        let pool = connect_in_memory().await.unwrap();
        let agent = Agent::new(
            "Assistant",
            Arc::new(model),
            SessionStore::new(pool.clone()),
        );
        (doable_tools(Arc::new(agent), pool.clone()), pool)
    }

    #[tokio::test]
    async fn exposes_all_doable_tools() {
        let (tools, _) = registry(ScriptedModel::new()).await;
        let names: Vec<&str> = tools.list().iter().map(|t| t.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "ask_assistant",
                "schedule_task",
                "list_calendar",
                "reflect_on_task",
                "hello",
                "create_task",
                "list_tasks"
            ]
        );
    }

    #[tokio::test]
    async fn calendar_tools_pass_through() {
        let (tools, _) = registry(ScriptedModel::new()).await;
        assert_eq!(
            tools
                .call("schedule_task", json!({ "title": "X", "start_time": "2025-01-01T10:00" }))
                .await
                .unwrap(),
            json!("Meeting 'X' scheduled at 2025-01-01T10:00 for 30 minutes.")
        );
        let events = tools.call("list_calendar", json!({})).await.unwrap();
        assert_eq!(events.as_array().map(Vec::len), Some(2));
        assert_eq!(tools.call("hello", json!({ "name": "Ada" })).await.unwrap(), json!("Hello, Ada!"));
    }

    #[tokio::test]
    async fn ask_assistant_returns_agent_content() {
        let (tools, _) = registry(ScriptedModel::new().with_text("Hi there!")).await;
        let server = McpServer::new("Doable Assistant", tools);
        let resp = server
            .handle_value(json!({
                "jsonrpc": "2.0", "id": 1, "method": "tools/call",
                "params": { "name": "ask_assistant", "arguments": { "message": "hello" } }
            }))
            .await
            .unwrap();
        assert_eq!(resp["result"]["content"][0]["text"], "Hi there!");
        assert_eq!(resp["result"]["isError"], false);
    }

    #[tokio::test]
    async fn create_then_list_tasks() {
        let (tools, _) = registry(ScriptedModel::new()).await;
        let created = tools
            .call("create_task", json!({ "title": "Ship it", "userId": "u1", "priority": 5 }))
            .await
            .unwrap();
        assert_eq!(created["success"], true);
        assert_eq!(created["task"]["status"], "created");

        let invalid = tools
            .call("create_task", json!({ "title": "Bad", "userId": "u1", "priority": 7 }))
            .await
            .unwrap();
        assert_eq!(invalid["success"], false);
        assert_eq!(invalid["error"], "Priority must be between 1 and 5");

        let bad_date = tools
            .call("create_task", json!({ "title": "Bad", "userId": "u1", "dueDate": "banana" }))
            .await
            .unwrap();
        assert_eq!(bad_date["success"], false);
        assert_eq!(bad_date["error"], "Invalid due date");

        let listed = tools
            .call("list_tasks", json!({ "userId": "u1", "isCompleted": false }))
            .await
            .unwrap();
        let listed = listed.as_array().unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0]["title"], "Ship it");
        assert_eq!(listed[0]["priority"], 5);
        assert_eq!(listed[0]["dueDate"], Value::Null);
    }
}
