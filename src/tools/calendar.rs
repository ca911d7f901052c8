//! Static calendar and self-reflection stand-ins. Nothing is scheduled or
//! verified; every call returns the same literals regardless of input.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::{parse_args, ToolRegistry};

pub const DEFAULT_DURATION_MINS: u32 = 30;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarEvent {
    pub title: String,
    pub start_time: String,
    pub duration: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationReport {
    pub verified: bool,
    pub task: String,
    pub steps_reviewed: usize,
    pub feedback: String,
}

pub fn schedule_meeting(title: &str, start_time: &str, duration: u32) -> String {
    format!("Meeting '{title}' scheduled at {start_time} for {duration} minutes.")
}

pub fn get_calendar_events() -> Vec<CalendarEvent> {
    vec![
        CalendarEvent {
            title: "Team Standup".to_string(),
            start_time: "2025-01-01T09:00".to_string(),
            duration: 15,
        },
        CalendarEvent {
            title: "Project Review".to_string(),
            start_time: "2025-01-01T14:00".to_string(),
            duration: 60,
        },
    ]
}

pub fn verify_task_completion(task: &str, steps: &[String]) -> VerificationReport {
    VerificationReport {
        verified: true,
        task: task.to_string(),
        steps_reviewed: steps.len(),
        feedback: format!(
            "Task '{task}' appears complete. All {} steps were reviewed.",
            steps.len()
        ),
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ScheduleArgs {
    pub title: String,
    pub start_time: String,
    #[serde(default = "default_duration")]
    pub duration: u32,
}

#[derive(Debug, Deserialize)]
pub(crate) struct VerifyArgs {
    pub task: String,
    #[serde(default)]
    pub steps: Vec<String>,
}

fn default_duration() -> u32 {
    DEFAULT_DURATION_MINS
}

pub(crate) fn schedule_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "title": { "type": "string", "description": "Title of the meeting or task" },
            "start_time": { "type": "string", "description": "Start time in ISO 8601 format" },
            "duration": { "type": "integer", "description": "Duration in minutes", "default": DEFAULT_DURATION_MINS }
        },
        "required": ["title", "start_time"]
    })
}

pub(crate) fn empty_schema() -> Value {
    json!({ "type": "object", "properties": {} })
}

pub(crate) fn verify_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "task": { "type": "string", "description": "The task that was worked on" },
            "steps": {
                "type": "array",
                "items": { "type": "string" },
                "description": "Steps taken to complete the task"
            }
        },
        "required": ["task", "steps"]
    })
}

/// The three mock functions exposed as agent tools under their own names.
pub fn calendar_toolkit() -> ToolRegistry {
    let mut registry = ToolRegistry::new();

    registry.register_sync(
        "schedule_meeting",
        "Schedule a meeting in the user's calendar.",
        schedule_schema(),
        |args| {
            let args: ScheduleArgs = parse_args(args)?;
            Ok(Value::String(schedule_meeting(&args.title, &args.start_time, args.duration)))
        },
    );

    registry.register_sync(
        "get_calendar_events",
        "Get all events currently in the user's calendar.",
        empty_schema(),
        |_| serde_json::to_value(get_calendar_events()).map_err(|e| e.to_string()),
    );

    registry.register_sync(
        "verify_task_completion",
        "Reflect on the steps taken for a task and verify it was completed.",
        verify_schema(),
        |args| {
            let args: VerifyArgs = parse_args(args)?;
            serde_json::to_value(verify_task_completion(&args.task, &args.steps))
                .map_err(|e| e.to_string())
        },
    );

    registry
}
