use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::core::time::now_rfc3339;

pub const DEFAULT_PRIORITY: i64 = 3;
pub const DEFAULT_SUBSTEP_MINS: i64 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EisenhowerQuadrant {
    #[serde(rename = "Urgent & Important")]
    UrgentImportant,
    #[serde(rename = "Not Urgent & Important")]
    NotUrgentImportant,
    #[serde(rename = "Urgent & Not Important")]
    UrgentNotImportant,
    #[serde(rename = "Not Urgent & Not Important")]
    NotUrgentNotImportant,
}

impl EisenhowerQuadrant {
    pub const LABELS: [&'static str; 4] = [
        "Urgent & Important",
        "Not Urgent & Important",
        "Urgent & Not Important",
        "Not Urgent & Not Important",
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EisenhowerQuadrant::UrgentImportant => Self::LABELS[0],
            EisenhowerQuadrant::NotUrgentImportant => Self::LABELS[1],
            EisenhowerQuadrant::UrgentNotImportant => Self::LABELS[2],
            EisenhowerQuadrant::NotUrgentNotImportant => Self::LABELS[3],
        }
    }

    pub fn parse(raw: &str) -> Option<EisenhowerQuadrant> {
        match raw.trim() {
            "Urgent & Important" => Some(EisenhowerQuadrant::UrgentImportant),
            "Not Urgent & Important" => Some(EisenhowerQuadrant::NotUrgentImportant),
            "Urgent & Not Important" => Some(EisenhowerQuadrant::UrgentNotImportant),
            "Not Urgent & Not Important" => Some(EisenhowerQuadrant::NotUrgentNotImportant),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Substep {
    #[serde(default = "new_id")]
    pub id: String,
    pub title: String,
    #[serde(default = "default_substep_mins")]
    pub duration_mins: i64,
    #[serde(default)]
    pub is_completed: bool,
}

impl Substep {
    pub fn new(title: String, duration_mins: i64) -> Substep {
        Substep {
            id: new_id(),
            title,
            duration_mins,
            is_completed: false,
        }
    }
}

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

fn default_substep_mins() -> i64 {
    DEFAULT_SUBSTEP_MINS
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub user_id: String,
    pub project_id: Option<String>,
    pub title: String,
    pub description: Option<String>,
    pub why: Option<String>,
    pub priority: i64,
    pub eisenhower_quadrant: Option<EisenhowerQuadrant>,
    pub due_date: Option<String>,
    pub effort_estimate_mins: Option<i64>,
    pub is_completed: bool,
    pub substeps: Vec<Substep>,
    pub last_delayed_at: Option<String>,
    pub reverse_pomodoro_active: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl Task {
    pub fn new(user_id: String, title: String) -> Task {
        let now = now_rfc3339();
        Task {
            id: new_id(),
            user_id,
            project_id: None,
            title,
            description: None,
            why: None,
            priority: DEFAULT_PRIORITY,
            eisenhower_quadrant: None,
            due_date: None,
            effort_estimate_mins: None,
            is_completed: false,
            substeps: Vec::new(),
            last_delayed_at: None,
            reverse_pomodoro_active: false,
            created_at: now.clone(),
            updated_at: now,
        }
    }

    /// Whether create-time enrichment has anything to fill in.
    pub fn needs_enrichment(&self) -> bool {
        self.eisenhower_quadrant.is_none() || self.effort_estimate_mins.is_none() || self.why.is_none()
    }
}

#[derive(Debug, FromRow)]
pub struct TaskRow {
    pub id: String,
    pub user_id: String,
    pub project_id: Option<String>,
    pub title: String,
    pub description: Option<String>,
    pub why: Option<String>,
    pub priority: i64,
    pub eisenhower_quadrant: Option<String>,
    pub due_date: Option<String>,
    pub effort_estimate_mins: Option<i64>,
    pub is_completed: i64,
    pub substeps_json: String,
    pub last_delayed_at: Option<String>,
    pub reverse_pomodoro_active: i64,
    pub created_at: String,
    pub updated_at: String,
}

impl TaskRow {
    pub fn to_task(self) -> Task {
        Task {
            id: self.id,
            user_id: self.user_id,
            project_id: self.project_id,
            title: self.title,
            description: self.description,
            why: self.why,
            priority: self.priority,
            eisenhower_quadrant: self
                .eisenhower_quadrant
                .as_deref()
                .and_then(EisenhowerQuadrant::parse),
            due_date: self.due_date,
            effort_estimate_mins: self.effort_estimate_mins,
            is_completed: self.is_completed == 1,
            substeps: serde_json::from_str(&self.substeps_json).unwrap_or_default(),
            last_delayed_at: self.last_delayed_at,
            reverse_pomodoro_active: self.reverse_pomodoro_active == 1,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn quadrant_labels_round_trip_through_serde() {
        for label in EisenhowerQuadrant::LABELS {
            let quadrant = EisenhowerQuadrant::parse(label).expect("known label");
            assert_eq!(serde_json::to_value(quadrant).unwrap(), json!(label));
        }
        assert!(EisenhowerQuadrant::parse("Urgent").is_none());
    }

    #[test]
    fn task_serializes_in_camel_case() {
        let task = Task::new("u1".into(), "Write report".into());
        let value = serde_json::to_value(&task).unwrap();
        assert_eq!(value["userId"], "u1");
        assert_eq!(value["priority"], 3);
        assert_eq!(value["isCompleted"], false);
        assert!(value.get("reversePomodoroActive").is_some());
        assert!(task.needs_enrichment());
    }

    #[test]
    fn substep_defaults_apply() {
        let step: Substep = serde_json::from_value(json!({ "title": "Open file" })).unwrap();
        assert_eq!(step.duration_mins, 5);
        assert!(!step.is_completed);
        assert!(!step.id.is_empty());
    }
}
