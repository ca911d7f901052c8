use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::core::time::now_rfc3339;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ProjectStatus {
    #[default]
    Active,
    #[serde(rename = "On Hold")]
    OnHold,
    Completed,
}

impl ProjectStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectStatus::Active => "Active",
            ProjectStatus::OnHold => "On Hold",
            ProjectStatus::Completed => "Completed",
        }
    }

    pub fn parse(raw: &str) -> Option<ProjectStatus> {
        match raw.trim() {
            "Active" => Some(ProjectStatus::Active),
            "On Hold" => Some(ProjectStatus::OnHold),
            "Completed" => Some(ProjectStatus::Completed),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub description: Option<String>,
    pub status: ProjectStatus,
    pub assigned_employees: Vec<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl Project {
    pub fn new(user_id: String, title: String) -> Project {
        let now = now_rfc3339();
        Project {
            id: Uuid::new_v4().to_string(),
            user_id,
            title,
            description: None,
            status: ProjectStatus::Active,
            assigned_employees: Vec::new(),
            created_at: now.clone(),
            updated_at: now,
        }
    }
}

#[derive(Debug, FromRow)]
pub struct ProjectRow {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub description: Option<String>,
    pub status: String,
    pub assigned_employees_json: String,
    pub created_at: String,
    pub updated_at: String,
}

impl ProjectRow {
    pub fn to_project(self) -> Project {
        Project {
            id: self.id,
            user_id: self.user_id,
            title: self.title,
            description: self.description,
            status: ProjectStatus::parse(&self.status).unwrap_or_default(),
            assigned_employees: serde_json::from_str(&self.assigned_employees_json)
                .unwrap_or_default(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}
