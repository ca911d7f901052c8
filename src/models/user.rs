use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

use crate::core::time::now_rfc3339;

pub const DEFAULT_USER_EMAIL: &str = "user@doable.ai";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Persona {
    #[serde(rename = "Software Developer")]
    SoftwareDeveloper,
    #[serde(rename = "Product Manager")]
    ProductManager,
    #[serde(rename = "Team Leader")]
    TeamLeader,
    #[default]
    Other,
}

impl Persona {
    pub fn as_str(&self) -> &'static str {
        match self {
            Persona::SoftwareDeveloper => "Software Developer",
            Persona::ProductManager => "Product Manager",
            Persona::TeamLeader => "Team Leader",
            Persona::Other => "Other",
        }
    }

    pub fn parse(raw: &str) -> Option<Persona> {
        match raw.trim() {
            "Software Developer" => Some(Persona::SoftwareDeveloper),
            "Product Manager" => Some(Persona::ProductManager),
            "Team Leader" => Some(Persona::TeamLeader),
            "Other" => Some(Persona::Other),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Psychology {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quiz_results: Option<Value>,
    #[serde(default)]
    pub traits: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_psych_update: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub email: String,
    pub persona: Persona,
    pub ikigai: Option<String>,
    pub psychology: Psychology,
    pub life_goals: Vec<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl User {
    pub fn new(email: String, persona: Persona) -> User {
        let now = now_rfc3339();
        User {
            id: Uuid::new_v4().to_string(),
            email,
            persona,
            ikigai: None,
            psychology: Psychology::default(),
            life_goals: Vec::new(),
            created_at: now.clone(),
            updated_at: now,
        }
    }
}

#[derive(Debug, FromRow)]
pub struct UserRow {
    pub id: String,
    pub email: String,
    pub persona: String,
    pub ikigai: Option<String>,
    pub psychology_json: String,
    pub life_goals_json: String,
    pub created_at: String,
    pub updated_at: String,
}

impl UserRow {
    pub fn to_user(self) -> User {
        User {
            id: self.id,
            email: self.email,
            persona: Persona::parse(&self.persona).unwrap_or_default(),
            ikigai: self.ikigai,
            psychology: serde_json::from_str(&self.psychology_json).unwrap_or_default(),
            life_goals: serde_json::from_str(&self.life_goals_json).unwrap_or_default(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}
