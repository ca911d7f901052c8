use serde::Deserialize;
use serde_json::Value;
use sqlx::SqlitePool;
use tracing::info;

use crate::core::time::now_rfc3339;
use crate::core::validation::{normalize_non_empty, validate_email};
use crate::error::AppError;
use crate::models::user::{Persona, User, DEFAULT_USER_EMAIL};
use crate::repositories::users as repo;

const BASE_TRAITS: [&str; 2] = ["Purpose-driven", "Impact-focused"];

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserInput {
    pub email: Option<String>,
    pub persona: Option<String>,
    pub ikigai: Option<String>,
    pub life_goals: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserInput {
    pub email: Option<String>,
    pub persona: Option<String>,
    pub ikigai: Option<String>,
    pub life_goals: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizSubmission {
    pub ikigai: String,
    #[serde(default)]
    pub life_goals: Vec<String>,
    #[serde(default)]
    pub quiz_results: Value,
}

fn parse_persona(raw: Option<&str>) -> Result<Persona, AppError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(Persona::Other),
        Some(raw) => Persona::parse(raw).ok_or_else(|| AppError::validation("Invalid persona")),
    }
}

async fn ensure_email_free(pool: &SqlitePool, email: &str, owner: Option<&str>) -> Result<(), AppError> {
    match repo::get_user_by_email(pool, email).await? {
        Some(existing) if Some(existing.id.as_str()) != owner => {
            Err(AppError::validation("Email already in use"))
        }
        _ => Ok(()),
    }
}

pub async fn list_users(pool: &SqlitePool) -> Result<Vec<User>, AppError> {
    repo::list_users(pool).await
}

pub async fn get_user(pool: &SqlitePool, id: &str) -> Result<User, AppError> {
    repo::get_user_by_id(pool, id)
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))
}

pub async fn create_user(pool: &SqlitePool, input: CreateUserInput) -> Result<User, AppError> {
    let email = validate_email(input.email.as_deref().unwrap_or_default())?;
    let persona = parse_persona(input.persona.as_deref())?;
    ensure_email_free(pool, &email, None).await?;

    let mut user = User::new(email, persona);
    user.ikigai = normalize_non_empty(input.ikigai);
    user.life_goals = input.life_goals.unwrap_or_default();
    repo::create_user(pool, &user).await?;
    info!("[Users] created user: id={}", user.id);
    Ok(user)
}

pub async fn update_user(pool: &SqlitePool, id: &str, input: UpdateUserInput) -> Result<User, AppError> {
    let mut user = get_user(pool, id).await?;
    if let Some(email) = input.email {
        let email = validate_email(&email)?;
        ensure_email_free(pool, &email, Some(id)).await?;
        user.email = email;
    }
    if input.persona.is_some() {
        user.persona = parse_persona(input.persona.as_deref())?;
    }
    if let Some(ikigai) = input.ikigai {
        user.ikigai = normalize_non_empty(Some(ikigai));
    }
    if let Some(goals) = input.life_goals {
        user.life_goals = goals;
    }
    user.updated_at = now_rfc3339();
    repo::update_user(pool, &user).await?;
    Ok(user)
}

pub async fn delete_user(pool: &SqlitePool, id: &str) -> Result<(), AppError> {
    if !repo::delete_user(pool, id).await? {
        return Err(AppError::not_found("User not found"));
    }
    Ok(())
}

/// The oldest user, created on first use.
pub async fn get_or_create_default_user(pool: &SqlitePool) -> Result<User, AppError> {
    if let Some(user) = repo::list_users(pool).await?.into_iter().next() {
        return Ok(user);
    }
    let user = User::new(DEFAULT_USER_EMAIL.to_string(), Persona::Other);
    repo::create_user(pool, &user).await?;
    info!("[Users] created default user: id={}", user.id);
    Ok(user)
}

pub fn derive_traits(ikigai: &str) -> Vec<String> {
    let mut traits: Vec<String> = BASE_TRAITS.iter().map(|t| t.to_string()).collect();
    let lower = ikigai.to_lowercase();
    if lower.contains("help") {
        traits.push("Altruistic".to_string());
    }
    if lower.contains("create") {
        traits.push("Creative".to_string());
    }
    traits
}

pub async fn submit_psychology_quiz(
    pool: &SqlitePool,
    user_id: &str,
    submission: QuizSubmission,
) -> Result<User, AppError> {
    let mut user = get_user(pool, user_id).await?;
    let now = now_rfc3339();
    user.psychology.traits = derive_traits(&submission.ikigai);
    user.psychology.quiz_results = Some(submission.quiz_results).filter(|v| !v.is_null());
    user.psychology.last_psych_update = Some(now.clone());
    user.ikigai = normalize_non_empty(Some(submission.ikigai));
    user.life_goals = submission.life_goals;
    user.updated_at = now;
    repo::update_user(pool, &user).await?;
    Ok(user)
}
