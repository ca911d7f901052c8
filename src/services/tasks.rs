use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sqlx::SqlitePool;
use tracing::{info, warn};

use crate::core::time::now_rfc3339;
use crate::core::validation::{normalize_non_empty, require_non_empty, validate_priority};
use crate::error::AppError;
use crate::llm::{generate_json, ChatModel, ModelRequest};
use crate::models::task::{EisenhowerQuadrant, Substep, Task, DEFAULT_PRIORITY, DEFAULT_SUBSTEP_MINS};
use crate::models::user::User;
use crate::repositories::tasks::{self as repo, TaskFilter};
use crate::repositories::{projects as project_repo, users as user_repo};
use crate::services::task_parser::parse_task_input;
use crate::services::users::get_or_create_default_user;

pub const FALLBACK_MOTIVATION: &str =
    "You've got this! Every small step counts towards your big goals.";
const MAX_SUBSTEPS: usize = 10;
const DUE_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskInput {
    pub user_id: Option<String>,
    pub project_id: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub why: Option<String>,
    pub priority: Option<i64>,
    pub eisenhower_quadrant: Option<String>,
    pub due_date: Option<String>,
    pub effort_estimate_mins: Option<i64>,
    pub is_completed: Option<bool>,
    pub substeps: Option<Vec<Substep>>,
    pub reverse_pomodoro_active: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTaskInput {
    pub project_id: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub why: Option<String>,
    pub priority: Option<i64>,
    pub eisenhower_quadrant: Option<String>,
    pub due_date: Option<String>,
    pub effort_estimate_mins: Option<i64>,
    pub is_completed: Option<bool>,
    pub substeps: Option<Vec<Substep>>,
    pub last_delayed_at: Option<String>,
    pub reverse_pomodoro_active: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Enrichment {
    eisenhower_quadrant: Option<String>,
    effort_estimate_mins: Option<f64>,
    why: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeneratedSubstep {
    title: String,
    duration_mins: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct GeneratedSubsteps {
    #[serde(default)]
    substeps: Vec<GeneratedSubstep>,
}

#[derive(Debug, Serialize)]
pub struct Motivation {
    pub motivation: String,
}

fn parse_quadrant(raw: Option<&str>) -> Result<Option<EisenhowerQuadrant>, AppError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(raw) => EisenhowerQuadrant::parse(raw)
            .map(Some)
            .ok_or_else(|| AppError::validation("Invalid Eisenhower quadrant")),
    }
}

/// Accepts RFC 3339, `YYYY-MM-DDTHH:MM:SS[.f]` or `YYYY-MM-DD`. Blank means unset.
fn parse_due_date(raw: Option<String>) -> Result<Option<String>, AppError> {
    let Some(raw) = normalize_non_empty(raw) else {
        return Ok(None);
    };
    let valid = DateTime::parse_from_rfc3339(&raw).is_ok()
        || NaiveDateTime::parse_from_str(&raw, "%Y-%m-%dT%H:%M:%S%.f").is_ok()
        || NaiveDate::parse_from_str(&raw, "%Y-%m-%d").is_ok();
    if valid {
        Ok(Some(raw))
    } else {
        Err(AppError::validation("Invalid due date"))
    }
}

fn validate_effort(mins: Option<i64>) -> Result<Option<i64>, AppError> {
    match mins {
        Some(m) if m < 0 => Err(AppError::validation("Effort estimate must not be negative")),
        other => Ok(other),
    }
}

pub async fn list_tasks(pool: &SqlitePool, filter: &TaskFilter) -> Result<Vec<Task>, AppError> {
    repo::list_tasks(pool, filter).await
}

pub async fn get_task(pool: &SqlitePool, id: &str) -> Result<Task, AppError> {
    repo::get_task_by_id(pool, id)
        .await?
        .ok_or_else(|| AppError::not_found("Task not found"))
}

/// Creates a task. With a model, missing quadrant, effort or "why" are filled
/// in from the owner's profile; enrichment failures never block creation.
pub async fn create_task(
    pool: &SqlitePool,
    model: Option<&dyn ChatModel>,
    input: CreateTaskInput,
) -> Result<Task, AppError> {
    let title = require_non_empty(input.title.as_deref(), "Title is required")?;
    let priority = validate_priority(input.priority.unwrap_or(DEFAULT_PRIORITY))?;
    let quadrant = parse_quadrant(input.eisenhower_quadrant.as_deref())?;
    let effort = validate_effort(input.effort_estimate_mins)?;
    let due_date = parse_due_date(input.due_date)?;
    let user_id = match normalize_non_empty(input.user_id) {
        Some(id) => id,
        None => get_or_create_default_user(pool).await?.id,
    };

    let mut task = Task::new(user_id, title);
    task.project_id = normalize_non_empty(input.project_id);
    task.description = normalize_non_empty(input.description);
    task.why = normalize_non_empty(input.why);
    task.priority = priority;
    task.eisenhower_quadrant = quadrant;
    task.due_date = due_date;
    task.effort_estimate_mins = effort;
    task.is_completed = input.is_completed.unwrap_or(false);
    task.substeps = input.substeps.unwrap_or_default();
    task.reverse_pomodoro_active = input.reverse_pomodoro_active.unwrap_or(false);

    if let Some(model) = model.filter(|_| task.needs_enrichment()) {
        match user_repo::get_user_by_id(pool, &task.user_id).await {
            Ok(Some(user)) => {
                if let Err(err) = enrich_task(model, &mut task, &user).await {
                    warn!("[Tasks] enrichment failed, keeping defaults: {}", err);
                }
            }
            Ok(None) => {}
            Err(err) => warn!("[Tasks] enrichment skipped, user lookup failed: {}", err),
        }
    }

    repo::create_task(pool, &task).await?;
    info!("[Tasks] created task: id={}, user={}", task.id, task.user_id);
    Ok(task)
}

pub fn enrichment_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "eisenhowerQuadrant": { "type": "string", "enum": EisenhowerQuadrant::LABELS },
            "effortEstimateMins": { "type": "number" },
            "why": {
                "type": "string",
                "description": "A short, motivating reason why this task matters to the user's specific Ikigai and goals."
            }
        },
        "required": ["eisenhowerQuadrant", "effortEstimateMins", "why"]
    })
}

fn enrichment_prompt(task: &Task, user: &User) -> String {
    format!(
        "Analyze this task: \"{}\"\nDescription: \"{}\"\n\nUser Context:\n- Ikigai: {}\n- Life Goals: {}\n- Traits: {}\n\n\
         1. Assign an Eisenhower Matrix quadrant based on urgency and importance to THIS specific user's goals.\n\
         2. Estimate effort in minutes (default to 15 if unsure).\n\
         3. Write a 1-sentence \"Why\" explaining the impact of this task on their life goals.",
        task.title,
        task.description.as_deref().unwrap_or_default(),
        user.ikigai.as_deref().unwrap_or("Unknown"),
        user.life_goals.join(", "),
        user.psychology.traits.join(", "),
    )
}

/// Fills only the fields the task is missing.
pub async fn enrich_task(model: &dyn ChatModel, task: &mut Task, user: &User) -> Result<(), AppError> {
    let value = generate_json(model, &enrichment_prompt(task, user), enrichment_schema()).await?;
    let enrichment: Enrichment = serde_json::from_value(value)?;

    if task.eisenhower_quadrant.is_none() {
        task.eisenhower_quadrant = enrichment
            .eisenhower_quadrant
            .as_deref()
            .and_then(EisenhowerQuadrant::parse);
    }
    if task.effort_estimate_mins.is_none() {
        task.effort_estimate_mins = enrichment
            .effort_estimate_mins
            .filter(|m| m.is_finite() && *m >= 0.0)
            .map(|m| m.round() as i64);
    }
    if task.why.is_none() {
        task.why = normalize_non_empty(enrichment.why);
    }
    Ok(())
}

pub async fn update_task(pool: &SqlitePool, id: &str, input: UpdateTaskInput) -> Result<Task, AppError> {
    let mut task = get_task(pool, id).await?;
    if input.title.is_some() {
        task.title = require_non_empty(input.title.as_deref(), "Title is required")?;
    }
    if let Some(priority) = input.priority {
        task.priority = validate_priority(priority)?;
    }
    if input.eisenhower_quadrant.is_some() {
        task.eisenhower_quadrant = parse_quadrant(input.eisenhower_quadrant.as_deref())?;
    }
    if input.effort_estimate_mins.is_some() {
        task.effort_estimate_mins = validate_effort(input.effort_estimate_mins)?;
    }
    if let Some(project_id) = input.project_id {
        task.project_id = normalize_non_empty(Some(project_id));
    }
    if let Some(description) = input.description {
        task.description = normalize_non_empty(Some(description));
    }
    if let Some(why) = input.why {
        task.why = normalize_non_empty(Some(why));
    }
    if input.due_date.is_some() {
        task.due_date = parse_due_date(input.due_date)?;
    }
    if let Some(done) = input.is_completed {
        task.is_completed = done;
    }
    if let Some(substeps) = input.substeps {
        task.substeps = substeps;
    }
    if let Some(delayed) = input.last_delayed_at {
        task.last_delayed_at = normalize_non_empty(Some(delayed));
    }
    if let Some(active) = input.reverse_pomodoro_active {
        task.reverse_pomodoro_active = active;
    }
    task.updated_at = now_rfc3339();
    repo::update_task(pool, &task).await?;
    Ok(task)
}

pub async fn delete_task(pool: &SqlitePool, id: &str) -> Result<(), AppError> {
    if !repo::delete_task(pool, id).await? {
        return Err(AppError::not_found("Task not found"));
    }
    Ok(())
}

pub fn substeps_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "substeps": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "title": { "type": "string" },
                        "durationMins": { "type": "number" }
                    },
                    "required": ["title"]
                }
            }
        },
        "required": ["substeps"]
    })
}

/// Replaces the task's substeps with a model-generated breakdown.
pub async fn generate_substeps(pool: &SqlitePool, model: &dyn ChatModel, id: &str) -> Result<Task, AppError> {
    let mut task = get_task(pool, id).await?;
    let prompt = format!(
        "Break down this task into small, actionable 5-minute substeps:\nTask: \"{}\"\nDescription: \"{}\"\n\n\
         Rules:\n\
         1. Each step should be completable in roughly 5 minutes.\n\
         2. Make them concrete and actionable (e.g., \"Open file\", \"Write function signature\", \"Add error handling\").\n\
         3. Generate 3-10 steps depending on complexity.",
        task.title,
        task.description.as_deref().unwrap_or_default(),
    );
    let value = generate_json(model, &prompt, substeps_schema()).await?;
    let generated: GeneratedSubsteps = serde_json::from_value(value)?;

    let substeps: Vec<Substep> = generated
        .substeps
        .into_iter()
        .filter_map(|s| {
            let title = normalize_non_empty(Some(s.title))?;
            let mins = s
                .duration_mins
                .filter(|m| m.is_finite() && *m > 0.0)
                .map(|m| m.round() as i64)
                .unwrap_or(DEFAULT_SUBSTEP_MINS);
            Some(Substep::new(title, mins))
        })
        .take(MAX_SUBSTEPS)
        .collect();
    if substeps.is_empty() {
        return Err(AppError::Model("model returned no substeps".to_string()));
    }

    task.substeps = substeps;
    task.updated_at = now_rfc3339();
    repo::update_task(pool, &task).await?;
    Ok(task)
}

fn motivation_prompt(task: &Task, user: Option<&User>) -> String {
    let (ikigai, goals, traits) = match user {
        Some(user) => (
            user.ikigai.clone().unwrap_or_default(),
            user.life_goals.join(", "),
            user.psychology.traits.join(", "),
        ),
        None => Default::default(),
    };
    format!(
        "You are a motivational coach for a user with the following profile:\nIkigai: {ikigai}\nLife Goals: {goals}\n\
         User Traits: {traits}\n\nThe user has a delayed task: \"{}\".\nReason for delay: {}\n\n\
         Generate a short, punchy, and highly motivational quote (1-2 sentences) that reminds the user WHY this task \
         matters to their life goals and how completing it impacts their future.",
        task.title,
        task.why.as_deref().unwrap_or("Unknown"),
    )
}

/// A short motivational nudge; any model failure yields the stock line.
pub async fn generate_motivation(
    pool: &SqlitePool,
    model: &dyn ChatModel,
    id: &str,
) -> Result<Motivation, AppError> {
    let task = get_task(pool, id).await?;
    let user = user_repo::get_user_by_id(pool, &task.user_id).await?;
    let motivation = match model
        .generate(ModelRequest::prompt(motivation_prompt(&task, user.as_ref())))
        .await
    {
        Ok(response) => normalize_non_empty(Some(response.text()))
            .unwrap_or_else(|| FALLBACK_MOTIVATION.to_string()),
        Err(err) => {
            warn!("[Tasks] motivation failed: {}", err);
            FALLBACK_MOTIVATION.to_string()
        }
    };
    Ok(Motivation { motivation })
}

/// Parses quick-add syntax against known users and projects, then creates it.
pub async fn quick_add(
    pool: &SqlitePool,
    model: Option<&dyn ChatModel>,
    input: &str,
    today: NaiveDate,
) -> Result<Task, AppError> {
    let raw = require_non_empty(Some(input), "Input is required")?;
    let users = user_repo::list_users(pool).await?;
    let projects = project_repo::list_projects(pool, None).await?;
    let parsed = parse_task_input(&raw, &users, &projects, today);

    create_task(
        pool,
        model,
        CreateTaskInput {
            user_id: Some(parsed.user_id),
            project_id: parsed.project_id,
            title: Some(parsed.title),
            due_date: parsed.due_date.map(|d| d.format(DUE_DATE_FORMAT).to_string()),
            effort_estimate_mins: parsed.effort_estimate_mins,
            priority: Some(DEFAULT_PRIORITY),
            ..CreateTaskInput::default()
        },
    )
    .await
}
