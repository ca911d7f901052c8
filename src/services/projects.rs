use serde::Deserialize;
use sqlx::SqlitePool;

use crate::core::time::now_rfc3339;
use crate::core::validation::{normalize_non_empty, require_non_empty};
use crate::error::AppError;
use crate::models::project::{Project, ProjectStatus};
use crate::repositories::projects as repo;
use crate::services::users::get_or_create_default_user;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProjectInput {
    pub user_id: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<String>,
    pub assigned_employees: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProjectInput {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<String>,
    pub assigned_employees: Option<Vec<String>>,
}

fn parse_status(raw: &str) -> Result<ProjectStatus, AppError> {
    ProjectStatus::parse(raw).ok_or_else(|| AppError::validation("Invalid project status"))
}

pub async fn list_projects(pool: &SqlitePool, user_id: Option<&str>) -> Result<Vec<Project>, AppError> {
    repo::list_projects(pool, user_id).await
}

pub async fn get_project(pool: &SqlitePool, id: &str) -> Result<Project, AppError> {
    repo::get_project_by_id(pool, id)
        .await?
        .ok_or_else(|| AppError::not_found("Project not found"))
}

pub async fn create_project(pool: &SqlitePool, input: CreateProjectInput) -> Result<Project, AppError> {
    let title = require_non_empty(input.title.as_deref(), "Title is required")?;
    let status = match input.status.as_deref() {
        Some(raw) => parse_status(raw)?,
        None => ProjectStatus::Active,
    };
    let user_id = match normalize_non_empty(input.user_id) {
        Some(id) => id,
        None => get_or_create_default_user(pool).await?.id,
    };

    let mut project = Project::new(user_id, title);
    project.description = normalize_non_empty(input.description);
    project.status = status;
    project.assigned_employees = input.assigned_employees.unwrap_or_default();
    repo::create_project(pool, &project).await?;
    Ok(project)
}

pub async fn update_project(
    pool: &SqlitePool,
    id: &str,
    input: UpdateProjectInput,
) -> Result<Project, AppError> {
    let mut project = get_project(pool, id).await?;
    if input.title.is_some() {
        project.title = require_non_empty(input.title.as_deref(), "Title is required")?;
    }
    if let Some(description) = input.description {
        project.description = normalize_non_empty(Some(description));
    }
    if let Some(status) = input.status.as_deref() {
        project.status = parse_status(status)?;
    }
    if let Some(employees) = input.assigned_employees {
        project.assigned_employees = employees;
    }
    project.updated_at = now_rfc3339();
    repo::update_project(pool, &project).await?;
    Ok(project)
}

pub async fn delete_project(pool: &SqlitePool, id: &str) -> Result<(), AppError> {
    if !repo::delete_project(pool, id).await? {
        return Err(AppError::not_found("Project not found"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::connect_in_memory;

    #[tokio::test]
    async fn create_requires_title_and_fills_default_user() {
        let pool = connect_in_memory().await.unwrap();
        let err = create_project(&pool, CreateProjectInput::default()).await.unwrap_err();
        assert_eq!(err.to_string(), "Title is required");

        let project = create_project(
            &pool,
            CreateProjectInput { title: Some("Launch".into()), ..Default::default() },
        )
        .await
        .unwrap();
        let default_user = get_or_create_default_user(&pool).await.unwrap();
        assert_eq!(project.user_id, default_user.id);
        assert_eq!(project.status, ProjectStatus::Active);
    }

    #[tokio::test]
    async fn update_changes_status_and_rejects_unknown() {
        let pool = connect_in_memory().await.unwrap();
        let project = create_project(
            &pool,
            CreateProjectInput {
                user_id: Some("u1".into()),
                title: Some("Launch".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let updated = update_project(
            &pool,
            &project.id,
            UpdateProjectInput { status: Some("On Hold".into()), ..Default::default() },
        )
        .await
        .unwrap();
        assert_eq!(updated.status, ProjectStatus::OnHold);

        let err = update_project(
            &pool,
            &project.id,
            UpdateProjectInput { status: Some("Paused".into()), ..Default::default() },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        delete_project(&pool, &project.id).await.unwrap();
        assert!(matches!(get_project(&pool, &project.id).await, Err(AppError::NotFound(_))));
    }
}
