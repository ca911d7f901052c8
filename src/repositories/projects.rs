use sqlx::SqlitePool;

use crate::error::AppError;
use crate::models::project::{Project, ProjectRow};

pub async fn list_projects(pool: &SqlitePool, user_id: Option<&str>) -> Result<Vec<Project>, AppError> {
    let mut query = "SELECT * FROM projects".to_string();
    if user_id.is_some() {
        query.push_str(" WHERE user_id = ?");
    }
    query.push_str(" ORDER BY created_at DESC, rowid DESC");
    let mut q = sqlx::query_as::<_, ProjectRow>(&query);
    if let Some(uid) = user_id {
        q = q.bind(uid);
    }
    let rows = q.fetch_all(pool).await?;
    Ok(rows.into_iter().map(|r| r.to_project()).collect())
}

pub async fn get_project_by_id(pool: &SqlitePool, id: &str) -> Result<Option<Project>, AppError> {
    let row = sqlx::query_as::<_, ProjectRow>("SELECT * FROM projects WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row.map(|r| r.to_project()))
}

pub async fn create_project(pool: &SqlitePool, project: &Project) -> Result<String, AppError> {
    sqlx::query(
        "INSERT INTO projects (id, user_id, title, description, status, assigned_employees_json, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&project.id)
    .bind(&project.user_id)
    .bind(&project.title)
    .bind(&project.description)
    .bind(project.status.as_str())
    .bind(serde_json::to_string(&project.assigned_employees)?)
    .bind(&project.created_at)
    .bind(&project.updated_at)
    .execute(pool)
    .await?;
    Ok(project.id.clone())
}

pub async fn update_project(pool: &SqlitePool, project: &Project) -> Result<(), AppError> {
    sqlx::query(
        "UPDATE projects SET user_id = ?, title = ?, description = ?, status = ?, assigned_employees_json = ?, updated_at = ? \
         WHERE id = ?",
    )
    .bind(&project.user_id)
    .bind(&project.title)
    .bind(&project.description)
    .bind(project.status.as_str())
    .bind(serde_json::to_string(&project.assigned_employees)?)
    .bind(&project.updated_at)
    .bind(&project.id)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn delete_project(pool: &SqlitePool, id: &str) -> Result<bool, AppError> {
    let result = sqlx::query("DELETE FROM projects WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
