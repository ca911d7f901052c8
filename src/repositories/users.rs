use sqlx::SqlitePool;

use crate::error::AppError;
use crate::models::user::{User, UserRow};

/// Oldest first, so the first entry is the default user.
pub async fn list_users(pool: &SqlitePool) -> Result<Vec<User>, AppError> {
    let rows = sqlx::query_as::<_, UserRow>("SELECT * FROM users ORDER BY created_at ASC, rowid ASC")
        .fetch_all(pool)
        .await?;
    Ok(rows.into_iter().map(|r| r.to_user()).collect())
}

pub async fn get_user_by_id(pool: &SqlitePool, id: &str) -> Result<Option<User>, AppError> {
    let row = sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row.map(|r| r.to_user()))
}

pub async fn get_user_by_email(pool: &SqlitePool, email: &str) -> Result<Option<User>, AppError> {
    let row = sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE email = ?")
        .bind(email)
        .fetch_optional(pool)
        .await?;
    Ok(row.map(|r| r.to_user()))
}

pub async fn create_user(pool: &SqlitePool, user: &User) -> Result<String, AppError> {
    sqlx::query(
        "INSERT INTO users (id, email, persona, ikigai, psychology_json, life_goals_json, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&user.id)
    .bind(&user.email)
    .bind(user.persona.as_str())
    .bind(&user.ikigai)
    .bind(serde_json::to_string(&user.psychology)?)
    .bind(serde_json::to_string(&user.life_goals)?)
    .bind(&user.created_at)
    .bind(&user.updated_at)
    .execute(pool)
    .await?;
    Ok(user.id.clone())
}

pub async fn update_user(pool: &SqlitePool, user: &User) -> Result<(), AppError> {
    sqlx::query(
        "UPDATE users SET email = ?, persona = ?, ikigai = ?, psychology_json = ?, life_goals_json = ?, updated_at = ? \
         WHERE id = ?",
    )
    .bind(&user.email)
    .bind(user.persona.as_str())
    .bind(&user.ikigai)
    .bind(serde_json::to_string(&user.psychology)?)
    .bind(serde_json::to_string(&user.life_goals)?)
    .bind(&user.updated_at)
    .bind(&user.id)
    .execute(pool)
    .await?;
    Ok(())
}

/// Returns whether a row was removed.
pub async fn delete_user(pool: &SqlitePool, id: &str) -> Result<bool, AppError> {
    let result = sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
