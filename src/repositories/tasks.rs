use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use crate::error::AppError;
use crate::models::task::{Task, TaskRow};

#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    pub user_id: Option<String>,
    pub project_id: Option<String>,
    pub is_completed: Option<bool>,
    pub limit: Option<i64>,
}

/// Newest first.
pub async fn list_tasks(pool: &SqlitePool, filter: &TaskFilter) -> Result<Vec<Task>, AppError> {
    let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT * FROM tasks WHERE 1 = 1");
    if let Some(user_id) = &filter.user_id {
        qb.push(" AND user_id = ").push_bind(user_id.clone());
    }
    if let Some(project_id) = &filter.project_id {
        qb.push(" AND project_id = ").push_bind(project_id.clone());
    }
    if let Some(done) = filter.is_completed {
        qb.push(" AND is_completed = ").push_bind(if done { 1i64 } else { 0i64 });
    }
    qb.push(" ORDER BY created_at DESC, rowid DESC");
    if let Some(limit) = filter.limit {
        qb.push(" LIMIT ").push_bind(limit);
    }
    let rows = qb.build_query_as::<TaskRow>().fetch_all(pool).await?;
    Ok(rows.into_iter().map(|r| r.to_task()).collect())
}

pub async fn get_task_by_id(pool: &SqlitePool, id: &str) -> Result<Option<Task>, AppError> {
    let row = sqlx::query_as::<_, TaskRow>("SELECT * FROM tasks WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row.map(|r| r.to_task()))
}

pub async fn create_task(pool: &SqlitePool, task: &Task) -> Result<String, AppError> {
    sqlx::query(
        "INSERT INTO tasks (id, user_id, project_id, title, description, why, priority, eisenhower_quadrant, due_date, \
         effort_estimate_mins, is_completed, substeps_json, last_delayed_at, reverse_pomodoro_active, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&task.id)
    .bind(&task.user_id)
    .bind(&task.project_id)
    .bind(&task.title)
    .bind(&task.description)
    .bind(&task.why)
    .bind(task.priority)
    .bind(task.eisenhower_quadrant.map(|q| q.as_str()))
    .bind(&task.due_date)
    .bind(task.effort_estimate_mins)
    .bind(task.is_completed as i64)
    .bind(serde_json::to_string(&task.substeps)?)
    .bind(&task.last_delayed_at)
    .bind(task.reverse_pomodoro_active as i64)
    .bind(&task.created_at)
    .bind(&task.updated_at)
    .execute(pool)
    .await?;
    Ok(task.id.clone())
}

pub async fn update_task(pool: &SqlitePool, task: &Task) -> Result<(), AppError> {
    sqlx::query(
        "UPDATE tasks SET user_id = ?, project_id = ?, title = ?, description = ?, why = ?, priority = ?, \
         eisenhower_quadrant = ?, due_date = ?, effort_estimate_mins = ?, is_completed = ?, substeps_json = ?, \
         last_delayed_at = ?, reverse_pomodoro_active = ?, updated_at = ? WHERE id = ?",
    )
    .bind(&task.user_id)
    .bind(&task.project_id)
    .bind(&task.title)
    .bind(&task.description)
    .bind(&task.why)
    .bind(task.priority)
    .bind(task.eisenhower_quadrant.map(|q| q.as_str()))
    .bind(&task.due_date)
    .bind(task.effort_estimate_mins)
    .bind(task.is_completed as i64)
    .bind(serde_json::to_string(&task.substeps)?)
    .bind(&task.last_delayed_at)
    .bind(task.reverse_pomodoro_active as i64)
    .bind(&task.updated_at)
    .bind(&task.id)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn delete_task(pool: &SqlitePool, id: &str) -> Result<bool, AppError> {
    let result = sqlx::query("DELETE FROM tasks WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::connect_in_memory;

    #[tokio::test]
    async fn filters_and_orders_newest_first() {
        let pool = connect_in_memory().await.unwrap();
        let mut first = Task::new("u1".into(), "first".into());
        first.created_at = "2025-01-01T00:00:00.000Z".into();
        let mut second = Task::new("u1".into(), "second".into());
        second.created_at = "2025-01-02T00:00:00.000Z".into();
        second.is_completed = true;
        let other = Task::new("u2".into(), "other".into());
        for task in [&first, &second, &other] {
            create_task(&pool, task).await.unwrap();
        }

        let mine = list_tasks(
            &pool,
            &TaskFilter { user_id: Some("u1".into()), ..TaskFilter::default() },
        )
        .await
        .unwrap();
        let titles: Vec<&str> = mine.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, vec!["second", "first"]);

        let open = list_tasks(
            &pool,
            &TaskFilter {
                user_id: Some("u1".into()),
                is_completed: Some(false),
                limit: Some(10),
                ..TaskFilter::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(open.len(), 1);
        assert_eq!(open[0].title, "first");
    }

    #[tokio::test]
    async fn update_and_delete_round_trip() {
        let pool = connect_in_memory().await.unwrap();
        let mut task = Task::new("u1".into(), "draft".into());
        create_task(&pool, &task).await.unwrap();
        task.title = "final".into();
        task.substeps.push(crate::models::task::Substep::new("Open file".into(), 5));
        update_task(&pool, &task).await.unwrap();

        let stored = get_task_by_id(&pool, &task.id).await.unwrap().expect("task");
        assert_eq!(stored.title, "final");
        assert_eq!(stored.substeps.len(), 1);
        assert!(delete_task(&pool, &task.id).await.unwrap());
        assert!(!delete_task(&pool, &task.id).await.unwrap());
    }
}
