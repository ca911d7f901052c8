use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use sqlx::{
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions},
    SqlitePool,
};
use tracing::info;

use crate::error::AppError;

pub(super) async fn init_sqlite(db_path: &str) -> Result<SqlitePool, AppError> {
    let path = Path::new(db_path);
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .foreign_keys(true)
        .busy_timeout(Duration::from_millis(30_000));

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    sqlx::query("PRAGMA synchronous = NORMAL")
        .execute(&pool)
        .await
        .ok();

    create_tables_sqlite(&pool).await?;

    info!("[SQLite] database initialized: {}", db_path);
    Ok(pool)
}

pub(super) async fn init_in_memory() -> Result<SqlitePool, AppError> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
    // A single connection keeps every query on the same in-memory database.
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await?;
    create_tables_sqlite(&pool).await?;
    Ok(pool)
}

async fn create_tables_sqlite(pool: &SqlitePool) -> Result<(), AppError> {
    let statements = [
        r#"CREATE TABLE IF NOT EXISTS agent_sessions (
            id TEXT PRIMARY KEY,
            agent_id TEXT NOT NULL,
            user_id TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )"#,
        r#"CREATE TABLE IF NOT EXISTS agent_messages (
            seq INTEGER PRIMARY KEY AUTOINCREMENT,
            id TEXT NOT NULL UNIQUE,
            session_id TEXT NOT NULL,
            run_id TEXT NOT NULL,
            role TEXT NOT NULL,
            parts_json TEXT NOT NULL,
            created_at TEXT NOT NULL,
            FOREIGN KEY (session_id) REFERENCES agent_sessions(id) ON DELETE CASCADE
        )"#,
        r#"CREATE TABLE IF NOT EXISTS users (
            id TEXT PRIMARY KEY,
            email TEXT NOT NULL UNIQUE,
            persona TEXT NOT NULL DEFAULT 'Other',
            ikigai TEXT,
            psychology_json TEXT NOT NULL DEFAULT '{}',
            life_goals_json TEXT NOT NULL DEFAULT '[]',
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )"#,
        r#"CREATE TABLE IF NOT EXISTS projects (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            title TEXT NOT NULL,
            description TEXT,
            status TEXT NOT NULL DEFAULT 'Active',
            assigned_employees_json TEXT NOT NULL DEFAULT '[]',
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )"#,
        r#"CREATE TABLE IF NOT EXISTS tasks (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            project_id TEXT,
            title TEXT NOT NULL,
            description TEXT,
            why TEXT,
            priority INTEGER NOT NULL DEFAULT 3,
            eisenhower_quadrant TEXT,
            due_date TEXT,
            effort_estimate_mins INTEGER,
            is_completed INTEGER NOT NULL DEFAULT 0,
            substeps_json TEXT NOT NULL DEFAULT '[]',
            last_delayed_at TEXT,
            reverse_pomodoro_active INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )"#,
        "CREATE INDEX IF NOT EXISTS idx_agent_messages_session ON agent_messages(session_id, seq)",
        "CREATE INDEX IF NOT EXISTS idx_agent_sessions_agent ON agent_sessions(agent_id, updated_at)",
        "CREATE INDEX IF NOT EXISTS idx_tasks_user ON tasks(user_id, created_at)",
        "CREATE INDEX IF NOT EXISTS idx_projects_user ON projects(user_id, created_at)",
    ];

    for stmt in statements {
        sqlx::query(stmt).execute(pool).await?;
    }
    Ok(())
}
