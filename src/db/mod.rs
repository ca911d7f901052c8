use sqlx::SqlitePool;

use crate::error::AppError;

mod sqlite;

/// Opens (or creates) the database file and applies the schema.
pub async fn connect(db_path: &str) -> Result<SqlitePool, AppError> {
    sqlite::init_sqlite(db_path).await
}

/// Schema-initialized in-memory database, used by tests.
pub async fn connect_in_memory() -> Result<SqlitePool, AppError> {
    sqlite::init_in_memory().await
}

#[cfg(test)]
mod tests {
    use super::{connect, connect_in_memory};

    #[tokio::test]
    async fn schema_is_created_in_memory() {
        let pool = connect_in_memory().await.expect("in-memory db");
        let tables: Vec<(String,)> =
            sqlx::query_as("SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name")
                .fetch_all(&pool)
                .await
                .expect("list tables");
        let names: Vec<String> = tables.into_iter().map(|(n,)| n).collect();
        for expected in ["agent_messages", "agent_sessions", "projects", "tasks", "users"] {
            assert!(names.iter().any(|n| n == expected), "missing table {expected}");
        }
    }

    #[tokio::test]
    async fn file_database_is_created_with_parent_dirs() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("my_os.db");
        let pool = connect(path.to_str().expect("utf8 path")).await.expect("file db");
        pool.close().await;
        assert!(path.exists());
    }
}
