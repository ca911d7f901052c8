use sqlx::SqlitePool;
use uuid::Uuid;

use crate::core::time::now_rfc3339;
use crate::error::AppError;
use crate::llm::ChatMessage;
use crate::models::agent_session::{
    AgentMessageRow, AgentSession, AgentSessionDetail, AgentSessionRow, StoredMessage,
};

/// SQLite-backed run history for agents.
#[derive(Clone)]
pub struct SessionStore {
    pool: SqlitePool,
}

impl SessionStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn ensure_session(
        &self,
        session_id: &str,
        agent_id: &str,
        user_id: Option<&str>,
    ) -> Result<(), AppError> {
        let now = now_rfc3339();
        sqlx::query(
            "INSERT INTO agent_sessions (id, agent_id, user_id, created_at, updated_at) VALUES (?, ?, ?, ?, ?) \
             ON CONFLICT(id) DO UPDATE SET updated_at = excluded.updated_at, \
             user_id = COALESCE(excluded.user_id, agent_sessions.user_id)",
        )
        .bind(session_id)
        .bind(agent_id)
        .bind(user_id)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn append_messages(
        &self,
        session_id: &str,
        run_id: &str,
        messages: &[ChatMessage],
    ) -> Result<(), AppError> {
        if messages.is_empty() {
            return Ok(());
        }
        let now = now_rfc3339();
        let mut tx = self.pool.begin().await?;
        for message in messages {
            let parts_json = serde_json::to_string(&message.parts)?;
            sqlx::query(
                "INSERT INTO agent_messages (id, session_id, run_id, role, parts_json, created_at) VALUES (?, ?, ?, ?, ?, ?)",
            )
            .bind(Uuid::new_v4().to_string())
            .bind(session_id)
            .bind(run_id)
            .bind(message.role.as_str())
            .bind(parts_json)
            .bind(&now)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    /// The newest `limit` messages of a session, oldest first.
    pub async fn recent_messages(
        &self,
        session_id: &str,
        limit: usize,
    ) -> Result<Vec<ChatMessage>, AppError> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        let rows = sqlx::query_as::<_, AgentMessageRow>(
            "SELECT id, run_id, role, parts_json, created_at FROM (\
                SELECT seq, id, run_id, role, parts_json, created_at FROM agent_messages \
                WHERE session_id = ? ORDER BY seq DESC LIMIT ?\
             ) ORDER BY seq ASC",
        )
        .bind(session_id)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows
            .into_iter()
            .filter_map(AgentMessageRow::to_message)
            .map(|m| m.to_chat_message())
            .collect())
    }

    pub async fn list_sessions(&self, agent_id: Option<&str>) -> Result<Vec<AgentSession>, AppError> {
        let mut query = "SELECT * FROM agent_sessions".to_string();
        if agent_id.is_some() {
            query.push_str(" WHERE agent_id = ?");
        }
        query.push_str(" ORDER BY updated_at DESC, rowid DESC");
        let mut q = sqlx::query_as::<_, AgentSessionRow>(&query);
        if let Some(agent_id) = agent_id {
            q = q.bind(agent_id);
        }
        let rows = q.fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(AgentSessionRow::to_session).collect())
    }

    pub async fn get_session(&self, session_id: &str) -> Result<Option<AgentSessionDetail>, AppError> {
        let row = sqlx::query_as::<_, AgentSessionRow>("SELECT * FROM agent_sessions WHERE id = ?")
            .bind(session_id)
            .fetch_optional(&self.pool)
            .await?;
        let Some(row) = row else {
            return Ok(None);
        };

        let messages: Vec<StoredMessage> = sqlx::query_as::<_, AgentMessageRow>(
            "SELECT id, run_id, role, parts_json, created_at FROM agent_messages WHERE session_id = ? ORDER BY seq ASC",
        )
        .bind(session_id)
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .filter_map(AgentMessageRow::to_message)
        .collect();

        Ok(Some(AgentSessionDetail {
            session: row.to_session(),
            messages,
        }))
    }

    pub async fn delete_session(&self, session_id: &str) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM agent_sessions WHERE id = ?")
            .bind(session_id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::not_found("Session not found"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::SessionStore;
    use crate::db::connect_in_memory;
    use crate::error::AppError;
    use crate::llm::ChatMessage;

    async fn store() -> SessionStore {
        SessionStore::new(connect_in_memory().await.expect("db"))
    }

    #[tokio::test]
    async fn recent_messages_returns_newest_window_oldest_first() {
        let store = store().await;
        store.ensure_session("s1", "assistant", None).await.unwrap();
        let messages: Vec<ChatMessage> = (0..5).map(|i| ChatMessage::user_text(format!("m{i}"))).collect();
        store.append_messages("s1", "run-1", &messages).await.unwrap();

        let recent = store.recent_messages("s1", 3).await.unwrap();
        let texts: Vec<String> = recent.iter().map(ChatMessage::text).collect();
        assert_eq!(texts, vec!["m2", "m3", "m4"]);
        assert!(store.recent_messages("s1", 0).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn ensure_session_keeps_known_user() {
        let store = store().await;
        store.ensure_session("s1", "assistant", Some("u1")).await.unwrap();
        store.ensure_session("s1", "assistant", None).await.unwrap();
        let detail = store.get_session("s1").await.unwrap().expect("session");
        assert_eq!(detail.session.user_id.as_deref(), Some("u1"));
    }

    #[tokio::test]
    async fn list_filters_by_agent() {
        let store = store().await;
        store.ensure_session("a", "assistant", None).await.unwrap();
        store.ensure_session("b", "planner", None).await.unwrap();
        assert_eq!(store.list_sessions(None).await.unwrap().len(), 2);
        let only = store.list_sessions(Some("planner")).await.unwrap();
        assert_eq!(only.len(), 1);
        assert_eq!(only[0].session_id, "b");
    }

    #[tokio::test]
    async fn delete_cascades_and_reports_missing() {
        let store = store().await;
        store.ensure_session("s1", "assistant", None).await.unwrap();
        store
            .append_messages("s1", "r", &[ChatMessage::user_text("hi")])
            .await
            .unwrap();
        store.delete_session("s1").await.unwrap();
        assert!(store.get_session("s1").await.unwrap().is_none());
        assert!(store.recent_messages("s1", 10).await.unwrap().is_empty());
        assert!(matches!(
            store.delete_session("s1").await,
            Err(AppError::NotFound(_))
        ));
    }
}
